//! HTTP accept loop and per-connection task management.
//!
//! [`serve`] owns the listener of one running server.  It:
//!
//! 1. Accepts TCP connections until the shutdown token is cancelled.
//! 2. Drives each connection with hyper's HTTP/1.1 server in its own task,
//!    calling the axum router for every request.
//! 3. On cancellation, drops the listener (new connects are refused), asks
//!    every open connection to finish its in-flight request and close, then
//!    waits for them.
//!
//! The grace period is enforced by the caller: the service manager aborts the
//! `serve` task when it runs out of patience, which drops the [`JoinSet`] and
//! aborts every connection task still alive.
//!
//! # Scalability
//!
//! Each connection runs in its own Tokio task, so a slow upload never blocks
//! the accept loop or other clients.  Handlers share only the immutable
//! route state.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::Request;
use axum::response::Response;
use axum::Router;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tower::Service;
use tracing::{debug, error, info};

/// Runs the accept loop for `listener` until `shutdown` is cancelled and
/// every connection has closed.
pub async fn serve(listener: TcpListener, router: Router, shutdown: CancellationToken) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,

            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!("connection from {peer}");
                    let router = router.clone();
                    let shutdown = shutdown.clone();
                    connections.spawn(serve_connection(stream, peer, router, shutdown));
                }
                Err(e) => {
                    // Transient (e.g. out of file descriptors); keep serving.
                    error!("accept error: {e}");
                }
            },

            // Reap finished connection tasks so the set does not grow forever.
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    let local = listener.local_addr().ok();
    drop(listener);
    debug!(
        "listener {local:?} closed; waiting for {} open connection(s)",
        connections.len()
    );

    while connections.join_next().await.is_some() {}
    info!("HTTP server closed");
}

/// Serves one TCP connection until the client disconnects or shutdown
/// completes.
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Router,
    shutdown: CancellationToken,
) {
    let service = service_fn(move |request: Request<Incoming>| {
        let mut router = router.clone();
        async move {
            let response: Response<Body> = router.call(request.map(Body::new)).await?;
            Ok::<_, Infallible>(response)
        }
    });

    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
    let mut conn = std::pin::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(e) = result {
                debug!("connection {peer} ended with error: {e}");
            }
            return;
        }
        _ = shutdown.cancelled() => {
            // Finish the in-flight request, then close instead of keeping alive.
            conn.as_mut().graceful_shutdown();
        }
    }

    if let Err(e) = conn.await {
        debug!("connection {peer} ended with error during shutdown: {e}");
    }
}
