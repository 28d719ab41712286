//! Route table construction.
//!
//! [`build_routes`] turns a [`ServiceMode`] and a serving directory into an
//! [`axum::Router`].  The router is built fresh on every start, so nothing
//! from a previous run (mode, directory, policy) leaks into the next one.
//!
//! | Mode     | Routes                                                               |
//! |----------|----------------------------------------------------------------------|
//! | Download | `GET /`, `GET /download/*path`                                       |
//! | Upload   | `GET /`, `POST /`                                                    |
//! | Combined | `GET /`, `GET+POST /upload-service`, `GET /download-service`, `GET /download/*path` |

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, HeaderValue};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use skynet_core::{CollisionPolicy, ServiceMode, ServiceSettings};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use super::errors::RequestError;
use super::pages;
use super::storage::{list_directory, resolve_download, sanitize_upload_name, Resolved, UploadTarget};

/// Name of the multipart field carrying the uploaded file.
pub const FILE_FIELD: &str = "file";

/// Per-router state shared by every handler.
#[derive(Debug)]
pub struct ServeContext {
    pub mode: ServiceMode,
    /// Canonical serving directory.
    pub root: PathBuf,
    pub collision: CollisionPolicy,
}

/// Builds the route table for `mode` serving `root`.
///
/// `root` should already be canonical; download confinement compares
/// canonical paths against it.
pub fn build_routes(mode: ServiceMode, root: PathBuf, settings: &ServiceSettings) -> Router {
    let ctx = Arc::new(ServeContext {
        mode,
        root,
        collision: settings.collision,
    });

    // Combined mode owns `/` for the landing page and moves each service
    // under its own prefix.
    let mut router = Router::new();
    if mode == ServiceMode::Combined {
        router = router.route("/", get(landing));
    }
    if mode.serves_downloads() {
        router = router
            .route(pages::listing_path(mode), get(listing_root))
            .route("/download/*path", get(download));
    }
    if mode.accepts_uploads() {
        router = router.route(pages::upload_path(mode), get(upload_form).post(upload));
    }

    router
        .layer(DefaultBodyLimit::max(settings.max_upload_bytes))
        .with_state(ctx)
}

async fn landing() -> Html<String> {
    Html(pages::landing_page())
}

async fn upload_form(State(ctx): State<Arc<ServeContext>>) -> Html<String> {
    Html(pages::upload_form(ctx.mode))
}

async fn listing_root(State(ctx): State<Arc<ServeContext>>) -> Result<Html<String>, RequestError> {
    let entries = list_directory(&ctx.root).await?;
    Ok(Html(pages::listing_page(ctx.mode, "", &entries)))
}

async fn download(
    State(ctx): State<Arc<ServeContext>>,
    Path(requested): Path<String>,
) -> Result<Response, RequestError> {
    match resolve_download(&ctx.root, &requested).await? {
        Resolved::File { path, .. } => {
            let file = File::open(&path).await.map_err(RequestError::Storage)?;
            // Length of the file actually being streamed, which may differ
            // from what resolution saw if it was replaced in between.
            let len = file.metadata().await.map_err(RequestError::Storage)?.len();
            debug!("serving {} ({len} bytes)", path.display());
            let headers = [
                (
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/octet-stream"),
                ),
                (header::CONTENT_LENGTH, HeaderValue::from(len)),
            ];
            Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
        }
        Resolved::Directory { path, relative } => {
            let entries = list_directory(&path).await?;
            Ok(Html(pages::listing_page(ctx.mode, &relative, &entries)).into_response())
        }
    }
}

/// Stores the first `file` field of the form and answers with the success
/// notice.  Other fields are skipped.
async fn upload(
    State(ctx): State<Arc<ServeContext>>,
    mut multipart: Multipart,
) -> Result<Html<String>, RequestError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let submitted = field
            .file_name()
            .ok_or(RequestError::MissingFileName)?
            .to_string();
        let name = sanitize_upload_name(&submitted)?;
        let mut target = UploadTarget::create(&ctx.root, &name, ctx.collision).await?;
        debug!("receiving '{submitted}' as '{}'", target.stored_name());

        let mut written: u64 = 0;
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    if let Err(e) = target.write(&chunk).await {
                        target.discard().await;
                        return Err(e);
                    }
                    written += chunk.len() as u64;
                }
                Ok(None) => break,
                Err(e) => {
                    target.discard().await;
                    return Err(e.into());
                }
            }
        }

        let stored = target.finish().await?;
        info!("stored upload '{stored}' ({written} bytes)");
        return Ok(Html(pages::upload_success(
            &stored,
            pages::upload_path(ctx.mode),
        )));
    }

    Err(RequestError::MissingField(FILE_FIELD))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
