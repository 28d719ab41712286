//! Service registry and lifecycle controller.
//!
//! [`ServiceManager`] is a two-state machine:
//!
//! ```text
//!            start() ok
//!   Idle ───────────────────▶ Running(handle)
//!    ▲                              │
//!    └──────────────────────────────┘
//!            stop(handle)
//! ```
//!
//! A single `tokio::sync::Mutex` (the swap lock) is held across the whole
//! build-bind-install sequence of `start` and the whole shutdown sequence of
//! `stop`.  Two concurrent starts therefore cannot both bind, and a start
//! cannot interleave with a stop still draining connections.
//!
//! A failed start leaves the registry exactly as it was.  Errors raised by
//! the accept loop after a successful start are logged by the background
//! task and never reach the caller.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use skynet_core::{validate_port, ServiceMode, ServiceSettings, ValidationError};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::build_routes;
use crate::infrastructure::http_server::serve;
use crate::infrastructure::interfaces::running_elevated;

/// Error type for start/stop operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The port or directory was rejected before any resource was touched.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The serving directory could not be created or resolved.
    #[error("serving directory {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TCP listener could not be opened.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// `start` was called while a server is running.
    #[error("a server is already running on {0}")]
    AlreadyRunning(SocketAddr),

    /// `stop` was called while idle.
    #[error("no server is running")]
    NotRunning,

    /// `stop` was called with a handle from an earlier run.
    #[error("handle {0} does not belong to the running server")]
    HandleMismatch(Uuid),
}

/// Identifies one successful start.  Cheap to clone; pass it back to
/// [`ServiceManager::stop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHandle {
    id: Uuid,
    local_addr: SocketAddr,
    mode: ServiceMode,
    dir: PathBuf,
}

impl ServerHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn mode(&self) -> ServiceMode {
        self.mode
    }

    /// Canonical serving directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `http://<ip>:<port>` for display or a QR code.
    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }
}

impl fmt::Display for ServerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} mode, serving {})",
            self.url(),
            self.mode,
            self.dir.display()
        )
    }
}

/// Registry entry for the running server.
struct ActiveServer {
    handle: ServerHandle,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

/// Starts and stops the embedded HTTP service.  At most one server runs at a
/// time.
pub struct ServiceManager {
    settings: ServiceSettings,
    active: Mutex<Option<ActiveServer>>,
}

impl ServiceManager {
    pub fn new(settings: ServiceSettings) -> Self {
        Self {
            settings,
            active: Mutex::new(None),
        }
    }

    /// Default settings, with privileged ports allowed only when the process
    /// runs elevated.
    pub fn with_defaults() -> Self {
        Self::new(ServiceSettings {
            allow_privileged_ports: running_elevated(),
            ..ServiceSettings::default()
        })
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Starts a server for `mode` on `ip:port` serving `dir`.
    ///
    /// `dir` is created (with parents) if missing.  The accept loop runs as a
    /// detached background task; this call returns as soon as the listener
    /// is bound.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Validation`] for a port outside [1, 65535] or a
    ///   privileged port without elevation.
    /// - [`ServiceError::AlreadyRunning`] if a server is active.
    /// - [`ServiceError::Filesystem`] if `dir` cannot be created.
    /// - [`ServiceError::Bind`] if the listener cannot be opened.
    pub async fn start(
        &self,
        mode: ServiceMode,
        ip: IpAddr,
        port: u32,
        dir: &Path,
    ) -> Result<ServerHandle, ServiceError> {
        let port = validate_port(port, self.settings.allow_privileged_ports)?;

        let mut active = self.active.lock().await;
        if let Some(current) = active.as_ref() {
            return Err(ServiceError::AlreadyRunning(current.handle.local_addr));
        }

        let root = prepare_directory(dir).await?;
        let router = build_routes(mode, root.clone(), &self.settings);

        let addr = SocketAddr::new(ip, port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServiceError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServiceError::Bind { addr, source })?;

        let handle = ServerHandle {
            id: Uuid::new_v4(),
            local_addr,
            mode,
            dir: root,
        };
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(serve(listener, router, shutdown.clone()));

        info!("HTTP server started: {handle}");
        *active = Some(ActiveServer {
            handle: handle.clone(),
            shutdown,
            task,
        });

        Ok(handle)
    }

    /// Stops the running server using the configured grace period.
    pub async fn stop(&self, handle: &ServerHandle) -> Result<(), ServiceError> {
        self.stop_with_grace(handle, self.settings.shutdown_grace)
            .await
    }

    /// Stops the running server, waiting up to `grace` for in-flight
    /// requests before aborting the remaining connections.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotRunning`] when idle, [`ServiceError::HandleMismatch`]
    /// when `handle` is not the active one (the active server keeps running).
    pub async fn stop_with_grace(
        &self,
        handle: &ServerHandle,
        grace: Duration,
    ) -> Result<(), ServiceError> {
        let mut active = self.active.lock().await;

        let ActiveServer {
            handle: current,
            shutdown,
            mut task,
        } = match active.take() {
            None => return Err(ServiceError::NotRunning),
            Some(server) if server.handle.id != handle.id => {
                *active = Some(server);
                return Err(ServiceError::HandleMismatch(handle.id));
            }
            Some(server) => server,
        };

        info!("stopping HTTP server on {}", current.local_addr);
        shutdown.cancel();

        match timeout(grace, &mut task).await {
            Ok(Ok(())) => debug!("server task finished within {grace:?}"),
            Ok(Err(e)) => warn!("server task ended abnormally: {e}"),
            Err(_) => {
                warn!("connections still open after {grace:?}; closing them");
                task.abort();
                // Cancelled is the expected outcome of the abort.
                let _ = task.await;
            }
        }

        Ok(())
    }

    /// The handle of the running server, if any.
    pub async fn active(&self) -> Option<ServerHandle> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|server| server.handle.clone())
    }

    pub async fn is_running(&self) -> bool {
        self.active.lock().await.is_some()
    }
}

impl Drop for ServiceManager {
    fn drop(&mut self) {
        if let Some(server) = self.active.get_mut().take() {
            debug!("manager dropped while running; cancelling {}", server.handle.local_addr);
            server.shutdown.cancel();
        }
    }
}

/// Creates `dir` if needed and returns its canonical form.
async fn prepare_directory(dir: &Path) -> Result<PathBuf, ServiceError> {
    let fs_err = |source: std::io::Error| ServiceError::Filesystem {
        path: dir.to_path_buf(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(fs_err)?;
    let root = tokio::fs::canonicalize(dir).await.map_err(fs_err)?;

    if !tokio::fs::metadata(&root).await.map_err(fs_err)?.is_dir() {
        return Err(ValidationError::NotADirectory(root).into());
    }
    Ok(root)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
