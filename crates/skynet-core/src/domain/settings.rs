//! Service settings: the knobs shared by the route builder and the lifecycle
//! controller.
//!
//! Like every configuration type in this workspace, [`ServiceSettings`] is a
//! plain struct with a [`Default`] impl.  Entry points populate it from CLI
//! arguments or GUI fields; the library never reads the environment itself.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Port used when the caller does not choose one.
pub const DEFAULT_PORT: u16 = 8080;

/// Multipart body cap applied to uploads (100 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 << 20;

/// How long `stop` waits for in-flight requests before aborting them.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// What an upload does when the target filename already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Replace the existing file.
    Overwrite,
    /// Refuse the upload with HTTP 409.
    Reject,
    /// Store under the first free `name (N).ext`.
    #[default]
    Rename,
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CollisionPolicy::Overwrite => "overwrite",
            CollisionPolicy::Reject => "reject",
            CollisionPolicy::Rename => "rename",
        };
        f.write_str(label)
    }
}

/// Returned when a string does not name a [`CollisionPolicy`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown collision policy '{0}' (expected overwrite, reject or rename)")]
pub struct ParseCollisionPolicyError(pub String);

impl FromStr for CollisionPolicy {
    type Err = ParseCollisionPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(CollisionPolicy::Overwrite),
            "reject" => Ok(CollisionPolicy::Reject),
            "rename" => Ok(CollisionPolicy::Rename),
            _ => Err(ParseCollisionPolicyError(s.to_string())),
        }
    }
}

/// Per-manager tunables.
///
/// # Example
///
/// ```rust
/// use skynet_core::{CollisionPolicy, ServiceSettings};
///
/// let settings = ServiceSettings::default();
/// assert_eq!(settings.max_upload_bytes, 100 * 1024 * 1024);
/// assert_eq!(settings.collision, CollisionPolicy::Rename);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Upper bound on a multipart request body, in bytes.
    pub max_upload_bytes: usize,

    /// Bounded grace period for graceful shutdown.  Connections still open
    /// when it expires are aborted.
    pub shutdown_grace: Duration,

    /// Filename collision behaviour for uploads.
    pub collision: CollisionPolicy,

    /// Whether ports below 1024 may be requested.  The infrastructure layer
    /// sets this from the effective user id; the pure default is `false`.
    pub allow_privileged_ports: bool,
}

impl Default for ServiceSettings {
    /// | Field                    | Default  |
    /// |--------------------------|----------|
    /// | max_upload_bytes         | 100 MiB  |
    /// | shutdown_grace           | 5 s      |
    /// | collision                | Rename   |
    /// | allow_privileged_ports   | false    |
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            collision: CollisionPolicy::default(),
            allow_privileged_ports: false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
