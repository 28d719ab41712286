//! # skynet-core
//!
//! Shared domain library for the Skynet file-transfer service.
//!
//! This crate holds the pieces of the service that are pure data and pure
//! rules: which routes a [`ServiceMode`] installs, what a bind candidate
//! ([`NetworkInterface`]) looks like, which ports and directories are
//! acceptable, and how uploads behave when a filename is already taken.
//! It has zero dependencies on sockets, async runtimes or HTTP frameworks.
//!
//! # Architecture overview (for beginners)
//!
//! Skynet starts a small HTTP server on a chosen network interface so that
//! other devices on the LAN can download files from, or upload files to, a
//! directory on this machine.  The server can be stopped and restarted many
//! times during one process lifetime (from a CLI or a GUI button).
//!
//! This crate (`skynet-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – Service modes, interface records and the virtual
//!   interface filter, settings and the validation rules applied before any
//!   network resource is touched.
//!
//! - **`env`** – A small lookup table that maps portable environment variable
//!   names (`HOME`, `PWD`, ...) to their platform-specific spelling.  Only
//!   entry points consult it; the service manager never does.
//!
//! The `skynet-http` crate builds on top of this one and owns all I/O.

pub mod domain;
pub mod env;

// Re-export the most-used types at the crate root so callers can write
// `skynet_core::ServiceMode` instead of `skynet_core::domain::mode::ServiceMode`.
pub use domain::interface::{
    is_virtual_interface, select_candidates, InterfaceRecord, NetworkInterface, WILDCARD_NAME,
};
pub use domain::mode::{ParseModeError, ServiceMode};
pub use domain::settings::{
    CollisionPolicy, ParseCollisionPolicyError, ServiceSettings, DEFAULT_MAX_UPLOAD_BYTES,
    DEFAULT_PORT, DEFAULT_SHUTDOWN_GRACE,
};
pub use domain::validation::{
    validate_existing_directory, validate_port, ValidationError, PRIVILEGED_PORT_CEILING,
};
