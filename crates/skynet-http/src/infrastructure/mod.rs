//! Infrastructure layer for skynet-http.
//!
//! The infrastructure layer handles all I/O: asking the OS for its network
//! interfaces, binding the listener, running the accept loop and driving the
//! Idle/Running state machine.
//!
//! # Responsibilities
//!
//! - Enumerating interfaces and checking process elevation (`interfaces`)
//! - Accepting connections and serving HTTP/1.1 on them (`http_server`)
//! - Start/stop with the swap lock and graceful shutdown (`service_manager`)
//!
//! # What does NOT belong here?
//!
//! - Route contents, pages or path confinement (application layer)
//! - Filter rules for interfaces and port validation (skynet-core)
//! - Command-line parsing (done in `main.rs`)

pub mod http_server;
pub mod interfaces;
pub mod service_manager;

// Re-export the public contract so entry points can write
// `infrastructure::{list_interfaces, ServiceManager}`.
pub use interfaces::{list_interfaces, running_elevated, InterfaceError};
pub use service_manager::{ServerHandle, ServiceError, ServiceManager};
