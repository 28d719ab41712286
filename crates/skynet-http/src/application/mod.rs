//! Application layer for skynet-http.
//!
//! The application layer decides *what* each HTTP request does: which pages
//! exist for a mode, how a download path maps onto the serving directory and
//! how an upload is written.  It never binds sockets or spawns tasks.
//!
//! # Responsibilities
//!
//! - Building the per-mode route table (`routes`)
//! - Rendering the listing, upload form, landing and success pages (`pages`)
//! - Confining every filesystem access to the serving root (`storage`)
//! - Mapping per-request failures to HTTP statuses (`errors`)
//!
//! # What does NOT belong here?
//!
//! - Opening the TCP listener or running the accept loop (infrastructure)
//! - The start/stop state machine (infrastructure)
//! - Port and directory validation rules (skynet-core)

pub mod errors;
pub mod pages;
pub mod routes;
pub mod storage;

// Re-export so the service manager can write `application::build_routes`.
pub use errors::RequestError;
pub use routes::{build_routes, ServeContext, FILE_FIELD};
pub use storage::{ListingEntry, Resolved, UploadTarget};
