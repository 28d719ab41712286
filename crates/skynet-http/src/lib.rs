//! skynet-http library crate.
//!
//! An embedded HTTP file service that can be started and stopped repeatedly
//! within one process.  Other devices on the LAN use it to download files
//! from, or upload files to, a directory on this machine.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! CLI / GUI entry point
//!         ↓ list_interfaces / start / stop
//! [skynet-http]
//!   ├── application/     Route table, pages, confined file access
//!   └── infrastructure/
//!         ├── interfaces/       OS interface enumeration (nix getifaddrs)
//!         └── service_manager/  Idle ⇄ Running state machine + accept loop
//!         ↓
//! [skynet-core]          Modes, settings, validation, interface filter
//! ```
//!
//! # Layer rules
//!
//! - `application` depends on `skynet-core` and `axum` only; it does no
//!   socket work.
//! - `infrastructure` owns the listener, the background accept task and the
//!   swap lock.
//!
//! ```no_run
//! use skynet_http::infrastructure::{list_interfaces, ServiceManager};
//! use skynet_core::{ServiceMode, ServiceSettings};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ServiceManager::new(ServiceSettings::default());
//! let candidates = list_interfaces()?;
//! let handle = manager
//!     .start(ServiceMode::Combined, candidates[0].ip.into(), 8080, "./shared".as_ref())
//!     .await?;
//! println!("serving at {}", handle.url());
//! manager.stop(&handle).await?;
//! # Ok(())
//! # }
//! ```

/// Application layer: routes, pages and confined storage.
pub mod application;

/// Infrastructure layer: interface enumeration and the service manager.
pub mod infrastructure;
