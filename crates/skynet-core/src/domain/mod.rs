//! Domain entities for the Skynet file-transfer service.
//!
//! This module contains pure business rules with no infrastructure
//! dependencies.  Nothing in here opens a socket, reads a directory or spawns
//! a task, so every type can be unit-tested in isolation on any platform.
//!
//! # What lives here?
//!
//! - [`mode`] – the three service modes and their textual forms.
//! - [`interface`] – bind-candidate records and the virtual-interface filter.
//! - [`settings`] – per-manager tunables (upload cap, grace period, collision
//!   policy).
//! - [`validation`] – port and directory checks performed before binding.

/// Download / Upload / Combined service selection.
pub mod mode;

/// Network interface records used as bind candidates.
pub mod interface;

/// Tunables shared by the route builder and the lifecycle controller.
pub mod settings;

/// Pre-bind validation rules.
pub mod validation;
