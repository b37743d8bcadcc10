//! Module registry and its derived export index.
//!
//! # Responsibility
//! - Own the authoritative module set and the exact-name export mapping
//!   derived from it.
//!
//! # Invariants
//! - Registration order drives export precedence; the index is rebuilt as a
//!   whole and published atomically by the service container.

pub mod export_index;
pub mod module_registry;
