//! Declarative domain model for installable modules.
//!
//! # Responsibility
//! - Define the canonical descriptor shape shared by the registry, the
//!   visibility policy and the resolver.
//!
//! # Invariants
//! - Descriptors are immutable once admitted to the registry.

pub mod module;
