//! Service container and resolve facade.
//!
//! # Responsibility
//! - Wire registry, export index, visibility policy and per-module resolvers
//!   into the entry points external collaborators call.
//! - Keep bootstrap layers decoupled from resolver internals.

pub mod container;
pub mod request;
