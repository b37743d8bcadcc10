//! Per-module ordered symbol search.
//!
//! # Responsibility
//! - Run each lookup over the fixed tier sequence, short-circuiting on the
//!   first hit, consulting visibility policy before the export tier and the
//!   module's hook at the designated points.
//!
//! # Invariants
//! - Tier order is fixed: reject, resolved cache, platform, framework,
//!   pre-hook, exports, local, agent, post-hook.
//! - A clean miss falls through; a hook fault propagates immediately and
//!   never falls through.
//! - Once a name is resolved for a module it stays resolved to the identical
//!   artifact, regardless of later index rebuilds.

pub mod module_resolver;
