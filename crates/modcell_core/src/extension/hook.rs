//! Resolution hook contract.
//!
//! Hooks intercept the per-module search at defined points: once before the
//! export tier and once after every standard tier has missed, for classes and
//! resources alike. Every interception point is optional; the defaults
//! decline, and a declined call is indistinguishable from an absent
//! implementation.

use crate::model::module::ModuleDescriptor;
use crate::source::{ClassArtifact, ResourceArtifact};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Fault raised by a hook implementation during an interception call.
///
/// Unlike failures while *locating* a hook (swallowed by the binding layer),
/// invocation faults always propagate to the caller: a hook that breaks
/// mid-call signals broken extension code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookError {
    /// Human-readable fault description supplied by the hook.
    pub message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for HookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "hook fault: {}", self.message)
    }
}

impl Error for HookError {}

/// Lookup context handed to every interception call.
pub struct HookContext<'a> {
    /// Identity of the requesting module.
    pub identity: &'a str,
    /// Descriptor of the requesting module.
    pub descriptor: &'a ModuleDescriptor,
}

/// Per-module search interceptor.
///
/// Returning `Ok(None)` (or an empty list from the plural variants) declines
/// the interception and lets the standard search continue.
pub trait ResolutionHook: Send + Sync {
    /// Called before the export tier of a class lookup.
    fn pre_find_class(
        &self,
        _name: &str,
        _ctx: &HookContext<'_>,
    ) -> Result<Option<Arc<ClassArtifact>>, HookError> {
        Ok(None)
    }

    /// Called after every standard tier of a class lookup has missed.
    fn post_find_class(
        &self,
        _name: &str,
        _ctx: &HookContext<'_>,
    ) -> Result<Option<Arc<ClassArtifact>>, HookError> {
        Ok(None)
    }

    /// Called before the export tier of a singular resource lookup.
    fn pre_find_resource(
        &self,
        _name: &str,
        _ctx: &HookContext<'_>,
    ) -> Result<Option<Arc<ResourceArtifact>>, HookError> {
        Ok(None)
    }

    /// Called after every standard tier of a singular resource lookup missed.
    fn post_find_resource(
        &self,
        _name: &str,
        _ctx: &HookContext<'_>,
    ) -> Result<Option<Arc<ResourceArtifact>>, HookError> {
        Ok(None)
    }

    /// Plural variant of `pre_find_resource`; contributes to the accumulated
    /// result list of an all-matches lookup.
    fn pre_find_resources(
        &self,
        _name: &str,
        _ctx: &HookContext<'_>,
    ) -> Result<Vec<Arc<ResourceArtifact>>, HookError> {
        Ok(Vec::new())
    }

    /// Plural variant of `post_find_resource`.
    fn post_find_resources(
        &self,
        _name: &str,
        _ctx: &HookContext<'_>,
    ) -> Result<Vec<Arc<ResourceArtifact>>, HookError> {
        Ok(Vec::new())
    }

    /// Human-readable label for diagnostics.
    fn describe(&self) -> &str;
}

impl std::fmt::Debug for dyn ResolutionHook {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionHook")
            .field("describe", &self.describe())
            .finish()
    }
}
