//! Hook loader registry: factory table keyed by isolation space.
//!
//! # Responsibility
//! - Hold the hook factories installed at startup by the external loader and
//!   build hook instances on demand.
//!
//! # Invariants
//! - An isolation space registers at most one factory.
//! - An unknown space is a clean "no hook" outcome, not an error; a factory
//!   that fails to build is an error the binding layer decides how to treat.

use crate::extension::hook::ResolutionHook;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Capability value building one hook instance for an isolation space.
pub type HookFactory = Arc<dyn Fn() -> Result<Arc<dyn ResolutionHook>, String> + Send + Sync>;

/// Failure while locating or building a hook for an isolation space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookResolutionError {
    /// Isolation space the attempt was scoped to.
    pub isolation_space: String,
    /// Factory-supplied failure description.
    pub message: String,
}

impl Display for HookResolutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to build hook for isolation space `{}`: {}",
            self.isolation_space, self.message
        )
    }
}

impl Error for HookResolutionError {}

/// Registration errors for the factory table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookLoaderError {
    /// The isolation space already holds a factory.
    DuplicateIsolationSpace(String),
}

impl Display for HookLoaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateIsolationSpace(space) => {
                write!(f, "hook factory already registered for isolation space: {space}")
            }
        }
    }
}

impl Error for HookLoaderError {}

/// Registered-factory lookup table for per-space resolution hooks.
#[derive(Default)]
pub struct HookLoaderRegistry {
    factories: RwLock<HashMap<String, HookFactory>>,
}

impl HookLoaderRegistry {
    /// Creates an empty factory table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs one factory for an isolation space.
    ///
    /// # Errors
    /// - `DuplicateIsolationSpace` when the space already holds a factory.
    pub fn register_factory(
        &self,
        isolation_space: impl Into<String>,
        factory: HookFactory,
    ) -> Result<(), HookLoaderError> {
        let isolation_space = isolation_space.into();
        let mut factories = self.factories_mut();
        if factories.contains_key(isolation_space.as_str()) {
            return Err(HookLoaderError::DuplicateIsolationSpace(isolation_space));
        }
        factories.insert(isolation_space, factory);
        Ok(())
    }

    /// Builds the hook scoped to an isolation space.
    ///
    /// Returns `Ok(None)` when the space holds no factory.
    ///
    /// # Errors
    /// - `HookResolutionError` when the factory itself fails to build.
    pub fn load(
        &self,
        isolation_space: &str,
    ) -> Result<Option<Arc<dyn ResolutionHook>>, HookResolutionError> {
        let factory = match self.factories().get(isolation_space) {
            Some(factory) => Arc::clone(factory),
            None => return Ok(None),
        };
        (*factory)().map(Some).map_err(|message| HookResolutionError {
            isolation_space: isolation_space.to_string(),
            message,
        })
    }

    fn factories(&self) -> RwLockReadGuard<'_, HashMap<String, HookFactory>> {
        self.factories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn factories_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, HookFactory>> {
        self.factories
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
