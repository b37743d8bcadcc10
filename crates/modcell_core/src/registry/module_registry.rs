//! Module registry: the authoritative set of installed modules.
//!
//! # Responsibility
//! - Admit validated modules under a unique identity and hand out stable
//!   snapshots for lookup and index builds.
//!
//! # Invariants
//! - Registration order is load-bearing: `all_in_order` is the precedence
//!   order for export conflicts and for index iteration.
//! - At most one biz module carries the master designation at any time.

use crate::model::module::{ModuleDescriptor, ModuleValidationError};
use crate::source::SymbolSource;
use log::info;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// One admitted module: immutable descriptor plus its private symbol source.
#[derive(Clone)]
pub struct RegisteredModule {
    descriptor: Arc<ModuleDescriptor>,
    source: Arc<dyn SymbolSource>,
}

impl RegisteredModule {
    /// Pairs a descriptor with its private symbol source.
    pub fn new(descriptor: ModuleDescriptor, source: Arc<dyn SymbolSource>) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            source,
        }
    }

    /// Stable identity key.
    pub fn identity(&self) -> &str {
        &self.descriptor.identity
    }

    /// Immutable descriptor view.
    pub fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    /// The module's private symbol source (its local tier).
    pub fn source(&self) -> &Arc<dyn SymbolSource> {
        &self.source
    }

    /// Returns whether this module is the designated master biz.
    pub fn is_master(&self) -> bool {
        self.descriptor.is_master()
    }
}

impl std::fmt::Debug for RegisteredModule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredModule")
            .field("identity", &self.identity())
            .finish_non_exhaustive()
    }
}

/// Registration and lookup errors.
#[derive(Debug)]
pub enum RegistryError {
    /// The descriptor failed declaration-level validation.
    Validation(ModuleValidationError),
    /// The identity is already registered.
    DuplicateIdentity(String),
    /// A master biz exists already; a second designation is rejected.
    MasterAlreadyConfigured { existing: String, rejected: String },
    /// No module is registered under the identity.
    UnknownIdentity(String),
    /// No biz module carries the master designation.
    NoMasterConfigured,
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid module descriptor: {err}"),
            Self::DuplicateIdentity(identity) => {
                write!(f, "module identity already registered: {identity}")
            }
            Self::MasterAlreadyConfigured { existing, rejected } => write!(
                f,
                "master biz already configured as `{existing}`; rejecting `{rejected}`"
            ),
            Self::UnknownIdentity(identity) => {
                write!(f, "module not registered: {identity}")
            }
            Self::NoMasterConfigured => write!(f, "no master biz configured"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Default)]
struct RegistryState {
    // Insertion order; the identity map is an index into this vector and is
    // rebuilt on removal.
    modules: Vec<RegisteredModule>,
    by_identity: HashMap<String, usize>,
}

impl RegistryState {
    fn reindex(&mut self) {
        self.by_identity = self
            .modules
            .iter()
            .enumerate()
            .map(|(index, module)| (module.identity().to_string(), index))
            .collect();
    }
}

/// Thread-safe registry of installed modules.
#[derive(Default)]
pub struct ModuleRegistry {
    state: RwLock<RegistryState>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits one module after descriptor validation.
    ///
    /// # Errors
    /// - `Validation` when the descriptor breaks declaration invariants.
    /// - `DuplicateIdentity` when the identity is taken.
    /// - `MasterAlreadyConfigured` when a second master biz is declared.
    pub fn register(
        &self,
        descriptor: ModuleDescriptor,
        source: Arc<dyn SymbolSource>,
    ) -> Result<(), RegistryError> {
        descriptor.validate().map_err(RegistryError::Validation)?;

        let mut state = self.state_mut();
        if state.by_identity.contains_key(descriptor.identity.as_str()) {
            return Err(RegistryError::DuplicateIdentity(descriptor.identity));
        }
        if descriptor.is_master() {
            if let Some(existing) = state.modules.iter().find(|module| module.is_master()) {
                return Err(RegistryError::MasterAlreadyConfigured {
                    existing: existing.identity().to_string(),
                    rejected: descriptor.identity,
                });
            }
        }

        let module = RegisteredModule::new(descriptor, source);
        info!(
            "event=module_registered module=registry identity={} kind={:?} master={}",
            module.identity(),
            module.descriptor().kind,
            module.is_master()
        );
        let position = state.modules.len();
        state
            .by_identity
            .insert(module.identity().to_string(), position);
        state.modules.push(module);
        Ok(())
    }

    /// Removes one module, preserving the relative order of the survivors.
    ///
    /// The caller owns purging derived state (export index, resolver) for the
    /// removed identity.
    pub fn unregister(&self, identity: &str) -> Result<RegisteredModule, RegistryError> {
        let mut state = self.state_mut();
        let index = match state.by_identity.get(identity) {
            Some(index) => *index,
            None => return Err(RegistryError::UnknownIdentity(identity.to_string())),
        };
        let removed = state.modules.remove(index);
        state.reindex();
        info!(
            "event=module_unregistered module=registry identity={}",
            removed.identity()
        );
        Ok(removed)
    }

    /// Returns the module registered under `identity`.
    pub fn get_by_identity(&self, identity: &str) -> Option<RegisteredModule> {
        let state = self.state();
        state
            .by_identity
            .get(identity)
            .map(|index| state.modules[*index].clone())
    }

    /// Returns the designated master biz.
    ///
    /// # Errors
    /// - `NoMasterConfigured` when no registered biz carries the designation.
    pub fn get_master(&self) -> Result<RegisteredModule, RegistryError> {
        self.state()
            .modules
            .iter()
            .find(|module| module.is_master())
            .cloned()
            .ok_or(RegistryError::NoMasterConfigured)
    }

    /// Returns every module in stable registration order.
    pub fn all_in_order(&self) -> Vec<RegisteredModule> {
        self.state().modules.clone()
    }

    pub fn len(&self) -> usize {
        self.state().modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().modules.is_empty()
    }

    fn state(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
