//! Service container: construction-time wiring and the resolve facade.
//!
//! # Responsibility
//! - Own the module registry, the published export index and one resolver per
//!   module; expose the external resolve entry points.
//! - Provide the process-wide holder for collaborators that cannot thread an
//!   explicit handle.
//!
//! # Invariants
//! - The container is an explicit value; the process holder is the only
//!   mutable global and is installed once and disposed at shutdown.
//! - Index rebuilds publish build-then-swap; readers never observe a
//!   partially built index.

use crate::config::ProcessConfig;
use crate::extension::loader::HookLoaderRegistry;
use crate::model::module::ModuleDescriptor;
use crate::registry::export_index::ExportIndex;
use crate::registry::module_registry::{ModuleRegistry, RegisteredModule, RegistryError};
use crate::resolver::module_resolver::{ModuleResolver, ResolveError, ResolverContext};
use crate::service::request::{Arity, ResolveOutcome, ResolveRequest, SymbolKind};
use crate::source::SymbolSource;
use log::info;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Fixed tier sources consumed from external collaborators.
pub struct CoreSources {
    /// Platform runtime symbols; a hit here always wins.
    pub platform: Arc<dyn SymbolSource>,
    /// Infrastructure symbols under the reserved namespaces.
    pub framework: Arc<dyn SymbolSource>,
    /// Runtime-instrumentation-injected symbols, consulted after local.
    pub agent: Arc<dyn SymbolSource>,
}

/// Facade-level errors.
#[derive(Debug)]
pub enum ServiceError {
    /// The requesting module is not registered.
    UnknownModule(String),
    Registry(RegistryError),
    Resolve(ResolveError),
    /// The process holder already carries a container.
    AlreadyInstalled,
    /// The process holder is empty.
    NotInstalled,
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownModule(identity) => {
                write!(f, "requesting module is not registered: {identity}")
            }
            Self::Registry(err) => write!(f, "{err}"),
            Self::Resolve(err) => write!(f, "{err}"),
            Self::AlreadyInstalled => {
                write!(f, "process container already installed")
            }
            Self::NotInstalled => write!(f, "process container not installed"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Registry(err) => Some(err),
            Self::Resolve(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistryError> for ServiceError {
    fn from(err: RegistryError) -> Self {
        Self::Registry(err)
    }
}

impl From<ResolveError> for ServiceError {
    fn from(err: ResolveError) -> Self {
        Self::Resolve(err)
    }
}

/// Process-wide service container.
pub struct CoreContainer {
    registry: Arc<ModuleRegistry>,
    context: Arc<ResolverContext>,
    resolvers: RwLock<HashMap<String, Arc<ModuleResolver>>>,
}

impl std::fmt::Debug for CoreContainer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreContainer").finish_non_exhaustive()
    }
}

impl CoreContainer {
    /// Wires the container from externally supplied collaborators.
    pub fn new(
        sources: CoreSources,
        hook_loader: Arc<HookLoaderRegistry>,
        config: Arc<ProcessConfig>,
    ) -> Self {
        let registry = Arc::new(ModuleRegistry::new());
        let context = Arc::new(ResolverContext::new(
            sources.platform,
            sources.framework,
            sources.agent,
            Arc::clone(&registry),
            hook_loader,
            config,
        ));
        Self {
            registry,
            context,
            resolvers: RwLock::new(HashMap::new()),
        }
    }

    /// The authoritative module registry.
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// The process configuration the container was wired with.
    pub fn config(&self) -> &Arc<ProcessConfig> {
        self.context.config()
    }

    /// Admits one module.
    ///
    /// Does not rebuild the export index: the external loader batches
    /// registrations and calls `rebuild_export_index` once afterwards.
    pub fn register_module(
        &self,
        descriptor: ModuleDescriptor,
        source: Arc<dyn SymbolSource>,
    ) -> Result<(), RegistryError> {
        self.registry.register(descriptor, source)
    }

    /// Removes one module and purges its derived state.
    ///
    /// The export index is rebuilt immediately so the removed module's
    /// exports disappear from lookup.
    pub fn unregister_module(&self, identity: &str) -> Result<(), RegistryError> {
        self.registry.unregister(identity)?;
        self.resolvers_mut().remove(identity);
        self.rebuild_export_index();
        Ok(())
    }

    /// Rebuilds the export index from the current registry and publishes it
    /// in one step. Idempotent; safe after any registry mutation.
    pub fn rebuild_export_index(&self) {
        let modules = self.registry.all_in_order();
        let index = ExportIndex::build(&modules);
        info!(
            "event=export_index_published module=service classes={} resources={}",
            index.class_count(),
            index.resource_count()
        );
        self.context.publish_index(index);
    }

    /// Returns the designated master biz.
    pub fn get_master(&self) -> Result<RegisteredModule, RegistryError> {
        self.registry.get_master()
    }

    /// Returns the resolver serving one module, creating it on first use.
    pub fn resolver_for(&self, identity: &str) -> Result<Arc<ModuleResolver>, ServiceError> {
        if let Some(resolver) = self.resolvers().get(identity) {
            return Ok(Arc::clone(resolver));
        }
        let module = self
            .registry
            .get_by_identity(identity)
            .ok_or_else(|| ServiceError::UnknownModule(identity.to_string()))?;
        let mut resolvers = self.resolvers_mut();
        let resolver = resolvers
            .entry(identity.to_string())
            .or_insert_with(|| Arc::new(ModuleResolver::new(module, Arc::clone(&self.context))));
        Ok(Arc::clone(resolver))
    }

    /// Resolves one request on behalf of a registered module.
    ///
    /// # Errors
    /// - `UnknownModule` when the requesting identity is not registered.
    /// - `Resolve` for lookup faults, including `ResourceNotFound` for a
    ///   singular resource miss (an empty all-matches list is a legal
    ///   outcome, not a fault).
    pub fn resolve(&self, request: &ResolveRequest) -> Result<ResolveOutcome, ServiceError> {
        let resolver = self.resolver_for(&request.requesting_module)?;
        match request.kind {
            // A class name has one owner; `Arity::All` adds nothing.
            SymbolKind::Class => {
                let resolution = resolver.load_class(&request.name, request.link)?;
                Ok(ResolveOutcome::Class(resolution))
            }
            SymbolKind::Resource => match request.arity {
                Arity::Single => match resolver.find_resource(&request.name)? {
                    Some(hit) => Ok(ResolveOutcome::Resource(hit)),
                    None => Err(ServiceError::Resolve(ResolveError::ResourceNotFound {
                        module: request.requesting_module.clone(),
                        name: request.name.clone(),
                    })),
                },
                Arity::All => {
                    let hits = resolver.find_resources(&request.name)?;
                    Ok(ResolveOutcome::Resources(hits))
                }
            },
        }
    }

    fn resolvers(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<ModuleResolver>>> {
        self.resolvers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn resolvers_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<ModuleResolver>>> {
        self.resolvers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

static PROCESS_CONTAINER: RwLock<Option<Arc<CoreContainer>>> = RwLock::new(None);

/// Installs the process-wide container. Rejected when one is present.
pub fn install_process_container(container: Arc<CoreContainer>) -> Result<(), ServiceError> {
    let mut slot = process_slot_mut();
    if slot.is_some() {
        return Err(ServiceError::AlreadyInstalled);
    }
    info!("event=container_installed module=service");
    *slot = Some(container);
    Ok(())
}

/// Returns the installed process-wide container.
pub fn process_container() -> Result<Arc<CoreContainer>, ServiceError> {
    process_slot()
        .as_ref()
        .cloned()
        .ok_or(ServiceError::NotInstalled)
}

/// Clears the process-wide holder at shutdown.
///
/// Returns whether a container was installed. Idempotent.
pub fn dispose_process_container() -> bool {
    let disposed = process_slot_mut().take().is_some();
    if disposed {
        info!("event=container_disposed module=service");
    }
    disposed
}

fn process_slot() -> RwLockReadGuard<'static, Option<Arc<CoreContainer>>> {
    PROCESS_CONTAINER
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn process_slot_mut() -> RwLockWriteGuard<'static, Option<Arc<CoreContainer>>> {
    PROCESS_CONTAINER
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
