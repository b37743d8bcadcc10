//! Core of modcell: in-process module multiplexing and symbol resolution.
//! This crate is the single source of truth for resolution order and
//! visibility invariants.

pub mod config;
pub mod extension;
pub mod logging;
pub mod model;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod source;
pub mod visibility;

pub use config::{ProcessConfig, DELEGATE_MASTER_HOOK_KEY};
pub use extension::binding::{HookBinding, HookBindingDeps};
pub use extension::hook::{HookContext, HookError, ResolutionHook};
pub use extension::loader::{HookFactory, HookLoaderError, HookLoaderRegistry, HookResolutionError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::module::{ModuleDescriptor, ModuleKind, ModuleValidationError};
pub use registry::export_index::{ExportIndex, ExportedClass, ExportedResource};
pub use registry::module_registry::{ModuleRegistry, RegisteredModule, RegistryError};
pub use resolver::module_resolver::{
    ClassResolution, ModuleResolver, ResolveError, ResolvedFrom, ResolverContext, ResourceHit,
};
pub use service::container::{
    dispose_process_container, install_process_container, process_container, CoreContainer,
    CoreSources, ServiceError,
};
pub use service::request::{Arity, ResolveOutcome, ResolveRequest, SymbolKind};
pub use source::{ClassArtifact, MapSymbolSource, ResourceArtifact, SymbolSource};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
