//! Resolver implementation: shared lookup context and the per-module search.

use crate::config::ProcessConfig;
use crate::extension::binding::{HookBinding, HookBindingDeps};
use crate::extension::hook::{HookContext, HookError, ResolutionHook};
use crate::extension::loader::HookLoaderRegistry;
use crate::registry::export_index::ExportIndex;
use crate::registry::module_registry::{ModuleRegistry, RegisteredModule};
use crate::source::{ClassArtifact, ResourceArtifact, SymbolSource};
use crate::visibility;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Class-name prefixes generated by the platform's reflection machinery.
///
/// These classes are supplied exclusively by the platform's own internal
/// loader; a lookup through a module resolver is rejected outright.
const REFLECTION_ACCESSOR_PREFIXES: &[&str] = &[
    "sun.reflect.GeneratedMethodAccessor",
    "sun.reflect.GeneratedConstructorAccessor",
    "sun.reflect.GeneratedSerializationConstructorAccessor",
];

/// Reserved namespaces served by the framework tier, non-overridable.
const FRAMEWORK_NAMESPACE_PREFIXES: &[&str] = &["io.modcell.spi", "io.modcell.api"];

/// Returns whether a class name belongs to the reflection-accessor denylist.
pub fn is_reflection_accessor(class_name: &str) -> bool {
    REFLECTION_ACCESSOR_PREFIXES
        .iter()
        .any(|prefix| class_name.starts_with(prefix))
}

/// Returns whether a class name falls under a reserved framework namespace.
pub fn is_framework_namespace(class_name: &str) -> bool {
    FRAMEWORK_NAMESPACE_PREFIXES
        .iter()
        .any(|prefix| class_name.starts_with(prefix))
}

/// Tier that satisfied a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedFrom {
    Platform,
    Framework,
    PreHook,
    /// Export tier; carries the exporting module's identity.
    Export(String),
    Local,
    Agent,
    PostHook,
}

impl ResolvedFrom {
    /// Identity of the owning module, when the owner is a module.
    pub fn owner_identity(&self) -> Option<&str> {
        match self {
            Self::Export(owner) => Some(owner),
            _ => None,
        }
    }
}

/// Outcome of a class lookup: the artifact plus its owning tier.
#[derive(Debug, Clone)]
pub struct ClassResolution {
    pub origin: ResolvedFrom,
    pub artifact: Arc<ClassArtifact>,
}

/// Outcome of a resource lookup: the artifact plus its owning tier.
#[derive(Debug, Clone)]
pub struct ResourceHit {
    pub origin: ResolvedFrom,
    pub artifact: Arc<ResourceArtifact>,
}

/// Lookup faults surfaced to callers.
#[derive(Debug)]
pub enum ResolveError {
    /// Tier-0 reject: reflection-accessor names are never resolvable here.
    ForbiddenClass { module: String, name: String },
    /// Every tier missed a class lookup.
    ClassNotFound { module: String, name: String },
    /// Every tier missed a singular resource lookup (facade-level fault).
    ResourceNotFound { module: String, name: String },
    /// A hook implementation faulted mid-call; always propagated.
    HookInvocation {
        module: String,
        phase: &'static str,
        name: String,
        fault: HookError,
    },
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ForbiddenClass { module, name } => write!(
                f,
                "module `{module}` can not load class `{name}`: reflection accessor classes \
                 are supplied by the platform loader only"
            ),
            Self::ClassNotFound { module, name } => {
                write!(f, "module `{module}` can not find class `{name}`")
            }
            Self::ResourceNotFound { module, name } => {
                write!(f, "module `{module}` can not find resource `{name}`")
            }
            Self::HookInvocation {
                module,
                phase,
                name,
                fault,
            } => write!(
                f,
                "hook {phase} for `{name}` in module `{module}` failed: {fault}"
            ),
        }
    }
}

impl Error for ResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::HookInvocation { fault, .. } => Some(fault),
            _ => None,
        }
    }
}

/// Shared lookup collaborators: fixed tier sources, registry, hook factory
/// table, configuration and the published export index snapshot.
pub struct ResolverContext {
    platform: Arc<dyn SymbolSource>,
    framework: Arc<dyn SymbolSource>,
    agent: Arc<dyn SymbolSource>,
    registry: Arc<ModuleRegistry>,
    hook_loader: Arc<HookLoaderRegistry>,
    config: Arc<ProcessConfig>,
    index: RwLock<Arc<ExportIndex>>,
}

impl ResolverContext {
    /// Wires the fixed collaborators; the index starts empty until the first
    /// publish.
    pub fn new(
        platform: Arc<dyn SymbolSource>,
        framework: Arc<dyn SymbolSource>,
        agent: Arc<dyn SymbolSource>,
        registry: Arc<ModuleRegistry>,
        hook_loader: Arc<HookLoaderRegistry>,
        config: Arc<ProcessConfig>,
    ) -> Self {
        Self {
            platform,
            framework,
            agent,
            registry,
            hook_loader,
            config,
            index: RwLock::new(Arc::new(ExportIndex::default())),
        }
    }

    /// Publishes a freshly built index in one step.
    ///
    /// Readers resolve against whichever snapshot was current when their
    /// lookup started; nobody observes a partially built index.
    pub fn publish_index(&self, index: ExportIndex) {
        *self.index_slot_mut() = Arc::new(index);
    }

    /// Returns the currently published index snapshot.
    pub fn current_index(&self) -> Arc<ExportIndex> {
        Arc::clone(&self.index_slot())
    }

    /// The registry this context resolves against.
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// The process configuration this context consults.
    pub fn config(&self) -> &Arc<ProcessConfig> {
        &self.config
    }

    /// The hook factory table this context loads hooks from.
    pub fn hook_loader(&self) -> &Arc<HookLoaderRegistry> {
        &self.hook_loader
    }

    fn index_slot(&self) -> RwLockReadGuard<'_, Arc<ExportIndex>> {
        self.index.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn index_slot_mut(&self) -> RwLockWriteGuard<'_, Arc<ExportIndex>> {
        self.index.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

type ClassTier = fn(&ModuleResolver, &str) -> Result<Option<ClassResolution>, ResolveError>;
type ResourceTier = fn(&ModuleResolver, &str) -> Result<Option<ResourceHit>, ResolveError>;

/// Fixed class search order below the resolved cache. Keeping the tiers as a
/// uniform strategy chain keeps insertion and removal testable in isolation.
const CLASS_SEARCH_CHAIN: &[ClassTier] = &[
    ModuleResolver::class_from_platform,
    ModuleResolver::class_from_framework,
    ModuleResolver::class_from_pre_hook,
    ModuleResolver::class_from_exports,
    ModuleResolver::class_from_local,
    ModuleResolver::class_from_agent,
    ModuleResolver::class_from_post_hook,
];

/// Fixed singular resource search order. Resources skip the reject tier and
/// the resolved cache; both are class-name concepts.
const RESOURCE_SEARCH_CHAIN: &[ResourceTier] = &[
    ModuleResolver::resource_from_platform,
    ModuleResolver::resource_from_framework,
    ModuleResolver::resource_from_pre_hook,
    ModuleResolver::resource_from_exports,
    ModuleResolver::resource_from_local,
    ModuleResolver::resource_from_agent,
    ModuleResolver::resource_from_post_hook,
];

/// The per-module lookup engine.
///
/// Holds the module's resolved-class cache and its one-shot hook binding;
/// everything else is shared through the context. Lookups carry no state
/// between calls beyond those two caches.
pub struct ModuleResolver {
    module: RegisteredModule,
    context: Arc<ResolverContext>,
    resolved: RwLock<HashMap<String, ClassResolution>>,
    hook: HookBinding,
}

impl ModuleResolver {
    /// Creates the resolver for one requesting module.
    pub fn new(module: RegisteredModule, context: Arc<ResolverContext>) -> Self {
        Self {
            module,
            context,
            resolved: RwLock::new(HashMap::new()),
            hook: HookBinding::new(),
        }
    }

    /// The requesting module this resolver serves.
    pub fn module(&self) -> &RegisteredModule {
        &self.module
    }

    /// Resolves a class name over the full tier sequence.
    ///
    /// With `link` set, the returned artifact's link latch fires; linking is
    /// idempotent per artifact.
    ///
    /// # Errors
    /// - `ForbiddenClass` for reflection-accessor names, before any tier runs.
    /// - `HookInvocation` when the module's hook faults mid-call.
    /// - `ClassNotFound` when every tier misses.
    pub fn load_class(&self, name: &str, link: bool) -> Result<ClassResolution, ResolveError> {
        if is_reflection_accessor(name) {
            return Err(ResolveError::ForbiddenClass {
                module: self.module.identity().to_string(),
                name: name.to_string(),
            });
        }

        if let Some(resolution) = self.cached(name) {
            if link {
                resolution.artifact.link();
            }
            return Ok(resolution);
        }

        for tier in CLASS_SEARCH_CHAIN {
            if let Some(candidate) = tier(self, name)? {
                let resolution = self.remember(name, candidate);
                if link {
                    resolution.artifact.link();
                }
                return Ok(resolution);
            }
        }

        Err(ResolveError::ClassNotFound {
            module: self.module.identity().to_string(),
            name: name.to_string(),
        })
    }

    /// Resolves the first resource with the given name.
    ///
    /// A clean miss returns `Ok(None)`; only hook faults are errors here.
    pub fn find_resource(&self, name: &str) -> Result<Option<ResourceHit>, ResolveError> {
        for tier in RESOURCE_SEARCH_CHAIN {
            if let Some(hit) = tier(self, name)? {
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }

    /// Accumulates every resource with the given name across all tiers.
    ///
    /// Never short-circuits on a hit: callers legitimately want every visible
    /// match, in tier order, with export-tier entries in registration order.
    pub fn find_resources(&self, name: &str) -> Result<Vec<ResourceHit>, ResolveError> {
        let mut hits = Vec::new();

        collect(&mut hits, ResolvedFrom::Platform, self.context.platform.find_resources(name));
        collect(&mut hits, ResolvedFrom::Framework, self.context.framework.find_resources(name));

        if let Some(hook) = self.hook() {
            let found = hook
                .pre_find_resources(name, &self.hook_ctx())
                .map_err(|fault| self.hook_fault("pre_find_resources", name, fault))?;
            collect(&mut hits, ResolvedFrom::PreHook, found);
        }

        if self.may_search_exported_resource(name) {
            let index = self.context.current_index();
            for entry in index.find_export_resource_sources(name) {
                collect(
                    &mut hits,
                    ResolvedFrom::Export(entry.owner.clone()),
                    entry.source.find_resources(name),
                );
            }
        }

        collect(&mut hits, ResolvedFrom::Local, self.module.source().find_resources(name));
        collect(&mut hits, ResolvedFrom::Agent, self.context.agent.find_resources(name));

        if let Some(hook) = self.hook() {
            let found = hook
                .post_find_resources(name, &self.hook_ctx())
                .map_err(|fault| self.hook_fault("post_find_resources", name, fault))?;
            collect(&mut hits, ResolvedFrom::PostHook, found);
        }

        Ok(hits)
    }

    // -- class tiers ------------------------------------------------------

    fn class_from_platform(&self, name: &str) -> Result<Option<ClassResolution>, ResolveError> {
        Ok(self
            .context
            .platform
            .find_class(name)
            .map(|artifact| ClassResolution {
                origin: ResolvedFrom::Platform,
                artifact,
            }))
    }

    fn class_from_framework(&self, name: &str) -> Result<Option<ClassResolution>, ResolveError> {
        if !is_framework_namespace(name) {
            return Ok(None);
        }
        Ok(self
            .context
            .framework
            .find_class(name)
            .map(|artifact| ClassResolution {
                origin: ResolvedFrom::Framework,
                artifact,
            }))
    }

    fn class_from_pre_hook(&self, name: &str) -> Result<Option<ClassResolution>, ResolveError> {
        let hook = match self.hook() {
            Some(hook) => hook,
            None => return Ok(None),
        };
        let found = hook
            .pre_find_class(name, &self.hook_ctx())
            .map_err(|fault| self.hook_fault("pre_find_class", name, fault))?;
        Ok(found.map(|artifact| ClassResolution {
            origin: ResolvedFrom::PreHook,
            artifact,
        }))
    }

    fn class_from_exports(&self, name: &str) -> Result<Option<ClassResolution>, ResolveError> {
        // A visibility rejection skips this tier silently; the search falls
        // through to the local tier.
        let descriptor = self.module.descriptor();
        if visibility::is_class_denied(descriptor, name)
            || !visibility::is_class_import_allowed(descriptor, name)
        {
            return Ok(None);
        }
        let index = self.context.current_index();
        Ok(index.find_export_class_owner(name).and_then(|entry| {
            entry.source.find_class(name).map(|artifact| ClassResolution {
                origin: ResolvedFrom::Export(entry.owner.clone()),
                artifact,
            })
        }))
    }

    fn class_from_local(&self, name: &str) -> Result<Option<ClassResolution>, ResolveError> {
        Ok(self
            .module
            .source()
            .find_class(name)
            .map(|artifact| ClassResolution {
                origin: ResolvedFrom::Local,
                artifact,
            }))
    }

    fn class_from_agent(&self, name: &str) -> Result<Option<ClassResolution>, ResolveError> {
        Ok(self
            .context
            .agent
            .find_class(name)
            .map(|artifact| ClassResolution {
                origin: ResolvedFrom::Agent,
                artifact,
            }))
    }

    fn class_from_post_hook(&self, name: &str) -> Result<Option<ClassResolution>, ResolveError> {
        let hook = match self.hook() {
            Some(hook) => hook,
            None => return Ok(None),
        };
        let found = hook
            .post_find_class(name, &self.hook_ctx())
            .map_err(|fault| self.hook_fault("post_find_class", name, fault))?;
        Ok(found.map(|artifact| ClassResolution {
            origin: ResolvedFrom::PostHook,
            artifact,
        }))
    }

    // -- resource tiers ---------------------------------------------------

    fn resource_from_platform(&self, name: &str) -> Result<Option<ResourceHit>, ResolveError> {
        Ok(self
            .context
            .platform
            .find_resource(name)
            .map(|artifact| ResourceHit {
                origin: ResolvedFrom::Platform,
                artifact,
            }))
    }

    fn resource_from_framework(&self, name: &str) -> Result<Option<ResourceHit>, ResolveError> {
        Ok(self
            .context
            .framework
            .find_resource(name)
            .map(|artifact| ResourceHit {
                origin: ResolvedFrom::Framework,
                artifact,
            }))
    }

    fn resource_from_pre_hook(&self, name: &str) -> Result<Option<ResourceHit>, ResolveError> {
        let hook = match self.hook() {
            Some(hook) => hook,
            None => return Ok(None),
        };
        let found = hook
            .pre_find_resource(name, &self.hook_ctx())
            .map_err(|fault| self.hook_fault("pre_find_resource", name, fault))?;
        Ok(found.map(|artifact| ResourceHit {
            origin: ResolvedFrom::PreHook,
            artifact,
        }))
    }

    fn resource_from_exports(&self, name: &str) -> Result<Option<ResourceHit>, ResolveError> {
        if !self.may_search_exported_resource(name) {
            return Ok(None);
        }
        let index = self.context.current_index();
        for entry in index.find_export_resource_sources(name) {
            if let Some(artifact) = entry.source.find_resource(name) {
                return Ok(Some(ResourceHit {
                    origin: ResolvedFrom::Export(entry.owner.clone()),
                    artifact,
                }));
            }
        }
        Ok(None)
    }

    fn resource_from_local(&self, name: &str) -> Result<Option<ResourceHit>, ResolveError> {
        Ok(self
            .module
            .source()
            .find_resource(name)
            .map(|artifact| ResourceHit {
                origin: ResolvedFrom::Local,
                artifact,
            }))
    }

    fn resource_from_agent(&self, name: &str) -> Result<Option<ResourceHit>, ResolveError> {
        Ok(self
            .context
            .agent
            .find_resource(name)
            .map(|artifact| ResourceHit {
                origin: ResolvedFrom::Agent,
                artifact,
            }))
    }

    fn resource_from_post_hook(&self, name: &str) -> Result<Option<ResourceHit>, ResolveError> {
        let hook = match self.hook() {
            Some(hook) => hook,
            None => return Ok(None),
        };
        let found = hook
            .post_find_resource(name, &self.hook_ctx())
            .map_err(|fault| self.hook_fault("post_find_resource", name, fault))?;
        Ok(found.map(|artifact| ResourceHit {
            origin: ResolvedFrom::PostHook,
            artifact,
        }))
    }

    // -- shared plumbing --------------------------------------------------

    fn may_search_exported_resource(&self, name: &str) -> bool {
        let descriptor = self.module.descriptor();
        !visibility::is_resource_denied(descriptor, name)
            && visibility::is_resource_import_allowed(descriptor, name)
    }

    fn hook(&self) -> Option<Arc<dyn ResolutionHook>> {
        let deps = HookBindingDeps {
            loader: &self.context.hook_loader,
            registry: &self.context.registry,
            config: &self.context.config,
        };
        self.hook.get_or_load(&self.module, &deps)
    }

    fn hook_ctx(&self) -> HookContext<'_> {
        HookContext {
            identity: self.module.identity(),
            descriptor: self.module.descriptor(),
        }
    }

    fn hook_fault(&self, phase: &'static str, name: &str, fault: HookError) -> ResolveError {
        ResolveError::HookInvocation {
            module: self.module.identity().to_string(),
            phase,
            name: name.to_string(),
            fault,
        }
    }

    fn cached(&self, name: &str) -> Option<ClassResolution> {
        self.resolved
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }

    /// Records a tier hit. First writer wins: a concurrent lookup that raced
    /// through the tiers keeps the already-stored resolution, so a module
    /// observes one artifact per name for its whole lifetime.
    fn remember(&self, name: &str, candidate: ClassResolution) -> ClassResolution {
        self.resolved
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(name.to_string())
            .or_insert(candidate)
            .clone()
    }
}

fn collect(hits: &mut Vec<ResourceHit>, origin: ResolvedFrom, found: Vec<Arc<ResourceArtifact>>) {
    hits.extend(found.into_iter().map(|artifact| ResourceHit {
        origin: origin.clone(),
        artifact,
    }));
}

#[cfg(test)]
mod tests {
    use super::{is_framework_namespace, is_reflection_accessor};

    #[test]
    fn reflection_accessor_prefixes_are_rejected_names() {
        assert!(is_reflection_accessor("sun.reflect.GeneratedMethodAccessor11"));
        assert!(is_reflection_accessor(
            "sun.reflect.GeneratedSerializationConstructorAccessor3"
        ));
        assert!(!is_reflection_accessor("sun.reflect.Reflection"));
        assert!(!is_reflection_accessor("com.foo.Bar"));
    }

    #[test]
    fn framework_namespace_covers_reserved_prefixes_only() {
        assert!(is_framework_namespace("io.modcell.spi.hook.Contract"));
        assert!(is_framework_namespace("io.modcell.api.Bootstrap"));
        assert!(!is_framework_namespace("io.modcell.runtime.Impl"));
        assert!(!is_framework_namespace("org.lib.Helper"));
    }
}
