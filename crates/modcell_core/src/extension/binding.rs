//! Per-module one-shot hook binding.
//!
//! # Responsibility
//! - Resolve the hook for one requesting module exactly once and cache the
//!   outcome, including the "no hook" outcome, for the resolver's lifetime.
//!
//! # Invariants
//! - Exactly one load attempt per binding; concurrent first callers serialize
//!   on the latch and observe the settled outcome.
//! - Failures while locating or building a hook are logged and cached as
//!   "no hook"; they never abort the standard search.

use crate::config::{ProcessConfig, DELEGATE_MASTER_HOOK_KEY};
use crate::extension::hook::ResolutionHook;
use crate::extension::loader::HookLoaderRegistry;
use crate::model::module::ModuleKind;
use crate::registry::module_registry::{ModuleRegistry, RegisteredModule};
use log::{debug, error};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Collaborators consulted during the single resolution attempt.
pub struct HookBindingDeps<'a> {
    pub loader: &'a HookLoaderRegistry,
    pub registry: &'a ModuleRegistry,
    pub config: &'a ProcessConfig,
}

/// One-shot latch around the resolved hook of a requesting module.
#[derive(Default)]
pub struct HookBinding {
    cell: OnceCell<Option<Arc<dyn ResolutionHook>>>,
}

impl HookBinding {
    /// Creates an unresolved binding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached hook, resolving it on first use.
    ///
    /// Resolution order: the requesting module's own isolation space, then —
    /// for a non-master biz with `module.hook.delegate-to-master` enabled —
    /// the master biz's isolation space. An absent master silently disables
    /// the delegation.
    pub fn get_or_load(
        &self,
        module: &RegisteredModule,
        deps: &HookBindingDeps<'_>,
    ) -> Option<Arc<dyn ResolutionHook>> {
        self.cell
            .get_or_init(|| resolve_once(module, deps))
            .clone()
    }

    /// Returns whether the binding has settled, without triggering a load.
    pub fn is_settled(&self) -> bool {
        self.cell.get().is_some()
    }
}

fn resolve_once(
    module: &RegisteredModule,
    deps: &HookBindingDeps<'_>,
) -> Option<Arc<dyn ResolutionHook>> {
    match deps.loader.load(module.identity()) {
        Ok(Some(hook)) => {
            debug!(
                "event=hook_bound module=extension identity={} hook={}",
                module.identity(),
                hook.describe()
            );
            return Some(hook);
        }
        Ok(None) => {}
        Err(err) => {
            error!(
                "event=hook_resolution_failed module=extension identity={} detail={err}",
                module.identity()
            );
            return None;
        }
    }

    if !should_delegate_to_master(module, deps.config) {
        return None;
    }

    let master = match deps.registry.get_master() {
        Ok(master) => master,
        Err(err) => {
            // Delegation silently disables itself when no master exists.
            debug!(
                "event=hook_master_delegation_skipped module=extension identity={} detail={err}",
                module.identity()
            );
            return None;
        }
    };

    match deps.loader.load(master.identity()) {
        Ok(outcome) => {
            if let Some(hook) = &outcome {
                debug!(
                    "event=hook_bound_via_master module=extension identity={} master={} hook={}",
                    module.identity(),
                    master.identity(),
                    hook.describe()
                );
            }
            outcome
        }
        Err(err) => {
            error!(
                "event=hook_resolution_failed module=extension identity={} master={} detail={err}",
                module.identity(),
                master.identity()
            );
            None
        }
    }
}

fn should_delegate_to_master(module: &RegisteredModule, config: &ProcessConfig) -> bool {
    module.descriptor().kind == ModuleKind::Biz
        && !module.is_master()
        && config.get_bool(DELEGATE_MASTER_HOOK_KEY, false)
}

#[cfg(test)]
mod tests {
    use super::{HookBinding, HookBindingDeps};
    use crate::config::{ProcessConfig, DELEGATE_MASTER_HOOK_KEY};
    use crate::extension::hook::ResolutionHook;
    use crate::extension::loader::HookLoaderRegistry;
    use crate::model::module::ModuleDescriptor;
    use crate::registry::module_registry::{ModuleRegistry, RegisteredModule};
    use crate::source::MapSymbolSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct NamedHook(&'static str);

    impl ResolutionHook for NamedHook {
        fn describe(&self) -> &str {
            self.0
        }
    }

    fn module(descriptor: ModuleDescriptor) -> RegisteredModule {
        let label = descriptor.identity.clone();
        RegisteredModule::new(descriptor, MapSymbolSource::new(label).build())
    }

    #[test]
    fn caches_absence_and_never_retries() {
        let loader = HookLoaderRegistry::new();
        let registry = ModuleRegistry::new();
        let config = ProcessConfig::new();
        let deps = HookBindingDeps {
            loader: &loader,
            registry: &registry,
            config: &config,
        };
        let requesting = module(ModuleDescriptor::biz("app:1.0.0"));

        let binding = HookBinding::new();
        assert!(!binding.is_settled());
        assert!(binding.get_or_load(&requesting, &deps).is_none());
        assert!(binding.is_settled());

        // A factory installed after the first attempt is never consulted.
        loader
            .register_factory("app:1.0.0", Arc::new(|| Ok(Arc::new(NamedHook("late")))))
            .expect("factory registration");
        assert!(binding.get_or_load(&requesting, &deps).is_none());
    }

    #[test]
    fn resolution_failure_is_swallowed_into_absence() {
        let loader = HookLoaderRegistry::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);
        loader
            .register_factory(
                "app:1.0.0",
                Arc::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err("broken factory".to_string())
                }),
            )
            .expect("factory registration");
        let registry = ModuleRegistry::new();
        let config = ProcessConfig::new();
        let deps = HookBindingDeps {
            loader: &loader,
            registry: &registry,
            config: &config,
        };
        let requesting = module(ModuleDescriptor::biz("app:1.0.0"));

        let binding = HookBinding::new();
        assert!(binding.get_or_load(&requesting, &deps).is_none());
        assert!(binding.get_or_load(&requesting, &deps).is_none());
        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn non_master_biz_delegates_to_master_space_when_enabled() {
        let loader = HookLoaderRegistry::new();
        loader
            .register_factory(
                "shell:1.0.0",
                Arc::new(|| Ok(Arc::new(NamedHook("master-hook")))),
            )
            .expect("factory registration");

        let registry = ModuleRegistry::new();
        registry
            .register(
                ModuleDescriptor::master_biz("shell:1.0.0"),
                MapSymbolSource::new("shell").build(),
            )
            .expect("master registration");

        let config = ProcessConfig::new();
        config.put(DELEGATE_MASTER_HOOK_KEY, "true");
        let deps = HookBindingDeps {
            loader: &loader,
            registry: &registry,
            config: &config,
        };

        let requesting = module(ModuleDescriptor::biz("worker:1.0.0"));
        let binding = HookBinding::new();
        let hook = binding
            .get_or_load(&requesting, &deps)
            .expect("delegated hook");
        assert_eq!(hook.describe(), "master-hook");
    }

    #[test]
    fn delegation_requires_opt_in_and_a_master() {
        let loader = HookLoaderRegistry::new();
        loader
            .register_factory(
                "shell:1.0.0",
                Arc::new(|| Ok(Arc::new(NamedHook("master-hook")))),
            )
            .expect("factory registration");
        let registry = ModuleRegistry::new();
        let config = ProcessConfig::new();
        let deps = HookBindingDeps {
            loader: &loader,
            registry: &registry,
            config: &config,
        };

        // Opt-in flag missing: own-space miss stays a miss.
        let requesting = module(ModuleDescriptor::biz("worker:1.0.0"));
        assert!(HookBinding::new().get_or_load(&requesting, &deps).is_none());

        // Opt-in set but no master registered: delegation silently disables.
        config.put(DELEGATE_MASTER_HOOK_KEY, "true");
        assert!(HookBinding::new().get_or_load(&requesting, &deps).is_none());
    }
}
