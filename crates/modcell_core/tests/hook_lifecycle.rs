use modcell_core::{
    ClassArtifact, CoreContainer, CoreSources, HookContext, HookError, HookLoaderRegistry,
    MapSymbolSource, ModuleDescriptor, ProcessConfig, ResolutionHook, ResolveError,
    ResolveRequest, ResolvedFrom, ServiceError, DELEGATE_MASTER_HOOK_KEY,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Supplies one class name from a chosen phase and declines everything else.
struct SupplyingHook {
    label: &'static str,
    supplies: &'static str,
    from_pre: bool,
}

impl ResolutionHook for SupplyingHook {
    fn pre_find_class(
        &self,
        name: &str,
        _ctx: &HookContext<'_>,
    ) -> Result<Option<Arc<ClassArtifact>>, HookError> {
        if self.from_pre && name == self.supplies {
            return Ok(Some(Arc::new(ClassArtifact::new(name, self.label))));
        }
        Ok(None)
    }

    fn post_find_class(
        &self,
        name: &str,
        _ctx: &HookContext<'_>,
    ) -> Result<Option<Arc<ClassArtifact>>, HookError> {
        if !self.from_pre && name == self.supplies {
            return Ok(Some(Arc::new(ClassArtifact::new(name, self.label))));
        }
        Ok(None)
    }

    fn describe(&self) -> &str {
        self.label
    }
}

/// Faults on every pre-class interception.
struct FaultingHook;

impl ResolutionHook for FaultingHook {
    fn pre_find_class(
        &self,
        _name: &str,
        _ctx: &HookContext<'_>,
    ) -> Result<Option<Arc<ClassArtifact>>, HookError> {
        Err(HookError::new("interceptor panic substitute"))
    }

    fn describe(&self) -> &str {
        "faulting"
    }
}

fn container_with_loader(loader: Arc<HookLoaderRegistry>, config: Arc<ProcessConfig>) -> CoreContainer {
    CoreContainer::new(
        CoreSources {
            platform: MapSymbolSource::new("platform").build(),
            framework: MapSymbolSource::new("framework").build(),
            agent: MapSymbolSource::new("agent").build(),
        },
        loader,
        config,
    )
}

#[test]
fn pre_hook_supplies_before_the_export_tier() {
    let loader = Arc::new(HookLoaderRegistry::new());
    loader
        .register_factory(
            "app:1.0.0",
            Arc::new(|| {
                Ok(Arc::new(SupplyingHook {
                    label: "pre-hook",
                    supplies: "org.lib.Helper",
                    from_pre: true,
                }))
            }),
        )
        .expect("factory registration");
    let container = container_with_loader(loader, Arc::new(ProcessConfig::new()));

    container
        .register_module(
            ModuleDescriptor::plugin("lib-plugin").with_export_classes(&["org.lib.Helper"]),
            MapSymbolSource::new("lib-plugin").add_class("org.lib.Helper").build(),
        )
        .expect("plugin registration");
    container
        .register_module(
            ModuleDescriptor::biz("app:1.0.0").with_import_packages(&["org.lib.*"]),
            MapSymbolSource::new("app").build(),
        )
        .expect("biz registration");
    container.rebuild_export_index();

    let outcome = container
        .resolve(&ResolveRequest::class("app:1.0.0", "org.lib.Helper"))
        .expect("hook resolution");
    assert_eq!(*outcome.origin().expect("origin"), ResolvedFrom::PreHook);
}

#[test]
fn post_hook_runs_after_every_standard_tier_missed() {
    let loader = Arc::new(HookLoaderRegistry::new());
    loader
        .register_factory(
            "app:1.0.0",
            Arc::new(|| {
                Ok(Arc::new(SupplyingHook {
                    label: "post-hook",
                    supplies: "ghost.Only",
                    from_pre: false,
                }))
            }),
        )
        .expect("factory registration");
    let container = container_with_loader(loader, Arc::new(ProcessConfig::new()));
    container
        .register_module(
            ModuleDescriptor::biz("app:1.0.0"),
            MapSymbolSource::new("app").build(),
        )
        .expect("biz registration");
    container.rebuild_export_index();

    let outcome = container
        .resolve(&ResolveRequest::class("app:1.0.0", "ghost.Only"))
        .expect("post-hook resolution");
    assert_eq!(*outcome.origin().expect("origin"), ResolvedFrom::PostHook);
}

#[test]
fn hook_invocation_fault_propagates_and_skips_remaining_tiers() {
    let loader = Arc::new(HookLoaderRegistry::new());
    loader
        .register_factory("app:1.0.0", Arc::new(|| Ok(Arc::new(FaultingHook))))
        .expect("factory registration");
    let container = container_with_loader(loader, Arc::new(ProcessConfig::new()));
    // The local source carries the class; the fault must still win.
    container
        .register_module(
            ModuleDescriptor::biz("app:1.0.0"),
            MapSymbolSource::new("app").add_class("com.app.Present").build(),
        )
        .expect("biz registration");
    container.rebuild_export_index();

    let err = container
        .resolve(&ResolveRequest::class("app:1.0.0", "com.app.Present"))
        .expect_err("hook fault must propagate");
    match err {
        ServiceError::Resolve(ResolveError::HookInvocation { phase, module, .. }) => {
            assert_eq!(phase, "pre_find_class");
            assert_eq!(module, "app:1.0.0");
        }
        other => panic!("expected HookInvocation, got: {other}"),
    }
}

#[test]
fn hook_resolution_failure_is_swallowed_and_search_continues() {
    let loader = Arc::new(HookLoaderRegistry::new());
    loader
        .register_factory("app:1.0.0", Arc::new(|| Err("factory exploded".to_string())))
        .expect("factory registration");
    let container = container_with_loader(loader, Arc::new(ProcessConfig::new()));
    container
        .register_module(
            ModuleDescriptor::biz("app:1.0.0"),
            MapSymbolSource::new("app").add_class("com.app.Present").build(),
        )
        .expect("biz registration");
    container.rebuild_export_index();

    let outcome = container
        .resolve(&ResolveRequest::class("app:1.0.0", "com.app.Present"))
        .expect("standard search must proceed");
    assert_eq!(*outcome.origin().expect("origin"), ResolvedFrom::Local);
}

#[test]
fn concurrent_first_use_loads_the_hook_exactly_once() {
    let load_count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&load_count);
    let loader = Arc::new(HookLoaderRegistry::new());
    loader
        .register_factory(
            "app:1.0.0",
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(SupplyingHook {
                    label: "shared-hook",
                    supplies: "hooked.Class",
                    from_pre: true,
                }))
            }),
        )
        .expect("factory registration");
    let container = container_with_loader(loader, Arc::new(ProcessConfig::new()));
    container
        .register_module(
            ModuleDescriptor::biz("app:1.0.0"),
            MapSymbolSource::new("app").build(),
        )
        .expect("biz registration");
    container.rebuild_export_index();

    let resolver = container.resolver_for("app:1.0.0").expect("resolver");
    let artifacts = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                scope.spawn(move || {
                    resolver
                        .load_class("hooked.Class", false)
                        .expect("hook resolution")
                        .artifact
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread join"))
            .collect::<Vec<_>>()
    });

    assert_eq!(load_count.load(Ordering::SeqCst), 1);
    for artifact in &artifacts[1..] {
        assert!(Arc::ptr_eq(&artifacts[0], artifact));
    }
}

#[test]
fn non_master_biz_delegates_to_the_master_hook_when_opted_in() {
    let loader = Arc::new(HookLoaderRegistry::new());
    loader
        .register_factory(
            "shell:1.0.0",
            Arc::new(|| {
                Ok(Arc::new(SupplyingHook {
                    label: "master-hook",
                    supplies: "ghost.Only",
                    from_pre: false,
                }))
            }),
        )
        .expect("factory registration");
    let config = Arc::new(ProcessConfig::new());
    config.put(DELEGATE_MASTER_HOOK_KEY, "true");
    let container = container_with_loader(loader, config);

    container
        .register_module(
            ModuleDescriptor::master_biz("shell:1.0.0"),
            MapSymbolSource::new("shell").build(),
        )
        .expect("master registration");
    container
        .register_module(
            ModuleDescriptor::biz("worker:1.0.0"),
            MapSymbolSource::new("worker").build(),
        )
        .expect("worker registration");
    container.rebuild_export_index();

    let outcome = container
        .resolve(&ResolveRequest::class("worker:1.0.0", "ghost.Only"))
        .expect("delegated hook resolution");
    assert_eq!(*outcome.origin().expect("origin"), ResolvedFrom::PostHook);
}

#[test]
fn delegation_without_a_master_silently_disables_itself() {
    let loader = Arc::new(HookLoaderRegistry::new());
    let config = Arc::new(ProcessConfig::new());
    config.put(DELEGATE_MASTER_HOOK_KEY, "true");
    let container = container_with_loader(loader, config);
    container
        .register_module(
            ModuleDescriptor::biz("worker:1.0.0"),
            MapSymbolSource::new("worker").add_class("com.worker.Own").build(),
        )
        .expect("worker registration");
    container.rebuild_export_index();

    // No master is registered: the lookup still runs the standard chain.
    let outcome = container
        .resolve(&ResolveRequest::class("worker:1.0.0", "com.worker.Own"))
        .expect("standard resolution");
    assert_eq!(*outcome.origin().expect("origin"), ResolvedFrom::Local);
}
