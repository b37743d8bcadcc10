//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `modcell_core` wiring: one
//!   plugin, one biz, one resolved class.
//! - Keep output deterministic for quick local sanity checks.

use modcell_core::{
    CoreContainer, CoreSources, HookLoaderRegistry, MapSymbolSource, ModuleDescriptor,
    ProcessConfig, ResolveRequest,
};
use std::sync::Arc;

fn main() {
    println!("modcell_core ping={}", modcell_core::ping());
    println!("modcell_core version={}", modcell_core::core_version());

    let container = CoreContainer::new(
        CoreSources {
            platform: MapSymbolSource::new("platform").build(),
            framework: MapSymbolSource::new("framework").build(),
            agent: MapSymbolSource::new("agent").build(),
        },
        Arc::new(HookLoaderRegistry::new()),
        Arc::new(ProcessConfig::new()),
    );

    let smoke = || -> Result<String, Box<dyn std::error::Error>> {
        container.register_module(
            ModuleDescriptor::plugin("base-plugin:1.0.0").with_export_classes(&["org.lib.Helper"]),
            MapSymbolSource::new("base-plugin").add_class("org.lib.Helper").build(),
        )?;
        container.register_module(
            ModuleDescriptor::master_biz("shell:1.0.0").with_import_packages(&["org.lib.*"]),
            MapSymbolSource::new("shell").build(),
        )?;
        container.rebuild_export_index();

        let outcome = container.resolve(&ResolveRequest::class("shell:1.0.0", "org.lib.Helper"))?;
        Ok(outcome
            .owner_identity()
            .unwrap_or("<non-module tier>")
            .to_string())
    };

    match smoke() {
        Ok(owner) => println!("modcell_core resolve org.lib.Helper owner={owner}"),
        Err(err) => {
            eprintln!("modcell_core smoke failed: {err}");
            std::process::exit(1);
        }
    }
}
