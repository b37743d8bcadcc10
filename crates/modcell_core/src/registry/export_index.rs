//! Export index: derived exact-name lookup over module export declarations.
//!
//! # Responsibility
//! - Map each exported class name to its owning module and each exported
//!   resource name to every exporter, precomputed once per build.
//!
//! # Invariants
//! - Class entries are first-writer-wins in registration order; later
//!   duplicate exporters are silently ignored (documented behavior, not an
//!   error).
//! - Resource entries accumulate in registration order, duplicates allowed.
//! - An index value is immutable; rebuilds produce a fresh value that the
//!   container publishes with a pointer swap.

use crate::registry::module_registry::RegisteredModule;
use crate::source::SymbolSource;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Owner entry for one exported class name.
#[derive(Clone)]
pub struct ExportedClass {
    /// Identity of the exporting module.
    pub owner: String,
    /// The exporting module's private symbol source.
    pub source: Arc<dyn SymbolSource>,
}

/// One exporter entry for a resource name.
#[derive(Clone)]
pub struct ExportedResource {
    /// Identity of the exporting module.
    pub owner: String,
    /// The exporting module's private symbol source.
    pub source: Arc<dyn SymbolSource>,
}

/// Immutable derived mapping from exported names to exporting modules.
#[derive(Default)]
pub struct ExportIndex {
    classes: HashMap<String, ExportedClass>,
    resources: HashMap<String, Vec<ExportedResource>>,
}

impl ExportIndex {
    /// Builds an index from modules in registration order.
    ///
    /// Building is a pure function of the input snapshot: rebuilding from an
    /// unchanged registry yields an equivalent index.
    pub fn build(modules: &[RegisteredModule]) -> Self {
        let mut index = Self::default();
        for module in modules {
            for class_name in &module.descriptor().export_classes {
                index
                    .classes
                    .entry(class_name.clone())
                    .or_insert_with(|| ExportedClass {
                        owner: module.identity().to_string(),
                        source: Arc::clone(module.source()),
                    });
            }
            for resource_name in &module.descriptor().export_resources {
                index
                    .resources
                    .entry(resource_name.clone())
                    .or_default()
                    .push(ExportedResource {
                        owner: module.identity().to_string(),
                        source: Arc::clone(module.source()),
                    });
            }
        }
        debug!(
            "event=export_index_built module=registry classes={} resources={}",
            index.classes.len(),
            index.resources.len()
        );
        index
    }

    /// Returns the owning module entry for an exported class name.
    pub fn find_export_class_owner(&self, class_name: &str) -> Option<&ExportedClass> {
        self.classes.get(class_name)
    }

    /// Returns every exporter of a resource name, in registration order.
    pub fn find_export_resource_sources(&self, resource_name: &str) -> &[ExportedResource] {
        self.resources
            .get(resource_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct exported class names.
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Number of distinct exported resource names.
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::ExportIndex;
    use crate::model::module::ModuleDescriptor;
    use crate::registry::module_registry::RegisteredModule;
    use crate::source::MapSymbolSource;

    fn exporting_module(identity: &str, class_names: &[&str], resource_names: &[&str]) -> RegisteredModule {
        RegisteredModule::new(
            ModuleDescriptor::plugin(identity)
                .with_export_classes(class_names)
                .with_export_resources(resource_names),
            MapSymbolSource::new(identity).build(),
        )
    }

    #[test]
    fn first_writer_wins_for_duplicate_class_exports() {
        let modules = vec![
            exporting_module("first", &["com.shared.Api"], &[]),
            exporting_module("second", &["com.shared.Api"], &[]),
        ];
        let index = ExportIndex::build(&modules);

        let entry = index
            .find_export_class_owner("com.shared.Api")
            .expect("class entry");
        assert_eq!(entry.owner, "first");
        assert_eq!(index.class_count(), 1);
    }

    #[test]
    fn resource_exporters_accumulate_in_registration_order() {
        let modules = vec![
            exporting_module("first", &[], &["conf/app.xml"]),
            exporting_module("second", &[], &["conf/app.xml"]),
        ];
        let index = ExportIndex::build(&modules);

        let owners: Vec<&str> = index
            .find_export_resource_sources("conf/app.xml")
            .iter()
            .map(|entry| entry.owner.as_str())
            .collect();
        assert_eq!(owners, vec!["first", "second"]);
        assert!(index.find_export_resource_sources("missing").is_empty());
    }

    #[test]
    fn rebuild_from_unchanged_input_is_equivalent() {
        let modules = vec![
            exporting_module("first", &["com.shared.Api"], &["conf/app.xml"]),
            exporting_module("second", &["com.shared.Api"], &["conf/app.xml"]),
        ];
        let first_build = ExportIndex::build(&modules);
        let second_build = ExportIndex::build(&modules);

        assert_eq!(first_build.class_count(), second_build.class_count());
        assert_eq!(
            first_build
                .find_export_class_owner("com.shared.Api")
                .expect("entry")
                .owner,
            second_build
                .find_export_class_owner("com.shared.Api")
                .expect("entry")
                .owner
        );
    }
}
