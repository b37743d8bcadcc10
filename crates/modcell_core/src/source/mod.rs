//! Symbol source capability and resolved artifacts.
//!
//! # Responsibility
//! - Define the "lookup by name" contract the resolver consumes for the
//!   platform, framework, agent and module-private tiers.
//! - Provide an in-memory implementation for wiring, smoke runs and tests.
//!
//! # Invariants
//! - Sources are read-only from the resolver's point of view; their backing
//!   format (archive layout, directories, generated tables) is irrelevant
//!   here.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One resolvable class artifact.
///
/// The `linked` latch implements resolve-and-link semantics: linking is
/// idempotent per artifact, so repeated link requests are cheap no-ops.
#[derive(Debug)]
pub struct ClassArtifact {
    /// Fully-qualified class name.
    pub name: String,
    /// Label of the source that defined this artifact.
    pub defined_by: String,
    /// Opaque payload; empty when the backing source carries metadata only.
    pub bytes: Vec<u8>,
    linked: AtomicBool,
}

impl ClassArtifact {
    /// Creates a metadata-only artifact.
    pub fn new(name: impl Into<String>, defined_by: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            defined_by: defined_by.into(),
            bytes: Vec::new(),
            linked: AtomicBool::new(false),
        }
    }

    /// Creates an artifact carrying an opaque payload.
    pub fn with_bytes(
        name: impl Into<String>,
        defined_by: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            bytes,
            ..Self::new(name, defined_by)
        }
    }

    /// Marks the artifact linked. Idempotent.
    pub fn link(&self) {
        self.linked.store(true, Ordering::Release);
    }

    /// Returns whether a link request has been observed.
    pub fn is_linked(&self) -> bool {
        self.linked.load(Ordering::Acquire)
    }
}

/// One resolvable resource artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceArtifact {
    /// Resource path, e.g. `META-INF/config.xml`.
    pub name: String,
    /// Label of the location the resource was found at.
    pub location: String,
    /// Opaque payload; empty when the backing source carries metadata only.
    pub bytes: Vec<u8>,
}

impl ResourceArtifact {
    /// Creates a metadata-only resource artifact.
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            bytes: Vec::new(),
        }
    }
}

/// Lookup-by-name capability backing one resolver tier.
pub trait SymbolSource: Send + Sync {
    /// Finds a class by fully-qualified name. A clean miss returns `None`.
    fn find_class(&self, name: &str) -> Option<Arc<ClassArtifact>>;

    /// Finds the first resource with the given name.
    fn find_resource(&self, name: &str) -> Option<Arc<ResourceArtifact>>;

    /// Finds every resource with the given name, in source-defined order.
    fn find_resources(&self, name: &str) -> Vec<Arc<ResourceArtifact>> {
        self.find_resource(name).into_iter().collect()
    }

    /// Human-readable label for diagnostics.
    fn describe(&self) -> &str;
}

/// In-memory symbol source keyed by exact names.
///
/// Used for platform/framework/agent wiring in smoke runs and as the
/// module-private source in tests; production deployments install sources
/// backed by real archives through the same trait.
pub struct MapSymbolSource {
    label: String,
    classes: HashMap<String, Arc<ClassArtifact>>,
    resources: HashMap<String, Vec<Arc<ResourceArtifact>>>,
}

impl MapSymbolSource {
    /// Creates an empty source with a diagnostic label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            classes: HashMap::new(),
            resources: HashMap::new(),
        }
    }

    /// Adds a metadata-only class entry defined by this source.
    pub fn add_class(mut self, name: &str) -> Self {
        let artifact = ClassArtifact::new(name, self.label.clone());
        self.classes.insert(name.to_string(), Arc::new(artifact));
        self
    }

    /// Adds a resource entry; repeated names accumulate in insertion order.
    pub fn add_resource(mut self, name: &str, location: &str) -> Self {
        let artifact = Arc::new(ResourceArtifact::new(name, location));
        self.resources.entry(name.to_string()).or_default().push(artifact);
        self
    }

    /// Finishes construction and makes the source shareable.
    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl SymbolSource for MapSymbolSource {
    fn find_class(&self, name: &str) -> Option<Arc<ClassArtifact>> {
        self.classes.get(name).cloned()
    }

    fn find_resource(&self, name: &str) -> Option<Arc<ResourceArtifact>> {
        self.resources
            .get(name)
            .and_then(|entries| entries.first())
            .cloned()
    }

    fn find_resources(&self, name: &str) -> Vec<Arc<ResourceArtifact>> {
        self.resources.get(name).cloned().unwrap_or_default()
    }

    fn describe(&self) -> &str {
        &self.label
    }
}
