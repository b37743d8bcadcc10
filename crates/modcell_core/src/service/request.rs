//! Resolve facade request and outcome model.

use crate::resolver::module_resolver::{ClassResolution, ResolvedFrom, ResourceHit};

/// Symbol category of a resolve request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Class,
    Resource,
}

/// Result arity of a resolve request.
///
/// `All` is meaningful for resources; a class name has exactly one owner, so
/// class requests treat `All` as `Single`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Single,
    All,
}

/// One resolve request against the service container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Identity of the module the lookup runs for.
    pub requesting_module: String,
    /// Requested class or resource name.
    pub name: String,
    pub kind: SymbolKind,
    pub arity: Arity,
    /// Request resolve-and-link semantics for class lookups.
    pub link: bool,
}

impl ResolveRequest {
    /// Builds a singular class request.
    pub fn class(requesting_module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            requesting_module: requesting_module.into(),
            name: name.into(),
            kind: SymbolKind::Class,
            arity: Arity::Single,
            link: false,
        }
    }

    /// Builds a singular class request with resolve-and-link semantics.
    pub fn class_and_link(requesting_module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            link: true,
            ..Self::class(requesting_module, name)
        }
    }

    /// Builds a singular resource request.
    pub fn resource(requesting_module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            requesting_module: requesting_module.into(),
            name: name.into(),
            kind: SymbolKind::Resource,
            arity: Arity::Single,
            link: false,
        }
    }

    /// Builds an all-matches resource request.
    pub fn all_resources(requesting_module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            arity: Arity::All,
            ..Self::resource(requesting_module, name)
        }
    }
}

/// Successful outcome of a resolve request.
#[derive(Debug)]
pub enum ResolveOutcome {
    Class(ClassResolution),
    Resource(ResourceHit),
    /// Every visible match, in tier order; may be empty.
    Resources(Vec<ResourceHit>),
}

impl ResolveOutcome {
    /// Owning tier of a singular outcome.
    pub fn origin(&self) -> Option<&ResolvedFrom> {
        match self {
            Self::Class(resolution) => Some(&resolution.origin),
            Self::Resource(hit) => Some(&hit.origin),
            Self::Resources(_) => None,
        }
    }

    /// Identity of the owning module, when a module owns the single result.
    pub fn owner_identity(&self) -> Option<&str> {
        self.origin().and_then(ResolvedFrom::owner_identity)
    }
}
