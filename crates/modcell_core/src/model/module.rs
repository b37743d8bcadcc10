//! Module descriptor domain model.
//!
//! # Responsibility
//! - Define the declarative shape of one installable module (plugin or biz).
//! - Validate declaration-level invariants before registry admission.
//!
//! # Invariants
//! - `identity` is a stable external key and never changes after registration.
//! - Deny lists and the master flag are biz-only concepts; a plugin descriptor
//!   carrying either is rejected.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Identity shape: `name` or `name:version`, lowercase first segment.
static IDENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9._-]*(:[0-9A-Za-z][0-9A-Za-z._-]*)?$")
        .expect("valid identity regex")
});

/// Isolation category of one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    /// Shared library module: trusted code exporting symbols to applications.
    Plugin,
    /// Application module; one biz per registry may be designated master.
    Biz,
}

/// Declarative description of one module as supplied by the external loader.
///
/// All list fields hold already-parsed strings; the core never reads archives
/// or configuration files itself. Class entries are exact fully-qualified
/// names; package entries are patterns (`com.foo` exact, `com.foo.*`
/// sub-package wildcard); resource entries are exact resource paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Stable unique identity, `name` or `name:version`.
    pub identity: String,
    /// Plugin or biz application.
    pub kind: ModuleKind,
    /// Class names this module exports to importers.
    #[serde(default)]
    pub export_classes: Vec<String>,
    /// Resource names this module exports to importers.
    #[serde(default)]
    pub export_resources: Vec<String>,
    /// Exact class names this module imports from the export tier.
    #[serde(default)]
    pub import_classes: Vec<String>,
    /// Package patterns this module imports from the export tier.
    #[serde(default)]
    pub import_packages: Vec<String>,
    /// Exact resource names this module imports from the export tier.
    #[serde(default)]
    pub import_resources: Vec<String>,
    /// Class names this biz refuses to import even when otherwise allowed.
    #[serde(default)]
    pub deny_import_classes: Vec<String>,
    /// Package patterns this biz refuses to import; always override imports.
    #[serde(default)]
    pub deny_import_packages: Vec<String>,
    /// Resource names this biz refuses to import.
    #[serde(default)]
    pub deny_import_resources: Vec<String>,
    /// Master designation; meaningful for `ModuleKind::Biz` only.
    #[serde(default)]
    pub master: bool,
}

impl ModuleDescriptor {
    /// Creates an empty plugin descriptor with the given identity.
    pub fn plugin(identity: impl Into<String>) -> Self {
        Self::empty(identity, ModuleKind::Plugin)
    }

    /// Creates an empty biz descriptor with the given identity.
    pub fn biz(identity: impl Into<String>) -> Self {
        Self::empty(identity, ModuleKind::Biz)
    }

    /// Creates a biz descriptor carrying the master designation.
    pub fn master_biz(identity: impl Into<String>) -> Self {
        let mut descriptor = Self::empty(identity, ModuleKind::Biz);
        descriptor.master = true;
        descriptor
    }

    fn empty(identity: impl Into<String>, kind: ModuleKind) -> Self {
        Self {
            identity: identity.into(),
            kind,
            export_classes: Vec::new(),
            export_resources: Vec::new(),
            import_classes: Vec::new(),
            import_packages: Vec::new(),
            import_resources: Vec::new(),
            deny_import_classes: Vec::new(),
            deny_import_packages: Vec::new(),
            deny_import_resources: Vec::new(),
            master: false,
        }
    }

    /// Replaces the exported class list.
    pub fn with_export_classes(mut self, names: &[&str]) -> Self {
        self.export_classes = to_owned_list(names);
        self
    }

    /// Replaces the exported resource list.
    pub fn with_export_resources(mut self, names: &[&str]) -> Self {
        self.export_resources = to_owned_list(names);
        self
    }

    /// Replaces the imported class list.
    pub fn with_import_classes(mut self, names: &[&str]) -> Self {
        self.import_classes = to_owned_list(names);
        self
    }

    /// Replaces the imported package pattern list.
    pub fn with_import_packages(mut self, patterns: &[&str]) -> Self {
        self.import_packages = to_owned_list(patterns);
        self
    }

    /// Replaces the imported resource list.
    pub fn with_import_resources(mut self, names: &[&str]) -> Self {
        self.import_resources = to_owned_list(names);
        self
    }

    /// Replaces the denied class list.
    pub fn with_deny_import_classes(mut self, names: &[&str]) -> Self {
        self.deny_import_classes = to_owned_list(names);
        self
    }

    /// Replaces the denied package pattern list.
    pub fn with_deny_import_packages(mut self, patterns: &[&str]) -> Self {
        self.deny_import_packages = to_owned_list(patterns);
        self
    }

    /// Replaces the denied resource list.
    pub fn with_deny_import_resources(mut self, names: &[&str]) -> Self {
        self.deny_import_resources = to_owned_list(names);
        self
    }

    /// Returns whether this descriptor designates the master biz.
    pub fn is_master(&self) -> bool {
        self.kind == ModuleKind::Biz && self.master
    }

    /// Validates declaration-level invariants.
    ///
    /// # Errors
    /// - Empty or malformed identity.
    /// - Blank entries in any declared list.
    /// - Plugin descriptors carrying deny lists or the master flag.
    pub fn validate(&self) -> Result<(), ModuleValidationError> {
        let identity = self.identity.trim();
        if identity.is_empty() {
            return Err(ModuleValidationError::EmptyIdentity);
        }
        if !IDENTITY_RE.is_match(identity) {
            return Err(ModuleValidationError::InvalidIdentity(
                self.identity.clone(),
            ));
        }

        for (list, entries) in [
            ("export_classes", &self.export_classes),
            ("export_resources", &self.export_resources),
            ("import_classes", &self.import_classes),
            ("import_packages", &self.import_packages),
            ("import_resources", &self.import_resources),
            ("deny_import_classes", &self.deny_import_classes),
            ("deny_import_packages", &self.deny_import_packages),
            ("deny_import_resources", &self.deny_import_resources),
        ] {
            if entries.iter().any(|entry| entry.trim().is_empty()) {
                return Err(ModuleValidationError::BlankListEntry(list));
            }
        }

        if self.kind == ModuleKind::Plugin {
            let has_deny = !self.deny_import_classes.is_empty()
                || !self.deny_import_packages.is_empty()
                || !self.deny_import_resources.is_empty();
            if has_deny {
                return Err(ModuleValidationError::PluginWithDenyList(
                    self.identity.clone(),
                ));
            }
            if self.master {
                return Err(ModuleValidationError::PluginAsMaster(
                    self.identity.clone(),
                ));
            }
        }

        Ok(())
    }
}

fn to_owned_list(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|entry| entry.to_string()).collect()
}

/// Declaration-level descriptor validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleValidationError {
    EmptyIdentity,
    InvalidIdentity(String),
    BlankListEntry(&'static str),
    PluginWithDenyList(String),
    PluginAsMaster(String),
}

impl Display for ModuleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyIdentity => write!(f, "module identity must not be empty"),
            Self::InvalidIdentity(value) => {
                write!(f, "module identity is invalid: {value}")
            }
            Self::BlankListEntry(list) => {
                write!(f, "module list `{list}` contains a blank entry")
            }
            Self::PluginWithDenyList(identity) => {
                write!(f, "plugin `{identity}` must not declare deny lists")
            }
            Self::PluginAsMaster(identity) => {
                write!(f, "plugin `{identity}` must not be designated master")
            }
        }
    }
}

impl Error for ModuleValidationError {}
