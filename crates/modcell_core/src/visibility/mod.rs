//! Visibility policy over declared import/deny lists.
//!
//! # Responsibility
//! - Decide, from a requesting module's declarations alone, whether a named
//!   symbol may be satisfied from the export tier.
//!
//! # Invariants
//! - Every predicate is a pure function of the descriptor and the name.
//! - Deny always wins: callers must check `is_*_denied` before the matching
//!   import predicate, and a name on both lists is denied.
//! - Deny lists are a biz-only concept; the deny predicates are vacuously
//!   false for plugins.

use crate::model::module::{ModuleDescriptor, ModuleKind};

/// Returns the package portion of a fully-qualified class name.
///
/// A name without a `.` separator lives in the default package, reported as
/// the empty string.
pub fn package_of(class_name: &str) -> &str {
    match class_name.rfind('.') {
        Some(index) => &class_name[..index],
        None => "",
    }
}

/// Returns whether `package` is covered by a declared package pattern.
///
/// `com.foo` matches only the package `com.foo`. `com.foo.*` matches
/// `com.foo` and any sub-package below it. Matching respects the `.`
/// separator boundary: `com.foobar` is covered by neither form.
pub fn matches_package_pattern(package: &str, pattern: &str) -> bool {
    match pattern.strip_suffix(".*") {
        Some(stem) => {
            package == stem
                || (package.len() > stem.len()
                    && package.starts_with(stem)
                    && package.as_bytes()[stem.len()] == b'.')
        }
        None => package == pattern,
    }
}

/// Returns whether the requesting module refuses to import `class_name`.
pub fn is_class_denied(descriptor: &ModuleDescriptor, class_name: &str) -> bool {
    if descriptor.kind != ModuleKind::Biz {
        return false;
    }
    if descriptor
        .deny_import_classes
        .iter()
        .any(|denied| denied == class_name)
    {
        return true;
    }
    let package = package_of(class_name);
    descriptor
        .deny_import_packages
        .iter()
        .any(|pattern| matches_package_pattern(package, pattern))
}

/// Returns whether the requesting module's import declarations cover
/// `class_name`.
///
/// The export tier is import-gated for plugins and biz modules alike: a
/// module without a matching import entry never sees the export, it falls
/// through to its local tier instead.
pub fn is_class_import_allowed(descriptor: &ModuleDescriptor, class_name: &str) -> bool {
    if descriptor
        .import_classes
        .iter()
        .any(|imported| imported == class_name)
    {
        return true;
    }
    let package = package_of(class_name);
    descriptor
        .import_packages
        .iter()
        .any(|pattern| matches_package_pattern(package, pattern))
}

/// Returns whether the requesting module refuses to import `resource_name`.
///
/// Resource denial is exact-name only.
pub fn is_resource_denied(descriptor: &ModuleDescriptor, resource_name: &str) -> bool {
    descriptor.kind == ModuleKind::Biz
        && descriptor
            .deny_import_resources
            .iter()
            .any(|denied| denied == resource_name)
}

/// Returns whether the requesting module imports `resource_name`.
///
/// Resource imports are exact-name only; package patterns never apply.
pub fn is_resource_import_allowed(descriptor: &ModuleDescriptor, resource_name: &str) -> bool {
    descriptor
        .import_resources
        .iter()
        .any(|imported| imported == resource_name)
}
