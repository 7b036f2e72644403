//! Manifest validation framework
//!
//! Validates mod manifests for structure and dependency declarations.
//! Versions are free-form and are not checked.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::module::registry::manifest::ModManifest;

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Manifest is valid
    Valid,
    /// Manifest is invalid with specific errors
    Invalid(Vec<String>),
}

/// Manifest validator
pub struct ManifestValidator {
    /// Maximum package name length (it doubles as a directory name)
    max_name_len: usize,
}

impl ManifestValidator {
    /// Create a new manifest validator
    pub fn new() -> Self {
        Self { max_name_len: 255 }
    }

    /// Validate the manifest of the package named `name`
    ///
    /// `name` is the package identity (its directory name). The manifest's own
    /// `name` is display metadata and is not checked.
    pub fn validate(&self, name: &str, manifest: &ModManifest) -> ValidationResult {
        let mut errors = Vec::new();

        if name.is_empty() {
            errors.push("Mod name cannot be empty".to_string());
        } else if !self.is_valid_name(name) {
            errors.push(format!(
                "Invalid mod name: {:?} (must be usable as a directory name)",
                name
            ));
        }

        if let Err(dep_errors) = self.validate_dependencies(name, manifest) {
            errors.extend(dep_errors);
        }

        if errors.is_empty() {
            debug!("Manifest validation passed for mod: {}", name);
            ValidationResult::Valid
        } else {
            warn!("Manifest validation failed for mod {}: {:?}", name, errors);
            ValidationResult::Invalid(errors)
        }
    }

    /// A package name must resolve to exactly one directory under the mods root
    #[inline]
    fn is_valid_name(&self, name: &str) -> bool {
        if name.is_empty() || name.len() > self.max_name_len {
            return false;
        }
        if name == "." || name == ".." {
            return false;
        }
        !name
            .chars()
            .any(|c| matches!(c, '/' | '\\') || c.is_control())
    }

    /// Validate dependency declarations
    fn validate_dependencies(
        &self,
        name: &str,
        manifest: &ModManifest,
    ) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for dep in &manifest.dependencies {
            if dep.is_empty() {
                errors.push("Dependency name cannot be empty".to_string());
                continue;
            }
            if !self.is_valid_name(dep) {
                errors.push(format!("Invalid dependency name: {:?}", dep));
            }
            if dep == name {
                errors.push(format!("Mod {} cannot depend on itself", name));
            }
            if !seen.insert(dep.as_str()) {
                errors.push(format!("Duplicate dependency: {}", dep));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for ManifestValidator {
    fn default() -> Self {
        Self::new()
    }
}
