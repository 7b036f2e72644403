//! Mod catalog
//!
//! Authoritative registry of every known mod and its activation status.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::module::registry::manifest::ModDescriptor;
use crate::module::traits::ModError;

/// Activation status of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModStatus {
    /// Known but not enabled
    Inactive,
    /// Enabled with every dependency active
    Active,
    /// Enabled but at least one dependency is not active
    Incomplete,
}

impl std::fmt::Display for ModStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            ModStatus::Inactive => "Inactive",
            ModStatus::Active => "Active",
            ModStatus::Incomplete => "Incomplete",
        })
    }
}

/// Catalog record binding a descriptor to its activation status
///
/// `missing_dependencies` is non-empty exactly when the status is `Incomplete`.
#[derive(Debug, Clone)]
pub struct ModEntry {
    descriptor: Arc<ModDescriptor>,
    status: ModStatus,
    missing_dependencies: BTreeSet<String>,
}

impl ModEntry {
    fn new(descriptor: Arc<ModDescriptor>) -> Self {
        Self {
            descriptor,
            status: ModStatus::Inactive,
            missing_dependencies: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    #[inline]
    pub fn descriptor(&self) -> &Arc<ModDescriptor> {
        &self.descriptor
    }

    #[inline]
    pub fn status(&self) -> ModStatus {
        self.status
    }

    #[inline]
    pub fn missing_dependencies(&self) -> &BTreeSet<String> {
        &self.missing_dependencies
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ModStatus::Active
    }
}

/// Registry of all discovered mods, iterated in registration order
#[derive(Debug, Default)]
pub struct ModCatalog {
    entries: Vec<ModEntry>,
    index: HashMap<String, usize>,
}

impl ModCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mod as `Inactive`. Registering a name twice is rejected.
    pub fn register(
        &mut self,
        descriptor: impl Into<Arc<ModDescriptor>>,
    ) -> Result<(), ModError> {
        let descriptor = descriptor.into();
        let name = descriptor.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ModError::DuplicateMod(name));
        }

        debug!("Registering mod {} in catalog", name);
        self.index.insert(name, self.entries.len());
        self.entries.push(ModEntry::new(descriptor));
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&ModEntry, ModError> {
        self.index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| ModError::ModNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All entries in registration order
    pub fn all_entries(&self) -> &[ModEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Update a mod's status, enforcing the entry invariant
    pub fn set_status(
        &mut self,
        name: &str,
        status: ModStatus,
        missing: impl IntoIterator<Item = String>,
    ) -> Result<(), ModError> {
        let missing: BTreeSet<String> = missing.into_iter().collect();
        match status {
            ModStatus::Incomplete if missing.is_empty() => {
                return Err(ModError::InvalidStatus(format!(
                    "{} cannot be Incomplete without missing dependencies",
                    name
                )));
            }
            ModStatus::Active if !missing.is_empty() => {
                return Err(ModError::InvalidStatus(format!(
                    "{} cannot be Active with missing dependencies {:?}",
                    name, missing
                )));
            }
            _ => {}
        }

        let i = *self
            .index
            .get(name)
            .ok_or_else(|| ModError::ModNotFound(name.to_string()))?;
        let entry = &mut self.entries[i];

        debug!("Mod {} status {} -> {}", name, entry.status, status);
        entry.status = status;
        entry.missing_dependencies = match status {
            ModStatus::Incomplete => missing,
            _ => BTreeSet::new(),
        };
        Ok(())
    }

    /// Names of `Active` entries in registration order
    pub fn active_names(&self) -> Vec<String> {
        self.entries_with_status(ModStatus::Active)
            .map(|e| e.name().to_string())
            .collect()
    }

    pub fn entries_with_status(&self, status: ModStatus) -> impl Iterator<Item = &ModEntry> {
        self.entries.iter().filter(move |e| e.status == status)
    }
}
