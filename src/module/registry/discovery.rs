//! Mod discovery
//!
//! Scans the mods root and discovers available mod packages.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::module::registry::manifest::{ModDescriptor, ModManifest, MANIFEST_FILES};
use crate::module::traits::ModError;
use crate::module::validation::{ManifestValidator, ValidationResult};

/// Discovered mod information
#[derive(Debug, Clone)]
pub struct DiscoveredMod {
    /// Manifest file the descriptor was read from
    pub manifest_path: PathBuf,
    /// Mod descriptor, rooted under the scanned directory
    pub descriptor: ModDescriptor,
}

/// Mod discovery scanner
pub struct ModDiscovery {
    /// Directory holding one subdirectory per mod
    mods_dir: PathBuf,
    validator: ManifestValidator,
}

impl ModDiscovery {
    /// Create a new mod discovery scanner
    pub fn new<P: AsRef<Path>>(mods_dir: P) -> Self {
        Self {
            mods_dir: mods_dir.as_ref().to_path_buf(),
            validator: ManifestValidator::new(),
        }
    }

    pub fn mods_dir(&self) -> &Path {
        &self.mods_dir
    }

    /// Discover all mods in the mods directory
    ///
    /// Package directories are visited in name order so the result does not depend
    /// on the platform's directory listing order.
    pub fn discover_mods(&self) -> Result<Vec<DiscoveredMod>, ModError> {
        info!("Discovering mods in {:?}", self.mods_dir);

        if !self.mods_dir.exists() {
            debug!("Mods directory does not exist: {:?}", self.mods_dir);
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.mods_dir).map_err(|e| {
            ModError::Io(format!("Failed to read mods directory: {}", e))
        })?;

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                ModError::Io(format!("Failed to read directory entry: {}", e))
            })?;
            let path = entry.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();

        let mut mods = Vec::new();
        for dir in dirs {
            match self.discover_in(&dir) {
                Ok(Some(discovered)) => mods.push(discovered),
                Ok(None) => {}
                Err(e) => warn!("Skipping mod directory {:?}: {}", dir, e),
            }
        }

        info!("Discovered {} mods", mods.len());
        Ok(mods)
    }

    /// Discover a specific mod by name
    pub fn discover_mod(&self, mod_name: &str) -> Result<DiscoveredMod, ModError> {
        let mod_dir = self.mods_dir.join(mod_name);
        self.discover_in(&mod_dir)?.ok_or_else(|| {
            ModError::ModNotFound(format!(
                "Mod {} not found (no manifest in {:?})",
                mod_name, mod_dir
            ))
        })
    }

    fn discover_in(&self, dir: &Path) -> Result<Option<DiscoveredMod>, ModError> {
        let Some(manifest_path) = MANIFEST_FILES
            .iter()
            .map(|file| dir.join(file))
            .find(|path| path.is_file())
        else {
            debug!("No manifest found in {:?}, skipping", dir);
            return Ok(None);
        };

        let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
            return Err(ModError::InvalidManifest(format!(
                "Directory name {:?} is not valid UTF-8",
                dir
            )));
        };

        let manifest = ModManifest::from_file(&manifest_path)?;

        if let ValidationResult::Invalid(errors) = self.validator.validate(name, &manifest) {
            return Err(ModError::InvalidManifest(errors.join("; ")));
        }

        if !manifest.name.is_empty() && manifest.name != name {
            debug!("Mod {} is displayed as '{}'", name, manifest.name);
        }

        debug!("Discovered mod {} at {:?}", name, dir);
        Ok(Some(DiscoveredMod {
            manifest_path,
            descriptor: ModDescriptor::new(name, manifest, &self.mods_dir),
        }))
    }
}
