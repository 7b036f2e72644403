//! Mod manifest parsing
//!
//! Handles parsing `mod.toml` / `mod.json` manifests into mod descriptors.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::module::traits::ModError;

/// Manifest file names probed in each package directory, in order
pub const MANIFEST_FILES: [&str; 2] = ["mod.toml", "mod.json"];

/// Mod manifest (mod.toml / mod.json structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModManifest {
    /// Display name; the package is identified by its directory name
    #[serde(default)]
    pub name: String,
    /// Mod author
    #[serde(default)]
    pub author: String,
    /// Free-form version string
    #[serde(default)]
    pub version: String,
    /// Game version the mod was built for
    #[serde(default, alias = "game_version")]
    pub game_version: String,
    /// Names of mods that must be active before this one
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl ModManifest {
    /// Load manifest from file. `.json` files are parsed as JSON, anything else as TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ModError::InvalidManifest(format!("Failed to read manifest file: {}", e))
        })?;

        let manifest: ModManifest = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&contents).map_err(|e| {
                ModError::InvalidManifest(format!("Failed to parse manifest JSON: {}", e))
            })?,
            _ => toml::from_str(&contents).map_err(|e| {
                ModError::InvalidManifest(format!("Failed to parse manifest TOML: {}", e))
            })?,
        };

        Ok(manifest)
    }

    /// Convert to a descriptor rooted under `mods_root`, identified by the manifest name
    pub fn into_descriptor<P: AsRef<Path>>(self, mods_root: P) -> ModDescriptor {
        let name = self.name.clone();
        ModDescriptor::new(name, self, mods_root)
    }
}

/// Static identity of one mod package
///
/// The name is the package's directory name. The install path is derived from it
/// once at construction and never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModDescriptor {
    name: String,
    manifest: ModManifest,
    install_path: PathBuf,
}

impl ModDescriptor {
    pub fn new<P: AsRef<Path>>(
        name: impl Into<String>,
        manifest: ModManifest,
        mods_root: P,
    ) -> Self {
        let name = name.into();
        let install_path = mods_root.as_ref().join(&name);
        Self {
            name,
            manifest,
            install_path,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name shown to players; falls back to the package name
    pub fn display_name(&self) -> &str {
        if self.manifest.name.is_empty() {
            &self.name
        } else {
            &self.manifest.name
        }
    }

    #[inline]
    pub fn author(&self) -> &str {
        &self.manifest.author
    }

    #[inline]
    pub fn version(&self) -> &str {
        &self.manifest.version
    }

    #[inline]
    pub fn game_version(&self) -> &str {
        &self.manifest.game_version
    }

    #[inline]
    pub fn dependencies(&self) -> &[String] {
        &self.manifest.dependencies
    }

    /// Root directory of the package, `<mods root>/<name>`
    #[inline]
    pub fn install_path(&self) -> &Path {
        &self.install_path
    }

    pub fn manifest(&self) -> &ModManifest {
        &self.manifest
    }
}
