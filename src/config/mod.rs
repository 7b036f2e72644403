//! Configuration management for the mod loader
//!
//! Handles loading the loader configuration from TOML or JSON files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Mod loader configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModLoaderConfig {
    /// Directory containing one subdirectory per mod
    #[serde(default = "default_mods_dir")]
    pub mods_dir: PathBuf,

    /// Mods to activate (empty = every discovered mod)
    #[serde(default)]
    pub enabled_mods: Vec<String>,

    /// Script directory name inside each mod
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: String,

    /// Archive directory name inside each mod
    #[serde(default = "default_bundles_dir")]
    pub bundles_dir: String,

    /// Extension (without dot) that marks a file in the scripts directory as source
    #[serde(default = "default_source_extension")]
    pub source_extension: String,

    /// Reserved type name of a mod's entry point
    #[serde(default = "default_entry_point")]
    pub entry_point: String,

    /// Let mod code reference the host API and unsafe constructs
    #[serde(default = "default_true")]
    pub allow_host_api: bool,

    /// Log filter (e.g. "info", "modhost=debug"); RUST_LOG takes precedence
    #[serde(default)]
    pub log_filter: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_mods_dir() -> PathBuf {
    PathBuf::from("Mods")
}

fn default_scripts_dir() -> String {
    "Scripts".to_string()
}

fn default_bundles_dir() -> String {
    "Bundles".to_string()
}

fn default_source_extension() -> String {
    "src".to_string()
}

fn default_entry_point() -> String {
    "ScriptMain".to_string()
}

impl Default for ModLoaderConfig {
    fn default() -> Self {
        Self {
            mods_dir: default_mods_dir(),
            enabled_mods: Vec::new(),
            scripts_dir: default_scripts_dir(),
            bundles_dir: default_bundles_dir(),
            source_extension: default_source_extension(),
            entry_point: default_entry_point(),
            allow_host_api: true,
            log_filter: None,
        }
    }
}

impl ModLoaderConfig {
    /// Default configuration rooted at `mods_dir`
    pub fn with_mods_dir<P: AsRef<Path>>(mods_dir: P) -> Self {
        Self {
            mods_dir: mods_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Load configuration from TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ModLoaderConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_toml_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ModLoaderConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from file, picking the format by extension
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Whether `name` should be activated
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled_mods.is_empty() || self.enabled_mods.iter().any(|m| m == name)
    }
}
