//! Mod manager for orchestrating all mods
//!
//! Owns the catalog and every mod's package, computes the load order, runs the
//! bulk activation pass and drives each mod through the lifecycle engine. The
//! compiler, overlay and archive store are injected; nothing is global.
//!
//! All mutation goes through `&mut self`, so init/start/destroy of different mods
//! can never interleave.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ModLoaderConfig;
use crate::module::lifecycle::ModLifecycle;
use crate::module::package::{FailureKind, ModPackage, ModState};
use crate::module::registry::{
    ModCatalog, ModDependencies, ModDescriptor, ModDiscovery, ModStatus, ResolutionContext,
};
use crate::module::traits::{ActiveMods, AssetOverlay, AssetStore, CodeCompiler, ModError};
use crate::utils::log_error;

/// Outcome of a bulk load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Mods that reached `Initialized`
    pub initialized: Vec<String>,
    /// Active mods whose init failed (their assets may still be overlaid)
    pub failed: Vec<String>,
    /// Enabled mods left `Incomplete` by missing or cyclic dependencies
    pub incomplete: Vec<String>,
}

/// Mod manager coordinates all known mods
pub struct ModManager {
    config: ModLoaderConfig,
    lifecycle: ModLifecycle,
    assets: Arc<dyn AssetStore>,
    catalog: ModCatalog,
    /// Runtime record per registered mod (name -> package)
    packages: HashMap<String, ModPackage>,
    /// Enabled mods in dependency order
    load_order: Vec<String>,
}

impl ModManager {
    /// Create a new mod manager
    pub fn new(
        config: ModLoaderConfig,
        compiler: Arc<dyn CodeCompiler>,
        overlay: Arc<dyn AssetOverlay>,
        assets: Arc<dyn AssetStore>,
    ) -> Self {
        let lifecycle = ModLifecycle::new(&config, compiler, overlay);
        Self {
            config,
            lifecycle,
            assets,
            catalog: ModCatalog::new(),
            packages: HashMap::new(),
            load_order: Vec::new(),
        }
    }

    pub fn config(&self) -> &ModLoaderConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ModCatalog {
        &self.catalog
    }

    pub fn package(&self, name: &str) -> Option<&ModPackage> {
        self.packages.get(name)
    }

    /// Enabled mods in the order they are initialized and started
    pub fn load_order(&self) -> &[String] {
        &self.load_order
    }

    /// A mod that is initialized and usable as a dependency
    pub fn get_active_mod(&self, name: &str) -> Option<&ModPackage> {
        self.packages.get(name).filter(|p| p.is_live())
    }

    /// Register a mod in the catalog and create its package
    pub fn register(&mut self, descriptor: ModDescriptor) -> Result<(), ModError> {
        let descriptor = Arc::new(descriptor);
        self.catalog.register(Arc::clone(&descriptor))?;
        let package =
            ModPackage::new(descriptor, &self.config.bundles_dir, Arc::clone(&self.assets));
        self.packages.insert(package.name().to_string(), package);
        Ok(())
    }

    /// Scan the mods directory and register every mod not yet known
    ///
    /// Returns the number of newly registered mods.
    pub fn discover(&mut self) -> Result<usize, ModError> {
        let discovery = ModDiscovery::new(&self.config.mods_dir);
        let mut added = 0;
        for discovered in discovery.discover_mods()? {
            let name = discovered.descriptor.name().to_string();
            if self.catalog.contains(&name) {
                continue;
            }
            match self.register(discovered.descriptor) {
                Ok(()) => added += 1,
                Err(e) => warn!("Failed to register mod {}: {}", name, e),
            }
        }
        Ok(added)
    }

    /// Compute catalog statuses for every registered mod
    ///
    /// Disabled mods become `Inactive`. Enabled mods are visited in dependency order
    /// and become `Active` when every dependency is `Active`, `Incomplete` otherwise.
    /// Mods caught in a dependency cycle are `Incomplete`.
    pub fn resolve_statuses(&mut self) -> Result<Vec<String>, ModError> {
        let enabled: Vec<Arc<ModDescriptor>> = self
            .catalog
            .all_entries()
            .iter()
            .filter(|e| self.config.is_enabled(e.name()))
            .map(|e| Arc::clone(e.descriptor()))
            .collect();

        for entry in self.catalog.all_entries().to_vec() {
            self.catalog.set_status(entry.name(), ModStatus::Inactive, Vec::new())?;
        }

        let resolution = ModDependencies::load_order(enabled.iter().map(|d| d.as_ref()));
        let mut incomplete = Vec::new();

        for name in &resolution.order {
            let entry = self.catalog.lookup(name)?;
            let missing = ModDependencies::missing(
                entry.descriptor().dependencies(),
                ResolutionContext::Entries(self.catalog.all_entries()),
            );
            if missing.is_empty() {
                self.catalog.set_status(name, ModStatus::Active, Vec::new())?;
            } else {
                self.catalog.set_status(name, ModStatus::Incomplete, missing)?;
                incomplete.push(name.clone());
            }
        }

        if let Err(e) = resolution.ensure_acyclic() {
            warn!("{}", e);
            let cyclic: HashSet<&str> = resolution.cyclic.iter().map(String::as_str).collect();
            for descriptor in enabled.iter().filter(|d| cyclic.contains(d.name())) {
                let blocked: Vec<String> = descriptor
                    .dependencies()
                    .iter()
                    .filter(|dep| cyclic.contains(dep.as_str()))
                    .cloned()
                    .collect();
                self.catalog
                    .set_status(descriptor.name(), ModStatus::Incomplete, blocked)?;
                incomplete.push(descriptor.name().to_string());
            }
        }

        self.load_order = resolution.order;
        Ok(incomplete)
    }

    /// Discover mods, resolve statuses and initialize every `Active` mod in load order
    ///
    /// Mods that are already loaded are reported but not initialized again, so the
    /// pass can be repeated after new mods were installed.
    pub fn load_all(&mut self) -> Result<LoadSummary, ModError> {
        info!("Loading mods from {:?}", self.config.mods_dir);
        self.discover()?;
        let incomplete = self.resolve_statuses()?;

        let mut summary = LoadSummary {
            incomplete,
            ..LoadSummary::default()
        };

        for name in self.load_order.clone() {
            if !self.catalog.lookup(&name)?.is_active() {
                continue;
            }
            let Some(package) = self.packages.get_mut(&name) else {
                continue;
            };
            if package.is_live() {
                debug!("Mod {} is already loaded ({})", name, package.state());
                if package.state() == ModState::Failed(FailureKind::Compile) {
                    summary.failed.push(name);
                } else {
                    summary.initialized.push(name);
                }
                continue;
            }
            match self
                .lifecycle
                .init(package, ResolutionContext::Entries(self.catalog.all_entries()))
            {
                Ok(()) => summary.initialized.push(name),
                Err(e) => {
                    warn!("Mod {} failed to initialize: {}", name, e);
                    summary.failed.push(name);
                }
            }
        }

        info!(
            "Loaded mods: {} initialized, {} failed, {} incomplete",
            summary.initialized.len(),
            summary.failed.len(),
            summary.incomplete.len()
        );
        Ok(summary)
    }

    /// Start every initialized mod in load order
    pub fn start_all(&mut self) {
        for name in &self.load_order {
            if let Some(package) = self.packages.get_mut(name) {
                log_error(
                    || self.lifecycle.start(package),
                    &format!("Failed to start mod {}", name),
                );
            }
        }
    }

    /// Activate a single mod at runtime against the mods already running
    ///
    /// On success the mod is initialized and started. A mod whose scripts fail to
    /// compile stays active with its assets overlaid and the error is returned.
    pub fn enable_mod(&mut self, name: &str) -> Result<(), ModError> {
        let live = self.live_names();
        let package = self
            .packages
            .get_mut(name)
            .ok_or_else(|| ModError::ModNotFound(name.to_string()))?;

        if package.is_live() {
            self.catalog.set_status(name, ModStatus::Active, Vec::new())?;
            Self::push_load_order(&mut self.load_order, name);
            return self.lifecycle.start(package);
        }

        match self.lifecycle.init(package, ResolutionContext::Live(&live)) {
            Ok(()) => {}
            Err(ModError::MissingDependencies { name, missing }) => {
                self.catalog
                    .set_status(&name, ModStatus::Incomplete, missing.clone())?;
                return Err(ModError::MissingDependencies { name, missing });
            }
            Err(e) if package.is_live() => {
                self.catalog.set_status(name, ModStatus::Active, Vec::new())?;
                Self::push_load_order(&mut self.load_order, name);
                return Err(e);
            }
            Err(e) => return Err(e),
        }

        self.catalog.set_status(name, ModStatus::Active, Vec::new())?;
        Self::push_load_order(&mut self.load_order, name);
        self.lifecycle.start(package)
    }

    /// Deactivate a single mod at runtime
    ///
    /// Dependents keep running; their dependency is only checked at init.
    pub fn disable_mod(&mut self, name: &str) -> Result<(), ModError> {
        let package = self
            .packages
            .get_mut(name)
            .ok_or_else(|| ModError::ModNotFound(name.to_string()))?;
        self.lifecycle.destroy(package);
        self.catalog.set_status(name, ModStatus::Inactive, Vec::new())?;
        self.load_order.retain(|n| n != name);

        let dependents: Vec<&str> = self
            .packages
            .values()
            .filter(|p| p.is_live() && p.descriptor().dependencies().iter().any(|d| d == name))
            .map(|p| p.name())
            .collect();
        if !dependents.is_empty() {
            warn!("Mod {} disabled while {:?} still depend on it", name, dependents);
        }
        Ok(())
    }

    /// Destroy every mod, dependents before their dependencies
    pub fn shutdown(&mut self) {
        info!("Shutting down mod manager");
        for name in self.load_order.iter().rev() {
            if let Some(package) = self.packages.get_mut(name) {
                self.lifecycle.destroy(package);
            }
        }
        // Mods outside the load order may still hold overlay registrations
        for package in self.packages.values_mut() {
            self.lifecycle.destroy(package);
        }
        info!("Mod manager shut down");
    }

    fn live_names(&self) -> HashSet<String> {
        self.packages
            .values()
            .filter(|p| p.is_live())
            .map(|p| p.name().to_string())
            .collect()
    }

    fn push_load_order(load_order: &mut Vec<String>, name: &str) {
        if !load_order.iter().any(|n| n == name) {
            load_order.push(name.to_string());
        }
    }
}

impl ActiveMods for ModManager {
    fn is_active(&self, name: &str) -> bool {
        self.get_active_mod(name).is_some()
    }
}
