//! Mod lifecycle engine
//!
//! Drives a single [`ModPackage`] through init, start and destroy:
//!
//! - **Init** gates on dependencies before touching anything, then registers the
//!   mod's root with the asset overlay and compiles its `Scripts` batch.
//! - **Start** finds the code unit's entry-point type, instantiates it and calls it
//!   once with the owning package.
//! - **Destroy** revokes the overlay registration. It is safe in any state.
//!
//! Failures are scoped to the mod being processed and reported through logging and
//! the returned `Result`; nothing here aborts the host.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::ModLoaderConfig;
use crate::module::loader::ScriptLoader;
use crate::module::package::{FailureKind, ModPackage, ModState};
use crate::module::registry::dependencies::{ModDependencies, ResolutionContext};
use crate::module::traits::{AssetOverlay, CodeCompiler, CodeUnit, ModError};

/// Lifecycle engine shared by every mod of one loader
pub struct ModLifecycle {
    compiler: Arc<dyn CodeCompiler>,
    overlay: Arc<dyn AssetOverlay>,
    scripts_dir: String,
    source_extension: String,
    entry_point: String,
    allow_host_api: bool,
}

impl ModLifecycle {
    pub fn new(
        config: &ModLoaderConfig,
        compiler: Arc<dyn CodeCompiler>,
        overlay: Arc<dyn AssetOverlay>,
    ) -> Self {
        Self {
            compiler,
            overlay,
            scripts_dir: config.scripts_dir.clone(),
            source_extension: config.source_extension.clone(),
            entry_point: config.entry_point.clone(),
            allow_host_api: config.allow_host_api,
        }
    }

    /// Reserved name of the entry-point type
    pub fn entry_point_name(&self) -> &str {
        &self.entry_point
    }

    /// Initialize a mod
    ///
    /// Allowed from `Uninitialized`, `Failed` and `Destroyed`, so a mod that failed
    /// its dependency gate can be retried once the dependency is active.
    pub fn init(
        &self,
        package: &mut ModPackage,
        context: ResolutionContext<'_>,
    ) -> Result<(), ModError> {
        let name = package.name().to_string();
        if !package.state.can_init() {
            return Err(ModError::InvalidState {
                name,
                state: package.state.to_string(),
            });
        }

        package.state = ModState::Initializing;

        let missing = ModDependencies::missing(package.descriptor().dependencies(), context);
        if !missing.is_empty() {
            for dep in &missing {
                error!("Mod: '{}' is missing a dependency '{}'", name, dep);
            }
            error!("Make sure all dependencies for mod '{}' are met.", name);
            // A retry after a compile failure still holds the earlier registration
            if package.overlay_registered {
                self.overlay.unregister_search_path(package.install_path());
                package.overlay_registered = false;
            }
            package.code_unit = None;
            package.script = None;
            package.state = ModState::Failed(FailureKind::MissingDependencies);
            return Err(ModError::MissingDependencies { name, missing });
        }

        // Assets are overlaid even if the mod ships no code or its code is broken
        self.overlay.register_search_path(package.install_path());
        package.overlay_registered = true;
        package.code_unit = None;
        package.script = None;

        let scripts_dir = package.install_path().join(&self.scripts_dir);
        let sources = match ScriptLoader::collect_sources(&scripts_dir, &self.source_extension) {
            Ok(Some(sources)) if !sources.is_empty() => sources,
            Ok(_) => {
                info!("Mod {} initialized (assets only)", name);
                package.state = ModState::Initialized;
                return Ok(());
            }
            Err(e) => {
                error!("Scripts for mod '{}' couldn't be read: {}", name, e);
                package.state = ModState::Failed(FailureKind::Compile);
                return Err(e);
            }
        };

        match self.compiler.compile(&name, &sources, self.allow_host_api) {
            Ok(unit) => {
                package.code_unit = Some(unit);
                package.state = ModState::Initialized;
                info!("Mod {} initialized ({} script(s) compiled)", name, sources.len());
                Ok(())
            }
            Err(e) => {
                error!("Code unit for mod '{}' couldn't be compiled: {}", name, e);
                package.state = ModState::Failed(FailureKind::Compile);
                Err(ModError::Compile {
                    name,
                    diagnostics: e.to_string(),
                })
            }
        }
    }

    /// Start a mod by invoking its entry point
    ///
    /// A mod without code, without an entry-point type, or whose entry point cannot
    /// be constructed starts without running anything. Mods that did not initialize
    /// are skipped.
    pub fn start(&self, package: &mut ModPackage) -> Result<(), ModError> {
        let name = package.name().to_string();
        match package.state {
            ModState::Initialized => {}
            ModState::Uninitialized | ModState::Failed(_) => {
                debug!("Mod {} is not initialized, nothing to start", name);
                return Ok(());
            }
            ModState::Started | ModState::StartFailed => {
                debug!("Mod {} was already started", name);
                return Ok(());
            }
            state => {
                return Err(ModError::InvalidState {
                    name,
                    state: state.to_string(),
                });
            }
        }

        package.state = ModState::Starting;

        let Some(unit) = package.code_unit.clone() else {
            package.state = ModState::Started;
            return Ok(());
        };

        let Some(type_name) = self.find_entry_point(unit.as_ref()) else {
            debug!("Mod {} has no '{}' entry point", name, self.entry_point);
            package.state = ModState::Started;
            return Ok(());
        };

        let mut script = match unit.instantiate(&type_name) {
            Ok(Some(script)) => script,
            Ok(None) => {
                debug!("Entry point '{}' of mod {} is not a script", type_name, name);
                package.state = ModState::Started;
                return Ok(());
            }
            Err(e) => {
                warn!("Entry point '{}' of mod {} could not be created: {}", type_name, name, e);
                package.state = ModState::Started;
                return Ok(());
            }
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| script.start(&*package)));
        let reason = match outcome {
            Ok(Ok(())) => {
                package.script = Some(script);
                package.state = ModState::Started;
                info!("Mod {} started", name);
                return Ok(());
            }
            Ok(Err(e)) => e.to_string(),
            Err(panic) => panic_message(panic.as_ref()),
        };

        warn!("Entry point of mod {} failed: {}", name, reason);
        package.state = ModState::StartFailed;
        Err(ModError::ScriptFailed { name, reason })
    }

    /// Tear a mod down, revoking its overlay registration
    ///
    /// Safe to call in any state and any number of times.
    pub fn destroy(&self, package: &mut ModPackage) {
        if package.state == ModState::Destroyed {
            debug!("Mod {} already destroyed", package.name());
            return;
        }

        if package.overlay_registered {
            self.overlay.unregister_search_path(package.install_path());
            package.overlay_registered = false;
        }
        package.script = None;
        package.code_unit = None;
        package.state = ModState::Destroyed;
        info!("Mod {} destroyed", package.name());
    }

    /// Entry-point type of a code unit
    ///
    /// A type designated by the unit wins; otherwise the first exported type whose
    /// name equals the reserved entry-point name.
    fn find_entry_point(&self, unit: &dyn CodeUnit) -> Option<String> {
        if let Some(designated) = unit.entry_point() {
            return Some(designated);
        }
        unit.exported_types()
            .into_iter()
            .find(|t| t.name == self.entry_point)
            .map(|t| t.name)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
