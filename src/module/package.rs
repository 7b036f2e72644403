//! Mod package runtime record
//!
//! A [`ModPackage`] is one mod as seen by the lifecycle engine: its descriptor, its
//! compiled code unit, the started entry-point instance and its lifecycle state.
//! It is also the handle passed to a mod's entry point, which uses it to load
//! archives from its own `Bundles` directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::module::registry::manifest::ModDescriptor;
use crate::module::traits::{
    ArchiveHandle, ArchiveRequest, AssetStore, CodeUnit, ModError, ModScript,
};

/// Why a mod's init failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// At least one dependency was not active; nothing was registered
    MissingDependencies,
    /// Sources did not compile; the asset overlay stays registered
    Compile,
}

/// Lifecycle state of one mod package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModState {
    Uninitialized,
    Initializing,
    Initialized,
    Failed(FailureKind),
    Starting,
    Started,
    StartFailed,
    Destroyed,
}

impl ModState {
    /// Whether init may run from this state
    pub fn can_init(&self) -> bool {
        matches!(
            self,
            ModState::Uninitialized | ModState::Failed(_) | ModState::Destroyed
        )
    }
}

impl std::fmt::Display for ModState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModState::Failed(kind) => write!(f, "Failed({:?})", kind),
            other => write!(f, "{:?}", other),
        }
    }
}

/// One mod's runtime record
pub struct ModPackage {
    descriptor: Arc<ModDescriptor>,
    bundles_dir: PathBuf,
    assets: Arc<dyn AssetStore>,
    pub(crate) state: ModState,
    pub(crate) code_unit: Option<Arc<dyn CodeUnit>>,
    pub(crate) script: Option<Box<dyn ModScript>>,
    pub(crate) overlay_registered: bool,
}

impl ModPackage {
    /// Create a package whose archives are looked up in `<install>/<bundles_dir_name>`
    pub fn new(
        descriptor: Arc<ModDescriptor>,
        bundles_dir_name: &str,
        assets: Arc<dyn AssetStore>,
    ) -> Self {
        let bundles_dir = descriptor.install_path().join(bundles_dir_name);
        Self {
            descriptor,
            bundles_dir,
            assets,
            state: ModState::Uninitialized,
            code_unit: None,
            script: None,
            overlay_registered: false,
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

    /// Root directory of the mod
    #[inline]
    pub fn install_path(&self) -> &Path {
        self.descriptor.install_path()
    }

    #[inline]
    pub fn state(&self) -> ModState {
        self.state
    }

    /// Compiled code, present once init compiled the mod's scripts
    pub fn code_unit(&self) -> Option<&Arc<dyn CodeUnit>> {
        self.code_unit.as_ref()
    }

    /// Whether a started entry-point instance is held
    pub fn has_running_script(&self) -> bool {
        self.script.is_some()
    }

    /// Whether the install path is currently registered with the overlay
    pub fn is_overlay_registered(&self) -> bool {
        self.overlay_registered
    }

    /// Whether other mods may depend on this one
    ///
    /// A mod whose scripts failed to compile still contributes its assets and counts.
    pub fn is_live(&self) -> bool {
        matches!(
            self.state,
            ModState::Initialized
                | ModState::Starting
                | ModState::Started
                | ModState::StartFailed
                | ModState::Failed(FailureKind::Compile)
        )
    }

    fn bundle_path(&self, path: &Path) -> Option<PathBuf> {
        if !self.bundles_dir.is_dir() {
            debug!("Mod {} has no bundles directory", self.name());
            return None;
        }
        Some(self.bundles_dir.join(path))
    }

    /// Load an archive from this mod's bundles directory
    ///
    /// Returns `None` if the mod ships no bundles directory.
    pub fn load_bundle<P: AsRef<Path>>(
        &self,
        path: P,
        offset: u64,
    ) -> Option<Result<ArchiveHandle, ModError>> {
        let full = self.bundle_path(path.as_ref())?;
        Some(self.assets.load_archive(&full, offset))
    }

    /// Start an asynchronous archive load from this mod's bundles directory
    ///
    /// Returns `None` if the mod ships no bundles directory. The returned request is
    /// independent of the package and may be spawned or awaited later.
    pub fn load_bundle_async<P: AsRef<Path>>(
        &self,
        path: P,
        offset: u64,
    ) -> Option<ArchiveRequest> {
        let full = self.bundle_path(path.as_ref())?;
        Some(self.assets.load_archive_async(full, offset))
    }
}

impl std::fmt::Debug for ModPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModPackage")
            .field("name", &self.name())
            .field("state", &self.state)
            .field("has_code", &self.code_unit.is_some())
            .field("has_script", &self.script.is_some())
            .field("overlay_registered", &self.overlay_registered)
            .finish_non_exhaustive()
    }
}
