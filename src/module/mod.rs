//! Mod system
//!
//! Discovers mod packages, gates them on their declared dependencies, compiles
//! their scripts through a pluggable compiler and drives each one through
//! init, start and destroy while overlaying its files onto the asset search path.
//!
//! ## Architecture
//!
//! - **Registry**: manifests, discovery, the catalog of known mods and the
//!   dependency resolver
//! - **Lifecycle**: the per-mod engine (init / start / destroy)
//! - **Manager**: bulk activation pass and runtime enable/disable
//! - **Failure Containment**: a broken mod never stops the others from loading

pub mod assets;
pub mod lifecycle;
pub mod loader;
pub mod manager;
pub mod overlay;
pub mod package;
pub mod registry;
pub mod traits;
pub mod validation;

pub use assets::FileAssetStore;
pub use lifecycle::ModLifecycle;
pub use manager::{LoadSummary, ModManager};
pub use overlay::SearchPathOverlay;
pub use package::{FailureKind, ModPackage, ModState};
pub use registry::{ModCatalog, ModDescriptor, ModEntry, ModManifest, ModStatus, ResolutionContext};
pub use traits::{
    ActiveMods, ArchiveHandle, ArchiveRequest, AssetOverlay, AssetStore, CodeCompiler, CodeUnit,
    CompileError, ModError, ModScript, SourceFile, TypeDescriptor,
};
