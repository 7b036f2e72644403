//! Mod registry and discovery
//!
//! Handles mod discovery, manifest parsing, the catalog and dependency resolution.

pub mod catalog;
pub mod dependencies;
pub mod discovery;
pub mod manifest;

pub use catalog::{ModCatalog, ModEntry, ModStatus};
pub use dependencies::{LoadOrder, ModDependencies, ResolutionContext};
pub use discovery::{DiscoveredMod, ModDiscovery};
pub use manifest::{ModDescriptor, ModManifest};
