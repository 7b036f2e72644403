//! modhost - mod loader for game hosts
//!
//! This crate discovers externally authored mod packages, validates their declared
//! dependencies, compiles their scripts at runtime through a host-provided compiler
//! and drives each mod through init, start and destroy while overlaying its files
//! onto the host's asset search path.
//!
//! ## Package Layout
//!
//! ```text
//! Mods/
//!   <Name>/
//!     mod.toml            name, author, version, gameVersion, dependencies
//!     Scripts/*.src       compiled together as one batch
//!     Bundles/<path>      archives loaded through the mod's package handle
//! ```
//!
//! ## Design Principles
//!
//! 1. **Dependency Gate First**: a mod with a missing dependency acquires nothing
//! 2. **Assets Survive Broken Code**: a compile failure keeps the mod's overlay
//! 3. **Failure Containment**: one broken mod never stops the others
//! 4. **Injected Collaborators**: compiler, overlay and archive store are traits

pub mod config;
pub mod module;
pub mod utils;

pub use config::ModLoaderConfig;
pub use module::{
    ActiveMods, AssetOverlay, AssetStore, CodeCompiler, CodeUnit, CompileError, ModError,
    ModManager, ModPackage, ModScript, ModState, ModStatus,
};
