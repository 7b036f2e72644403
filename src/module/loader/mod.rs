//! Mod script loading
//!
//! Collects a mod's script sources for compilation.

pub mod loader;

pub use loader::ScriptLoader;
