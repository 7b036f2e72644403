//! Mod system traits and interfaces
//!
//! Defines the error type and the capabilities the loader consumes from the host:
//! the script compiler, the asset search-path overlay, the archive store, and the
//! live "which mods are running" query.

use bytes::Bytes;
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::module::package::ModPackage;

/// Mod system errors
#[derive(Debug, Error)]
pub enum ModError {
    #[error("Mod '{name}' is missing dependencies: {missing:?}")]
    MissingDependencies { name: String, missing: Vec<String> },

    #[error("Code unit for mod '{name}' couldn't be compiled: {diagnostics}")]
    Compile { name: String, diagnostics: String },

    #[error("Entry point '{type_name}' of mod '{name}' could not be instantiated: {reason}")]
    Instantiation {
        name: String,
        type_name: String,
        reason: String,
    },

    #[error("Entry point of mod '{name}' failed: {reason}")]
    ScriptFailed { name: String, reason: String },

    #[error("Mod not found: {0}")]
    ModNotFound(String),

    #[error("Mod already registered: {0}")]
    DuplicateMod(String),

    #[error("Invalid mod manifest: {0}")]
    InvalidManifest(String),

    #[error("Invalid mod status: {0}")]
    InvalidStatus(String),

    #[error("Mod '{name}' cannot do this while {state}")]
    InvalidState { name: String, state: String },

    #[error("Circular dependency between mods: {0:?}")]
    CircularDependency(Vec<String>),

    #[error("Asset error: {0}")]
    Asset(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for ModError {
    fn from(e: std::io::Error) -> Self {
        ModError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ModError {
    fn from(e: serde_json::Error) -> Self {
        ModError::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for ModError {
    fn from(e: toml::de::Error) -> Self {
        ModError::SerializationError(e.to_string())
    }
}

/// Diagnostics returned by a [`CodeCompiler`] when a source batch does not build
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}", diagnostics.join("; "))]
pub struct CompileError {
    pub diagnostics: Vec<String>,
}

impl CompileError {
    pub fn new(diagnostics: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            diagnostics: diagnostics.into_iter().map(Into::into).collect(),
        }
    }
}

/// One script file handed to the compiler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Where the text was read from
    pub path: PathBuf,
    /// Full source text
    pub text: String,
}

/// A type exported by a compiled code unit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    /// Fully qualified type name as reported by the backend
    pub name: String,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Compiles a mod's script batch into a loadable code unit
///
/// All sources of one mod are compiled together so they can reference each other.
/// Identical input must produce the same outcome; failures are reported through
/// [`CompileError`], never by panicking.
pub trait CodeCompiler: Send + Sync {
    fn compile(
        &self,
        unit_name: &str,
        sources: &[SourceFile],
        allow_host_api: bool,
    ) -> Result<Arc<dyn CodeUnit>, CompileError>;
}

/// The runtime-loadable result of compiling a mod's sources
pub trait CodeUnit: Send + Sync {
    /// Types exported by this unit, in the backend's declaration order
    fn exported_types(&self) -> Vec<TypeDescriptor>;

    /// Construct an instance of `type_name` as an entry point
    ///
    /// `Ok(None)` means the type exists but does not provide the entry-point capability.
    fn instantiate(&self, type_name: &str) -> Result<Option<Box<dyn ModScript>>, ModError>;

    /// Type the unit designates as its entry point, if the backend knows it
    ///
    /// When `None`, the loader searches [`exported_types`](Self::exported_types) for the
    /// configured reserved entry-point name.
    fn entry_point(&self) -> Option<String> {
        None
    }
}

/// Entry-point capability implemented by a mod's designated script type
pub trait ModScript: Send {
    /// Called exactly once after the owning mod has been initialized
    fn start(&mut self, package: &ModPackage) -> Result<(), ModError>;
}

/// Prioritized virtual file-resolution search order shared with the host
///
/// Implementations use interior mutability; registering an already present path
/// or removing an absent one must leave the order untouched.
pub trait AssetOverlay: Send + Sync {
    /// Add `path` to the search order. Returns `false` if it was already present.
    fn register_search_path(&self, path: &Path) -> bool;

    /// Remove `path` from the search order. Returns `false` if it was not present.
    fn unregister_search_path(&self, path: &Path) -> bool;
}

/// A loaded binary archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHandle {
    pub path: PathBuf,
    pub data: Bytes,
}

/// Pending asynchronous archive load
pub type ArchiveRequest = BoxFuture<'static, Result<ArchiveHandle, ModError>>;

/// The host's binary archive loader
pub trait AssetStore: Send + Sync {
    /// Load an archive synchronously
    fn load_archive(&self, path: &Path, offset: u64) -> Result<ArchiveHandle, ModError>;

    /// Start loading an archive without blocking the caller
    fn load_archive_async(&self, path: PathBuf, offset: u64) -> ArchiveRequest;
}

/// Live query over mods that are already running
pub trait ActiveMods {
    fn is_active(&self, name: &str) -> bool;
}

impl ActiveMods for std::collections::HashSet<String> {
    fn is_active(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl ActiveMods for std::collections::BTreeSet<String> {
    fn is_active(&self, name: &str) -> bool {
        self.contains(name)
    }
}
