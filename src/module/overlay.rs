//! Asset search-path overlay
//!
//! In-memory prioritized search order. Mods register their install directory so
//! their files shadow the base game's; the most recently registered path wins.

use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::module::traits::AssetOverlay;

/// Prioritized list of optional search paths
#[derive(Debug, Default)]
pub struct SearchPathOverlay {
    /// Registration order; lookups walk it back to front
    paths: RwLock<Vec<PathBuf>>,
}

impl SearchPathOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<PathBuf>> {
        self.paths.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<PathBuf>> {
        self.paths.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Registered paths in registration order
    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.read().clone()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.read().iter().any(|p| p == path)
    }

    /// Resolve `relative` against the search order, highest priority first
    pub fn resolve<P: AsRef<Path>>(&self, relative: P) -> Option<PathBuf> {
        let relative = relative.as_ref();
        self.read()
            .iter()
            .rev()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.exists())
    }
}

impl AssetOverlay for SearchPathOverlay {
    fn register_search_path(&self, path: &Path) -> bool {
        let mut paths = self.write();
        if paths.iter().any(|p| p == path) {
            debug!("Search path {:?} already registered", path);
            return false;
        }
        debug!("Registering search path {:?}", path);
        paths.push(path.to_path_buf());
        true
    }

    fn unregister_search_path(&self, path: &Path) -> bool {
        let mut paths = self.write();
        let before = paths.len();
        paths.retain(|p| p != path);
        let removed = paths.len() != before;
        if removed {
            debug!("Unregistered search path {:?}", path);
        }
        removed
    }
}
