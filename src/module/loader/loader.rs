//! Script source collection
//!
//! Reads every source file of a mod's `Scripts` directory into one compilation batch.

use std::fs;
use std::path::Path;
use tracing::{debug, trace};

use crate::module::traits::{ModError, SourceFile};

/// Collects script sources from a mod's scripts directory
pub struct ScriptLoader;

impl ScriptLoader {
    /// Read all files with `extension` directly inside `scripts_dir`
    ///
    /// Returns `Ok(None)` when the directory does not exist. Subdirectories are not
    /// descended into. Files are returned sorted by file name so the batch handed to
    /// the compiler is the same on every platform.
    pub fn collect_sources<P: AsRef<Path>>(
        scripts_dir: P,
        extension: &str,
    ) -> Result<Option<Vec<SourceFile>>, ModError> {
        let scripts_dir = scripts_dir.as_ref();
        if !scripts_dir.is_dir() {
            debug!("No scripts directory at {:?}", scripts_dir);
            return Ok(None);
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(scripts_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) == Some(extension) {
                paths.push(path);
            } else {
                trace!("Ignoring non-source file {:?}", path);
            }
        }
        paths.sort();

        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let text = fs::read_to_string(&path).map_err(|e| {
                ModError::Io(format!("Failed to read script {:?}: {}", path, e))
            })?;
            sources.push(SourceFile { path, text });
        }

        debug!("Collected {} script(s) from {:?}", sources.len(), scripts_dir);
        Ok(Some(sources))
    }
}
