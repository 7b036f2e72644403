//! Mod dependency resolution
//!
//! Checks a mod's direct dependencies against either the catalog (bulk pass before
//! activation) or a live set of running mods, and computes a load order.

use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

use crate::module::registry::catalog::ModEntry;
use crate::module::registry::manifest::ModDescriptor;
use crate::module::traits::{ActiveMods, ModError};

/// Where dependency names are resolved
#[derive(Clone, Copy)]
pub enum ResolutionContext<'a> {
    /// Catalog entries; a dependency counts only if its entry is `Active`
    Entries(&'a [ModEntry]),
    /// Mods already running in a live manager
    Live(&'a dyn ActiveMods),
}

impl ResolutionContext<'_> {
    fn is_satisfied(&self, dependency: &str) -> bool {
        match self {
            ResolutionContext::Entries(entries) => entries
                .iter()
                .find(|e| e.name() == dependency)
                .map_or(false, |e| e.is_active()),
            ResolutionContext::Live(active) => active.is_active(dependency),
        }
    }
}

impl std::fmt::Debug for ResolutionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionContext::Entries(entries) => {
                f.debug_tuple("Entries").field(&entries.len()).finish()
            }
            ResolutionContext::Live(_) => f.write_str("Live"),
        }
    }
}

/// Load order result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOrder {
    /// Mods in load order (dependencies first)
    pub order: Vec<String>,
    /// Mods that are part of, or depend on, a dependency cycle
    pub cyclic: Vec<String>,
}

impl LoadOrder {
    /// Fail with [`ModError::CircularDependency`] if any mod could not be ordered
    pub fn ensure_acyclic(&self) -> Result<(), ModError> {
        if self.cyclic.is_empty() {
            Ok(())
        } else {
            Err(ModError::CircularDependency(self.cyclic.clone()))
        }
    }
}

/// Dependency resolver
pub struct ModDependencies;

impl ModDependencies {
    /// Direct dependencies of a mod that are not satisfied in `context`
    ///
    /// Only direct dependencies are checked. Names are de-duplicated and keep their
    /// declared order.
    pub fn missing(dependencies: &[String], context: ResolutionContext<'_>) -> Vec<String> {
        let mut seen = HashSet::new();
        dependencies
            .iter()
            .filter(|dep| seen.insert(dep.as_str()))
            .filter(|dep| !context.is_satisfied(dep))
            .cloned()
            .collect()
    }

    /// Order mods so each comes after the dependencies it shares with the set
    ///
    /// Dependencies on mods outside `descriptors` are ignored here; they are caught
    /// by the dependency gate at init. Ties keep the input order.
    pub fn load_order<'a>(descriptors: impl IntoIterator<Item = &'a ModDescriptor>) -> LoadOrder {
        let descriptors: Vec<&ModDescriptor> = descriptors.into_iter().collect();
        let known: HashSet<&str> = descriptors.iter().map(|d| d.name()).collect();

        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for descriptor in &descriptors {
            let mut seen = HashSet::new();
            let deps: Vec<&str> = descriptor
                .dependencies()
                .iter()
                .map(String::as_str)
                .filter(|dep| known.contains(dep) && seen.insert(*dep))
                .collect();
            in_degree.insert(descriptor.name(), deps.len());
            for dep in deps {
                dependents.entry(dep).or_default().push(descriptor.name());
            }
        }

        // Kahn's algorithm
        let mut queue: VecDeque<&str> = descriptors
            .iter()
            .map(|d| d.name())
            .filter(|name| in_degree.get(name) == Some(&0))
            .collect();

        let mut order = Vec::with_capacity(descriptors.len());
        while let Some(name) = queue.pop_front() {
            order.push(name.to_string());
            for dependent in dependents.get(name).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(*dependent);
                    }
                }
            }
        }

        let ordered: HashSet<&str> = order.iter().map(String::as_str).collect();
        let cyclic: Vec<String> = descriptors
            .iter()
            .map(|d| d.name())
            .filter(|name| !ordered.contains(name))
            .map(str::to_string)
            .collect();

        debug!("Load order: {:?}, unresolvable: {:?}", order, cyclic);
        LoadOrder { order, cyclic }
    }
}
