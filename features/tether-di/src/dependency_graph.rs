use std::{
    any::TypeId,
    collections::{BTreeMap, HashSet},
};

use thiserror::Error;

use crate::{
    errors::display_chain,
    types::{DependencyInfo, TypeInfo},
};

/// Graph of all registered interfaces and the parameters their factories declare
///
/// Built on demand by [Container::graph](crate::Container::graph). Registration never
/// validates anything, [DependencyGraph::check] reports missing dependencies and cycles
/// before they surface during resolution.
#[derive(Default)]
pub struct DependencyGraph {
    map: BTreeMap<TypeId, DependencyGraphEntry>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an interface, replacing an earlier entry for it
    pub fn add(&mut self, info: TypeInfo, dependencies: Vec<DependencyInfo>) {
        self.map
            .insert(info.type_id, DependencyGraphEntry { info, dependencies });
    }

    pub fn contains(&self, info: &TypeInfo) -> bool {
        self.map.contains_key(&info.type_id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Validate the graph
    ///
    /// Returns a list of all issues
    pub fn check(&self) -> Result<(), DependencyGraphErrors> {
        let mut checked = HashSet::new();
        let mut errors = Vec::new();
        for entry in self.map.values() {
            let mut dependency_chain = Vec::new();
            check_recurse(
                self,
                &mut checked,
                &mut errors,
                &mut dependency_chain,
                entry,
            );
        }

        if !errors.is_empty() {
            return Err(DependencyGraphErrors { errors });
        }

        return Ok(());

        fn check_recurse(
            graph: &DependencyGraph,
            checked: &mut HashSet<TypeId>,
            errors: &mut Vec<DependencyGraphError>,
            dependency_chain: &mut Vec<TypeInfo>,
            entry: &DependencyGraphEntry,
        ) {
            // Circular Dependency Check
            if let Some(from) = dependency_chain.first().copied() {
                if dependency_chain.contains(&entry.info) {
                    let to = entry.info;
                    let mut chain = dependency_chain.clone();
                    chain.push(to); // Add current so chain is complete

                    errors.push(DependencyGraphError::CircularDependency { from, to, chain });
                }
            }

            // Skip other checks if already checked
            if !checked.insert(entry.info.type_id) {
                return;
            };

            dependency_chain.push(entry.info);

            for (position, dependency) in entry.dependencies.iter().enumerate() {
                if dependency.has_default {
                    continue;
                }

                let Some(type_info) = dependency.type_info else {
                    errors.push(DependencyGraphError::MissingTypeAnnotation {
                        parameter: dependency.name,
                        position,
                        required_by: entry.info,
                    });
                    continue;
                };

                let Some(next_entry) = graph.map.get(&type_info.type_id) else {
                    if !dependency.optional {
                        errors.push(DependencyGraphError::MissingDependency {
                            dependency: type_info,
                            required_by: entry.info,
                        });
                    }

                    continue;
                };

                check_recurse(graph, checked, errors, dependency_chain, next_entry);
            }

            dependency_chain.pop();
        }
    }
}

/// One line per interface: `Interface -> [dependency, ...]`
impl std::fmt::Display for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut lines: Vec<String> = self
            .map
            .values()
            .map(|entry| {
                let dependencies = entry
                    .dependencies
                    .iter()
                    .filter(|dependency| !dependency.has_default)
                    .map(|dependency| match (dependency.type_info, dependency.optional) {
                        (Some(info), false) => info.type_name.to_string(),
                        (Some(info), true) => format!("{}?", info.type_name),
                        (None, _) => format!("<untyped {}>", dependency.name),
                    })
                    .collect::<Vec<_>>();
                format!("{} -> [{}]", entry.info, dependencies.join(", "))
            })
            .collect();
        lines.sort();
        f.write_str(&lines.join("\n"))
    }
}

struct DependencyGraphEntry {
    info: TypeInfo,
    dependencies: Vec<DependencyInfo>,
}

#[derive(Error, Debug, Clone)]
pub enum DependencyGraphError {
    #[error("'{required_by}' needs '{dependency}' but it is missing")]
    MissingDependency {
        dependency: TypeInfo,
        required_by: TypeInfo,
    },
    #[error("Parameter {position} ('{parameter}') of '{required_by}' has no declared type")]
    MissingTypeAnnotation {
        parameter: &'static str,
        position: usize,
        required_by: TypeInfo,
    },
    #[error("A Circular Dependency exists between '{from}' and '{to}' through {}", display_chain(.chain))]
    CircularDependency {
        from: TypeInfo,
        to: TypeInfo,
        chain: Vec<TypeInfo>,
    },
}
impl std::fmt::Display for DependencyGraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The dependency graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}

#[derive(Error, Debug, Clone)]
pub struct DependencyGraphErrors {
    pub errors: Vec<DependencyGraphError>,
}
