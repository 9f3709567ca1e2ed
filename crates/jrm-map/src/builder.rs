//! Graph construction from collected facts.
//!
//! A pure function of the fact set: identical facts always produce identical
//! node and edge sets. Ordering is imposed downstream at serialization; here
//! only identity matters.
//!
//! Import targets outside the repository collapse into one synthetic
//! `<external>` sink per module, so the outside world can never contribute
//! unbounded fan-out. Bytecode-derived edges outrank import-derived edges
//! for the same endpoint pair.

use jrm_core::error::ConstructionError;
use jrm_core::model::{
    Edge, Granularity, Module, Package, Provenance, RepoGraph, Repository, TypeNode,
};
use jrm_facts::collect::RepoFacts;
use std::collections::{BTreeMap, BTreeSet};

/// Package name used when a source file declares none.
const DEFAULT_PACKAGE: &str = "<default>";
/// Synthetic per-module sink for targets outside the repository.
const EXTERNAL_SEGMENT: &str = "<external>";

/// External sink id for a module.
pub fn external_sink_id(module_id: &str) -> String {
    format!("{module_id}:{EXTERNAL_SEGMENT}")
}

fn package_id(module_id: &str, package_name: &str) -> String {
    format!("{module_id}:{package_name}")
}

fn type_id(module_id: &str, package_name: &str, type_name: &str) -> String {
    format!("{module_id}:{package_name}.{type_name}")
}

/// Resolves qualified names to internal packages across modules.
struct PackageIndex {
    /// Package fqn → owning (module id, package id), sorted by module id.
    by_name: BTreeMap<String, Vec<(String, String)>>,
}

impl PackageIndex {
    fn new(graph: &RepoGraph) -> Self {
        let mut by_name: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
        for package in graph.packages.values() {
            by_name
                .entry(package.name.clone())
                .or_default()
                .push((package.module.clone(), package.id.clone()));
        }
        Self { by_name }
    }

    /// Resolve a package fqn to an internal package id, preferring the
    /// requesting module, then the lexically-smallest owning module.
    fn resolve(&self, name: &str, from_module: &str) -> Option<&str> {
        let owners = self.by_name.get(name)?;
        owners
            .iter()
            .find(|(module, _)| module == from_module)
            .or_else(|| owners.first())
            .map(|(_, id)| id.as_str())
    }
}

/// Edge set under construction: deduplicated on (granularity, source,
/// target), bytecode provenance overriding imports.
#[derive(Default)]
struct EdgeSet {
    edges: BTreeMap<(Granularity, String, String), Provenance>,
}

impl EdgeSet {
    fn insert(&mut self, source: &str, target: &str, granularity: Granularity, prov: Provenance) {
        if source == target {
            return;
        }
        let entry = self
            .edges
            .entry((granularity, source.to_string(), target.to_string()))
            .or_insert(prov);
        if prov > *entry {
            *entry = prov;
        }
    }

    fn into_edges(self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .edges
            .into_iter()
            .map(|((granularity, source, target), provenance)| Edge {
                source,
                target,
                granularity,
                provenance,
            })
            .collect();
        edges.sort();
        edges
    }
}

/// Assemble the typed graph from collected facts.
pub fn build(facts: &RepoFacts) -> Result<RepoGraph, ConstructionError> {
    let mut framework_features: Vec<String> = facts
        .modules
        .iter()
        .flat_map(|m| m.build.framework_features.iter().cloned())
        .collect();
    framework_features.sort();
    framework_features.dedup();
    let properties = facts
        .modules
        .iter()
        .flat_map(|m| m.build.properties.clone())
        .collect();

    let mut graph = RepoGraph::new(Repository {
        name: facts.name.clone(),
        build_tool: facts.build_tool,
        coordinates: facts.coordinates.clone(),
        properties,
        framework_features,
        generated_at: None,
    });

    // Containment first: modules, packages, types.
    for module in &facts.modules {
        let mut owned = BTreeSet::new();
        for file in &module.files {
            let pkg_name = file.package.as_deref().unwrap_or(DEFAULT_PACKAGE);
            let pkg_id = package_id(&module.id, pkg_name);
            owned.insert(pkg_id.clone());
            let package = graph.packages.entry(pkg_id.clone()).or_insert_with(|| Package {
                id: pkg_id.clone(),
                name: pkg_name.to_string(),
                module: module.id.clone(),
                types: BTreeSet::new(),
                external: false,
                collapsed_count: 0,
                score: None,
            });
            for ty in &file.types {
                let tid = type_id(&module.id, pkg_name, &ty.name);
                package.types.insert(tid.clone());
                graph.types.entry(tid.clone()).or_insert_with(|| TypeNode {
                    id: tid,
                    name: ty.name.clone(),
                    kind: ty.kind,
                    package: pkg_id.clone(),
                    annotations: ty.annotations.clone(),
                    members: ty.public_members.clone(),
                    score: None,
                });
            }
        }
        graph.modules.insert(
            module.id.clone(),
            Module {
                id: module.id.clone(),
                packages: owned,
            },
        );
    }

    let index = PackageIndex::new(&graph);
    let mut edges = EdgeSet::default();
    let mut sinks_needed: BTreeSet<String> = BTreeSet::new();

    // Package edges derived from type-level import facts.
    for module in &facts.modules {
        for file in &module.files {
            let pkg_name = file.package.as_deref().unwrap_or(DEFAULT_PACKAGE);
            let source_id = package_id(&module.id, pkg_name);
            for import in &file.imports {
                let Some((target_pkg, simple)) = import.rsplit_once('.') else {
                    continue;
                };
                if target_pkg.is_empty() || target_pkg == pkg_name {
                    continue;
                }
                match index.resolve(target_pkg, &module.id) {
                    Some(target_id) => {
                        edges.insert(&source_id, target_id, Granularity::Package, Provenance::Imports);
                        record_type_use(&mut graph, target_id, target_pkg, simple, &source_id);
                        record_file_fan_out(&mut graph, module, file, pkg_name, target_id);
                    }
                    None => {
                        let sink = external_sink_id(&module.id);
                        edges.insert(&source_id, &sink, Granularity::Package, Provenance::Imports);
                        sinks_needed.insert(module.id.clone());
                    }
                }
            }
        }
    }

    // Bytecode edges take precedence over the import heuristic.
    for module in &facts.modules {
        let Some(raw_edges) = &module.raw_edges else {
            continue;
        };
        for raw in raw_edges {
            if raw.source == raw.target {
                continue;
            }
            let Some(source_id) = index.resolve(&raw.source, &module.id).map(str::to_string) else {
                return Err(ConstructionError::UnresolvedEndpoint {
                    from: raw.source.clone(),
                    target: raw.target.clone(),
                    package: raw.source.clone(),
                });
            };
            match index.resolve(&raw.target, &module.id).map(str::to_string) {
                Some(target_id) => {
                    edges.insert(&source_id, &target_id, Granularity::Package, Provenance::Bytecode);
                }
                None => {
                    let sink = external_sink_id(&module.id);
                    edges.insert(&source_id, &sink, Granularity::Package, Provenance::Bytecode);
                    sinks_needed.insert(module.id.clone());
                }
            }
        }
    }

    // Materialize external sinks that acquired at least one edge.
    for module_id in sinks_needed {
        let sink_id = external_sink_id(&module_id);
        graph.packages.insert(
            sink_id.clone(),
            Package {
                id: sink_id.clone(),
                name: EXTERNAL_SEGMENT.to_string(),
                module: module_id.clone(),
                types: BTreeSet::new(),
                external: true,
                collapsed_count: 0,
                score: None,
            },
        );
        if let Some(module) = graph.modules.get_mut(&module_id) {
            module.packages.insert(sink_id);
        }
    }

    // Module edges: package edges projected through ownership, plus declared
    // build dependencies that name a sibling module.
    let package_edges: Vec<(String, String, Provenance)> = edges
        .edges
        .iter()
        .filter(|((granularity, _, _), _)| *granularity == Granularity::Package)
        .map(|((_, source, target), prov)| (source.clone(), target.clone(), *prov))
        .collect();
    for (source, target, prov) in package_edges {
        let (Some(src_pkg), Some(tgt_pkg)) = (graph.packages.get(&source), graph.packages.get(&target))
        else {
            continue;
        };
        let src_module = src_pkg.module.clone();
        let tgt_module = tgt_pkg.module.clone();
        if src_module != tgt_module && !tgt_pkg.external {
            edges.insert(&src_module, &tgt_module, Granularity::Module, prov);
        }
    }
    let coords: BTreeMap<(String, String), String> = facts
        .modules
        .iter()
        .filter_map(|m| {
            m.build
                .coordinates
                .as_ref()
                .map(|c| ((c.group.clone(), c.artifact.clone()), m.id.clone()))
        })
        .collect();
    for module in &facts.modules {
        for dep in &module.build.dependencies {
            if let Some(target) = coords.get(&(dep.group.clone(), dep.artifact.clone())) {
                edges.insert(&module.id, target, Granularity::Module, Provenance::Imports);
            }
        }
    }

    graph.edges = edges.into_edges();
    validate(&graph)?;
    Ok(graph)
}

/// Record that `source_pkg` imports the type `simple` of `target_pkg`, and
/// which internal package each of the importing file's types reaches.
fn record_type_use(
    graph: &mut RepoGraph,
    target_pkg_id: &str,
    target_pkg_name: &str,
    simple: &str,
    source_pkg_id: &str,
) {
    let Some(target_pkg) = graph.packages.get(target_pkg_id) else {
        return;
    };
    let target_module = target_pkg.module.clone();
    let tid = type_id(&target_module, target_pkg_name, simple);
    if graph.types.contains_key(&tid) {
        graph
            .type_importers
            .entry(tid)
            .or_default()
            .insert(source_pkg_id.to_string());
    }
}

fn record_file_fan_out(
    graph: &mut RepoGraph,
    module: &jrm_facts::collect::ModuleFacts,
    file: &jrm_facts::java::SourceFileFacts,
    pkg_name: &str,
    target_pkg_id: &str,
) {
    for ty in &file.types {
        let tid = type_id(&module.id, pkg_name, &ty.name);
        if graph.types.contains_key(&tid) {
            graph
                .type_imports
                .entry(tid)
                .or_default()
                .insert(target_pkg_id.to_string());
        }
    }
}

/// Reject any edge whose endpoints are missing at the declared granularity.
fn validate(graph: &RepoGraph) -> Result<(), ConstructionError> {
    for edge in &graph.edges {
        let (exists_src, exists_tgt, granularity) = match edge.granularity {
            Granularity::Module => (
                graph.modules.contains_key(&edge.source),
                graph.modules.contains_key(&edge.target),
                "module",
            ),
            Granularity::Package => (
                graph.packages.contains_key(&edge.source),
                graph.packages.contains_key(&edge.target),
                "package",
            ),
        };
        if !exists_src {
            return Err(ConstructionError::MissingEndpoint {
                id: edge.source.clone(),
                granularity,
            });
        }
        if !exists_tgt {
            return Err(ConstructionError::MissingEndpoint {
                id: edge.target.clone(),
                granularity,
            });
        }
    }
    Ok(())
}
