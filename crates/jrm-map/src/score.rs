//! Importance scoring over the constructed graph.
//!
//! Attaches an [`ImportanceScore`] to every package and type without ever
//! adding or removing nodes or edges. Cycles are expected topology: the
//! depth signal is a bounded multi-source BFS, so it terminates on any
//! graph shape.

use jrm_core::config::ScorerConfig;
use jrm_core::model::{Granularity, ImportanceScore, RepoGraph};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Member signature that marks a conventional entry routine.
const MAIN_MEMBER: &str = "main";

/// Weights of the composite ranking value. The individual signals and the
/// identifier tie-break are fixed by contract; the blend is a tunable.
const W_FAN_IN: f64 = 2.0;
const W_FAN_OUT: f64 = 1.0;
const W_ENTRY: f64 = 6.0;
const W_SHALLOWNESS: f64 = 0.25;

/// Compute and attach importance scores for all packages and types.
pub fn score(graph: &mut RepoGraph, config: &ScorerConfig) {
    let entry_annotations: BTreeSet<&str> =
        config.entry_annotations.iter().map(String::as_str).collect();

    // Type signals first; package entry-point flags derive from them.
    let mut type_scores: BTreeMap<String, ImportanceScore> = BTreeMap::new();
    for (id, ty) in &graph.types {
        let entry_point = ty.members.iter().any(|m| m == MAIN_MEMBER)
            || ty.annotations.iter().any(|a| {
                entry_annotations.contains(simple_annotation_name(a))
            });
        type_scores.insert(
            id.clone(),
            ImportanceScore {
                fan_in: graph.type_importers.get(id).map_or(0, BTreeSet::len),
                fan_out: graph.type_imports.get(id).map_or(0, BTreeSet::len),
                depth: 0,
                annotation_density: ty.annotations.len() as f64 / config.annotation_norm,
                entry_point,
            },
        );
    }

    // Entry-point packages seed the depth computation.
    let entry_packages: BTreeSet<String> = graph
        .packages
        .values()
        .filter(|p| {
            p.types
                .iter()
                .any(|tid| type_scores.get(tid).is_some_and(|s| s.entry_point))
        })
        .map(|p| p.id.clone())
        .collect();
    let depths = package_depths(graph, &entry_packages, config.depth_cap);

    for package in graph.packages.values_mut() {
        let fan_in = graph
            .edges
            .iter()
            .filter(|e| e.granularity == Granularity::Package && e.target == package.id)
            .count();
        let fan_out = graph
            .edges
            .iter()
            .filter(|e| e.granularity == Granularity::Package && e.source == package.id)
            .count();
        let densities: Vec<f64> = package
            .types
            .iter()
            .filter_map(|tid| type_scores.get(tid))
            .map(|s| s.annotation_density)
            .collect();
        let annotation_density = if densities.is_empty() {
            0.0
        } else {
            densities.iter().sum::<f64>() / densities.len() as f64
        };
        package.score = Some(ImportanceScore {
            fan_in,
            fan_out,
            depth: depths.get(&package.id).copied().unwrap_or(config.depth_cap),
            annotation_density,
            entry_point: entry_packages.contains(&package.id),
        });
    }

    // Types inherit their package's depth; edges only exist at package and
    // module granularity.
    for (id, ty) in &mut graph.types {
        let mut s = type_scores[id];
        if let Some(pkg) = graph.packages.get(&ty.package) {
            s.depth = pkg.score.map_or(config.depth_cap, |ps| ps.depth);
        }
        ty.score = Some(s);
    }
}

/// Simple name of a possibly-qualified annotation.
fn simple_annotation_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Shortest distance from the nearest entry point, per package, capped.
/// Multi-source BFS; unreachable packages take the cap.
fn package_depths(
    graph: &RepoGraph,
    entry_packages: &BTreeSet<String>,
    cap: u32,
) -> BTreeMap<String, u32> {
    let mut adjacency: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for edge in graph.edges_at(Granularity::Package) {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .insert(edge.target.as_str());
    }

    let mut depths: BTreeMap<String, u32> = BTreeMap::new();
    let mut frontier: VecDeque<(&str, u32)> = entry_packages
        .iter()
        .map(|id| (id.as_str(), 0))
        .collect();
    while let Some((id, depth)) = frontier.pop_front() {
        if depths.contains_key(id) {
            continue;
        }
        depths.insert(id.to_string(), depth);
        if depth >= cap {
            continue;
        }
        if let Some(targets) = adjacency.get(id) {
            for &target in targets {
                if !depths.contains_key(target) {
                    frontier.push_back((target, depth + 1));
                }
            }
        }
    }
    depths
}

/// Composite ranking value. Higher is more important. Every ranked use
/// tie-breaks by identifier ascending for a total order.
pub fn importance_value(score: &ImportanceScore, depth_cap: u32) -> f64 {
    let shallowness = f64::from(depth_cap.saturating_sub(score.depth));
    W_FAN_IN * score.fan_in as f64
        + W_FAN_OUT * score.fan_out as f64
        + score.annotation_density
        + if score.entry_point { W_ENTRY } else { 0.0 }
        + W_SHALLOWNESS * shallowness
}

/// Package ids in ascending importance (least important first).
pub fn packages_ascending(graph: &RepoGraph, depth_cap: u32) -> Vec<String> {
    let mut ranked: Vec<(f64, String)> = graph
        .packages
        .values()
        .map(|p| {
            let value = p.score.as_ref().map_or(0.0, |s| importance_value(s, depth_cap));
            (value, p.id.clone())
        })
        .collect();
    ranked.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(&b.1))
    });
    ranked.into_iter().map(|(_, id)| id).collect()
}

/// Type ids in ascending importance (least important first).
pub fn types_ascending(graph: &RepoGraph, depth_cap: u32) -> Vec<String> {
    let mut ranked: Vec<(f64, String)> = graph
        .types
        .values()
        .map(|t| {
            let value = t.score.as_ref().map_or(0.0, |s| importance_value(s, depth_cap));
            (value, t.id.clone())
        })
        .collect();
    ranked.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(&b.1))
    });
    ranked.into_iter().map(|(_, id)| id).collect()
}
