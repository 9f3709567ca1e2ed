//! Budget-aware lossy projection.
//!
//! A strict-priority, monotone reduction pass over the scored graph.
//! Module and package boundaries are never deleted (only merged), dependency
//! direction is never reversed, and every action lands in the report in the
//! order it was performed, so the report is a replayable log.
//!
//! Projection never fails: when every rule is exhausted and the estimate
//! still exceeds the budget, the maximally reduced graph is returned with
//! `budget_exceeded` set. That is a reported boundary condition, not an
//! error.

use crate::score::{importance_value, packages_ascending, types_ascending};
use crate::serialize;
use jrm_core::config::JrmConfig;
use jrm_core::model::{
    ActionKind, BudgetReport, Edge, Granularity, Package, PruneAction, RepoGraph,
};
use std::collections::BTreeSet;

/// Synthetic sibling that absorbs collapsed leaf packages.
const COLLAPSED_SEGMENT: &str = "<collapsed>";

fn collapsed_id(module_id: &str) -> String {
    format!("{module_id}:{COLLAPSED_SEGMENT}")
}

/// Project the scored graph into the budget. Returns the reduced graph and
/// the action log; the input graph is never mutated.
pub fn project(scored: &RepoGraph, config: &JrmConfig) -> (RepoGraph, BudgetReport) {
    let byte_limit = config.budget.byte_limit();
    let mut reduced = scored.clone();
    let mut report = BudgetReport {
        input: scored.counts(),
        ..BudgetReport::default()
    };

    // Steps (a)–(d) in strict order; each stops as soon as the estimate
    // fits. After (d) there is no further reduction to apply.
    if !fits(&reduced, byte_limit) {
        drop_low_support_edges(&mut reduced, &mut report, config, byte_limit);
    }
    if !fits(&reduced, byte_limit) {
        drop_member_signatures(&mut reduced, &mut report, config, byte_limit);
    }
    if !fits(&reduced, byte_limit) {
        collapse_leaf_packages(&mut reduced, &mut report, byte_limit);
    }
    if !fits(&reduced, byte_limit) {
        drop_low_importance_types(&mut reduced, &mut report, config, byte_limit);
    }

    let estimate = serialize::estimate_size(&reduced);
    if estimate > byte_limit {
        report.budget_exceeded = true;
        report.residual_overage = estimate - byte_limit;
        tracing::debug!(estimate, byte_limit, "budget exceeded after all reductions");
    }
    report.output = reduced.counts();
    (reduced, report)
}

fn fits(graph: &RepoGraph, byte_limit: usize) -> bool {
    serialize::estimate_size(graph) <= byte_limit
}

/// Combined endpoint degree of a package edge; absent scores count zero.
fn edge_support(graph: &RepoGraph, edge: &Edge) -> usize {
    let degree = |id: &str| {
        graph
            .packages
            .get(id)
            .and_then(|p| p.score.as_ref())
            .map_or(0, jrm_core::model::ImportanceScore::degree)
    };
    degree(&edge.source) + degree(&edge.target)
}

/// Whether either endpoint is an entry-point package. Such edges are never
/// low-signal regardless of threshold.
fn touches_entry_point(graph: &RepoGraph, edge: &Edge) -> bool {
    [&edge.source, &edge.target].into_iter().any(|id| {
        graph
            .packages
            .get(id)
            .and_then(|p| p.score.as_ref())
            .is_some_and(|s| s.entry_point)
    })
}

/// Step (a): drop package edges whose endpoint support falls below an
/// escalating threshold. Module edges and entry-point edges are protected.
fn drop_low_support_edges(
    graph: &mut RepoGraph,
    report: &mut BudgetReport,
    config: &JrmConfig,
    byte_limit: usize,
) {
    let mut threshold = config.projector.support_start;
    while threshold <= config.projector.support_max {
        if fits(graph, byte_limit) {
            return;
        }
        let victims: Vec<Edge> = graph
            .edges
            .iter()
            .filter(|e| e.granularity == Granularity::Package)
            .filter(|e| !touches_entry_point(graph, e))
            .filter(|e| edge_support(graph, e) < threshold)
            .cloned()
            .collect();
        for edge in &victims {
            let support = edge_support(graph, edge);
            report.actions.push(PruneAction {
                kind: ActionKind::DropEdge,
                targets: vec![edge.source.clone(), edge.target.clone()],
                reason: format!("edge support {support} below threshold {threshold}"),
            });
        }
        graph.edges.retain(|e| !victims.contains(e));
        threshold += config.projector.support_step;
    }
}

/// Step (b): clear public member lists, least important packages first.
/// Type name and kind always survive.
fn drop_member_signatures(
    graph: &mut RepoGraph,
    report: &mut BudgetReport,
    config: &JrmConfig,
    byte_limit: usize,
) {
    for pkg_id in packages_ascending(graph, config.scorer.depth_cap) {
        if fits(graph, byte_limit) {
            return;
        }
        let Some(type_ids) = graph.packages.get(&pkg_id).map(|p| p.types.clone()) else {
            continue;
        };
        for tid in type_ids {
            let Some(ty) = graph.types.get_mut(&tid) else {
                continue;
            };
            if ty.members.is_empty() {
                continue;
            }
            ty.members.clear();
            report.actions.push(PruneAction {
                kind: ActionKind::DropMembers,
                targets: vec![tid.clone()],
                reason: format!("low importance of containing package {pkg_id}"),
            });
        }
    }
}

/// Step (c): merge leaf packages (no fan-in from outside their module, no
/// high-importance types) into a per-module aggregate carrying a count.
fn collapse_leaf_packages(graph: &mut RepoGraph, report: &mut BudgetReport, byte_limit: usize) {
    let module_ids: Vec<String> = graph.modules.keys().cloned().collect();
    for module_id in module_ids {
        if fits(graph, byte_limit) {
            return;
        }
        let candidates: Vec<String> = graph
            .modules
            .get(&module_id)
            .map(|m| {
                m.packages
                    .iter()
                    .filter(|pkg_id| is_collapsible(graph, pkg_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if candidates.is_empty() {
            continue;
        }

        let agg_id = collapsed_id(&module_id);
        graph
            .packages
            .entry(agg_id.clone())
            .or_insert_with(|| Package {
                id: agg_id.clone(),
                name: COLLAPSED_SEGMENT.to_string(),
                module: module_id.clone(),
                types: BTreeSet::new(),
                external: false,
                collapsed_count: 0,
                score: None,
            });

        for pkg_id in candidates {
            let Some(package) = graph.packages.remove(&pkg_id) else {
                continue;
            };
            for tid in &package.types {
                graph.types.remove(tid);
                graph.type_importers.remove(tid);
                graph.type_imports.remove(tid);
            }
            for edge in &mut graph.edges {
                if edge.source == pkg_id {
                    edge.source = agg_id.clone();
                }
                if edge.target == pkg_id {
                    edge.target = agg_id.clone();
                }
            }
            graph.edges.retain(|e| e.source != e.target);
            if let Some(module) = graph.modules.get_mut(&module_id) {
                module.packages.remove(&pkg_id);
                module.packages.insert(agg_id.clone());
            }
            if let Some(agg) = graph.packages.get_mut(&agg_id) {
                agg.collapsed_count += 1;
            }
            report.actions.push(PruneAction {
                kind: ActionKind::MergePackage,
                targets: vec![pkg_id, agg_id.clone()],
                reason: "leaf package with no fan-in from outside its module".to_string(),
            });
        }
        graph.sort_edges();
    }
}

/// A package is collapsible when it is a true leaf — nothing depends on it
/// and none of its types matter on their own (no entry points, nothing other
/// packages import). Judged from the scores attached before projection, so
/// re-projecting an already-reduced graph finds the same answer. Sinks and
/// aggregates are never re-collapsed.
fn is_collapsible(graph: &RepoGraph, pkg_id: &str) -> bool {
    let Some(package) = graph.packages.get(pkg_id) else {
        return false;
    };
    if package.external || package.collapsed_count > 0 {
        return false;
    }
    let Some(score) = &package.score else {
        return false;
    };
    if score.entry_point || score.fan_in > 0 {
        return false;
    }
    !package.types.iter().any(|tid| {
        graph
            .types
            .get(tid)
            .and_then(|t| t.score.as_ref())
            .is_some_and(|s| s.entry_point || s.fan_in > 0)
    })
}

/// Step (d), last resort: drop whole types in ascending importance.
/// Packages and modules are protected by the priority order.
fn drop_low_importance_types(
    graph: &mut RepoGraph,
    report: &mut BudgetReport,
    config: &JrmConfig,
    byte_limit: usize,
) {
    for tid in types_ascending(graph, config.scorer.depth_cap) {
        if fits(graph, byte_limit) {
            return;
        }
        let Some(ty) = graph.types.remove(&tid) else {
            continue;
        };
        if let Some(package) = graph.packages.get_mut(&ty.package) {
            package.types.remove(&tid);
        }
        graph.type_importers.remove(&tid);
        graph.type_imports.remove(&tid);
        let value = ty
            .score
            .as_ref()
            .map_or(0.0, |s| importance_value(s, config.scorer.depth_cap));
        report.actions.push(PruneAction {
            kind: ActionKind::DropType,
            targets: vec![tid],
            reason: format!("low importance ({value:.2})"),
        });
    }
}
