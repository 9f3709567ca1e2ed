//! End-to-end pipeline: `(facts, budget) → (document, report)`.

use crate::{builder, project, score, serialize};
use jrm_core::config::JrmConfig;
use jrm_core::error::{ConstructionError, Degradation};
use jrm_core::model::{BudgetReport, Granularity, Provenance, RepoGraph};
use jrm_facts::collect::RepoFacts;

/// Result of a complete map run.
pub struct MapOutcome {
    /// The reduced (projected) graph that was serialized.
    pub graph: RepoGraph,
    pub report: BudgetReport,
    /// The rendered artifact.
    pub bytes: Vec<u8>,
}

/// Build, score, project, and serialize in one pass.
///
/// `generated_at` is carried verbatim into the artifact's metadata field;
/// pass `None` wherever byte-identical output matters.
pub fn run(
    facts: &RepoFacts,
    config: &JrmConfig,
    generated_at: Option<String>,
) -> Result<MapOutcome, ConstructionError> {
    let mut graph = builder::build(facts)?;
    graph.repository.generated_at = generated_at;
    score::score(&mut graph, &config.scorer);

    let counts = graph.counts();
    tracing::debug!(
        modules = counts.modules,
        packages = counts.packages,
        types = counts.types,
        edges = counts.edges,
        "graph constructed and scored"
    );

    let (reduced, mut report) = project::project(&graph, config);

    let mut notes: Vec<String> = facts.degradations.iter().map(Degradation::to_note).collect();
    for edge in reduced
        .edges_at(Granularity::Package)
        .filter(|e| e.provenance == Provenance::Bytecode)
    {
        notes.push(
            Degradation::EdgeProvenance(format!("{} -> {}: bytecode", edge.source, edge.target))
                .to_note(),
        );
    }
    report.notes = notes;

    let bytes = serialize::serialize(&reduced, &report);
    Ok(MapOutcome {
        graph: reduced,
        report,
        bytes,
    })
}
