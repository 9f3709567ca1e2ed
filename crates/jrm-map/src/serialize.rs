//! Deterministic artifact serialization.
//!
//! The graph is assembled into the typed document model with lexical key
//! ordering at every level — modules, then packages, then types, then
//! members — and edge lists sorted by target identifier. The only
//! run-dependent value is the optional `generatedAt` metadata field, which
//! is excluded from determinism guarantees.

use jrm_core::document::DocValue;
use jrm_core::model::{
    BudgetReport, Granularity, GraphCounts, ImportanceScore, Package, RepoGraph, SCHEMA_VERSION,
    TypeNode,
};

/// Serialized byte length of the structural document. This is the quantity
/// the budget applies to; the budget report is an audit appendix and never
/// feeds back into pruning decisions.
pub fn estimate_size(graph: &RepoGraph) -> usize {
    content_document(graph).render().len()
}

/// Render the full artifact: structural document plus budget report.
pub fn serialize(graph: &RepoGraph, report: &BudgetReport) -> Vec<u8> {
    document(graph, report).render().into_bytes()
}

/// The full artifact document.
pub fn document(graph: &RepoGraph, report: &BudgetReport) -> DocValue {
    let mut fields = content_fields(graph);
    fields.push(("budgetReport".to_string(), report_value(report)));
    DocValue::Object(fields)
}

/// The structural document: everything except the budget report.
pub fn content_document(graph: &RepoGraph) -> DocValue {
    DocValue::Object(content_fields(graph))
}

fn content_fields(graph: &RepoGraph) -> Vec<(String, DocValue)> {
    let mut repository = vec![
        ("name".to_string(), DocValue::str(&graph.repository.name)),
        (
            "buildTool".to_string(),
            DocValue::str(graph.repository.build_tool.name()),
        ),
        (
            "coordinates".to_string(),
            match &graph.repository.coordinates {
                Some(c) => DocValue::object([
                    ("group", DocValue::str(&c.group)),
                    ("artifact", DocValue::str(&c.artifact)),
                    (
                        "version",
                        c.version.as_deref().map_or(DocValue::Null, DocValue::str),
                    ),
                ]),
                None => DocValue::Null,
            },
        ),
    ];
    if !graph.repository.properties.is_empty() {
        repository.push((
            "properties".to_string(),
            DocValue::Object(
                graph
                    .repository
                    .properties
                    .iter()
                    .map(|(k, v)| (k.clone(), DocValue::str(v)))
                    .collect(),
            ),
        ));
    }
    if !graph.repository.framework_features.is_empty() {
        repository.push((
            "frameworkFeatures".to_string(),
            DocValue::list(graph.repository.framework_features.iter().map(DocValue::str)),
        ));
    }
    if let Some(at) = &graph.repository.generated_at {
        repository.push(("generatedAt".to_string(), DocValue::str(at)));
    }

    vec![
        ("schemaVersion".to_string(), DocValue::str(SCHEMA_VERSION)),
        ("repository".to_string(), DocValue::Object(repository)),
        (
            "modules".to_string(),
            DocValue::list(graph.modules.values().map(|m| module_value(graph, m))),
        ),
        (
            "packages".to_string(),
            DocValue::list(graph.packages.values().map(|p| package_value(graph, p))),
        ),
        (
            "types".to_string(),
            DocValue::list(graph.types.values().map(type_value)),
        ),
    ]
}

fn module_value(graph: &RepoGraph, module: &jrm_core::model::Module) -> DocValue {
    DocValue::object([
        ("id", DocValue::str(&module.id)),
        (
            "packages",
            DocValue::list(module.packages.iter().map(DocValue::str)),
        ),
        (
            "dependsOn",
            DocValue::list(
                graph
                    .targets_of(&module.id, Granularity::Module)
                    .into_iter()
                    .map(DocValue::str),
            ),
        ),
    ])
}

fn package_value(graph: &RepoGraph, package: &Package) -> DocValue {
    let mut fields = vec![
        ("id".to_string(), DocValue::str(&package.id)),
        ("module".to_string(), DocValue::str(&package.module)),
        (
            "dependsOn".to_string(),
            DocValue::list(
                graph
                    .targets_of(&package.id, Granularity::Package)
                    .into_iter()
                    .map(DocValue::str),
            ),
        ),
    ];
    if package.external {
        fields.push(("external".to_string(), DocValue::Bool(true)));
    }
    if package.collapsed_count > 0 {
        fields.push((
            "collapsedCount".to_string(),
            DocValue::int(package.collapsed_count),
        ));
    }
    if let Some(score) = &package.score {
        fields.push(("importance".to_string(), score_value(score)));
    }
    DocValue::Object(fields)
}

fn type_value(ty: &TypeNode) -> DocValue {
    let mut fields = vec![
        ("id".to_string(), DocValue::str(&ty.id)),
        ("kind".to_string(), DocValue::str(ty.kind.name())),
        (
            "annotations".to_string(),
            DocValue::list(ty.annotations.iter().map(DocValue::str)),
        ),
        (
            "publicMembers".to_string(),
            DocValue::list(ty.members.iter().map(DocValue::str)),
        ),
    ];
    if let Some(score) = &ty.score {
        fields.push(("importance".to_string(), score_value(score)));
    }
    DocValue::Object(fields)
}

fn score_value(score: &ImportanceScore) -> DocValue {
    DocValue::object([
        ("fanIn", DocValue::int(score.fan_in)),
        ("fanOut", DocValue::int(score.fan_out)),
        ("depth", DocValue::Int(i64::from(score.depth))),
        (
            "annotationDensity",
            DocValue::Float(score.annotation_density),
        ),
        ("entryPoint", DocValue::Bool(score.entry_point)),
        ("bucket", DocValue::str(score.bucket().name())),
    ])
}

fn counts_value(counts: &GraphCounts) -> DocValue {
    DocValue::object([
        ("modules", DocValue::int(counts.modules)),
        ("packages", DocValue::int(counts.packages)),
        ("types", DocValue::int(counts.types)),
        ("edges", DocValue::int(counts.edges)),
    ])
}

fn report_value(report: &BudgetReport) -> DocValue {
    DocValue::object([
        ("inputCounts", counts_value(&report.input)),
        ("outputCounts", counts_value(&report.output)),
        (
            "actions",
            DocValue::list(report.actions.iter().map(|action| {
                DocValue::object([
                    ("kind", DocValue::str(action.kind.name())),
                    (
                        "targets",
                        DocValue::list(action.targets.iter().map(DocValue::str)),
                    ),
                    ("reason", DocValue::str(&action.reason)),
                ])
            })),
        ),
        ("budgetExceeded", DocValue::Bool(report.budget_exceeded)),
        ("residualOverage", DocValue::int(report.residual_overage)),
        (
            "notes",
            DocValue::list(report.notes.iter().map(DocValue::str)),
        ),
    ])
}
