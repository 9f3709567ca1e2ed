//! Error taxonomy for a map run.
//!
//! Only structural-integrity violations abort a run: [`ConstructionError`]
//! from the graph builder and [`ArtifactError`] from storage. Everything else
//! is a [`Degradation`], absorbed into the budget report's notes.

/// Fatal: the fact set references an internal-looking edge endpoint that
/// cannot be resolved. Emitting a structurally invalid graph is worse than
/// aborting.
#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    #[error("bytecode edge `{from} -> {target}` references unresolved internal package `{package}`")]
    UnresolvedEndpoint {
        from: String,
        target: String,
        package: String,
    },
    #[error("edge endpoint `{id}` does not exist at {granularity} granularity")]
    MissingEndpoint { id: String, granularity: &'static str },
}

/// Fatal: the output artifact could not be committed. The temporary file is
/// removed, so no partial artifact is left visible.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to write artifact {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to commit artifact {path}: {source}")]
    Commit {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A non-fatal condition absorbed during the run and enumerated in the
/// report. The run still exits zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// Missing source root or empty fact set; the map is built empty.
    IngestGap(String),
    /// Malformed or missing build descriptor; repository metadata is partial.
    MetadataDegraded(String),
    /// Bytecode tool missing, timed out, or failed; import-derived edges used.
    DependencyToolUnavailable(String),
    /// Which provider produced the dependency edges.
    EdgeProvenance(String),
}

impl Degradation {
    /// Render as a report note.
    pub fn to_note(&self) -> String {
        match self {
            Degradation::IngestGap(detail) => format!("ingest gap: {detail}"),
            Degradation::MetadataDegraded(detail) => format!("metadata degraded: {detail}"),
            Degradation::DependencyToolUnavailable(detail) => {
                format!("dependency tool unavailable: {detail}")
            }
            Degradation::EdgeProvenance(detail) => format!("edge provenance: {detail}"),
        }
    }
}
