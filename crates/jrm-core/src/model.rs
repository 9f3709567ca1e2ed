//! Graph data model for the repository map.
//!
//! Containment is a strict tree (Repository ⊃ Module ⊃ Package ⊃ Type);
//! dependency edges are a separate, possibly cyclic relation layered on top.
//! Everything is constructed once per run from immutable facts, scored once,
//! then reduced by projection into a new graph — nodes are never mutated in
//! place after scoring.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Schema version written into every artifact.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Build tool detected from the repository's descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTool {
    Maven,
    Gradle,
    Unknown,
}

impl BuildTool {
    pub fn name(self) -> &'static str {
        match self {
            BuildTool::Maven => "maven",
            BuildTool::Gradle => "gradle",
            BuildTool::Unknown => "unknown",
        }
    }
}

/// Maven-style coordinates of the repository or a declared dependency.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinates {
    pub group: String,
    pub artifact: String,
    pub version: Option<String>,
}

/// Root metadata, created once per run and immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub build_tool: BuildTool,
    pub coordinates: Option<Coordinates>,
    /// Build properties from the root descriptor.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    /// Framework-marker artifacts declared as dependencies, sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub framework_features: Vec<String>,
    /// Generation timestamp. Isolated metadata, excluded from determinism
    /// guarantees; `None` in tests and wherever byte-identity matters.
    pub generated_at: Option<String>,
}

/// A build module. Owns a disjoint set of packages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub packages: BTreeSet<String>,
}

/// A Java package, identified as `{module}:{fully.qualified.name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    /// Fully qualified package name (`<default>` for the default package).
    pub name: String,
    /// Owning module (back-reference only, not ownership).
    pub module: String,
    pub types: BTreeSet<String>,
    /// Synthetic per-module sink for targets outside the repository.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub external: bool,
    /// Number of leaf packages merged into this aggregate; 0 for real packages.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub collapsed_count: usize,
    /// Attached by the importance scorer; absent before scoring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<ImportanceScore>,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// The declared kind of a Java type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
}

impl TypeKind {
    /// Map a declaration keyword (`class`, `interface`, `enum`, `record`).
    pub fn from_keyword(kw: &str) -> Option<Self> {
        match kw {
            "class" => Some(TypeKind::Class),
            "interface" => Some(TypeKind::Interface),
            "enum" => Some(TypeKind::Enum),
            "record" => Some(TypeKind::Record),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Record => "record",
        }
    }
}

/// A declared type, identified as `{module}:{package}.{Name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeNode {
    pub id: String,
    pub name: String,
    pub kind: TypeKind,
    /// Owning package (back-reference only).
    pub package: String,
    /// Annotation names, presence only — no argument values.
    pub annotations: BTreeSet<String>,
    /// Public member signatures (names only, no bodies), sorted.
    pub members: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<ImportanceScore>,
}

/// Granularity an edge was declared at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Module,
    Package,
}

/// The source that produced an edge. Bytecode edges reflect actual compiled
/// dependencies and take precedence over the import heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Imports,
    Bytecode,
}

impl Provenance {
    pub fn name(self) -> &'static str {
        match self {
            Provenance::Imports => "imports",
            Provenance::Bytecode => "bytecode",
        }
    }
}

/// A directed dependency edge. Deduplicated on (source, target, granularity);
/// self-edges are dropped at construction time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub granularity: Granularity,
    pub provenance: Provenance,
}

/// Heuristic importance signals for a package or type.
///
/// Ranked uses compare the raw numeric signals; the bucket exists for
/// reporting only, so that bucket boundaries can never reorder pruning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImportanceScore {
    pub fan_in: usize,
    pub fan_out: usize,
    /// Shortest distance from the nearest entry point, capped.
    pub depth: u32,
    pub annotation_density: f64,
    pub entry_point: bool,
}

/// Reporting-only ordinal bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportanceBucket {
    High,
    Medium,
    Low,
}

impl ImportanceBucket {
    pub fn name(self) -> &'static str {
        match self {
            ImportanceBucket::High => "high",
            ImportanceBucket::Medium => "medium",
            ImportanceBucket::Low => "low",
        }
    }
}

impl ImportanceScore {
    /// Combined degree, the support signal for edge pruning.
    pub fn degree(&self) -> usize {
        self.fan_in + self.fan_out
    }

    /// Raw-signal check used by the projector's leaf-collapse rule.
    pub fn is_high(&self) -> bool {
        self.entry_point || self.fan_in >= 4
    }

    /// Derived ordinal bucket for the report. Never used in comparisons.
    pub fn bucket(&self) -> ImportanceBucket {
        if self.is_high() {
            ImportanceBucket::High
        } else if self.degree() <= 1 {
            ImportanceBucket::Low
        } else {
            ImportanceBucket::Medium
        }
    }
}

/// Entity and edge counts, before and after projection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphCounts {
    pub modules: usize,
    pub packages: usize,
    pub types: usize,
    pub edges: usize,
}

/// The kind of a single pruning action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    DropEdge,
    DropMembers,
    MergePackage,
    DropType,
}

impl ActionKind {
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::DropEdge => "drop-edge",
            ActionKind::DropMembers => "drop-members",
            ActionKind::MergePackage => "merge-package",
            ActionKind::DropType => "drop-type",
        }
    }
}

/// One pruning action, recorded in the order it was performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneAction {
    pub kind: ActionKind,
    pub targets: Vec<String>,
    pub reason: String,
}

/// Replayable log of everything the budget projector removed, plus every
/// non-fatal degradation absorbed earlier in the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetReport {
    pub input: GraphCounts,
    pub output: GraphCounts,
    pub actions: Vec<PruneAction>,
    /// Set when the budget could not be met after exhausting all rules.
    /// A reported boundary condition, not a failure.
    pub budget_exceeded: bool,
    /// Estimated size above budget when `budget_exceeded`; 0 otherwise.
    pub residual_overage: usize,
    pub notes: Vec<String>,
}

/// The typed repository graph: containment tree plus dependency edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoGraph {
    pub repository: Repository,
    pub modules: BTreeMap<String, Module>,
    pub packages: BTreeMap<String, Package>,
    pub types: BTreeMap<String, TypeNode>,
    pub edges: Vec<Edge>,
    /// Scorer input: type id → packages whose files import it.
    /// Derived at construction, not part of the artifact.
    pub type_importers: BTreeMap<String, BTreeSet<String>>,
    /// Scorer input: type id → internal packages its declaring file imports.
    pub type_imports: BTreeMap<String, BTreeSet<String>>,
}

impl RepoGraph {
    pub fn new(repository: Repository) -> Self {
        Self {
            repository,
            modules: BTreeMap::new(),
            packages: BTreeMap::new(),
            types: BTreeMap::new(),
            edges: Vec::new(),
            type_importers: BTreeMap::new(),
            type_imports: BTreeMap::new(),
        }
    }

    /// Current entity/edge counts.
    pub fn counts(&self) -> GraphCounts {
        GraphCounts {
            modules: self.modules.len(),
            packages: self.packages.len(),
            types: self.types.len(),
            edges: self.edges.len(),
        }
    }

    /// Edges at the given granularity, in stored (sorted) order.
    pub fn edges_at(&self, granularity: Granularity) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.granularity == granularity)
    }

    /// Distinct targets of edges leaving `source` at the given granularity.
    pub fn targets_of(&self, source: &str, granularity: Granularity) -> BTreeSet<&str> {
        self.edges_at(granularity)
            .filter(|e| e.source == source)
            .map(|e| e.target.as_str())
            .collect()
    }

    /// Distinct sources of edges entering `target` at the given granularity.
    pub fn sources_of(&self, target: &str, granularity: Granularity) -> BTreeSet<&str> {
        self.edges_at(granularity)
            .filter(|e| e.target == target)
            .map(|e| e.source.as_str())
            .collect()
    }

    /// Restore the canonical edge order after bulk edits.
    pub fn sort_edges(&mut self) {
        self.edges.sort();
        self.edges.dedup();
    }
}
