//! Lexical fact extraction from Java source text.
//!
//! Regex-driven line scanning with an explicit two-state machine: pending
//! annotations accumulate until the next type declaration claims them, and
//! any other statement line discards them. Blank lines and comments are
//! skipped without perturbing state, so formatting never changes the facts.
//!
//! This is deliberately not a parser. It extracts boundaries (package,
//! imports, type declarations, public member names) and ignores bodies.

use jrm_core::model::TypeKind;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Facts extracted from one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFileFacts {
    /// Path relative to the module root.
    pub path: PathBuf,
    /// Declared package; `None` for the default package.
    pub package: Option<String>,
    /// Imported qualified names, in declaration order.
    pub imports: Vec<String>,
    pub types: Vec<TypeFacts>,
}

/// A declared type and its surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeFacts {
    pub name: String,
    pub kind: TypeKind,
    /// Annotation names attached to the declaration, presence only.
    pub annotations: BTreeSet<String>,
    /// Public member names (methods and fields), sorted and deduplicated.
    pub public_members: Vec<String>,
}

fn package_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*package\s+([\w.]+)\s*;").unwrap())
}

fn import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*import\s+(?:static\s+)?([\w.]+)\s*;").unwrap())
}

fn type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*(?:public|protected|private)?\s*(?:abstract|final|sealed|non-sealed|static)?\s*(class|interface|record|enum)\s+(\w+)",
        )
        .unwrap()
    })
}

fn annotation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*@([\w.]+)").unwrap())
}

fn public_method_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*public\s+[\w<>,\[\].?\s]+\s+(\w+)\s*\(").unwrap())
}

fn public_field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*public\s+[\w<>,\[\].?\s]+\s+(\w+)\s*(?:=|;)").unwrap())
}

/// What a single source line means to the scanner.
#[derive(Debug, PartialEq, Eq)]
enum LineEvent<'a> {
    Skip,
    Annotation(&'a str),
    TypeDecl { kind: TypeKind, name: &'a str },
    Member(&'a str),
    Statement,
}

fn classify(line: &str) -> LineEvent<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with('*') {
        return LineEvent::Skip;
    }
    if let Some(caps) = annotation_re().captures(line) {
        return LineEvent::Annotation(caps.get(1).unwrap().as_str());
    }
    if let Some(caps) = type_re().captures(line)
        && let Some(kind) = TypeKind::from_keyword(caps.get(1).unwrap().as_str())
    {
        return LineEvent::TypeDecl {
            kind,
            name: caps.get(2).unwrap().as_str(),
        };
    }
    if let Some(caps) = public_method_re().captures(line) {
        return LineEvent::Member(caps.get(1).unwrap().as_str());
    }
    if let Some(caps) = public_field_re().captures(line) {
        return LineEvent::Member(caps.get(1).unwrap().as_str());
    }
    LineEvent::Statement
}

/// Scanner state: either idle, or holding annotations that belong to the
/// next type declaration.
enum ScanState {
    Idle,
    AccumulatingAnnotations(Vec<String>),
}

impl ScanState {
    fn take_pending(&mut self) -> Vec<String> {
        match std::mem::replace(self, ScanState::Idle) {
            ScanState::Idle => Vec::new(),
            ScanState::AccumulatingAnnotations(pending) => pending,
        }
    }

    fn push(&mut self, name: &str) {
        match self {
            ScanState::Idle => {
                *self = ScanState::AccumulatingAnnotations(vec![name.to_string()]);
            }
            ScanState::AccumulatingAnnotations(pending) => pending.push(name.to_string()),
        }
    }
}

/// Extract facts from a single Java source file.
pub fn parse_java_file(path: &Path, source: &str) -> SourceFileFacts {
    let mut package = None;
    let mut imports = Vec::new();
    let mut types: Vec<TypeFacts> = Vec::new();
    // Index into `types` that member lines currently belong to.
    let mut current_type: Option<usize> = None;
    let mut state = ScanState::Idle;

    for line in source.lines() {
        if package.is_none()
            && let Some(caps) = package_re().captures(line)
        {
            package = Some(caps.get(1).unwrap().as_str().to_string());
            continue;
        }
        if let Some(caps) = import_re().captures(line) {
            imports.push(caps.get(1).unwrap().as_str().to_string());
            continue;
        }

        match classify(line) {
            LineEvent::Skip => {}
            LineEvent::Annotation(name) => state.push(name),
            LineEvent::TypeDecl { kind, name } => {
                let annotations = state.take_pending().into_iter().collect();
                types.push(TypeFacts {
                    name: name.to_string(),
                    kind,
                    annotations,
                    public_members: Vec::new(),
                });
                current_type = Some(types.len() - 1);
            }
            LineEvent::Member(name) => {
                // Annotations seen so far decorated this member, not a type.
                state.take_pending();
                if let Some(idx) = current_type {
                    types[idx].public_members.push(name.to_string());
                }
            }
            LineEvent::Statement => {
                state.take_pending();
            }
        }
    }

    for ty in &mut types {
        ty.public_members.sort();
        ty.public_members.dedup();
    }

    SourceFileFacts {
        path: path.to_path_buf(),
        package,
        imports,
        types,
    }
}
