//! Repository scan: module discovery, parallel per-file fact extraction,
//! and the single deterministic merge.
//!
//! Per-file parsing is embarrassingly parallel and read-only; results are
//! reduced only through a sort-by-path step, never through concurrent
//! mutation of shared maps, so fact collection is reproducible regardless
//! of scheduling.

use crate::build_meta::{self, BuildFacts};
use crate::bytecode::{BytecodeEdgeProvider, RawEdge};
use crate::java::{self, SourceFileFacts};
use anyhow::{Context, Result};
use jrm_core::error::Degradation;
use jrm_core::model::{BuildTool, Coordinates};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// All facts collected for one module.
#[derive(Debug)]
pub struct ModuleFacts {
    pub id: String,
    pub root: PathBuf,
    pub build: BuildFacts,
    /// Sorted by path (the deterministic merge key).
    pub files: Vec<SourceFileFacts>,
    /// Bytecode-derived edges; `None` degrades to the import fallback.
    pub raw_edges: Option<Vec<RawEdge>>,
}

/// The complete immutable fact set for a run.
#[derive(Debug)]
pub struct RepoFacts {
    pub name: String,
    pub build_tool: BuildTool,
    pub coordinates: Option<Coordinates>,
    /// Sorted by module id.
    pub modules: Vec<ModuleFacts>,
    pub degradations: Vec<Degradation>,
}

/// Scan filters.
#[derive(Debug, Clone, Default)]
pub struct CollectOptions {
    /// Glob patterns to include (all files when empty).
    pub include: Vec<String>,
    /// Glob patterns to exclude.
    pub exclude: Vec<String>,
}

fn build_globset(patterns: &[String], what: &str) -> Result<Option<globset::GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = globset::GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            globset::Glob::new(pattern).with_context(|| format!("invalid {what} glob: {pattern}"))?,
        );
    }
    Ok(Some(builder.build().with_context(|| format!("invalid {what} glob set"))?))
}

/// Collect the complete fact set for the repository at `root`.
pub fn collect(
    root: &Path,
    options: &CollectOptions,
    provider: Option<&dyn BytecodeEdgeProvider>,
) -> Result<RepoFacts> {
    let include = build_globset(&options.include, "--include")?;
    let exclude = build_globset(&options.exclude, "--exclude")?;

    let root_build = build_meta::load_build_facts(root);
    let mut degradations = root_build.degradations.clone();

    let name = root
        .file_name()
        .and_then(|n| n.to_str())
        .map_or_else(|| "repository".to_string(), ToString::to_string);
    let build_tool = root_build.tool.unwrap_or(BuildTool::Unknown);
    let coordinates = root_build.coordinates.clone();

    let mut modules = Vec::new();
    let mut used_ids = BTreeSet::new();
    for (rel_dir, module_root) in discover_module_roots(root, &root_build) {
        let build = if module_root == root {
            root_build.clone()
        } else {
            let facts = build_meta::load_build_facts(&module_root);
            degradations.extend(facts.degradations.clone());
            facts
        };

        let id = module_id(&rel_dir, &build, &mut used_ids);
        let files = collect_module_files(
            &module_root,
            include.as_ref(),
            exclude.as_ref(),
            &id,
            &mut degradations,
        );
        let raw_edges = collect_raw_edges(&module_root, &build, &id, provider, &mut degradations);

        modules.push(ModuleFacts {
            id,
            root: module_root,
            build,
            files,
            raw_edges,
        });
    }
    modules.sort_by(|a, b| a.id.cmp(&b.id));

    if modules.iter().all(|m| m.files.is_empty()) {
        degradations.push(Degradation::IngestGap(format!(
            "no Java sources found under {}",
            root.display()
        )));
    }

    Ok(RepoFacts {
        name,
        build_tool,
        coordinates,
        modules,
        degradations,
    })
}

/// Module roots declared by the aggregator descriptor, or the repository
/// root itself for single-module builds.
fn discover_module_roots(root: &Path, root_build: &BuildFacts) -> Vec<(String, PathBuf)> {
    let mut declared = root_build.modules.clone();
    if declared.is_empty() {
        for name in ["settings.gradle", "settings.gradle.kts"] {
            let settings = root.join(name);
            if let Ok(content) = std::fs::read_to_string(&settings) {
                declared = build_meta::gradle_settings_modules(&content);
                break;
            }
        }
    }

    let mut roots: Vec<(String, PathBuf)> = declared
        .iter()
        .map(|rel| (rel.clone(), root.join(rel)))
        .filter(|(_, dir)| dir.is_dir())
        .collect();
    if roots.is_empty() {
        let rel = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();
        roots.push((rel, root.to_path_buf()));
    }
    roots
}

/// Stable module identity: descriptor artifact id, else directory name;
/// collisions fall back to the full relative path.
fn module_id(rel_dir: &str, build: &BuildFacts, used: &mut BTreeSet<String>) -> String {
    let from_coords = build
        .coordinates
        .as_ref()
        .map(|c| c.artifact.clone())
        .filter(|a| !a.is_empty());
    let from_dir = rel_dir
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(ToString::to_string);

    let mut id = from_coords
        .or(from_dir)
        .unwrap_or_else(|| "root".to_string());
    if used.contains(&id) && !rel_dir.is_empty() {
        id = rel_dir.replace('/', "-");
    }
    used.insert(id.clone());
    id
}

fn collect_module_files(
    module_root: &Path,
    include: Option<&globset::GlobSet>,
    exclude: Option<&globset::GlobSet>,
    module_id: &str,
    degradations: &mut Vec<Degradation>,
) -> Vec<SourceFileFacts> {
    let source_root = ["src/main/java", "src"]
        .iter()
        .map(|candidate| module_root.join(candidate))
        .find(|dir| dir.is_dir());
    let Some(source_root) = source_root else {
        degradations.push(Degradation::IngestGap(format!(
            "module {module_id}: no source root"
        )));
        return Vec::new();
    };

    let walker = ignore::WalkBuilder::new(&source_root)
        .hidden(true)
        .git_ignore(true)
        .build();

    let mut sources: Vec<(PathBuf, String)> = Vec::new();
    for entry in walker.flatten() {
        let path = entry.path();
        if !path.is_file() || !path.extension().is_some_and(|e| e == "java") {
            continue;
        }
        let rel = path.strip_prefix(module_root).unwrap_or(path);
        if let Some(inc) = include
            && !inc.is_match(rel)
        {
            continue;
        }
        if let Some(exc) = exclude
            && exc.is_match(rel)
        {
            continue;
        }
        match std::fs::read_to_string(path) {
            Ok(content) => sources.push((rel.to_path_buf(), content)),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "skipping unreadable source file");
            }
        }
    }

    // Deterministic merge: parse in parallel, order by path.
    let mut files: Vec<SourceFileFacts> = sources
        .par_iter()
        .map(|(path, content)| java::parse_java_file(path, content))
        .collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

fn collect_raw_edges(
    module_root: &Path,
    build: &BuildFacts,
    module_id: &str,
    provider: Option<&dyn BytecodeEdgeProvider>,
    degradations: &mut Vec<Degradation>,
) -> Option<Vec<RawEdge>> {
    let Some(provider) = provider else {
        degradations.push(Degradation::EdgeProvenance(format!(
            "module {module_id}: imports fallback"
        )));
        return None;
    };

    let classes_dir = match build.tool {
        Some(BuildTool::Gradle) => module_root.join("build/classes/java/main"),
        _ => module_root.join("target/classes"),
    };
    if !classes_dir.is_dir() {
        degradations.push(Degradation::DependencyToolUnavailable(format!(
            "module {module_id}: no compiled classes at {}",
            classes_dir.display()
        )));
        return None;
    }

    match provider.collect(&classes_dir) {
        Ok(edges) => {
            degradations.push(Degradation::EdgeProvenance(format!(
                "module {module_id}: bytecode"
            )));
            Some(edges)
        }
        Err(err) => {
            tracing::warn!(module = module_id, %err, "bytecode edge provider failed");
            degradations.push(Degradation::DependencyToolUnavailable(format!(
                "module {module_id}: {err}"
            )));
            None
        }
    }
}
