//! CLI binary for jrm: build bounded, deterministic structural maps of Java
//! repositories.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jrm_core::config::{BudgetUnit, JrmConfig};
use jrm_facts::bytecode::{BytecodeEdgeProvider, JdepsProvider};
use jrm_facts::collect::CollectOptions;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "jrm", about = "Deterministic structural map of a Java repository")]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the map artifact from the repository
    Build {
        /// Output path for the artifact
        #[arg(short, long, default_value = jrm_core::storage::DEFAULT_ARTIFACT)]
        output: PathBuf,

        /// Size budget (overrides config)
        #[arg(long)]
        budget: Option<usize>,

        /// Budget unit: tokens or bytes
        #[arg(long)]
        unit: Option<BudgetUnit>,

        /// Glob patterns to include files (repeatable)
        #[arg(long)]
        include: Vec<String>,

        /// Glob patterns to exclude files (repeatable)
        #[arg(long)]
        exclude: Vec<String>,

        /// Skip the jdeps bytecode analysis, use import-derived edges only
        #[arg(long)]
        no_jdeps: bool,
    },

    /// Summarize an existing map artifact
    Info {
        /// Artifact path
        #[arg(short, long, default_value = jrm_core::storage::DEFAULT_ARTIFACT)]
        artifact: PathBuf,
    },
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;

    match cli.command {
        Commands::Build {
            output,
            budget,
            unit,
            include,
            exclude,
            no_jdeps,
        } => cmd_build(&project_root, &output, budget, unit, include, exclude, no_jdeps),
        Commands::Info { artifact } => cmd_info(&artifact),
    }
}

fn cmd_build(
    project_root: &Path,
    output: &Path,
    budget: Option<usize>,
    unit: Option<BudgetUnit>,
    include: Vec<String>,
    exclude: Vec<String>,
    no_jdeps: bool,
) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    let mut config = JrmConfig::load(project_root)?;
    if let Some(limit) = budget {
        config.budget.limit = limit;
    }
    if let Some(unit) = unit {
        config.budget.unit = unit;
    }

    let jdeps = (config.tool.jdeps && !no_jdeps).then(|| JdepsProvider::from_config(&config.tool));
    let provider = jdeps.as_ref().map(|p| p as &dyn BytecodeEdgeProvider);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    spinner.set_message("Scanning sources...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let options = CollectOptions { include, exclude };
    let facts = jrm_facts::collect::collect(project_root, &options, provider)?;
    spinner.finish_and_clear();

    let file_count: usize = facts.modules.iter().map(|m| m.files.len()).sum();
    eprintln!(
        "  Collected {} file(s) across {} module(s)",
        file_count,
        facts.modules.len()
    );

    let generated_at = chrono::Utc::now().to_rfc3339();
    let outcome = jrm_map::pipeline::run(&facts, &config, Some(generated_at))?;

    jrm_core::storage::write_artifact(output, &outcome.bytes)?;

    let report = &outcome.report;
    eprintln!("\nMap built successfully!");
    eprintln!(
        "  Modules: {} -> {}",
        report.input.modules, report.output.modules
    );
    eprintln!(
        "  Packages: {} -> {}",
        report.input.packages, report.output.packages
    );
    eprintln!("  Types: {} -> {}", report.input.types, report.output.types);
    eprintln!("  Edges: {} -> {}", report.input.edges, report.output.edges);
    eprintln!("  Pruning actions: {}", report.actions.len());
    if report.budget_exceeded {
        eprintln!(
            "  Budget exceeded by ~{} byte(s) after all reductions",
            report.residual_overage
        );
    }
    for note in &report.notes {
        eprintln!("  note: {note}");
    }
    eprintln!("  Saved to: {}", output.display());

    Ok(())
}

fn cmd_info(artifact: &Path) -> Result<()> {
    let content = std::fs::read_to_string(artifact)
        .with_context(|| format!("failed to read artifact {}", artifact.display()))?;
    let doc: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("artifact {} is not valid JSON", artifact.display()))?;

    println!("Schema: {}", doc["schemaVersion"].as_str().unwrap_or("?"));
    println!(
        "Repository: {} ({})",
        doc["repository"]["name"].as_str().unwrap_or("?"),
        doc["repository"]["buildTool"].as_str().unwrap_or("?"),
    );
    if let Some(at) = doc["repository"]["generatedAt"].as_str() {
        println!("Generated: {at}");
    }

    let count = |key: &str| doc[key].as_array().map_or(0, Vec::len);
    println!();
    println!("Modules: {}", count("modules"));
    println!("Packages: {}", count("packages"));
    println!("Types: {}", count("types"));

    let report = &doc["budgetReport"];
    println!();
    println!(
        "Pruning actions: {}",
        report["actions"].as_array().map_or(0, Vec::len)
    );
    println!(
        "Budget exceeded: {}",
        report["budgetExceeded"].as_bool().unwrap_or(false)
    );
    if let Some(notes) = report["notes"].as_array() {
        for note in notes {
            if let Some(note) = note.as_str() {
                println!("note: {note}");
            }
        }
    }

    Ok(())
}
