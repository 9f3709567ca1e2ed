//! Configuration for map generation.
//!
//! Load order: `.jrm/config.toml` → environment variables → defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Top-level jrm configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JrmConfig {
    pub budget: BudgetConfig,
    pub scorer: ScorerConfig,
    pub projector: ProjectorConfig,
    pub tool: ToolConfig,
}

/// Unit the size budget is expressed in. Tokens are estimated at four bytes
/// per token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetUnit {
    Tokens,
    Bytes,
}

impl BudgetUnit {
    /// Convert a budget limit in this unit to an estimated byte limit.
    pub fn to_bytes(self, limit: usize) -> usize {
        match self {
            BudgetUnit::Tokens => limit.saturating_mul(4),
            BudgetUnit::Bytes => limit,
        }
    }
}

impl FromStr for BudgetUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tokens" => Ok(BudgetUnit::Tokens),
            "bytes" => Ok(BudgetUnit::Bytes),
            other => Err(format!("unknown budget unit: {other}")),
        }
    }
}

/// Size budget for the output artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    pub limit: usize,
    pub unit: BudgetUnit,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            limit: 16_000,
            unit: BudgetUnit::Tokens,
        }
    }
}

impl BudgetConfig {
    /// The budget expressed as an estimated byte limit.
    pub fn byte_limit(&self) -> usize {
        self.unit.to_bytes(self.limit)
    }
}

/// Importance scorer constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Cap on the entry-point distance, bounding BFS cost on cyclic graphs.
    pub depth_cap: u32,
    /// Divisor keeping annotation density comparable across types.
    pub annotation_norm: f64,
    /// Annotations marking a type as a system boundary (routes, endpoints,
    /// entry routines). Matched against the simple annotation name.
    pub entry_annotations: Vec<String>,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            depth_cap: 10,
            annotation_norm: 4.0,
            entry_annotations: [
                "Path",
                "GET",
                "POST",
                "PUT",
                "DELETE",
                "PATCH",
                "RestController",
                "Controller",
                "RequestMapping",
                "GetMapping",
                "PostMapping",
                "PutMapping",
                "DeleteMapping",
                "WebServlet",
                "ServerEndpoint",
                "QuarkusMain",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
        }
    }
}

/// Budget projector tunables. The escalation schedule is deliberately
/// configurable; tests assert monotonicity rather than exact thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorConfig {
    /// Initial edge-support threshold for reduction step (a).
    pub support_start: usize,
    /// Fixed increment applied when a pass reclaims too little.
    pub support_step: usize,
    /// Threshold ceiling; step (a) gives up beyond this.
    pub support_max: usize,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            support_start: 2,
            support_step: 2,
            support_max: 16,
        }
    }
}

/// External bytecode-dependency tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Attempt the jdeps analysis at all; import-derived edges otherwise.
    pub jdeps: bool,
    pub jdeps_timeout_secs: u64,
    /// Value passed to `--multi-release`.
    pub multi_release: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            jdeps: true,
            jdeps_timeout_secs: 20,
            multi_release: "21".to_string(),
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl JrmConfig {
    /// Load config from `.jrm/config.toml` in the project root, with env var
    /// overrides. Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".jrm").join("config.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        env_override("JRM_BUDGET", &mut config.budget.limit);
        env_override("JRM_BUDGET_UNIT", &mut config.budget.unit);
        env_override("JRM_DEPTH_CAP", &mut config.scorer.depth_cap);
        env_override("JRM_SUPPORT_START", &mut config.projector.support_start);
        env_override("JRM_SUPPORT_STEP", &mut config.projector.support_step);
        env_override("JRM_SUPPORT_MAX", &mut config.projector.support_max);
        env_override("JRM_JDEPS_TIMEOUT", &mut config.tool.jdeps_timeout_secs);

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.projector.support_step == 0 {
            anyhow::bail!("projector.support_step must be at least 1");
        }
        if self.projector.support_start > self.projector.support_max {
            anyhow::bail!(
                "projector.support_start ({}) must not exceed support_max ({})",
                self.projector.support_start,
                self.projector.support_max,
            );
        }
        if self.scorer.annotation_norm <= 0.0 {
            anyhow::bail!("scorer.annotation_norm must be positive");
        }
        Ok(())
    }
}
