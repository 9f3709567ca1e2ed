//! Bytecode-derived dependency edges.
//!
//! The external tool invocation is isolated behind [`BytecodeEdgeProvider`]
//! so the core never performs process management and tests can substitute a
//! stub. The shipped implementation shells out to `jdeps` with a bounded
//! timeout; any failure degrades to the import-derived fallback upstream.

use jrm_core::config::ToolConfig;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// A raw `source -> target` edge at package granularity, as reported by the
/// tool. Endpoints are plain package names, not graph identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEdge {
    pub source: String,
    pub target: String,
}

/// Why a provider invocation produced no edges.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("`{0}` not found on PATH")]
    NotFound(String),
    #[error("`{tool}` timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },
    #[error("`{tool}` exited with status {status}")]
    Failed { tool: String, status: i32 },
    #[error("failed to run `{tool}`: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

/// Supplier of raw dependency edges for one module's compiled classes.
pub trait BytecodeEdgeProvider {
    fn collect(&self, classes_dir: &Path) -> Result<Vec<RawEdge>, ToolError>;
}

/// `jdeps`-backed provider.
pub struct JdepsProvider {
    pub timeout: Duration,
    pub multi_release: String,
}

impl JdepsProvider {
    pub fn from_config(config: &ToolConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.jdeps_timeout_secs),
            multi_release: config.multi_release.clone(),
        }
    }
}

impl BytecodeEdgeProvider for JdepsProvider {
    fn collect(&self, classes_dir: &Path) -> Result<Vec<RawEdge>, ToolError> {
        let jdeps = resolve_executable("jdeps").ok_or_else(|| ToolError::NotFound("jdeps".into()))?;

        let mut cmd = Command::new(jdeps);
        cmd.arg("-q")
            .arg("--recursive")
            .arg("--multi-release")
            .arg(&self.multi_release)
            .arg(classes_dir);

        let output = run_with_timeout(&mut cmd, "jdeps", self.timeout)?;
        Ok(parse_edge_lines(&output))
    }
}

/// Parse `a -> b` lines from tool output. The right-hand side may carry a
/// trailing containing-module column; only the first token is the target.
pub fn parse_edge_lines(output: &str) -> Vec<RawEdge> {
    let mut edges = Vec::new();
    for line in output.lines() {
        let Some((left, right)) = line.split_once("->") else {
            continue;
        };
        let source = left.trim().split_whitespace().next_back().unwrap_or("");
        let target = right.trim().split_whitespace().next().unwrap_or("");
        if source.is_empty() || target.is_empty() {
            continue;
        }
        edges.push(RawEdge {
            source: source.to_string(),
            target: target.to_string(),
        });
    }
    edges
}

/// Locate an executable on PATH.
pub fn resolve_executable(binary: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        let candidate = dir.join(binary);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Run a command, killing it at the deadline. Stdout is drained on a helper
/// thread so a filled pipe can never stall the child.
fn run_with_timeout(cmd: &mut Command, tool: &str, timeout: Duration) -> Result<String, ToolError> {
    cmd.stdout(Stdio::piped()).stderr(Stdio::null());
    let mut child = cmd.spawn().map_err(|source| ToolError::Spawn {
        tool: tool.to_string(),
        source,
    })?;

    let mut stdout = child.stdout.take().ok_or_else(|| ToolError::Spawn {
        tool: tool.to_string(),
        source: std::io::Error::other("stdout not captured"),
    })?;
    let reader = std::thread::spawn(move || {
        let mut buf = String::new();
        let _ = stdout.read_to_string(&mut buf);
        buf
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = reader.join();
                    return Err(ToolError::Timeout {
                        tool: tool.to_string(),
                        seconds: timeout.as_secs(),
                    });
                }
                std::thread::sleep(Duration::from_millis(25));
            }
            Err(source) => {
                let _ = child.kill();
                return Err(ToolError::Spawn {
                    tool: tool.to_string(),
                    source,
                });
            }
        }
    };

    let output = reader.join().unwrap_or_default();
    if !status.success() {
        return Err(ToolError::Failed {
            tool: tool.to_string(),
            status: status.code().unwrap_or(-1),
        });
    }
    Ok(output)
}
