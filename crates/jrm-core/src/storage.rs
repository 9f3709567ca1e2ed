//! Atomic artifact storage.
//!
//! The artifact is serialized fully in memory before anything touches disk;
//! the bytes land in a sibling temporary file which is renamed over the
//! final path. A failed or cancelled run leaves no partial artifact.

use crate::error::ArtifactError;
use std::fs;
use std::path::{Path, PathBuf};

/// Default artifact file name.
pub const DEFAULT_ARTIFACT: &str = "jrm-map.json";

/// Sibling temporary path used while committing `path`.
fn staging_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Commit `bytes` to `path`, all or nothing.
pub fn write_artifact(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    let staging = staging_path(path);

    fs::write(&staging, bytes).map_err(|source| ArtifactError::Write {
        path: staging.display().to_string(),
        source,
    })?;

    if let Err(source) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(ArtifactError::Commit {
            path: path.display().to_string(),
            source,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_artifact_commits_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(DEFAULT_ARTIFACT);

        write_artifact(&path, b"{\"schemaVersion\":\"1.0.0\"}\n").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("schemaVersion"));
        assert!(!staging_path(&path).exists(), "staging file left behind");
    }

    #[test]
    fn test_write_artifact_overwrites_previous() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(DEFAULT_ARTIFACT);

        write_artifact(&path, b"first").unwrap();
        write_artifact(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_write_artifact_missing_parent_fails_cleanly() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("no-such-dir").join(DEFAULT_ARTIFACT);

        let err = write_artifact(&path, b"x").unwrap_err();
        assert!(matches!(err, ArtifactError::Write { .. }));
        assert!(!path.exists());
    }
}
