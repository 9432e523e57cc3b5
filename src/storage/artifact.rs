use crate::error::{ForkRiskError, Result};
use crate::report::RiskResult;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn artifact_err(path: &Path, stage: &str, err: impl std::fmt::Display) -> ForkRiskError {
    ForkRiskError::Artifact(format!("{} ({}): {}", path.display(), stage, err))
}

/// Replaces the artifact at `path` atomically.
///
/// The document is written to a sibling temp file, fsynced, then renamed over the target,
/// so readers see either the previous artifact or the new one. The temp file is removed
/// on every error path when it drops.
pub fn write_artifact(path: &Path, result: &RiskResult) -> Result<()> {
    let mut body =
        serde_json::to_vec_pretty(result).map_err(|e| artifact_err(path, "serialize", e))?;
    body.push(b'\n');

    replace_file(path, &body, publish_mode)?;

    tracing::info!(
        "[ARTIFACT] Wrote {} ({} bytes, riskLevel={})",
        path.display(),
        body.len(),
        result.risk_level.as_str()
    );
    Ok(())
}

#[cfg(unix)]
fn publish_mode(tmp: &NamedTempFile) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    // NamedTempFile is created 0600.
    tmp.as_file()
        .set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn publish_mode(_tmp: &NamedTempFile) -> io::Result<()> {
    Ok(())
}

fn replace_file(
    path: &Path,
    body: &[u8],
    before_persist: impl FnOnce(&NamedTempFile) -> io::Result<()>,
) -> Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| artifact_err(path, "create_dir_all", e))?;

    let mut tmp = NamedTempFile::new_in(&parent).map_err(|e| artifact_err(path, "tempfile", e))?;
    tmp.write_all(body)
        .map_err(|e| artifact_err(path, "write", e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| artifact_err(path, "fsync", e))?;
    before_persist(&tmp).map_err(|e| artifact_err(path, "chmod", e))?;

    tmp.persist(path)
        .map_err(|e| artifact_err(path, "rename", e.error))?;
    Ok(())
}
