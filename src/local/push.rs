//! Pushing the local branch before a request is created.

use std::path::Path;
use std::process::Command;

use super::error::LocalDiscoveryError;

/// Force-pushes `HEAD` to `branch` on `remote` with the `git` binary.
///
/// The binary is used rather than libgit2 so the operator's credential
/// helpers and SSH agent apply.
///
/// # Errors
///
/// Returns [`LocalDiscoveryError::Push`] when `git` cannot be started or
/// exits unsuccessfully.
pub fn push_branch(workdir: &Path, remote: &str, branch: &str) -> Result<(), LocalDiscoveryError> {
    let refspec = format!("HEAD:refs/heads/{branch}");
    tracing::info!(remote, branch, "pushing branch");

    let output = Command::new("git")
        .current_dir(workdir)
        .args(["push", "-f", remote, refspec.as_str()])
        .output()
        .map_err(|error| LocalDiscoveryError::Push {
            message: format!("failed to run git: {error}"),
        })?;

    if !output.status.success() {
        return Err(LocalDiscoveryError::Push {
            message: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(())
}
