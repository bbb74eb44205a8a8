//! The `merge` subcommand.

use git_pr::{GitPrConfig, GitPrError, MergeOutcome};

use super::output::write_line;
use super::session::Session;

/// Merges the single open request from the current branch into its target.
///
/// # Errors
///
/// Returns [`GitPrError::AmbiguousRequest`] unless exactly one open request
/// matches, and [`GitPrError::Unsupported`] when the backend cannot merge.
pub fn run(config: &GitPrConfig) -> Result<(), GitPrError> {
    let session = Session::discover(config)?;
    let backend = session.backend(config)?;

    match backend.merge(&session.branches)? {
        MergeOutcome::Merged { web_url } => write_line(&format!("Merged {web_url}")),
        MergeOutcome::Unsupported => Err(GitPrError::Unsupported {
            backend: backend.kind().to_string(),
            operation: "merge".to_owned(),
        }),
    }
}
