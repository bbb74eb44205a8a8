//! The `jenkins` subcommand: push and start a CI build only.

use git_pr::{CiParameters, CiTrigger, GitPrConfig, GitPrError};

use super::output::write_line;
use super::session::Session;

/// Pushes the current branch and starts the configured CI suite on it.
///
/// # Errors
///
/// Returns [`GitPrError::Configuration`] when no Jenkins URL or suite is
/// configured, and [`GitPrError::Ci`] when the build cannot be started.
pub fn run(config: &GitPrConfig) -> Result<(), GitPrError> {
    let session = Session::discover(config)?;
    let trigger = session
        .jenkins(config)?
        .ok_or_else(|| GitPrError::Configuration {
            message: "jenkins_url is required".to_owned(),
        })?;
    let suite = config
        .jenkins_suite
        .clone()
        .filter(|suite| !suite.is_empty())
        .ok_or_else(|| GitPrError::Configuration {
            message: "jenkins_suite is required".to_owned(),
        })?;

    session.push(config)?;

    let job = trigger.trigger(&CiParameters {
        branch: session.branches.source.clone(),
        suite,
        key: config.jenkins_key(&session.user),
    })?;
    match job.result_url {
        Some(url) => write_line(&format!("CI build: {url}")),
        None => write_line(&format!("CI build queued as item {}", job.queue_id)),
    }
}
