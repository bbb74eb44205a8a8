//! The `test` subcommand: a raw GET against the backend API.

use git_pr::{GitPrConfig, GitPrError};

use super::output::write_record;
use super::session::Session;

/// Fetches `path` relative to the backend API base and prints the record.
///
/// # Errors
///
/// Returns a transport error when the request fails.
pub fn run(config: &GitPrConfig, path: &str) -> Result<(), GitPrError> {
    let session = Session::discover(config)?;
    let backend = session.backend(config)?;
    let record = backend.test(path.trim_start_matches('/'))?;
    write_record(&record)
}
