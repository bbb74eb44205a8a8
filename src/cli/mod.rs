//! Subcommand handlers.
//!
//! - [`create`]: Push the branch and run the review request workflow
//! - [`merge`]: Merge the open request for the current branch
//! - [`test`]: Send a raw GET to the backend API and print the record
//! - [`install`]: Register the `git pr` alias and store settings
//! - [`jenkins`]: Push the branch and start a CI build only
//!
//! Shared repository and backend resolution lives in [`session`].

use git_pr::GitPrError;

pub mod create;
pub mod install;
pub mod jenkins;
pub mod merge;
pub mod output;
pub mod session;
pub mod test;

/// Subcommand selected by the positional operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a review request (the default).
    Create,
    /// Merge the open request for the current branch.
    Merge,
    /// GET an API path and print the response.
    Test {
        /// Path relative to the backend API base URL.
        path: String,
    },
    /// Install the git alias and store settings.
    Install,
    /// Trigger the CI job without creating a request.
    Jenkins,
}

impl Command {
    /// Parses the subcommand from positional operands.
    ///
    /// # Errors
    ///
    /// Returns [`GitPrError::Configuration`] for an unknown subcommand, a
    /// missing `test` path, or surplus operands.
    pub fn from_operands(operands: &[String]) -> Result<Self, GitPrError> {
        let usage = |message: String| GitPrError::Configuration { message };
        let (name, rest) = match operands.split_first() {
            Some((name, rest)) => (name.as_str(), rest),
            None => return Ok(Self::Create),
        };

        let command = match name {
            "create" => Self::Create,
            "merge" => Self::Merge,
            "install" => Self::Install,
            "jenkins" => Self::Jenkins,
            "test" => {
                let [path] = rest else {
                    return Err(usage("usage: git-pr test <api-path>".to_owned()));
                };
                return Ok(Self::Test { path: path.clone() });
            }
            other => {
                return Err(usage(format!(
                    "unknown command `{other}` (expected create, merge, test, install or jenkins)"
                )));
            }
        };

        if rest.is_empty() {
            Ok(command)
        } else {
            Err(usage(format!("unexpected arguments: {}", rest.join(" "))))
        }
    }

    /// Returns false for `install`, which stores only what was supplied
    /// explicitly.
    pub const fn reads_git_settings(&self) -> bool {
        !matches!(self, Self::Install)
    }
}
