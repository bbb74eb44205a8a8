//! Error types for local repository discovery and git plumbing.

use thiserror::Error;

/// Errors that may occur while inspecting or pushing the local repository.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocalDiscoveryError {
    /// Current directory is not within a Git repository.
    #[error("not inside a Git repository")]
    NotARepository,

    /// `HEAD` does not point at a local branch.
    #[error("HEAD is detached; check out a branch first")]
    DetachedHead,

    /// The current branch has no upstream configured.
    #[error("branch '{branch}' has no upstream (set one with `git branch -u`)")]
    NoUpstream {
        /// Current branch name.
        branch: String,
    },

    /// The specified remote does not exist.
    #[error("remote '{name}' not found")]
    RemoteNotFound {
        /// Name of the missing remote.
        name: String,
    },

    /// The remote URL could not be parsed.
    #[error("could not parse remote URL: {url}")]
    InvalidRemoteUrl {
        /// The unparseable URL string.
        url: String,
    },

    /// Pushing the branch failed.
    #[error("push failed: {message}")]
    Push {
        /// Exit status and stderr of the push.
        message: String,
    },

    /// Git operation failed.
    #[error("git error: {message}")]
    Git {
        /// Error detail from the git2 library.
        message: String,
    },
}

impl From<git2::Error> for LocalDiscoveryError {
    fn from(error: git2::Error) -> Self {
        Self::Git {
            message: error.message().to_owned(),
        }
    }
}
