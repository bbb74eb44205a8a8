//! Error types surfaced by the review request workflow.

use thiserror::Error;

use crate::ci::CiError;
use crate::local::LocalDiscoveryError;
use crate::transport::TransportError;

/// Errors surfaced while preparing, submitting, or following up on a review
/// request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GitPrError {
    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// No credentials were configured for the hosting backend.
    #[error("credentials are required (use --user and --password)")]
    MissingCredentials,

    /// The hosting backend or CI server rejected or failed a request.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A response record did not have the shape the caller expected.
    #[error("unexpected {operation} payload: {message}")]
    Payload {
        /// Operation whose response could not be interpreted.
        operation: String,
        /// Decoder detail.
        message: String,
    },

    /// Triggering or polling the CI job failed.
    #[error(transparent)]
    Ci(#[from] CiError),

    /// A lookup expected exactly one open request but found another count.
    #[error("expected exactly one open request for {source_branch} -> {target_branch}, found {count}")]
    AmbiguousRequest {
        /// Source branch used for the lookup.
        source_branch: String,
        /// Target branch used for the lookup.
        target_branch: String,
        /// Number of matching open requests.
        count: usize,
    },

    /// A follow-up step failed after the request had already been created.
    #[error("request {web_url} was created but a follow-up step failed: {message}")]
    AfterSubmission {
        /// Web URL of the request that now exists on the backend.
        web_url: String,
        /// Description of the failed follow-up step.
        message: String,
    },

    /// Submission failed without a response; the request may already exist.
    #[error("submission was not confirmed and the request may already exist on the backend: {message}")]
    SubmissionUnconfirmed {
        /// Transport failure detail.
        message: String,
    },

    /// The external editor could not be launched or exited with an error.
    #[error("editor failed: {message}")]
    Editor {
        /// Launcher or exit status detail.
        message: String,
    },

    /// A template could not be parsed or rendered.
    #[error("template error: {message}")]
    Template {
        /// Detail from the template engine.
        message: String,
    },

    /// Local repository discovery failed.
    #[error("local repository: {0}")]
    Local(#[from] LocalDiscoveryError),

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// The selected backend does not implement the requested operation.
    #[error("{backend} does not support {operation}")]
    Unsupported {
        /// Backend name.
        backend: String,
        /// Operation name.
        operation: String,
    },
}

impl GitPrError {
    /// Builds a [`GitPrError::Payload`] for a decoding failure.
    pub(crate) fn payload(operation: &str, error: &serde_json::Error) -> Self {
        Self::Payload {
            operation: operation.to_owned(),
            message: error.to_string(),
        }
    }

    /// Builds a [`GitPrError::Io`] from a standard I/O error.
    pub(crate) fn io(context: &str, error: &std::io::Error) -> Self {
        Self::Io {
            message: format!("{context}: {error}"),
        }
    }
}

impl From<minijinja::Error> for GitPrError {
    fn from(error: minijinja::Error) -> Self {
        Self::Template {
            message: error.to_string(),
        }
    }
}
