//! Errors raised while triggering and tracking a CI build.

use thiserror::Error;

/// Failures of the CI trigger. None of them affect an already created
/// review request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CiError {
    /// The named job could not be found or read.
    #[error("failed to look up CI job {job}: {message}")]
    JobLookup {
        /// Job name.
        job: String,
        /// Failure detail.
        message: String,
    },

    /// The job could not be started.
    #[error("failed to start CI job {job}: {message}")]
    Invocation {
        /// Job name.
        job: String,
        /// Failure detail.
        message: String,
    },

    /// Reading the queue item failed.
    #[error("failed to poll CI queue item {queue_id}: {message}")]
    QueuePoll {
        /// Queue item identifier.
        queue_id: u64,
        /// Failure detail.
        message: String,
    },

    /// The queued build was cancelled before it started.
    #[error("CI queue item {queue_id} was cancelled")]
    Cancelled {
        /// Queue item identifier.
        queue_id: u64,
    },
}
