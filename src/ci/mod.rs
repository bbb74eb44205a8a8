//! CI trigger and poll.
//!
//! A build is started with a fixed parameter set, which yields a queue
//! identifier. The queue item is then polled at a fixed interval until the
//! server assigns a build number, at which point the build URL is known.

mod error;
pub mod jenkins;

pub use error::CiError;
pub use jenkins::{JenkinsSettings, JenkinsTrigger};

/// Job parameters for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiParameters {
    /// Remote branch under test.
    pub branch: String,
    /// Test suite to run.
    pub suite: String,
    /// Key pair name the build deploys with.
    pub key: String,
}

/// A build request moving from queued to running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiJob {
    /// Queue item identifier assigned on invocation.
    pub queue_id: u64,
    /// Build URL, present once the build is running.
    pub result_url: Option<String>,
    /// Parameters the build was started with.
    pub parameters: CiParameters,
}

impl CiJob {
    /// Returns true once a build URL has been assigned.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.result_url.is_some()
    }
}

/// Starts a build and waits until it is running.
#[cfg_attr(test, mockall::automock)]
pub trait CiTrigger {
    /// Starts a build with `parameters` and blocks until it has a URL.
    ///
    /// # Errors
    ///
    /// Returns a [`CiError`] when the job lookup, invocation, or any poll
    /// fails, or when the queued build is cancelled.
    fn trigger(&self, parameters: &CiParameters) -> Result<CiJob, CiError>;
}
