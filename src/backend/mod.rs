//! Hosting backends behind one capability set.
//!
//! The workflow only sees [`HostingBackend`]. Each concrete backend owns a
//! [`RestClient`] bound to its API base URL and the operator's credentials
//! and differs from the others in URL templates, payload field names, and
//! which follow-up operations it implements.

pub mod bitbucket;
pub mod github;
pub mod gitlab;
pub mod models;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde_json::Value;

use crate::directives::DirectiveKey;
use crate::draft::Draft;
use crate::error::GitPrError;
use crate::transport::{ClientOptions, Credentials, RestClient};

pub use bitbucket::BitbucketBackend;
pub use github::GitHubBackend;
pub use gitlab::GitLabBackend;
pub use models::{
    BranchPair, Capabilities, Member, MemberStatus, MergeOutcome, ProjectRef, SubmissionResult,
    encode_segment,
};

/// Operations the workflow needs from a hosting backend.
#[cfg_attr(test, mockall::automock)]
pub trait HostingBackend {
    /// Which provider this is.
    fn kind(&self) -> BackendKind;

    /// Follow-up operations the backend implements.
    fn capabilities(&self) -> Capabilities;

    /// Fetches the unfiltered team roster, following pagination.
    ///
    /// # Errors
    ///
    /// Returns a transport or payload error when the roster cannot be read.
    fn team_members(&self, team: &str) -> Result<Vec<Member>, GitPrError>;

    /// Creates the request on the backend.
    ///
    /// # Errors
    ///
    /// Returns [`GitPrError::Transport`] when the backend rejects the request
    /// and [`GitPrError::Payload`] when the response cannot be interpreted.
    fn submit(&self, draft: &Draft, branches: &BranchPair)
    -> Result<SubmissionResult, GitPrError>;

    /// Assigns required approvers on a created request.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the backend rejects the update.
    fn set_approvers(
        &self,
        submission: &SubmissionResult,
        approvers: &[Member],
    ) -> Result<(), GitPrError>;

    /// Posts a comment onto a created request.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the backend rejects the comment.
    fn post_comment(&self, submission: &SubmissionResult, body: &str) -> Result<(), GitPrError>;

    /// Merges the single open request matching `branches`.
    ///
    /// # Errors
    ///
    /// Returns [`GitPrError::AmbiguousRequest`] unless exactly one open
    /// request matches.
    fn merge(&self, branches: &BranchPair) -> Result<MergeOutcome, GitPrError>;

    /// Issues a diagnostic GET against an arbitrary API path.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the request fails.
    fn test(&self, path: &str) -> Result<Value, GitPrError>;
}

/// Supported hosting providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// GitLab merge requests.
    #[default]
    GitLab,
    /// GitHub pull requests.
    GitHub,
    /// Bitbucket Cloud pull requests.
    Bitbucket,
}

impl BackendKind {
    /// Returns the lowercase name used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GitLab => "gitlab",
            Self::GitHub => "github",
            Self::Bitbucket => "bitbucket",
        }
    }

    /// REST base URL used when none is configured.
    #[must_use]
    pub const fn default_api_url(self) -> &'static str {
        match self {
            Self::GitLab => "https://gitlab.com/api/v4",
            Self::GitHub => "https://api.github.com",
            Self::Bitbucket => "https://api.bitbucket.org/2.0",
        }
    }

    /// Directive carrying labels for this backend.
    #[must_use]
    pub const fn label_directive(self) -> Option<DirectiveKey> {
        match self {
            Self::GitLab => Some(DirectiveKey::GitlabLabel),
            Self::GitHub => Some(DirectiveKey::GithubLabel),
            Self::Bitbucket => None,
        }
    }

    /// Directive controlling source branch removal for this backend.
    #[must_use]
    pub const fn remove_directive(self) -> Option<DirectiveKey> {
        match self {
            Self::GitLab => Some(DirectiveKey::GitlabRemove),
            Self::Bitbucket => Some(DirectiveKey::BitbucketClose),
            Self::GitHub => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = GitPrError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gitlab" => Ok(Self::GitLab),
            "github" => Ok(Self::GitHub),
            "bitbucket" | "bb" => Ok(Self::Bitbucket),
            other => Err(GitPrError::Configuration {
                message: format!("unknown backend `{other}` (expected gitlab, github or bitbucket)"),
            }),
        }
    }
}

/// Settings needed to construct a backend.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// Provider to talk to.
    pub kind: BackendKind,
    /// REST base URL override.
    pub api_url: Option<String>,
    /// Operator login.
    pub user: String,
    /// Password or personal access token.
    pub secret: String,
    /// Repository the requests target.
    pub project: ProjectRef,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Builds the concrete backend selected by `settings.kind`.
///
/// # Errors
///
/// Returns [`GitPrError::MissingCredentials`] when the user or secret is
/// empty and [`GitPrError::Transport`] when the HTTP client cannot be built.
pub fn build_backend(settings: &BackendSettings) -> Result<Box<dyn HostingBackend>, GitPrError> {
    if settings.user.is_empty() || settings.secret.is_empty() {
        return Err(GitPrError::MissingCredentials);
    }

    let base_url = settings
        .api_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| settings.kind.default_api_url());
    let mut credentials = Credentials::basic(&settings.user, &settings.secret);
    if settings.kind == BackendKind::GitLab {
        credentials = credentials.with_token_header(gitlab::TOKEN_HEADER);
    }
    let options = ClientOptions {
        timeout: settings.timeout,
        ..ClientOptions::default()
    };
    let client = RestClient::new(base_url, credentials, options)?;

    tracing::debug!(backend = %settings.kind, base_url, "backend configured");

    let project = settings.project.clone();
    Ok(match settings.kind {
        BackendKind::GitLab => Box::new(GitLabBackend::new(client, project)),
        BackendKind::GitHub => Box::new(GitHubBackend::new(client, project)),
        BackendKind::Bitbucket => Box::new(BitbucketBackend::new(client, project)),
    })
}

/// Decodes a generic record into a typed response model.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    operation: &str,
    record: Value,
) -> Result<T, GitPrError> {
    serde_json::from_value(record).map_err(|error| GitPrError::payload(operation, &error))
}

/// Logs and reports an operation the backend does not implement.
pub(crate) fn skipped(kind: BackendKind, operation: &str) {
    tracing::warn!(backend = %kind, operation, "operation not supported by backend, skipping");
}
