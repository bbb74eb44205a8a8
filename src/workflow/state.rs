//! States and outcomes of the create workflow.

use std::fmt;

use crate::backend::SubmissionResult;
use crate::draft::Draft;

/// Steps of the create workflow, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowState {
    /// Fetch the team roster.
    ResolveTeam,
    /// Render the draft into the scratch file.
    ComposeDraft,
    /// Hand the scratch file to the operator.
    Edit,
    /// Strip comments and split title from body.
    Validate,
    /// Extract control directives from the body.
    ParseTrailers,
    /// Map `Review-By` handles to roster members.
    ResolveReviewers,
    /// Create the request on the backend.
    Submit,
    /// Assign approvers on the created request.
    SetApprovers,
    /// Start CI and post its URL, when a suite was requested.
    MaybeTriggerCi,
    /// The request exists and every follow-up has run.
    Done,
    /// The operator aborted before anything was submitted.
    Aborted,
}

impl WorkflowState {
    /// Returns true for `Done` and `Aborted`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ResolveTeam => "resolve-team",
            Self::ComposeDraft => "compose-draft",
            Self::Edit => "edit",
            Self::Validate => "validate",
            Self::ParseTrailers => "parse-trailers",
            Self::ResolveReviewers => "resolve-reviewers",
            Self::Submit => "submit",
            Self::SetApprovers => "set-approvers",
            Self::MaybeTriggerCi => "maybe-trigger-ci",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    /// Identifiers of the created request.
    pub result: SubmissionResult,
    /// The draft as it was finally submitted.
    pub draft: Draft,
    /// Build URL, when CI was triggered successfully.
    pub ci_url: Option<String>,
    /// Number of submit attempts, including the successful one.
    pub attempts: u32,
}

/// Terminal result of a workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// The request was created.
    Submitted(Box<SubmissionReport>),
    /// The operator aborted; nothing was created.
    Aborted {
        /// Title the operator left, or a note that it was empty.
        reason: String,
    },
}

impl WorkflowOutcome {
    /// Returns the report of a submitted request.
    #[must_use]
    pub fn report(&self) -> Option<&SubmissionReport> {
        match self {
            Self::Submitted(report) => Some(report),
            Self::Aborted { .. } => None,
        }
    }
}
