//! The create workflow: edit, validate, submit, retry, follow up.
//!
//! [`ReviewRequestWorkflow::run`] walks the states in [`WorkflowState`].
//! Only the submit step loops: a status the backend answered with sends the
//! operator back to the editor with the same scratch file, so nothing typed
//! is lost. A submit that got no response at all is not retried, since the
//! backend may already hold the request. Every other step runs at most once,
//! and nothing after a successful submission is retried.
//!
//! Once the backend has accepted the request a failure can no longer undo
//! it. From that point errors are reported as
//! [`GitPrError::AfterSubmission`] carrying the request URL, and CI errors
//! only produce a warning.

mod state;

pub use state::{SubmissionReport, WorkflowOutcome, WorkflowState};

use crate::backend::{BranchPair, HostingBackend, Member, ProjectRef, SubmissionResult};
use crate::ci::{CiParameters, CiTrigger};
use crate::directives::{extract_directives, strip};
use crate::draft::{
    Draft, DraftTemplateContext, TemplateMember, ValidatedText, render_ci_comment,
    render_request_draft, validate_text,
};
use crate::editor::{DraftEditor, ScratchFile};
use crate::error::GitPrError;
use crate::reviewers::{list_members, resolve_reviewers};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Everything the workflow knows about the operator and the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Operator handle; excluded from the reviewer roster.
    pub user: String,
    /// Team whose members are offered as reviewers; empty for none.
    pub team: String,
    /// Remote source branch and target branch.
    pub branches: BranchPair,
    /// Repository on the backend.
    pub project: ProjectRef,
    /// Default label offered in the draft.
    pub label: String,
    /// Default for removing the source branch after merge.
    pub remove_source_branch: bool,
    /// Default CI suite offered in the draft.
    pub ci_suite: String,
    /// Key pair name passed to CI.
    pub ci_key: String,
    /// Commit messages that seed the description.
    pub commit_log: String,
}

/// Drives one create run against a backend, an editor, and optionally CI.
pub struct ReviewRequestWorkflow<'a> {
    backend: &'a dyn HostingBackend,
    editor: &'a dyn DraftEditor,
    ci: Option<&'a dyn CiTrigger>,
    telemetry: &'a dyn TelemetrySink,
    context: &'a RequestContext,
    trace: Vec<WorkflowState>,
}

impl<'a> ReviewRequestWorkflow<'a> {
    /// Creates a workflow without CI.
    #[must_use]
    pub fn new(
        backend: &'a dyn HostingBackend,
        editor: &'a dyn DraftEditor,
        telemetry: &'a dyn TelemetrySink,
        context: &'a RequestContext,
    ) -> Self {
        Self {
            backend,
            editor,
            ci: None,
            telemetry,
            context,
            trace: Vec::new(),
        }
    }

    /// Enables the CI step.
    #[must_use]
    pub fn with_ci(mut self, ci: &'a dyn CiTrigger) -> Self {
        self.ci = Some(ci);
        self
    }

    /// States entered so far, in order. `Edit` through `Submit` repeat once
    /// per attempt.
    #[must_use]
    pub fn trace(&self) -> &[WorkflowState] {
        &self.trace
    }

    fn enter(&mut self, state: WorkflowState) {
        tracing::debug!(%state, "workflow state");
        self.trace.push(state);
    }

    /// Runs the workflow to a terminal state.
    ///
    /// # Errors
    ///
    /// Returns an error when a step other than submit fails before the
    /// request exists, when submit fails with a non-retryable error, or
    /// [`GitPrError::AfterSubmission`] when a follow-up fails afterwards.
    pub fn run(&mut self) -> Result<WorkflowOutcome, GitPrError> {
        self.enter(WorkflowState::ResolveTeam);
        let roster = list_members(self.backend, &self.context.team, &self.context.user)?;

        self.enter(WorkflowState::ComposeDraft);
        let scratch = ScratchFile::create(&self.compose(&roster)?)?;

        let mut attempt: u32 = 0;
        let (draft, result) = loop {
            attempt = attempt.saturating_add(1);

            self.enter(WorkflowState::Edit);
            self.editor.edit(scratch.path())?;
            let edited = scratch.read()?;

            self.enter(WorkflowState::Validate);
            let (title, body) = match validate_text(&strip(&edited)) {
                ValidatedText::Aborted { title } => return Ok(self.abort(title)),
                ValidatedText::Accepted { title, body } => (title, body),
            };

            self.enter(WorkflowState::ParseTrailers);
            let (directives, remainder) = extract_directives(&body);

            self.enter(WorkflowState::ResolveReviewers);
            let reviewers = resolve_reviewers(&directives, &roster);
            let draft = Draft::assemble(
                title,
                remainder,
                &directives,
                reviewers,
                self.backend.kind(),
                self.context.remove_source_branch,
            );

            self.enter(WorkflowState::Submit);
            match self.backend.submit(&draft, &self.context.branches) {
                Ok(result) => break (draft, result),
                Err(GitPrError::Transport(error)) if error.is_retryable() => {
                    tracing::warn!(attempt, %error, "submission rejected, editing again");
                    self.telemetry.record(TelemetryEvent::SubmissionRejected {
                        attempt,
                        message: error.to_string(),
                    });
                }
                Err(GitPrError::Transport(error)) if error.is_unconfirmed() => {
                    tracing::warn!(
                        attempt,
                        %error,
                        "submission not confirmed, check the backend before creating again"
                    );
                    return Err(GitPrError::SubmissionUnconfirmed {
                        message: error.to_string(),
                    });
                }
                Err(error) => return Err(error),
            }
        };

        tracing::info!(web_url = %result.web_url, attempt, "request submitted: {}", result.web_url);
        self.telemetry.record(TelemetryEvent::RequestSubmitted {
            web_url: result.web_url.clone(),
            attempt,
        });

        self.enter(WorkflowState::SetApprovers);
        self.set_approvers(&result, &draft.reviewers)?;

        self.enter(WorkflowState::MaybeTriggerCi);
        let ci_url = self.maybe_trigger_ci(&result, &draft)?;

        self.enter(WorkflowState::Done);
        Ok(WorkflowOutcome::Submitted(Box::new(SubmissionReport {
            result,
            draft,
            ci_url,
            attempts: attempt,
        })))
    }

    fn compose(&self, roster: &[Member]) -> Result<String, GitPrError> {
        let kind = self.backend.kind();
        let context = DraftTemplateContext {
            user: self.context.user.clone(),
            branch: self.context.branches.source.clone(),
            upstream: self.context.branches.target.clone(),
            owner: self.context.project.owner.clone(),
            repo: self.context.project.repo.clone(),
            remove_source_branch: self.context.remove_source_branch,
            team: self.context.team.clone(),
            label: self.context.label.clone(),
            label_key: kind
                .label_directive()
                .map(|key| key.as_str().to_owned())
                .unwrap_or_default(),
            remove_key: kind
                .remove_directive()
                .map(|key| key.as_str().to_owned())
                .unwrap_or_default(),
            suite: self.context.ci_suite.clone(),
            commits: self.context.commit_log.clone(),
            members: roster.iter().map(TemplateMember::from).collect(),
        };
        render_request_draft(&context)
    }

    fn abort(&mut self, title: String) -> WorkflowOutcome {
        self.enter(WorkflowState::Aborted);
        self.telemetry.record(TelemetryEvent::DraftAborted);
        let reason = if title.is_empty() {
            "empty title".to_owned()
        } else {
            title
        };
        tracing::info!(%reason, "aborted, nothing was submitted");
        WorkflowOutcome::Aborted { reason }
    }

    fn set_approvers(
        &self,
        result: &SubmissionResult,
        reviewers: &[Member],
    ) -> Result<(), GitPrError> {
        if reviewers.is_empty() || !self.backend.capabilities().approvers {
            return Ok(());
        }
        self.backend
            .set_approvers(result, reviewers)
            .map_err(|error| after_submission(result, "setting approvers", &error))?;
        self.telemetry.record(TelemetryEvent::ApproversAssigned {
            count: reviewers.len(),
        });
        Ok(())
    }

    fn maybe_trigger_ci(
        &self,
        result: &SubmissionResult,
        draft: &Draft,
    ) -> Result<Option<String>, GitPrError> {
        let Some(suite) = draft.ci_suite.as_deref() else {
            return Ok(None);
        };
        if !self.backend.capabilities().comments {
            tracing::warn!(
                backend = %self.backend.kind(),
                suite,
                "backend cannot post CI results, skipping CI"
            );
            return Ok(None);
        }
        let Some(ci) = self.ci else {
            tracing::warn!(suite, "no CI server configured, skipping CI");
            return Ok(None);
        };

        let parameters = CiParameters {
            branch: self.context.branches.source.clone(),
            suite: suite.to_owned(),
            key: self.context.ci_key.clone(),
        };
        let url = match ci.trigger(&parameters) {
            Ok(job) => job.result_url,
            Err(error) => {
                tracing::warn!(%error, "CI trigger failed, the request is unaffected");
                self.telemetry.record(TelemetryEvent::CiFailed {
                    message: error.to_string(),
                });
                return Ok(None);
            }
        };
        let Some(url) = url else {
            return Ok(None);
        };
        self.telemetry
            .record(TelemetryEvent::CiTriggered { url: url.clone() });

        let comment = render_ci_comment(suite, &url)
            .map_err(|error| after_submission(result, "rendering the CI comment", &error))?;
        self.backend
            .post_comment(result, &comment)
            .map_err(|error| after_submission(result, "posting the CI comment", &error))?;
        self.telemetry.record(TelemetryEvent::CommentPosted);

        Ok(Some(url))
    }
}

fn after_submission(result: &SubmissionResult, step: &str, error: &GitPrError) -> GitPrError {
    GitPrError::AfterSubmission {
        web_url: result.web_url.clone(),
        message: format!("{step}: {error}"),
    }
}
