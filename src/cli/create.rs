//! The `create` subcommand: push, edit, submit, follow up.

use git_pr::local::format_commit_log;
use git_pr::{
    CiTrigger, GitPrConfig, GitPrError, NoopTelemetrySink, RequestContext, ReviewRequestWorkflow,
    StderrJsonlTelemetrySink, SystemEditor, TelemetrySink, resolve_editor,
};

use super::output::write_outcome;
use super::session::Session;

/// Pushes the current branch and runs the review request workflow.
///
/// # Errors
///
/// Returns an error when the session cannot be resolved, the push fails, or
/// the workflow fails. A failure after the request was created carries its
/// URL.
pub fn run(config: &GitPrConfig) -> Result<(), GitPrError> {
    let session = Session::discover(config)?;
    session.push(config)?;

    let backend = session.backend(config)?;
    let jenkins = session.jenkins(config)?;
    let editor = SystemEditor::new(resolve_editor(config.editor.as_deref()));
    let telemetry: Box<dyn TelemetrySink> = if config.telemetry {
        Box::new(StderrJsonlTelemetrySink)
    } else {
        Box::new(NoopTelemetrySink)
    };

    let context = RequestContext {
        user: session.user.clone(),
        team: config.team().to_owned(),
        branches: session.branches.clone(),
        project: session.project.clone(),
        label: config.label.clone().unwrap_or_default(),
        remove_source_branch: config.remove_source_branch,
        ci_suite: config.jenkins_suite.clone().unwrap_or_default(),
        ci_key: config.jenkins_key(&session.user),
        commit_log: format_commit_log(&session.local.commit_messages()?),
    };

    let mut workflow =
        ReviewRequestWorkflow::new(backend.as_ref(), &editor, telemetry.as_ref(), &context);
    if let Some(trigger) = jenkins.as_ref() {
        workflow = workflow.with_ci(trigger as &dyn CiTrigger);
    }
    let outcome = workflow.run()?;

    write_outcome(&outcome)
}
