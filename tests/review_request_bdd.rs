//! Behavioural tests for the review request workflow against mock GitLab
//! and Jenkins servers.

mod support;

use git_pr::test_support::{RecordingTelemetrySink, ScriptedEditor};
use git_pr::{
    BranchPair, GitPrError, ProjectRef, RequestContext, ReviewRequestWorkflow, WorkflowOutcome,
};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use serde_json::json;
use support::{MockApi, PROJECT_PATH, WEB_URL};

#[derive(ScenarioState, Default)]
struct RequestState {
    api: Slot<MockApi>,
    jenkins: Slot<bool>,
    drafts: Slot<Vec<String>>,
    outcome: Slot<WorkflowOutcome>,
    error: Slot<GitPrError>,
}

#[fixture]
fn workflow_state() -> RequestState {
    RequestState::default()
}

fn context() -> RequestContext {
    RequestContext {
        user: "alice".to_owned(),
        team: "infra/dp".to_owned(),
        branches: BranchPair {
            source: "alice/fix-parser".to_owned(),
            target: "main".to_owned(),
        },
        project: ProjectRef::new("infra", "api"),
        label: String::new(),
        remove_source_branch: false,
        ci_suite: String::new(),
        ci_key: "alice".to_owned(),
        commit_log: "Fix the parser".to_owned(),
    }
}

fn push_draft(workflow_state: &RequestState, draft: String) {
    let mut drafts = workflow_state.drafts.take().unwrap_or_default();
    drafts.push(draft);
    workflow_state.drafts.set(drafts);
}

#[expect(
    clippy::expect_used,
    reason = "integration test step; allow-expect-in-tests does not cover integration tests"
)]
fn api(workflow_state: &RequestState) -> MockApi {
    workflow_state.api.get().expect("mock server not initialised")
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[given("a GitLab server with team members {members}")]
fn seed_gitlab(workflow_state: &RequestState, members: String) {
    let api = MockApi::start();
    let handles: Vec<&str> = members.trim_matches('"').split(',').collect();
    api.mount_roster(&handles);
    api.mount_create();
    api.mount_follow_ups();
    workflow_state.api.set(api);
}

#[given("the server rejects the first {count:u64} submissions")]
fn seed_conflicts(workflow_state: &RequestState, count: u64) {
    api(workflow_state).mount_conflicts(count);
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[given("a Jenkins job that starts build {url}")]
fn seed_jenkins(workflow_state: &RequestState, url: String) {
    api(workflow_state).mount_jenkins(url.trim_matches('"'));
    workflow_state.jenkins.set(true);
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[given("the operator writes {title} requesting review from {reviewer}")]
fn write_review_draft(workflow_state: &RequestState, title: String, reviewer: String) {
    push_draft(
        workflow_state,
        format!(
            "{}\n\nDetails.\n\nReview-By: {}\n",
            title.trim_matches('"'),
            reviewer.trim_matches('"')
        ),
    );
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[given("the operator writes {title} running suite {suite}")]
fn write_suite_draft(workflow_state: &RequestState, title: String, suite: String) {
    push_draft(
        workflow_state,
        format!(
            "{}\n\nJenkins-Suite: {}\n",
            title.trim_matches('"'),
            suite.trim_matches('"')
        ),
    );
}

#[when("the review request workflow runs")]
fn run_workflow(workflow_state: &RequestState) {
    let api = api(workflow_state);
    let backend = api.gitlab_backend();
    let trigger = api.jenkins_trigger();
    let editor = ScriptedEditor::new(workflow_state.drafts.get().unwrap_or_default());
    let telemetry = RecordingTelemetrySink::default();
    let context = context();

    let mut workflow = ReviewRequestWorkflow::new(&backend, &editor, &telemetry, &context);
    if workflow_state.jenkins.get().unwrap_or(false) {
        workflow = workflow.with_ci(&trigger);
    }

    match workflow.run() {
        Ok(outcome) => workflow_state.outcome.set(outcome),
        Err(error) => workflow_state.error.set(error),
    }
}

#[then("the request is reported as created")]
#[expect(
    clippy::expect_used,
    reason = "integration test step; allow-expect-in-tests does not cover integration tests"
)]
fn assert_created(workflow_state: &RequestState) {
    assert_eq!(workflow_state.error.get(), None, "workflow should not fail");
    let outcome = workflow_state.outcome.get().expect("workflow did not run");
    let report = outcome.report().expect("request should be created");

    assert_eq!(report.result.web_url, WEB_URL);
}

#[then("the workflow is aborted")]
fn assert_aborted(workflow_state: &RequestState) {
    assert!(matches!(
        workflow_state.outcome.get(),
        Some(WorkflowOutcome::Aborted { .. })
    ));
}

#[then("{count:usize} creation requests are sent")]
fn assert_creation_count(workflow_state: &RequestState, count: usize) {
    assert_eq!(api(workflow_state).bodies("POST", PROJECT_PATH).len(), count);
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[then("approver ids {ids} are assigned")]
fn assert_approvers(workflow_state: &RequestState, ids: String) {
    let expected: Vec<u64> = ids
        .trim_matches('"')
        .split(',')
        .filter_map(|id| id.parse().ok())
        .collect();
    let bodies = api(workflow_state).bodies("PUT", "/projects/42/merge_requests/7/approvers");

    assert_eq!(
        bodies,
        vec![json!({"approver_ids": expected, "approver_group_ids": []})],
        "approvers should be set exactly once"
    );
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[then("exactly one comment mentions {url}")]
fn assert_comment(workflow_state: &RequestState, url: String) {
    let url_clean = url.trim_matches('"');
    let bodies = api(workflow_state).bodies("POST", "/projects/42/merge_requests/7/notes");

    assert_eq!(bodies.len(), 1, "one comment should be posted");
    assert!(
        bodies
            .iter()
            .filter_map(|body| body.get("body").and_then(|text| text.as_str()))
            .all(|text| text.contains(url_clean)),
        "comment should contain the build URL"
    );
}

#[scenario(path = "tests/features/review_request.feature", index = 0)]
fn reviewers_become_approvers(workflow_state: RequestState) {
    let _ = workflow_state;
}

#[scenario(path = "tests/features/review_request.feature", index = 1)]
fn aborted_draft_changes_nothing(workflow_state: RequestState) {
    let _ = workflow_state;
}

#[scenario(path = "tests/features/review_request.feature", index = 2)]
fn rejected_submission_is_retried(workflow_state: RequestState) {
    let _ = workflow_state;
}

#[scenario(path = "tests/features/review_request.feature", index = 3)]
fn ci_url_is_posted(workflow_state: RequestState) {
    let _ = workflow_state;
}
