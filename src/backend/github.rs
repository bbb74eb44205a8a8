//! GitHub pull requests.
//!
//! Roster lookup, creation with labels, and the diagnostic passthrough are
//! wired up. Labels go through the issues API once the pull request exists.
//! Reviewers, approver assignment, comments, and merging are skipped with a
//! warning.

use std::collections::BTreeSet;

use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};

use super::models::{
    BranchPair, Capabilities, Member, MergeOutcome, ProjectRef, SubmissionResult, encode_segment,
};
use super::{BackendKind, HostingBackend, decode, skipped};
use crate::draft::Draft;
use crate::error::GitPrError;
use crate::transport::RestClient;

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: u64,
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    id: u64,
    number: u64,
    html_url: String,
}

/// GitHub backend.
#[derive(Debug, Clone)]
pub struct GitHubBackend {
    client: RestClient,
    project: ProjectRef,
}

impl GitHubBackend {
    /// Creates a backend for `project`.
    #[must_use]
    pub const fn new(client: RestClient, project: ProjectRef) -> Self {
        Self { client, project }
    }

    /// Adds `labels` to the created pull request.
    ///
    /// The pull request already exists at this point, so a failure is
    /// reported with its URL rather than as a rejected submission.
    fn apply_labels(
        &self,
        submission: &SubmissionResult,
        labels: &BTreeSet<String>,
    ) -> Result<(), GitPrError> {
        if labels.is_empty() {
            return Ok(());
        }
        let url = self.client.url(&format!(
            "repos/{}/{}/issues/{}/labels",
            self.project.owner, self.project.repo, submission.internal_sequence_id
        ));
        let payload = json!({ "labels": labels });

        self.client
            .execute(Method::POST, &url, None, Some(&payload))
            .map_err(|error| GitPrError::AfterSubmission {
                web_url: submission.web_url.clone(),
                message: format!("applying labels: {error}"),
            })?;
        tracing::debug!(count = labels.len(), "labels applied");
        Ok(())
    }
}

impl HostingBackend for GitHubBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::GitHub
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// `team` is `org/slug`; a bare slug is looked up in the repository owner.
    fn team_members(&self, team: &str) -> Result<Vec<Member>, GitPrError> {
        let (org, slug) = team
            .split_once('/')
            .unwrap_or((self.project.owner.as_str(), team));
        let url = self.client.url(&format!(
            "orgs/{}/teams/{}/members",
            encode_segment(org),
            encode_segment(slug)
        ));
        let records = self
            .client
            .fetch_all(Method::GET, &url, Some(&[("per_page", "100")]))?;

        // GitHub reports no display name or state on this endpoint.
        records
            .into_iter()
            .map(|record| {
                decode::<ApiUser>("team members", record)
                    .map(|user| Member::new(user.login.clone(), user.login).with_numeric_id(user.id))
            })
            .collect()
    }

    fn submit(
        &self,
        draft: &Draft,
        branches: &BranchPair,
    ) -> Result<SubmissionResult, GitPrError> {
        let payload = json!({
            "title": draft.title,
            "body": draft.body,
            "head": branches.source,
            "base": branches.target,
        });
        let url = self.client.url(&format!(
            "repos/{}/{}/pulls",
            self.project.owner, self.project.repo
        ));

        let record = self
            .client
            .execute(Method::POST, &url, None, Some(&payload))?;
        let pull = decode::<ApiPullRequest>("pull request", record)?;
        let submission = SubmissionResult {
            request_id: pull.id.to_string(),
            internal_sequence_id: pull.number,
            host_project_id: self.project.full_path(),
            web_url: pull.html_url,
        };

        self.apply_labels(&submission, &draft.labels)?;
        if !draft.reviewers.is_empty() {
            skipped(self.kind(), "reviewers");
        }
        Ok(submission)
    }

    fn set_approvers(
        &self,
        _submission: &SubmissionResult,
        _approvers: &[Member],
    ) -> Result<(), GitPrError> {
        skipped(self.kind(), "set approvers");
        Ok(())
    }

    fn post_comment(&self, _submission: &SubmissionResult, _body: &str) -> Result<(), GitPrError> {
        skipped(self.kind(), "post comment");
        Ok(())
    }

    fn merge(&self, _branches: &BranchPair) -> Result<MergeOutcome, GitPrError> {
        skipped(self.kind(), "merge");
        Ok(MergeOutcome::Unsupported)
    }

    fn test(&self, path: &str) -> Result<Value, GitPrError> {
        let url = self.client.url(path);
        Ok(self.client.execute(Method::GET, &url, None, None)?)
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;
    use tokio::runtime::Runtime;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::GitHubBackend;
    use crate::backend::{BranchPair, HostingBackend, Member, MergeOutcome, ProjectRef};
    use crate::draft::Draft;
    use crate::error::GitPrError;
    use crate::transport::{ClientOptions, Credentials, RestClient};

    struct GitHubFixture {
        runtime: Runtime,
        server: MockServer,
        backend: GitHubBackend,
    }

    impl GitHubFixture {
        fn mount_created_pull(&self) {
            self.runtime.block_on(
                Mock::given(method("POST"))
                    .and(path("/repos/acme/widgets/pulls"))
                    .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                        "id": 77,
                        "number": 3,
                        "html_url": "https://github.example/acme/widgets/pull/3"
                    })))
                    .mount(&self.server),
            );
        }

        fn request_count(&self) -> usize {
            self.runtime
                .block_on(self.server.received_requests())
                .map_or(0, |requests| requests.len())
        }
    }

    fn branches() -> BranchPair {
        BranchPair {
            source: "feature".to_owned(),
            target: "main".to_owned(),
        }
    }

    #[fixture]
    fn github() -> GitHubFixture {
        let runtime = Runtime::new().expect("runtime should start");
        let server = runtime.block_on(MockServer::start());
        let client = RestClient::new(
            server.uri(),
            Credentials::basic("octo", "token"),
            ClientOptions::default(),
        )
        .expect("client should build");
        GitHubFixture {
            runtime,
            server,
            backend: GitHubBackend::new(client, ProjectRef::new("acme", "widgets")),
        }
    }

    #[rstest]
    fn team_members_defaults_org_to_owner(github: GitHubFixture) {
        github.runtime.block_on(
            Mock::given(method("GET"))
                .and(path("/orgs/acme/teams/core/members"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                    {"id": 10, "login": "hubot"}
                ])))
                .mount(&github.server),
        );

        let members = github.backend.team_members("core").expect("roster should load");

        assert_eq!(members, vec![Member::new("hubot", "hubot").with_numeric_id(10)]);
    }

    #[rstest]
    fn submit_creates_pull_request(github: GitHubFixture) {
        github.runtime.block_on(
            Mock::given(method("POST"))
                .and(path("/repos/acme/widgets/pulls"))
                .and(body_json(json!({
                    "title": "Add widget",
                    "body": "Details",
                    "head": "feature",
                    "base": "main",
                })))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                    "id": 77,
                    "number": 3,
                    "html_url": "https://github.example/acme/widgets/pull/3"
                })))
                .mount(&github.server),
        );
        let draft = Draft {
            title: "Add widget".to_owned(),
            body: "Details".to_owned(),
            ..Draft::default()
        };
        let result = github
            .backend
            .submit(&draft, &branches())
            .expect("pull request should be created");

        assert_eq!(result.internal_sequence_id, 3);
        assert_eq!(result.host_project_id, "acme/widgets");
        assert_eq!(result.web_url, "https://github.example/acme/widgets/pull/3");
        assert_eq!(github.request_count(), 1, "no labels means no label call");
    }

    #[rstest]
    fn submit_applies_labels_to_created_pull_request(github: GitHubFixture) {
        github.mount_created_pull();
        github.runtime.block_on(
            Mock::given(method("POST"))
                .and(path("/repos/acme/widgets/issues/3/labels"))
                .and(body_json(json!({"labels": ["bug", "ui"]})))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                    {"name": "bug"}, {"name": "ui"}
                ])))
                .mount(&github.server),
        );
        let draft = Draft {
            title: "Add widget".to_owned(),
            labels: ["ui".to_owned(), "bug".to_owned()].into_iter().collect(),
            ..Draft::default()
        };

        let result = github
            .backend
            .submit(&draft, &branches())
            .expect("pull request should be created and labelled");

        assert_eq!(result.internal_sequence_id, 3);
        assert_eq!(github.request_count(), 2);
    }

    #[rstest]
    fn label_failure_reports_the_created_pull_request(github: GitHubFixture) {
        github.mount_created_pull();
        github.runtime.block_on(
            Mock::given(method("POST"))
                .and(path("/repos/acme/widgets/issues/3/labels"))
                .respond_with(ResponseTemplate::new(422).set_body_string("invalid label"))
                .mount(&github.server),
        );
        let draft = Draft {
            title: "Add widget".to_owned(),
            labels: ["bug".to_owned()].into_iter().collect(),
            ..Draft::default()
        };

        let error = github
            .backend
            .submit(&draft, &branches())
            .expect_err("label rejection should surface");

        assert!(matches!(
            error,
            GitPrError::AfterSubmission { ref web_url, .. }
                if web_url == "https://github.example/acme/widgets/pull/3"
        ));
    }

    #[rstest]
    fn follow_ups_are_skipped_without_network_calls(github: GitHubFixture) {
        let outcome = github.backend.merge(&branches()).expect("merge is a no-op");

        assert_eq!(outcome, MergeOutcome::Unsupported);
        assert!(!github.backend.capabilities().comments);
        assert_eq!(github.request_count(), 0);
    }
}
