//! Shared test utilities: a Tokio runtime for Wiremock and mock servers
//! preloaded with GitLab and Jenkins endpoints.

#![allow(
    dead_code,
    reason = "each integration test binary uses a different subset of helpers"
)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use git_pr::backend::gitlab::TOKEN_HEADER;
use git_pr::backend::{GitLabBackend, ProjectRef};
use git_pr::transport::{ClientOptions, Credentials};
use git_pr::{JenkinsTrigger, RestClient};
use serde_json::json;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Project every fixture targets.
pub const PROJECT_PATH: &str = "/projects/infra%2Fapi/merge_requests";

/// Browser URL returned for the created request.
pub const WEB_URL: &str = "https://gitlab.example/infra/api/-/merge_requests/7";

/// Shared runtime wrapper that can be stored in an `rstest-bdd` Slot.
#[derive(Clone)]
pub struct SharedRuntime(Rc<RefCell<Runtime>>);

impl SharedRuntime {
    /// Starts a new multi-threaded runtime.
    ///
    /// # Panics
    ///
    /// Panics if the runtime cannot be created.
    pub fn start() -> Self {
        let runtime =
            Runtime::new().unwrap_or_else(|error| panic!("failed to start runtime: {error}"));
        Self(Rc::new(RefCell::new(runtime)))
    }

    /// Drives `future` to completion.
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.0.borrow().block_on(future)
    }
}

/// A Wiremock server together with the runtime that drives it.
#[derive(Clone)]
pub struct MockApi {
    /// Runtime used for mounting and inspection.
    pub runtime: SharedRuntime,
    /// The server, shared between the GitLab and Jenkins clients.
    pub server: Rc<MockServer>,
}

impl MockApi {
    /// Starts a fresh server.
    pub fn start() -> Self {
        let runtime = SharedRuntime::start();
        let server = runtime.block_on(MockServer::start());
        Self {
            runtime,
            server: Rc::new(server),
        }
    }

    /// Mounts `mock` on the server.
    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    /// Returns the bodies of requests received for `method` and `path`.
    pub fn bodies(&self, http_method: &str, request_path: &str) -> Vec<serde_json::Value> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
            .into_iter()
            .filter(|request| {
                request.method.as_str() == http_method && request.url.path() == request_path
            })
            .map(|request| serde_json::from_slice(&request.body).unwrap_or_default())
            .collect()
    }

    /// Builds a GitLab backend for `infra/api` pointed at this server.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    pub fn gitlab_backend(&self) -> GitLabBackend {
        let credentials = Credentials::basic("alice", "secret").with_token_header(TOKEN_HEADER);
        let client = RestClient::new(self.server.uri(), credentials, ClientOptions::default())
            .unwrap_or_else(|error| panic!("client should build: {error}"));
        GitLabBackend::new(client, ProjectRef::new("infra", "api"))
    }

    /// Builds a Jenkins trigger for job `validator` pointed at this server.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    pub fn jenkins_trigger(&self) -> JenkinsTrigger {
        let client = RestClient::new(
            self.server.uri(),
            Credentials::basic("alice", "api-token"),
            ClientOptions::default(),
        )
        .unwrap_or_else(|error| panic!("client should build: {error}"));
        JenkinsTrigger::with_client(client, "validator", Duration::from_millis(5))
    }

    /// Mounts a roster for `infra/dp` with the given handles, numbered from 1.
    pub fn mount_roster(&self, handles: &[&str]) {
        let members: Vec<_> = handles
            .iter()
            .zip(1_u64..)
            .map(|(handle, id)| json!({"id": id, "username": handle, "name": handle, "state": "active"}))
            .collect();
        self.mount(
            Mock::given(method("GET"))
                .and(path("/groups/infra%2Fdp/members"))
                .respond_with(ResponseTemplate::new(200).set_body_json(members)),
        );
    }

    /// Mounts a successful merge request creation returning iid 7.
    pub fn mount_create(&self) {
        self.mount(
            Mock::given(method("POST"))
                .and(path(PROJECT_PATH))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                    "id": 1007,
                    "iid": 7,
                    "project_id": 42,
                    "web_url": WEB_URL
                }))),
        );
    }

    /// Mounts a creation that fails `times` times with 409 before any other
    /// creation mock applies.
    pub fn mount_conflicts(&self, times: u64) {
        self.mount(
            Mock::given(method("POST"))
                .and(path(PROJECT_PATH))
                .respond_with(
                    ResponseTemplate::new(409)
                        .set_body_json(json!({"message": ["Another open merge request already exists"]})),
                )
                .up_to_n_times(times)
                .with_priority(1),
        );
    }

    /// Mounts the approver and note endpoints of the created request.
    pub fn mount_follow_ups(&self) {
        self.mount(
            Mock::given(method("PUT"))
                .and(path("/projects/42/merge_requests/7/approvers"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({}))),
        );
        self.mount(
            Mock::given(method("POST"))
                .and(path("/projects/42/merge_requests/7/notes"))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1}))),
        );
    }

    /// Mounts a Jenkins job `validator` whose build starts as `build_url`.
    pub fn mount_jenkins(&self, build_url: &str) {
        self.mount(
            Mock::given(method("GET"))
                .and(path("/job/validator/api/json"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "validator"}))),
        );
        self.mount(
            Mock::given(method("POST"))
                .and(path("/job/validator/buildWithParameters"))
                .respond_with(ResponseTemplate::new(201).insert_header(
                    "Location",
                    format!("{}/queue/item/3/", self.server.uri()).as_str(),
                )),
        );
        self.mount(
            Mock::given(method("GET"))
                .and(path("/queue/item/3/api/json"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "executable": {"number": 42, "url": build_url}
                }))),
        );
    }
}
