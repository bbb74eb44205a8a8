//! git-pr library crate: code review requests from the command line.
//!
//! The library drives the review request workflow against GitLab, GitHub,
//! or Bitbucket: it renders an editable draft, parses control directives out
//! of the edited text, resolves reviewers against the team roster, submits
//! the request (letting the operator edit and retry on rejection), assigns
//! approvers, and optionally starts a Jenkins build whose URL is posted back
//! onto the request.

pub mod backend;
pub mod ci;
pub mod config;
pub mod directives;
pub mod draft;
pub mod editor;
pub mod error;
pub mod local;
pub mod reviewers;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod transport;
pub mod workflow;

pub use backend::{
    BackendKind, BackendSettings, BranchPair, Capabilities, HostingBackend, Member, MergeOutcome,
    ProjectRef, SubmissionResult, build_backend,
};
pub use ci::{CiError, CiJob, CiParameters, CiTrigger, JenkinsSettings, JenkinsTrigger};
pub use config::GitPrConfig;
pub use draft::Draft;
pub use editor::{DraftEditor, ScratchFile, SystemEditor, resolve_editor};
pub use error::GitPrError;
pub use local::{LocalDiscoveryError, LocalRepository, discover_repository};
pub use telemetry::{
    NoopTelemetrySink, StderrJsonlTelemetrySink, TelemetryEvent, TelemetrySink, init_tracing,
};
pub use transport::{RestClient, TransportError};
pub use workflow::{
    RequestContext, ReviewRequestWorkflow, WorkflowOutcome, WorkflowState,
};
