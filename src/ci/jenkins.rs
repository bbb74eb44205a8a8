//! Jenkins implementation of [`CiTrigger`].

use std::thread;
use std::time::Duration;

use http::header::LOCATION;
use reqwest::Method;
use serde::Deserialize;

use super::{CiError, CiJob, CiParameters, CiTrigger};
use crate::transport::{ClientOptions, Credentials, RestClient, TransportError};

/// Job started when none is configured.
pub const DEFAULT_JOB: &str = "devtest-pvt-branch-validator";

/// Interval between queue polls when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Connection settings for a Jenkins server.
#[derive(Debug, Clone)]
pub struct JenkinsSettings {
    /// Server base URL, such as `https://jenkins.example`.
    pub url: String,
    /// Login.
    pub user: String,
    /// API token.
    pub token: String,
    /// Job name; folders are separated by `/`.
    pub job: String,
    /// Accepts self-signed certificates.
    pub insecure: bool,
    /// Delay between queue polls.
    pub poll_interval: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
struct QueueItem {
    #[serde(default)]
    cancelled: bool,
    #[serde(default)]
    executable: Option<Executable>,
}

#[derive(Debug, Default, Deserialize)]
struct Executable {
    #[serde(default)]
    number: u64,
    #[serde(default)]
    url: String,
}

/// Starts parameterised Jenkins builds and polls the queue for their URL.
#[derive(Debug, Clone)]
pub struct JenkinsTrigger {
    client: RestClient,
    job: String,
    poll_interval: Duration,
}

impl JenkinsTrigger {
    /// Builds a trigger from connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] when the HTTP client cannot be built.
    pub fn new(settings: &JenkinsSettings) -> Result<Self, TransportError> {
        let options = ClientOptions {
            timeout: settings.timeout,
            accept_invalid_certs: settings.insecure,
        };
        let client = RestClient::new(
            &settings.url,
            Credentials::basic(&settings.user, &settings.token),
            options,
        )?;
        Ok(Self::with_client(client, &settings.job, settings.poll_interval))
    }

    /// Builds a trigger around an existing client.
    #[must_use]
    pub fn with_client(client: RestClient, job: &str, poll_interval: Duration) -> Self {
        Self {
            client,
            job: job.to_owned(),
            poll_interval,
        }
    }

    fn job_path(&self) -> String {
        self.job
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| format!("job/{segment}"))
            .collect::<Vec<_>>()
            .join("/")
    }

    fn lookup_job(&self) -> Result<(), CiError> {
        let url = self.client.url(&format!("{}/api/json", self.job_path()));
        self.client
            .execute(Method::GET, &url, None, None)
            .map(|_| ())
            .map_err(|error| CiError::JobLookup {
                job: self.job.clone(),
                message: error.to_string(),
            })
    }

    fn invoke(&self, parameters: &CiParameters) -> Result<u64, CiError> {
        let invocation_error = |message: String| CiError::Invocation {
            job: self.job.clone(),
            message,
        };
        let url = self
            .client
            .url(&format!("{}/buildWithParameters", self.job_path()));
        let query = [
            ("PVT_BRANCH_NAME", parameters.branch.as_str()),
            ("SUITE_TO_RUN", parameters.suite.as_str()),
            ("CICD_KEYPAIR", parameters.key.as_str()),
        ];

        let response = self
            .client
            .request(Method::POST, &url, Some(&query), None)
            .map_err(|error| invocation_error(error.to_string()))?;
        let location = response
            .headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| invocation_error("response has no Location header".to_owned()))?;

        queue_id_from_location(location)
            .ok_or_else(|| invocation_error(format!("unexpected queue location {location}")))
    }

    fn poll(&self, queue_id: u64) -> Result<QueueItem, CiError> {
        let url = self
            .client
            .url(&format!("queue/item/{queue_id}/api/json"));
        let record = self
            .client
            .execute(Method::GET, &url, None, None)
            .map_err(|error| CiError::QueuePoll {
                queue_id,
                message: error.to_string(),
            })?;
        serde_json::from_value(record).map_err(|error| CiError::QueuePoll {
            queue_id,
            message: error.to_string(),
        })
    }
}

impl CiTrigger for JenkinsTrigger {
    fn trigger(&self, parameters: &CiParameters) -> Result<CiJob, CiError> {
        self.lookup_job()?;

        tracing::info!(
            job = %self.job,
            suite = %parameters.suite,
            branch = %parameters.branch,
            "starting CI job"
        );
        let queue_id = self.invoke(parameters)?;
        tracing::info!(queue_id, "CI job queued, waiting to start");

        loop {
            let item = self.poll(queue_id)?;
            if item.cancelled {
                return Err(CiError::Cancelled { queue_id });
            }
            if let Some(executable) = item.executable
                && executable.number != 0
            {
                tracing::info!(url = %executable.url, number = executable.number, "CI job started");
                return Ok(CiJob {
                    queue_id,
                    result_url: Some(executable.url),
                    parameters: parameters.clone(),
                });
            }
            thread::sleep(self.poll_interval);
        }
    }
}

/// Extracts the numeric id from a queue location such as
/// `https://jenkins.example/queue/item/123/`.
fn queue_id_from_location(location: &str) -> Option<u64> {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}
