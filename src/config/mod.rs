//! Application configuration loaded from CLI, environment, files, and git.
//!
//! This module provides a unified configuration struct that merges values
//! from command-line arguments, environment variables, and configuration
//! files using ortho-config's layered approach. Settings stored in git
//! configuration under `pr.*` (written by `git-pr install`) are applied
//! afterwards and only fill fields that are still unset.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Git settings** – `pr.user`, `pr.team`, `pr.jenkins-url`, ...
//! 3. **Configuration file** – `.git-pr.toml` in current directory, home
//!    directory, or XDG config directory
//! 4. **Environment variables** – `GIT_PR_USER`, `GIT_PR_PASSWORD`, ...
//! 5. **Command-line arguments** – `--user`/`-u`, `--team`/`-t`, ...
//!
//! # Configuration File
//!
//! ```toml
//! backend = "gitlab"
//! api_url = "https://gitlab.example/api/v4"
//! user = "alice"
//! team = "infra/dp"
//! label = "needs-review"
//! jenkins_url = "https://jenkins.example"
//! jenkins_suite = "smoke"
//! ```

use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::backend::BackendKind;
use crate::ci::jenkins::{DEFAULT_JOB, DEFAULT_POLL_INTERVAL};
use crate::draft::parse_flag;
use crate::error::GitPrError;

/// Branch name template used when none is configured.
pub const DEFAULT_BRANCH_TEMPLATE: &str = "{{ branch }}";

/// Per-request timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use git_pr::GitPrConfig;
/// use ortho_config::OrthoConfig;
///
/// let config = GitPrConfig::load().expect("failed to load configuration");
/// let user = config.resolve_user().expect("user required");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "GIT_PR",
    discovery(
        dotfile_name = ".git-pr.toml",
        config_file_name = "git-pr.toml",
        app_name = "git-pr"
    )
)]
pub struct GitPrConfig {
    /// Hosting backend: `gitlab` (default), `github`, or `bitbucket`.
    #[ortho_config(cli_short = 'b')]
    pub backend: Option<String>,

    /// REST base URL overriding the backend's public default.
    #[ortho_config(cli_short = 'a')]
    pub api_url: Option<String>,

    /// Login on the hosting backend. Falls back to `USER`.
    #[ortho_config(cli_short = 'u')]
    pub user: Option<String>,

    /// Password or personal access token.
    #[ortho_config(cli_short = 'p')]
    pub password: Option<String>,

    /// Team whose members are offered as reviewers.
    #[ortho_config(cli_short = 't')]
    pub team: Option<String>,

    /// Label offered in the draft.
    #[ortho_config(cli_short = 'l')]
    pub label: Option<String>,

    /// Removes the source branch once the request is merged.
    ///
    /// Not read from the environment because `ortho_config` does not load
    /// boolean values from it.
    #[ortho_config(cli_short = 'd')]
    pub remove_source_branch: bool,

    /// Template for the remote branch name, rendered with `branch`, `user`,
    /// `owner`, and `repo`.
    #[ortho_config(cli_short = 'B')]
    pub branch_template: Option<String>,

    /// Target branch. Defaults to the upstream of the current branch.
    #[ortho_config(cli_short = 'U')]
    pub upstream: Option<String>,

    /// Repository owner. Defaults to the owner parsed from the remote URL.
    #[ortho_config(cli_short = 'o')]
    pub owner: Option<String>,

    /// Repository name. Defaults to the name parsed from the remote URL.
    #[ortho_config(cli_short = 'r')]
    pub repo: Option<String>,

    /// Editor command. Falls back to `GIT_EDITOR`, `EDITOR`, then
    /// `/usr/bin/editor`.
    #[ortho_config(cli_short = 'e')]
    pub editor: Option<String>,

    /// Skips pushing the branch before `create` and `jenkins`.
    #[ortho_config(cli_short = 'n')]
    pub no_push: bool,

    /// Jenkins server URL. CI is disabled when unset.
    #[ortho_config(cli_short = 'j')]
    pub jenkins_url: Option<String>,

    /// Jenkins login. Defaults to `user`.
    #[ortho_config(cli_short = 'J')]
    pub jenkins_user: Option<String>,

    /// Jenkins API token.
    #[ortho_config(cli_short = 'k')]
    pub jenkins_token: Option<String>,

    /// Jenkins job name; folders are separated by `/`.
    #[ortho_config(cli_short = 'w')]
    pub jenkins_job: Option<String>,

    /// Suite offered in the draft's `Jenkins-Suite` line.
    #[ortho_config(cli_short = 's')]
    pub jenkins_suite: Option<String>,

    /// Key pair name passed to the job. Defaults to `user`.
    #[ortho_config(cli_short = 'K')]
    pub jenkins_key: Option<String>,

    /// Accepts self-signed Jenkins certificates.
    #[ortho_config(cli_short = 'i')]
    pub jenkins_insecure: bool,

    /// Delay between Jenkins queue polls, in milliseconds.
    #[ortho_config(cli_short = 'P')]
    pub jenkins_poll_interval_ms: Option<u64>,

    /// Timeout for each HTTP request, in seconds.
    #[ortho_config(cli_short = 'T')]
    pub request_timeout_seconds: Option<u64>,

    /// Logs at debug level, including every HTTP exchange.
    #[ortho_config(cli_short = 'v')]
    pub verbose: bool,

    /// Writes logs as JSON.
    #[ortho_config(cli_short = 'L')]
    pub log_json: bool,

    /// Writes workflow telemetry to stderr as JSON lines.
    #[ortho_config(cli_short = 'E')]
    pub telemetry: bool,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|text| !text.trim().is_empty())
}

impl GitPrConfig {
    /// Returns the selected backend, defaulting to GitLab.
    ///
    /// # Errors
    ///
    /// Returns [`GitPrError::Configuration`] for an unknown backend name.
    pub fn backend_kind(&self) -> Result<BackendKind, GitPrError> {
        non_empty(self.backend.as_ref()).map_or_else(|| Ok(BackendKind::default()), str::parse)
    }

    /// Resolves the operator login, falling back to the `USER` variable.
    ///
    /// # Errors
    ///
    /// Returns [`GitPrError::MissingCredentials`] when neither is set.
    pub fn resolve_user(&self) -> Result<String, GitPrError> {
        non_empty(self.user.as_ref())
            .map(ToOwned::to_owned)
            .or_else(|| env::var("USER").ok().filter(|user| !user.is_empty()))
            .ok_or(GitPrError::MissingCredentials)
    }

    /// Returns the password or access token.
    ///
    /// # Errors
    ///
    /// Returns [`GitPrError::MissingCredentials`] when none is configured.
    pub fn resolve_password(&self) -> Result<String, GitPrError> {
        non_empty(self.password.as_ref())
            .map(ToOwned::to_owned)
            .ok_or(GitPrError::MissingCredentials)
    }

    /// Returns the team, or an empty string when reviewers are not offered.
    #[must_use]
    pub fn team(&self) -> &str {
        non_empty(self.team.as_ref()).unwrap_or_default()
    }

    /// Returns the remote branch name template.
    #[must_use]
    pub fn branch_template(&self) -> &str {
        non_empty(self.branch_template.as_ref()).unwrap_or(DEFAULT_BRANCH_TEMPLATE)
    }

    /// Returns the Jenkins job name.
    #[must_use]
    pub fn jenkins_job(&self) -> &str {
        non_empty(self.jenkins_job.as_ref()).unwrap_or(DEFAULT_JOB)
    }

    /// Returns the CI key pair name, defaulting to `user`.
    #[must_use]
    pub fn jenkins_key(&self, user: &str) -> String {
        non_empty(self.jenkins_key.as_ref()).unwrap_or(user).to_owned()
    }

    /// Returns the per-request HTTP timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_seconds
            .filter(|seconds| *seconds > 0)
            .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs)
    }

    /// Returns the Jenkins queue poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.jenkins_poll_interval_ms
            .map_or(DEFAULT_POLL_INTERVAL, Duration::from_millis)
    }

    /// Returns the log level implied by `verbose`.
    #[must_use]
    pub const fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }

    /// Fills unset fields from settings stored in git configuration.
    ///
    /// `settings` is keyed by `snake_case` field name. Boolean settings can
    /// only switch a flag on. Unknown keys and unparsable numbers are ignored
    /// with a warning.
    pub fn fill_from_git_settings(&mut self, settings: &BTreeMap<String, String>) {
        for (key, value) in settings {
            let Some(slot) = self.text_field(key) else {
                if !self.fill_other(key, value) {
                    tracing::warn!(key, "ignoring unknown git setting pr.{key}");
                }
                continue;
            };
            if non_empty(slot.as_ref()).is_none() {
                *slot = Some(value.clone());
            }
        }
    }

    fn text_field(&mut self, key: &str) -> Option<&mut Option<String>> {
        Some(match key {
            "backend" => &mut self.backend,
            "api_url" => &mut self.api_url,
            "user" => &mut self.user,
            "password" => &mut self.password,
            "team" => &mut self.team,
            "label" => &mut self.label,
            "branch_template" => &mut self.branch_template,
            "upstream" => &mut self.upstream,
            "owner" => &mut self.owner,
            "repo" => &mut self.repo,
            "editor" => &mut self.editor,
            "jenkins_url" => &mut self.jenkins_url,
            "jenkins_user" => &mut self.jenkins_user,
            "jenkins_token" => &mut self.jenkins_token,
            "jenkins_job" => &mut self.jenkins_job,
            "jenkins_suite" => &mut self.jenkins_suite,
            "jenkins_key" => &mut self.jenkins_key,
            _ => return None,
        })
    }

    fn fill_other(&mut self, key: &str, value: &str) -> bool {
        let flag = match key {
            "remove_source_branch" => Some(&mut self.remove_source_branch),
            "no_push" => Some(&mut self.no_push),
            "jenkins_insecure" => Some(&mut self.jenkins_insecure),
            "verbose" => Some(&mut self.verbose),
            "log_json" => Some(&mut self.log_json),
            "telemetry" => Some(&mut self.telemetry),
            _ => None,
        };
        if let Some(flag) = flag {
            *flag |= parse_flag(value).unwrap_or(false);
            return true;
        }

        let number = match key {
            "jenkins_poll_interval_ms" => &mut self.jenkins_poll_interval_ms,
            "request_timeout_seconds" => &mut self.request_timeout_seconds,
            _ => return false,
        };
        if number.is_none() {
            match value.trim().parse() {
                Ok(parsed) => *number = Some(parsed),
                Err(_) => tracing::warn!(key, value, "ignoring non-numeric git setting"),
            }
        }
        true
    }

    /// Returns the explicitly configured settings worth storing in git
    /// configuration, as `(snake_case name, value)` pairs.
    ///
    /// Logging switches are not stored.
    #[must_use]
    pub fn stored_settings(&self) -> Vec<(&'static str, String)> {
        let texts = [
            ("backend", &self.backend),
            ("api_url", &self.api_url),
            ("user", &self.user),
            ("password", &self.password),
            ("team", &self.team),
            ("label", &self.label),
            ("branch_template", &self.branch_template),
            ("upstream", &self.upstream),
            ("editor", &self.editor),
            ("jenkins_url", &self.jenkins_url),
            ("jenkins_user", &self.jenkins_user),
            ("jenkins_token", &self.jenkins_token),
            ("jenkins_job", &self.jenkins_job),
            ("jenkins_suite", &self.jenkins_suite),
            ("jenkins_key", &self.jenkins_key),
        ];
        let flags = [
            ("remove_source_branch", self.remove_source_branch),
            ("no_push", self.no_push),
            ("jenkins_insecure", self.jenkins_insecure),
        ];
        let numbers = [
            ("jenkins_poll_interval_ms", self.jenkins_poll_interval_ms),
            ("request_timeout_seconds", self.request_timeout_seconds),
        ];

        texts
            .into_iter()
            .filter_map(|(name, value)| non_empty(value.as_ref()).map(|text| (name, text.to_owned())))
            .chain(
                flags
                    .into_iter()
                    .filter(|(_, set)| *set)
                    .map(|(name, _)| (name, "true".to_owned())),
            )
            .chain(
                numbers
                    .into_iter()
                    .filter_map(|(name, value)| value.map(|number| (name, number.to_string()))),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests;
