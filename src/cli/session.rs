//! Repository, branch, and backend resolution shared by the subcommands.

use std::path::Path;

use git_pr::draft::render_branch_name;
use git_pr::local::push_branch;
use git_pr::{
    BackendSettings, BranchPair, GitPrConfig, GitPrError, HostingBackend, JenkinsSettings,
    JenkinsTrigger, LocalRepository, ProjectRef, build_backend, discover_repository,
};

/// The operator, repository, and branches a subcommand acts on.
#[derive(Debug)]
pub struct Session {
    /// Discovered local repository.
    pub local: LocalRepository,
    /// Operator login.
    pub user: String,
    /// Repository on the backend.
    pub project: ProjectRef,
    /// Remote source branch and target branch.
    pub branches: BranchPair,
}

impl Session {
    /// Resolves the session from the working directory and configuration.
    ///
    /// Owner and repository default to the remote URL, the target branch to
    /// the current branch's upstream, and the remote branch name is rendered
    /// from the configured template.
    ///
    /// # Errors
    ///
    /// Returns an error when the repository cannot be discovered, no user is
    /// configured, no target branch is known, or the template is invalid.
    pub fn discover(config: &GitPrConfig) -> Result<Self, GitPrError> {
        let local = discover_repository(Path::new("."))?;
        let user = config.resolve_user()?;
        let project = resolve_project(config, &local)?;

        let target = config
            .upstream
            .clone()
            .filter(|upstream| !upstream.is_empty())
            .or_else(|| local.upstream().map(|upstream| upstream.branch.clone()))
            .ok_or_else(|| GitPrError::Configuration {
                message: format!(
                    "branch `{}` has no upstream; pass --upstream",
                    local.branch()
                ),
            })?;
        let source = render_branch_name(
            config.branch_template(),
            local.branch(),
            &user,
            &project.owner,
            &project.repo,
        )?;

        tracing::debug!(%source, %target, owner = %project.owner, repo = %project.repo, "session resolved");
        Ok(Self {
            local,
            user,
            project,
            branches: BranchPair { source, target },
        })
    }

    /// Force-pushes `HEAD` to the remote source branch unless `no_push` is
    /// set.
    ///
    /// # Errors
    ///
    /// Returns [`GitPrError::Local`] when the push fails.
    pub fn push(&self, config: &GitPrConfig) -> Result<(), GitPrError> {
        if config.no_push {
            tracing::info!("not pushing (--no-push)");
            return Ok(());
        }
        push_branch(
            self.local.workdir(),
            self.local.remote_name(),
            &self.branches.source,
        )?;
        Ok(())
    }

    /// Builds the configured hosting backend for this project.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown backend, missing credentials, or an
    /// HTTP client that cannot be built.
    pub fn backend(&self, config: &GitPrConfig) -> Result<Box<dyn HostingBackend>, GitPrError> {
        build_backend(&BackendSettings {
            kind: config.backend_kind()?,
            api_url: config.api_url.clone(),
            user: self.user.clone(),
            secret: config.resolve_password()?,
            project: self.project.clone(),
            timeout: config.request_timeout(),
        })
    }

    /// Builds the Jenkins trigger, or `None` when no Jenkins URL is set.
    ///
    /// # Errors
    ///
    /// Returns [`GitPrError::Configuration`] when a URL is set without a
    /// token, and [`GitPrError::Transport`] when the client cannot be built.
    pub fn jenkins(&self, config: &GitPrConfig) -> Result<Option<JenkinsTrigger>, GitPrError> {
        let Some(url) = config.jenkins_url.clone().filter(|url| !url.is_empty()) else {
            return Ok(None);
        };
        let token = config
            .jenkins_token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| GitPrError::Configuration {
                message: "jenkins_token is required when jenkins_url is set".to_owned(),
            })?;

        let settings = JenkinsSettings {
            url,
            user: config
                .jenkins_user
                .clone()
                .filter(|user| !user.is_empty())
                .unwrap_or_else(|| self.user.clone()),
            token,
            job: config.jenkins_job().to_owned(),
            insecure: config.jenkins_insecure,
            poll_interval: config.poll_interval(),
            timeout: config.request_timeout(),
        };
        Ok(Some(JenkinsTrigger::new(&settings)?))
    }
}

fn resolve_project(config: &GitPrConfig, local: &LocalRepository) -> Result<ProjectRef, GitPrError> {
    let configured = |value: Option<&String>| value.filter(|text| !text.is_empty()).cloned();
    if let (Some(owner), Some(repo)) = (
        configured(config.owner.as_ref()),
        configured(config.repo.as_ref()),
    ) {
        return Ok(ProjectRef::new(owner, repo));
    }

    let origin = local.remote_origin()?;
    Ok(ProjectRef::new(
        configured(config.owner.as_ref()).unwrap_or_else(|| origin.owner().to_owned()),
        configured(config.repo.as_ref()).unwrap_or_else(|| origin.repository().to_owned()),
    ))
}
