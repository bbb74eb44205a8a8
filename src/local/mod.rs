//! Local Git repository collaborator.
//!
//! Discovers the current branch, its upstream, and the remote the request
//! targets; reads the commit messages that seed the draft; pushes the branch;
//! and reads or writes settings stored in git configuration.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use git_pr::local::discover_repository;
//!
//! let local_repo = discover_repository(Path::new(".")).expect("inside a repository");
//! let origin = local_repo.remote_origin().expect("remote should parse");
//! println!("{} -> {}/{}", local_repo.branch(), origin.owner(), origin.repository());
//! ```

mod discovery;
mod error;
mod push;
mod remote;
mod settings;

pub use discovery::{
    DEFAULT_REMOTE_NAME, LocalRepository, Upstream, discover_repository, format_commit_log,
};
pub use error::LocalDiscoveryError;
pub use push::push_branch;
pub use remote::{RemoteOrigin, parse_remote_url};
pub use settings::{
    ALIAS_KEY, SETTINGS_SECTION, install_alias, open_config, open_global_config, read_settings,
    write_settings,
};

#[cfg(test)]
mod tests;
