//! The `install` subcommand.

use std::env;

use camino::Utf8PathBuf;
use git_pr::local::{install_alias, open_global_config, write_settings};
use git_pr::{GitPrConfig, GitPrError};

use super::output::write_line;

/// Points `git pr` at this executable in the global git configuration and
/// stores every explicitly supplied setting under `pr.*`.
///
/// # Errors
///
/// Returns an error when the executable path is unknown or not UTF-8, or
/// when the global configuration cannot be written.
pub fn run(config: &GitPrConfig) -> Result<(), GitPrError> {
    let path = env::current_exe().map_err(|error| GitPrError::Io {
        message: format!("cannot locate this executable: {error}"),
    })?;
    let executable = Utf8PathBuf::from_path_buf(path).map_err(|raw| GitPrError::Io {
        message: format!("executable path is not UTF-8: {}", raw.display()),
    })?;

    let mut global = open_global_config()?;
    install_alias(&mut global, &executable)?;

    let settings = config.stored_settings();
    write_settings(&mut global, &settings)?;

    tracing::info!(stored = settings.len(), "installed git alias");
    write_line(&format!(
        "Installed `git pr` -> {executable} ({} settings stored)",
        settings.len()
    ))
}
