//! git-pr CLI entrypoint: create, merge, and test review requests.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use git_pr::local::{open_config, read_settings};
use git_pr::{GitPrConfig, GitPrError, init_tracing};
use ortho_config::OrthoConfig;

mod cli;

use cli::Command;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), GitPrError> {
    let (operands, filtered) = extract_positional_operands(std::env::args_os().collect());
    let command = Command::from_operands(&operands)?;
    let config = load_config(filtered, command.reads_git_settings())?;

    init_tracing(config.log_json, config.log_level());
    tracing::debug!(?command, "dispatching");

    match command {
        Command::Create => cli::create::run(&config),
        Command::Merge => cli::merge::run(&config),
        Command::Test { path } => cli::test::run(&config, &path),
        Command::Install => cli::install::run(&config),
        Command::Jenkins => cli::jenkins::run(&config),
    }
}

/// Loads configuration from CLI, environment, and files, then fills unset
/// fields from the `pr.*` git settings.
///
/// # Errors
///
/// Returns [`GitPrError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config(args: Vec<OsString>, with_git_settings: bool) -> Result<GitPrConfig, GitPrError> {
    let mut config =
        GitPrConfig::load_from_iter(args).map_err(|error| GitPrError::Configuration {
            message: error.to_string(),
        })?;

    if with_git_settings {
        let stored = read_settings(&open_config(Path::new("."))?)?;
        config.fill_from_git_settings(&stored);
    }
    Ok(config)
}

/// Long flags that consume the following argument as their value.
const VALUE_FLAGS: &[&str] = &[
    "--backend",
    "--api-url",
    "--user",
    "--password",
    "--team",
    "--label",
    "--branch-template",
    "--upstream",
    "--owner",
    "--repo",
    "--editor",
    "--jenkins-url",
    "--jenkins-user",
    "--jenkins-token",
    "--jenkins-job",
    "--jenkins-suite",
    "--jenkins-key",
    "--jenkins-poll-interval-ms",
    "--request-timeout-seconds",
];

/// Short flags that consume the following argument as their value.
const VALUE_SHORT_FLAGS: &[&str] = &[
    "-b", "-a", "-u", "-p", "-t", "-l", "-B", "-U", "-o", "-r", "-e", "-j", "-J", "-k", "-w",
    "-s", "-K", "-P", "-T",
];

fn takes_value(flag: &str) -> bool {
    VALUE_FLAGS.contains(&flag) || VALUE_SHORT_FLAGS.contains(&flag)
}

/// Splits positional operands (the subcommand and its argument) from the
/// flags handed to ortho-config.
///
/// The values of known flags are never mistaken for operands, `--flag=value`
/// is self-contained, and everything after `--` is positional.
fn extract_positional_operands(args: Vec<OsString>) -> (Vec<String>, Vec<OsString>) {
    let mut operands = Vec::new();
    let mut remaining = Vec::with_capacity(args.len());
    let mut iter = args.into_iter();

    if let Some(program) = iter.next() {
        remaining.push(program);
    }

    while let Some(arg) = iter.next() {
        let text = arg.to_string_lossy().into_owned();
        if text == "--" {
            operands.extend(iter.by_ref().map(|rest| rest.to_string_lossy().into_owned()));
            break;
        }
        if text.starts_with('-') {
            let needs_value = takes_value(&text);
            remaining.push(arg);
            if needs_value && let Some(value) = iter.next() {
                remaining.push(value);
            }
            continue;
        }
        operands.push(text);
    }

    (operands, remaining)
}
