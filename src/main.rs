// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Command-line interface for the profile-card binary.
//!
//! Reads credentials from the automation environment, refreshes the profile
//! cards and exits non-zero on the first fatal error.

use std::{path::PathBuf, process};

use chrono::Utc;
use clap::{ArgAction, Parser};
use profile_card::{Credentials, Error, Git, GitHubStats, RetryConfig, RunInputs, run};
use tracing_subscriber::EnvFilter;

/// Refresh the GitHub profile cards and README section.
#[derive(Debug, Parser,)]
#[command(name = "profile-card", version, about = "Render and publish GitHub profile cards")]
struct Cli
{
    /// Profile configuration file (default: profile.yaml in the root).
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf,>,

    /// Repository checkout receiving the artifacts.
    #[arg(long = "root", value_name = "DIR", default_value = ".")]
    root: PathBuf,

    /// Repository to push to, as owner/name.
    #[arg(long = "repository", value_name = "OWNER/NAME", env = "GITHUB_REPOSITORY")]
    repository: Option<String,>,

    /// Branch receiving the commit (overrides commit.branch).
    #[arg(long = "branch", value_name = "NAME", env = "PROFILE_CARD_BRANCH")]
    branch: Option<String,>,

    /// Write artifacts and report changes without committing.
    #[arg(long = "dry-run", action = ArgAction::SetTrue)]
    dry_run: bool,

    /// GitHub access token.
    #[arg(long = "token", env = "ACCESS_TOKEN", hide_env_values = true, hide = true)]
    token: Option<String,>,

    /// GitHub login whose statistics are collected.
    #[arg(long = "user", value_name = "LOGIN", env = "USER_NAME")]
    user: Option<String,>,
}

/// Entry point that reports errors and sets the appropriate exit status.
fn main()
{
    init_tracing();

    if let Err(error,) = execute(Cli::parse(),) {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

fn init_tracing()
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info",),);
    tracing_subscriber::fmt().with_env_filter(filter,).with_target(false,).init();
}

/// Executes a refresh using parsed arguments.
///
/// # Errors
///
/// Propagates the first fatal pipeline error.
fn execute(cli: Cli,) -> Result<(), Error,>
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::config(format!("failed to start async runtime: {e}"),),)?;

    let retry = RetryConfig::default();
    let inputs = RunInputs {
        token:        cli.token,
        login:        cli.user,
        repository:   cli.repository,
        root:         cli.root,
        config_path:  cli.config,
        branch:       cli.branch,
        dry_run:      cli.dry_run,
        generated_at: Utc::now(),
        retry:        retry.clone(),
    };

    let make_source = |credentials: &Credentials| {
        GitHubStats::new(credentials,).map(|stats| stats.with_retry(retry,),)
    };
    runtime.block_on(run(inputs, make_source, |root, repository, token| {
        Git::new(root, repository, token,)
    },),)?;

    Ok((),)
}

#[cfg(test)]
mod tests
{
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent()
    {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags()
    {
        let cli = Cli::try_parse_from([
            "profile-card",
            "--root",
            "/work",
            "--repository",
            "octocat/octocat",
            "--branch",
            "profile",
            "--dry-run",
            "--config",
            "cards.yaml",
        ],)
        .expect("arguments should parse",);

        assert_eq!(cli.root, PathBuf::from("/work"));
        assert_eq!(cli.repository.as_deref(), Some("octocat/octocat"));
        assert_eq!(cli.branch.as_deref(), Some("profile"));
        assert_eq!(cli.config, Some(PathBuf::from("cards.yaml")));
        assert!(cli.dry_run);
    }

    #[test]
    fn root_defaults_to_current_directory()
    {
        let cli = Cli::try_parse_from(["profile-card", "--dry-run"],).expect("should parse",);
        assert_eq!(cli.root, PathBuf::from("."));
    }
}
