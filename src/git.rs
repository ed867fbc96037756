// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Git operations for committing and pushing refreshed artifacts.
///
/// [`VersionControl`] is the seam used by the publisher; [`Git`] drives the
/// `git` binary inside the repository checkout. Commits use the GitHub Actions
/// bot identity and pushes go straight to the configured branch without
/// merging or retrying.
use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
};

use tracing::{debug, info};

use crate::{
    credentials::{AccessToken, RepositoryId},
    error::Error,
};

const BOT_NAME: &str = "github-actions[bot]";
const BOT_EMAIL: &str = "41898282+github-actions[bot]@users.noreply.github.com";

/// Version-control operations needed to publish artifacts.
///
/// Every path is relative to the repository root.
pub trait VersionControl
{
    /// Returns those `paths` whose working-tree contents differ from `HEAD`,
    /// untracked files included, in the given order.
    fn changed_paths(&mut self, paths: &[PathBuf],) -> Result<Vec<PathBuf,>, Error,>;

    /// Adds `paths` to the index.
    fn stage(&mut self, paths: &[PathBuf],) -> Result<(), Error,>;

    /// Reports whether the index differs from `HEAD` for any of `paths`.
    fn has_staged_changes(&mut self, paths: &[PathBuf],) -> Result<bool, Error,>;

    /// Records `paths` as a new revision and returns its identifier.
    ///
    /// Other entries already staged in the index are left out of the revision.
    fn commit(&mut self, message: &str, paths: &[PathBuf],) -> Result<String, Error,>;

    /// Pushes `HEAD` to `branch` on the remote.
    fn push(&mut self, branch: &str,) -> Result<(), Error,>;
}

/// [`VersionControl`] backed by the `git` binary.
pub struct Git
{
    root:   PathBuf,
    remote: String,
    token:  AccessToken,
}

impl std::fmt::Debug for Git
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_,>,) -> std::fmt::Result
    {
        f.debug_struct("Git",).field("root", &self.root,).finish_non_exhaustive()
    }
}

impl Git
{
    /// Operates on the checkout at `root` and pushes to `repository` over
    /// HTTPS authenticated with `token`.
    pub fn new(root: &Path, repository: &RepositoryId, token: &AccessToken,) -> Self
    {
        Self {
            root:   root.to_path_buf(),
            remote: repository.authenticated_remote(token,),
            token:  token.clone(),
        }
    }

    /// Operates on the checkout at `root` and pushes to an arbitrary remote.
    ///
    /// Any occurrence of `token` in git output is redacted.
    pub fn with_remote(root: &Path, remote: impl Into<String,>, token: &AccessToken,) -> Self
    {
        Self {
            root: root.to_path_buf(), remote: remote.into(), token: token.clone(),
        }
    }

    fn command(&self, args: &[&str],) -> Command
    {
        let mut command = Command::new("git",);
        command
            .args(args,)
            .current_dir(&self.root,)
            .env("GIT_TERMINAL_PROMPT", "0",)
            .env("GIT_AUTHOR_NAME", BOT_NAME,)
            .env("GIT_AUTHOR_EMAIL", BOT_EMAIL,)
            .env("GIT_COMMITTER_NAME", BOT_NAME,)
            .env("GIT_COMMITTER_EMAIL", BOT_EMAIL,);
        command
    }

    fn output(&self, label: &str, args: &[&str],) -> Result<Output, Error,>
    {
        debug!("Running git {}", label);
        self.command(args,)
            .output()
            .map_err(|e| Error::publish(format!("git {label} could not be started: {e}"),),)
    }

    fn run(&self, label: &str, args: &[&str],) -> Result<String, Error,>
    {
        let output = self.output(label, args,)?;
        if !output.status.success() {
            return Err(Error::publish(self.describe_failure(label, &output,),),);
        }
        Ok(String::from_utf8_lossy(&output.stdout,).trim().to_string(),)
    }

    fn describe_failure(&self, label: &str, output: &Output,) -> String
    {
        let stderr = String::from_utf8_lossy(&output.stderr,);
        let stderr = self.token.redact(stderr.trim(),);
        let rejected = stderr.contains("[rejected]",) || stderr.contains("non-fast-forward",);
        if rejected {
            format!("git {label} was rejected by the remote (no merge attempted): {stderr}")
        } else {
            format!("git {label} failed ({}): {stderr}", output.status)
        }
    }
}

fn with_paths<'a,>(args: &[&'a str], paths: &'a [String],) -> Vec<&'a str,>
{
    let mut args = args.to_vec();
    args.push("--",);
    args.extend(paths.iter().map(String::as_str,),);
    args
}

fn path_args(paths: &[PathBuf],) -> Vec<String,>
{
    paths.iter().map(|path| path.to_string_lossy().into_owned(),).collect()
}

impl VersionControl for Git
{
    fn changed_paths(&mut self, paths: &[PathBuf],) -> Result<Vec<PathBuf,>, Error,>
    {
        let mut changed = Vec::new();
        for path in paths {
            let path_arg = [path.to_string_lossy().into_owned()];
            let args = with_paths(&["status", "--porcelain", "--untracked-files=all"], &path_arg,);
            let status = self.run("status", &args,)?;
            if !status.is_empty() {
                debug!("{} differs from HEAD", path.display());
                changed.push(path.clone(),);
            }
        }
        Ok(changed,)
    }

    fn stage(&mut self, paths: &[PathBuf],) -> Result<(), Error,>
    {
        let paths = path_args(paths,);
        self.run("add", &with_paths(&["add"], &paths,),)?;
        Ok((),)
    }

    fn has_staged_changes(&mut self, paths: &[PathBuf],) -> Result<bool, Error,>
    {
        let paths = path_args(paths,);
        let output = self.output("diff", &with_paths(&["diff", "--cached", "--quiet"], &paths,),)?;
        match output.status.code() {
            Some(0,) => Ok(false,),
            Some(1,) => Ok(true,),
            _ => Err(Error::publish(self.describe_failure("diff", &output,),),),
        }
    }

    fn commit(&mut self, message: &str, paths: &[PathBuf],) -> Result<String, Error,>
    {
        let paths = path_args(paths,);
        self.run("commit", &with_paths(&["commit", "--quiet", "-m", message], &paths,),)?;
        let revision = self.run("rev-parse", &["rev-parse", "HEAD"],)?;
        info!("Created commit {}", revision);
        Ok(revision,)
    }

    fn push(&mut self, branch: &str,) -> Result<(), Error,>
    {
        let refspec = format!("HEAD:refs/heads/{branch}");
        let remote = self.remote.clone();
        self.run("push", &["push", "--quiet", &remote, &refspec],)?;
        info!("Pushed to {}", branch);
        Ok((),)
    }
}
