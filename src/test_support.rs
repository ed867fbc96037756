// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Fakes shared by unit tests.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
    process::Command,
    sync::Mutex
};

use chrono::{DateTime, TimeZone, Utc};

use crate::{
    error::Error,
    git::VersionControl,
    retry::RetryConfig,
    snapshot::{Counts, ProfileSnapshot},
    stats::{
        AccountDetails, Affiliation, ContributionWindow, LineCounts, OWNED, RepositoryLines,
        StatsSource
    }
};

/// Retry policy without noticeable delays.
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts:     2,
        initial_delay_ms: 1,
        backoff_factor:   2.0
    }
}

/// Fixed generation timestamp used by test snapshots.
pub fn generated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 3, 4, 0, 0).unwrap()
}

pub fn sample_snapshot(counts: Counts) -> ProfileSnapshot {
    ProfileSnapshot::new("octocat".to_owned(), counts, generated_at(), None, BTreeSet::new())
}

pub fn sample_snapshot_with_account(counts: Counts, account: AccountDetails) -> ProfileSnapshot {
    ProfileSnapshot::new(
        "octocat".to_owned(),
        counts,
        generated_at(),
        Some(account),
        BTreeSet::new()
    )
}

/// Rebuilds an error of the same class, since [`Error`] is not `Clone`.
fn duplicate(error: &Error) -> Error {
    match error {
        Error::Auth {
            message
        } => Error::auth(message.clone()),
        Error::RateLimit {
            operation,
            message
        } => Error::rate_limit(operation.clone(), message.clone()),
        Error::Network {
            operation,
            message
        } => Error::network(operation.clone(), message.clone()),
        Error::NotFound {
            operation,
            message
        } => Error::not_found(operation.clone(), message.clone()),
        other => Error::schema("fake", other.to_string())
    }
}

/// In-memory [`StatsSource`] returning fixed values.
///
/// Stars 42, repositories 7, contributed repositories 11, followers 15,
/// commits 300 and one repository with line statistics.
#[derive(Debug, Default)]
pub struct FakeStats {
    account_error: Option<Error>,
    stars_error:   Option<Error>,
    lines_error:   Option<Error>,
    calls:         Mutex<BTreeMap<&'static str, u32>>
}

impl FakeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_account(mut self, error: Error) -> Self {
        self.account_error = Some(error);
        self
    }

    pub fn failing_stars(mut self, error: Error) -> Self {
        self.stars_error = Some(error);
        self
    }

    pub fn failing_lines(mut self, error: Error) -> Self {
        self.lines_error = Some(error);
        self
    }

    /// Number of calls made to `operation`.
    pub fn calls(&self, operation: &str) -> u32 {
        self.calls
            .lock()
            .map(|calls| calls.get(operation).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn record(&self, operation: &'static str) {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(operation).or_insert(0) += 1;
        }
    }

    fn outcome<T>(&self, operation: &'static str, failure: &Option<Error>, value: T) -> Result<T, Error> {
        self.record(operation);
        match failure {
            Some(error) => Err(duplicate(error)),
            None => Ok(value)
        }
    }
}

impl StatsSource for FakeStats {
    async fn account(&self, login: &str) -> Result<AccountDetails, Error> {
        let account = AccountDetails {
            name: Some(format!("{login} the octocat")),
            website: Some("https://github.blog".to_owned()),
            ..AccountDetails::default()
        };
        self.outcome("account", &self.account_error, account)
    }

    async fn star_count(&self, _login: &str) -> Result<u64, Error> {
        self.outcome("stars", &self.stars_error, 42)
    }

    async fn repo_count(&self, _login: &str, affiliations: &[Affiliation]) -> Result<u64, Error> {
        if affiliations == OWNED {
            self.outcome("repositories", &None, 7)
        } else {
            self.outcome("contributed repositories", &None, 11)
        }
    }

    async fn follower_count(&self, _login: &str) -> Result<u64, Error> {
        self.outcome("followers", &None, 15)
    }

    async fn commit_count(&self, _login: &str, _window: ContributionWindow) -> Result<u64, Error> {
        self.outcome("commits", &None, 300)
    }

    async fn line_counts(&self, login: &str) -> Result<LineCounts, Error> {
        let lines = LineCounts {
            repositories: vec![RepositoryLines {
                repository: format!("{login}/hello-world"),
                additions:  1_200,
                deletions:  300,
                commits:    40
            }],
            skipped:      vec![format!("{login}/still-computing")]
        };
        self.outcome("lines of code", &self.lines_error, lines)
    }

    fn request_counts(&self) -> BTreeMap<&'static str, u32> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

/// Whether a usable `git` binary is on the `PATH`.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

/// Runs `git init` in `root`.
pub fn init_repository(root: &Path, bare: bool) {
    let mut command = Command::new("git");
    command.arg("init").arg("--quiet");
    if bare {
        command.arg("--bare");
    }
    let status = command.arg(root).status().expect("git init should run");
    assert!(status.success());
}

/// Contents of `path` as committed at `HEAD` of the checkout in `root`.
pub fn head_content(root: &Path, path: &str) -> String {
    let output = Command::new("git")
        .args(["show", &format!("HEAD:{path}")])
        .current_dir(root)
        .output()
        .expect("git show should run");
    assert!(output.status.success(), "{path} is not committed");
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// [`VersionControl`] fake over a working tree on disk.
///
/// `HEAD` is an in-memory map of committed file contents, empty unless seeded
/// with [`RecordingVcs::with_committed`]. Every call is recorded.
#[derive(Debug, Default)]
pub struct RecordingVcs {
    pub calls:   Vec<String>,
    root:        PathBuf,
    head:        BTreeMap<PathBuf, Vec<u8>>,
    staged:      Vec<PathBuf>,
    clean_index: bool,
    reject_push: bool,
    revisions:   Vec<String>
}

impl RecordingVcs {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            ..Self::default()
        }
    }

    /// Seeds `HEAD` with `body` at `path`.
    pub fn with_committed(mut self, path: &str, body: &str) -> Self {
        self.head.insert(PathBuf::from(path), body.as_bytes().to_vec());
        self
    }

    /// Pretend the index matches `HEAD` after staging.
    pub fn with_clean_index(mut self) -> Self {
        self.clean_index = true;
        self
    }

    /// Fail pushes as a diverged remote would.
    pub fn rejecting_push(mut self) -> Self {
        self.reject_push = true;
        self
    }

    pub fn last_revision(&self) -> Option<String> {
        self.revisions.last().cloned()
    }

    fn working_copy(&self, path: &Path) -> Option<Vec<u8>> {
        fs::read(self.root.join(path)).ok()
    }

    fn differs_from_head(&self, path: &Path) -> bool {
        self.working_copy(path).as_ref() != self.head.get(path)
    }

    fn record(&mut self, verb: &str, paths: &[PathBuf]) {
        let paths: Vec<String> = paths
            .iter()
            .map(|path| path.display().to_string())
            .collect();
        self.calls.push(format!("{verb} {}", paths.join(" ")));
    }
}

impl VersionControl for RecordingVcs {
    fn changed_paths(&mut self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, Error> {
        self.record("status", paths);
        Ok(paths
            .iter()
            .filter(|path| self.differs_from_head(path))
            .cloned()
            .collect())
    }

    fn stage(&mut self, paths: &[PathBuf]) -> Result<(), Error> {
        self.record("stage", paths);
        self.staged.extend(paths.iter().cloned());
        Ok(())
    }

    fn has_staged_changes(&mut self, paths: &[PathBuf]) -> Result<bool, Error> {
        self.calls.push("diff".to_owned());
        if self.clean_index {
            return Ok(false);
        }
        Ok(paths
            .iter()
            .any(|path| self.staged.contains(path) && self.differs_from_head(path)))
    }

    fn commit(&mut self, message: &str, paths: &[PathBuf]) -> Result<String, Error> {
        self.calls.push(format!("commit {message}"));
        for path in paths {
            match self.working_copy(path) {
                Some(body) => self.head.insert(path.clone(), body),
                None => self.head.remove(path)
            };
        }
        self.staged.retain(|path| !paths.contains(path));
        let revision = format!("{:040x}", self.revisions.len() + 1);
        self.revisions.push(revision.clone());
        Ok(revision)
    }

    fn push(&mut self, branch: &str) -> Result<(), Error> {
        self.calls.push(format!("push {branch}"));
        if self.reject_push {
            return Err(Error::publish(
                "git push was rejected by the remote (no merge attempted): ! [rejected] HEAD -> main (non-fast-forward)"
            ));
        }
        Ok(())
    }
}
