// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Change detection and publication of rendered artifacts.
//!
//! Artifacts are written only when their bytes differ from the working tree.
//! What gets committed is decided against `HEAD` instead, so output left on
//! disk by a dry run or a failed push still reaches the remote, while a run
//! over unchanged data leaves both the working tree and the history untouched.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf}
};

use tracing::{debug, info};

use crate::{
    config::CommitSettings,
    error::{self, Error},
    git::VersionControl,
    render::RenderedArtifact
};

/// Result of a publish attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// No artifact differed from `HEAD`; nothing was committed.
    NoOp,
    /// All changed artifacts were committed together and pushed.
    Committed {
        /// Identifier of the new revision.
        revision: String,
        /// Changed paths, relative to the repository root.
        paths:    Vec<PathBuf>
    }
}

/// Writes every artifact whose contents differ from the file on disk.
///
/// A missing file counts as empty. Returns the paths that were written, in
/// artifact order.
///
/// # Errors
///
/// Returns [`Error::Io`] when a file cannot be read or written.
pub fn write_artifacts(root: &Path, artifacts: &[RenderedArtifact]) -> Result<Vec<PathBuf>, Error> {
    let mut changed = Vec::new();

    for artifact in artifacts {
        let location = root.join(&artifact.path);
        let current = match fs::read(&location) {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(error::io_error(&location, source))
        };

        if current == artifact.body.as_bytes() {
            debug!("{} unchanged", artifact.path.display());
            continue;
        }

        if let Some(parent) = location.parent() {
            fs::create_dir_all(parent).map_err(|e| error::io_error(parent, e))?;
        }
        fs::write(&location, artifact.body.as_bytes())
            .map_err(|e| error::io_error(&location, e))?;
        info!("Updated {} ({})", artifact.path.display(), artifact.name);
        changed.push(artifact.path.clone());
    }

    Ok(changed)
}

/// Commits and pushes those `paths` that differ from `HEAD` as a single
/// revision.
///
/// # Errors
///
/// Returns [`Error::Publish`] when inspecting, staging, committing or pushing
/// fails.
pub fn commit_changes<V>(
    vcs: &mut V,
    paths: &[PathBuf],
    settings: &CommitSettings
) -> Result<CommitOutcome, Error>
where
    V: VersionControl
{
    let changed = vcs.changed_paths(paths)?;
    if changed.is_empty() {
        info!("No changes detected, skipping commit");
        return Ok(CommitOutcome::NoOp);
    }

    vcs.stage(&changed)?;
    if !vcs.has_staged_changes(&changed)? {
        info!("Index matches HEAD, skipping commit");
        return Ok(CommitOutcome::NoOp);
    }

    let revision = vcs.commit(&settings.message, &changed)?;
    vcs.push(&settings.branch)?;

    Ok(CommitOutcome::Committed {
        revision,
        paths: changed
    })
}

/// Writes changed artifacts under `root`, then commits and pushes every
/// artifact that differs from `HEAD`.
///
/// # Errors
///
/// Returns [`Error::Io`] for filesystem failures and [`Error::Publish`] for
/// version-control failures.
pub fn publish<V>(
    root: &Path,
    artifacts: &[RenderedArtifact],
    vcs: &mut V,
    settings: &CommitSettings
) -> Result<CommitOutcome, Error>
where
    V: VersionControl
{
    write_artifacts(root, artifacts)?;
    let paths: Vec<PathBuf> = artifacts
        .iter()
        .map(|artifact| artifact.path.clone())
        .collect();
    commit_changes(vcs, &paths, settings)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::{
        credentials::Credentials,
        git::Git,
        test_support::{RecordingVcs, git_available, head_content, init_repository}
    };

    fn artifact(path: &str, body: &str) -> RenderedArtifact {
        RenderedArtifact {
            name: "profile-light".to_owned(),
            path: PathBuf::from(path),
            body: body.to_owned()
        }
    }

    #[test]
    fn changed_content_is_committed() {
        let temp = tempdir().expect("failed to create tempdir");
        fs::write(temp.path().join("profile-light.svg"), "stars: 10").expect("write failed");
        let mut vcs =
            RecordingVcs::new(temp.path()).with_committed("profile-light.svg", "stars: 10");

        let outcome = publish(
            temp.path(),
            &[artifact("profile-light.svg", "stars: 11")],
            &mut vcs,
            &CommitSettings::default()
        )
        .expect("publish should succeed");

        match outcome {
            CommitOutcome::Committed {
                paths, ..
            } => assert_eq!(paths, vec![PathBuf::from("profile-light.svg")]),
            CommitOutcome::NoOp => panic!("expected a commit")
        }
        assert_eq!(
            fs::read_to_string(temp.path().join("profile-light.svg")).expect("read failed"),
            "stars: 11"
        );
        assert_eq!(
            vcs.calls,
            vec![
                "status profile-light.svg".to_owned(),
                "stage profile-light.svg".to_owned(),
                "diff".to_owned(),
                "commit chore(profile): refresh profile stats".to_owned(),
                "push main".to_owned()
            ]
        );
    }

    #[test]
    fn content_matching_head_is_noop_without_commit() {
        let temp = tempdir().expect("failed to create tempdir");
        fs::write(temp.path().join("profile-light.svg"), "stars: 10").expect("write failed");
        let mut vcs =
            RecordingVcs::new(temp.path()).with_committed("profile-light.svg", "stars: 10");

        let outcome = publish(
            temp.path(),
            &[artifact("profile-light.svg", "stars: 10")],
            &mut vcs,
            &CommitSettings::default()
        )
        .expect("publish should succeed");

        assert_eq!(outcome, CommitOutcome::NoOp);
        assert_eq!(vcs.calls, vec!["status profile-light.svg".to_owned()]);
    }

    #[test]
    fn uncommitted_output_on_disk_is_still_committed() {
        let temp = tempdir().expect("failed to create tempdir");
        fs::write(temp.path().join("profile-light.svg"), "stars: 11").expect("write failed");
        let mut vcs =
            RecordingVcs::new(temp.path()).with_committed("profile-light.svg", "stars: 10");

        let outcome = publish(
            temp.path(),
            &[artifact("profile-light.svg", "stars: 11")],
            &mut vcs,
            &CommitSettings::default()
        )
        .expect("publish should succeed");

        assert!(matches!(outcome, CommitOutcome::Committed { .. }));
    }

    #[test]
    fn only_changed_paths_are_staged() {
        let temp = tempdir().expect("failed to create tempdir");
        fs::write(temp.path().join("profile-light.svg"), "stars: 0").expect("write failed");
        fs::write(temp.path().join("profile-dark.svg"), "stars: 42").expect("write failed");
        let mut vcs = RecordingVcs::new(temp.path())
            .with_committed("profile-light.svg", "stars: 0")
            .with_committed("profile-dark.svg", "stars: 42");

        let outcome = publish(
            temp.path(),
            &[
                artifact("profile-light.svg", "stars: 42"),
                artifact("profile-dark.svg", "stars: 42"),
                artifact("cards/README.md", "hello")
            ],
            &mut vcs,
            &CommitSettings::default()
        )
        .expect("publish should succeed");

        assert_eq!(
            outcome,
            CommitOutcome::Committed {
                revision: vcs.last_revision().expect("commit recorded"),
                paths:    vec![PathBuf::from("profile-light.svg"), PathBuf::from("cards/README.md")]
            }
        );
        assert_eq!(vcs.calls[1], "stage profile-light.svg cards/README.md");
        assert!(temp.path().join("cards/README.md").exists());
    }

    #[test]
    fn clean_index_skips_commit() {
        let temp = tempdir().expect("failed to create tempdir");
        let mut vcs = RecordingVcs::new(temp.path()).with_clean_index();

        let outcome = publish(
            temp.path(),
            &[artifact("profile-light.svg", "stars: 1")],
            &mut vcs,
            &CommitSettings::default()
        )
        .expect("publish should succeed");

        assert_eq!(outcome, CommitOutcome::NoOp);
        assert_eq!(
            vcs.calls,
            vec![
                "status profile-light.svg".to_owned(),
                "stage profile-light.svg".to_owned(),
                "diff".to_owned()
            ]
        );
    }

    #[test]
    fn rejected_push_is_reported() {
        let temp = tempdir().expect("failed to create tempdir");
        let mut vcs = RecordingVcs::new(temp.path()).rejecting_push();

        let error = publish(
            temp.path(),
            &[artifact("profile-light.svg", "stars: 1")],
            &mut vcs,
            &CommitSettings::default()
        )
        .unwrap_err();

        assert!(matches!(error, Error::Publish { .. }));
    }

    #[test]
    fn write_artifacts_reports_changed_paths_only() {
        let temp = tempdir().expect("failed to create tempdir");
        let artifacts = [artifact("profile-light.svg", "a"), artifact("profile-dark.svg", "b")];

        let first = write_artifacts(temp.path(), &artifacts).expect("first write");
        let second = write_artifacts(temp.path(), &artifacts).expect("second write");

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
    }

    #[test]
    fn output_left_by_an_earlier_run_is_committed_to_git() {
        if !git_available() {
            return;
        }
        let remote = tempdir().expect("failed to create tempdir");
        let work = tempdir().expect("failed to create tempdir");
        init_repository(remote.path(), true);
        init_repository(work.path(), false);
        let token = Credentials::resolve(Some("ghp_test".to_owned()), Some("octocat".to_owned()))
            .expect("credentials should resolve")
            .token()
            .clone();
        let mut git = Git::with_remote(work.path(), remote.path().to_string_lossy(), &token);
        let settings = CommitSettings::default();

        let first = publish(
            work.path(),
            &[artifact("profile-light.svg", "stars: 10")],
            &mut git,
            &settings
        )
        .expect("first publish should succeed");
        assert!(matches!(first, CommitOutcome::Committed { .. }));

        fs::write(work.path().join("profile-light.svg"), "stars: 11").expect("write failed");

        let second = publish(
            work.path(),
            &[artifact("profile-light.svg", "stars: 11")],
            &mut git,
            &settings
        )
        .expect("second publish should succeed");
        match second {
            CommitOutcome::Committed {
                paths, ..
            } => assert_eq!(paths, vec![PathBuf::from("profile-light.svg")]),
            CommitOutcome::NoOp => panic!("uncommitted output must be published")
        }
        assert_eq!(head_content(work.path(), "profile-light.svg"), "stars: 11");

        let third = publish(
            work.path(),
            &[artifact("profile-light.svg", "stars: 11")],
            &mut git,
            &settings
        )
        .expect("third publish should succeed");
        assert_eq!(third, CommitOutcome::NoOp);
    }
}
