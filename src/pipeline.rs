// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// End-to-end refresh of the profile cards.
///
/// Stages run strictly in order: credentials, configuration, collection,
/// aggregation, rendering and publication. The first unrecovered error aborts
/// the remaining stages, so an incomplete snapshot is never published.
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::{
    aggregate::aggregate,
    config::ProfileConfig,
    credentials::{AccessToken, Credentials, RepositoryId},
    error::{self, Error},
    git::VersionControl,
    publish::{CommitOutcome, commit_changes, write_artifacts},
    readme::{CardPaths, render_readme},
    render::{RenderedArtifact, render},
    retry::RetryConfig,
    snapshot::ProfileSnapshot,
    stats::{ContributionWindow, StatsSource, collect},
    template::{Template, Variant},
};

/// Everything a run needs besides the platform clients.
#[derive(Clone,)]
pub struct RunInputs
{
    /// Raw `ACCESS_TOKEN` value.
    pub token:        Option<String,>,
    /// Raw `USER_NAME` value.
    pub login:        Option<String,>,
    /// `owner/name` of the repository receiving the commit.
    pub repository:   Option<String,>,
    /// Root of the repository checkout.
    pub root:         PathBuf,
    /// Explicit configuration file, relative to `root` or absolute.
    pub config_path:  Option<PathBuf,>,
    /// Branch overriding `commit.branch`.
    pub branch:       Option<String,>,
    /// Write artifacts without touching version control.
    pub dry_run:      bool,
    /// Timestamp stamped on the snapshot.
    pub generated_at: DateTime<Utc,>,
    /// Retry policy for metric fetches.
    pub retry:        RetryConfig,
}

impl std::fmt::Debug for RunInputs
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_,>,) -> std::fmt::Result
    {
        f.debug_struct("RunInputs",)
            .field("token", &self.token.as_ref().map(|_| "***",),)
            .field("login", &self.login,)
            .field("repository", &self.repository,)
            .field("root", &self.root,)
            .field("config_path", &self.config_path,)
            .field("branch", &self.branch,)
            .field("dry_run", &self.dry_run,)
            .field("generated_at", &self.generated_at,)
            .finish_non_exhaustive()
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone,)]
pub struct RunReport
{
    pub snapshot:      ProfileSnapshot,
    /// Paths relative to the repository root that were committed, or that
    /// were rewritten on a dry run.
    pub changed_paths: Vec<PathBuf,>,
    /// Publication result; `None` for dry runs.
    pub outcome:       Option<CommitOutcome,>,
}

/// Runs the full refresh.
///
/// `make_source` is called once credentials are validated and
/// `make_vcs` only when changes must be committed.
///
/// # Errors
///
/// Returns the first fatal error of any stage. Missing credentials fail before
/// `make_source` is invoked.
pub async fn run<S, V, MS, MV,>(
    inputs: RunInputs,
    make_source: MS,
    make_vcs: MV,
) -> Result<RunReport, Error,>
where
    S: StatsSource,
    V: VersionControl,
    MS: FnOnce(&Credentials,) -> Result<S, Error,>,
    MV: FnOnce(&Path, &RepositoryId, &AccessToken,) -> V,
{
    let credentials = Credentials::resolve(inputs.token, inputs.login,)?;

    let mut profile = ProfileConfig::load(&inputs.root, inputs.config_path.as_deref(),)?;
    if let Some(branch,) = inputs.branch {
        profile.commit.branch = branch;
        profile.validate()?;
    }

    let repository = match (inputs.repository.as_deref(), inputs.dry_run,) {
        (Some(value,), _,) => Some(RepositoryId::parse(value,)?,),
        (None, true,) => None,
        (None, false,) => {
            return Err(Error::config(
                "GITHUB_REPOSITORY (or --repository) is required unless --dry-run is set",
            ),);
        }
    };

    let light = load_template(&inputs.root, Variant::Light, profile.templates.light.as_deref(),)?;
    let dark = load_template(&inputs.root, Variant::Dark, profile.templates.dark.as_deref(),)?;

    let source = make_source(&credentials,)?;

    let pb = spinner();

    pb.set_message(format!("Collecting statistics for {}...", credentials.login()),);
    let window = ContributionWindow::trailing_year(inputs.generated_at,);
    let raw = collect(&source, credentials.login(), window, &inputs.retry,).await?;

    pb.set_message("Aggregating metrics...",);
    let snapshot = aggregate(raw, inputs.generated_at,)?;
    if !snapshot.unknown().is_empty() {
        let missing: Vec<String,> =
            snapshot.unknown().iter().map(ToString::to_string,).collect();
        warn!("Missing metrics rendered as 0: {}", missing.join(", "));
    }

    pb.set_message("Rendering cards...",);
    let artifacts = render_all(&inputs.root, &snapshot, &profile, &light, &dark,)?;

    pb.set_message("Writing artifacts...",);
    let written = write_artifacts(&inputs.root, &artifacts,)?;

    let outcome = match repository {
        Some(repository,) if !inputs.dry_run => {
            pb.set_message(format!("Publishing to {repository}..."),);
            let mut vcs = make_vcs(&inputs.root, &repository, credentials.token(),);
            let paths: Vec<PathBuf,> =
                artifacts.iter().map(|artifact| artifact.path.clone(),).collect();
            Some(commit_changes(&mut vcs, &paths, &profile.commit,)?,)
        }
        _ => {
            info!("Dry run: {} file(s) changed, skipping git", written.len());
            for path in &written {
                info!("   {}", path.display());
            }
            None
        }
    };

    pb.finish_and_clear();

    let changed_paths = match &outcome {
        Some(CommitOutcome::Committed {
            paths, ..
        },) => paths.clone(),
        Some(CommitOutcome::NoOp,) => Vec::new(),
        None => written,
    };

    match &outcome {
        Some(CommitOutcome::Committed {
            revision,
            paths,
        },) => info!("Committed {} file(s) as {}", paths.len(), revision),
        Some(CommitOutcome::NoOp,) => info!("Profile cards are up to date"),
        None => {}
    }

    Ok(RunReport {
        snapshot, changed_paths, outcome,
    },)
}

fn spinner() -> ProgressBar
{
    let pb = ProgressBar::new_spinner();
    if let Ok(style,) = ProgressStyle::with_template("{spinner:.yellow} [{elapsed_precise}] {msg}",)
    {
        pb.set_style(style,);
    }
    pb
}

fn load_template(root: &Path, variant: Variant, custom: Option<&Path,>,) -> Result<Template, Error,>
{
    match custom {
        Some(path,) => Template::from_file(variant.artifact_name(), &root.join(path,),),
        None => Ok(Template::builtin(variant,),),
    }
}

fn render_all(
    root: &Path,
    snapshot: &ProfileSnapshot,
    profile: &ProfileConfig,
    light: &Template,
    dark: &Template,
) -> Result<Vec<RenderedArtifact,>, Error,>
{
    let outputs = &profile.outputs;
    let light_card = render(snapshot, profile, light, &outputs.light,)?;
    let dark_card = render(snapshot, profile, dark, &outputs.dark,)?;

    let readme_location = root.join(&outputs.readme,);
    let existing = match fs::read_to_string(&readme_location,) {
        Ok(content,) => Some(content,),
        Err(source,) if source.kind() == ErrorKind::NotFound => None,
        Err(source,) => return Err(error::io_error(&readme_location, source,),),
    };
    let cards = CardPaths {
        light: &outputs.light, dark: &outputs.dark,
    };
    let readme = render_readme(existing.as_deref(), cards, snapshot.login(), &outputs.readme,)?;

    Ok(vec![light_card, dark_card, readme],)
}
