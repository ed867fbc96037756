// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Per-repository line statistics for a single author.
///
/// Reads the contributor statistics endpoint, which reports weekly additions,
/// deletions and commits for every contributor of a repository, and keeps the
/// totals for the requested login.
use octocrab::Octocrab;
use serde::Deserialize;
use tracing::debug;

use crate::{error::Error, github::classify, stats::RepositoryLines};

/// GitHub API contributor statistics response structure.
#[derive(Debug, Clone, Deserialize,)]
struct ContributorStats
{
    #[serde(default)]
    weeks:  Vec<WeeklyStats,>,
    author: Option<Author,>,
}

/// Weekly contribution statistics.
#[derive(Debug, Clone, Deserialize,)]
struct WeeklyStats
{
    #[serde(default)]
    a: u64,
    #[serde(default)]
    d: u64,
    #[serde(default)]
    c: u64,
}

/// Contributor author information.
#[derive(Debug, Clone, Deserialize,)]
struct Author
{
    login: String,
}

/// Fetches the additions, deletions and commits of `login` in `owner/repo`.
///
/// A repository where `login` never contributed yields zero totals.
///
/// # Errors
///
/// Returns [`Error::Schema`] while GitHub is still computing the statistics
/// (the endpoint answers `202 Accepted` with an empty object) and the
/// classified API error for every other failure.
///
/// # Example
///
/// ```no_run
/// use octocrab::Octocrab;
/// use profile_card::{Error, contributors::fetch_repository_lines};
///
/// # async fn example() -> Result<(), Error> {
/// let octocrab = Octocrab::builder()
///     .personal_token("token",)
///     .build()
///     .map_err(|e| Error::auth(format!("failed to build octocrab: {e}"),),)?;
/// let lines = fetch_repository_lines(&octocrab, "octocat", "hello-world", "octocat",).await?;
/// println!("+{} -{}", lines.additions, lines.deletions);
/// # Ok(())
/// # }
/// ```
pub async fn fetch_repository_lines(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    login: &str,
) -> Result<RepositoryLines, Error,>
{
    debug!("Fetching contributor stats for {}/{}", owner, repo);

    let stats: Vec<ContributorStats,> = octocrab
        .get(format!("/repos/{owner}/{repo}/stats/contributors"), None::<&(),>,)
        .await
        .map_err(|e| classify(&format!("contributor stats for {owner}/{repo}"), e,),)?;

    Ok(author_lines(format!("{owner}/{repo}"), &stats, login,),)
}

fn author_lines(repository: String, stats: &[ContributorStats], login: &str,) -> RepositoryLines
{
    let mut lines = RepositoryLines {
        repository, additions: 0, deletions: 0, commits: 0,
    };

    let weeks = stats
        .iter()
        .filter(|stat| {
            stat.author.as_ref().is_some_and(|author| author.login.eq_ignore_ascii_case(login,),)
        },)
        .flat_map(|stat| stat.weeks.iter(),);

    for week in weeks {
        lines.additions += week.a;
        lines.deletions += week.d;
        lines.commits += week.c;
    }

    lines
}
