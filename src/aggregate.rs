// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Pure transform from raw responses into a [`ProfileSnapshot`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::{
    error::Error,
    snapshot::{Counts, Metric, ProfileSnapshot},
    stats::{LineCounts, MetricOutcome, RawMetrics}
};

/// Aggregates raw metric outcomes into an immutable snapshot.
///
/// Missing metrics default to `0` and are recorded as unknown. Per-repository
/// line statistics are summed into totals.
///
/// # Errors
///
/// Returns [`Error::Schema`] when line totals overflow.
pub fn aggregate(raw: RawMetrics, generated_at: DateTime<Utc>) -> Result<ProfileSnapshot, Error> {
    let mut unknown = BTreeSet::new();

    let stars = known(raw.stars, Metric::Stars, &mut unknown);
    let repositories = known(raw.repositories, Metric::Repositories, &mut unknown);
    let contributed_repositories = known(
        raw.contributed_repositories,
        Metric::ContributedRepositories,
        &mut unknown
    );
    let followers = known(raw.followers, Metric::Followers, &mut unknown);
    let commits = known(raw.commits, Metric::Commits, &mut unknown);
    let lines = known(raw.lines, Metric::LinesOfCode, &mut unknown);
    let (lines_added, lines_removed) = sum_lines(&lines)?;

    Ok(ProfileSnapshot::new(
        raw.login,
        Counts {
            stars,
            repositories,
            contributed_repositories,
            followers,
            commits,
            lines_added,
            lines_removed
        },
        generated_at,
        raw.account,
        unknown
    ))
}

fn known<T: Default>(
    outcome: MetricOutcome<T>,
    metric: Metric,
    unknown: &mut BTreeSet<Metric>
) -> T {
    match outcome {
        MetricOutcome::Fetched(value) => value,
        MetricOutcome::Missing(_) => {
            unknown.insert(metric);
            T::default()
        }
    }
}

fn sum_lines(lines: &LineCounts) -> Result<(u64, u64), Error> {
    lines
        .repositories
        .iter()
        .try_fold((0u64, 0u64), |(added, removed), entry| {
            let added = added.checked_add(entry.additions);
            let removed = removed.checked_add(entry.deletions);
            match (added, removed) {
                (Some(added), Some(removed)) => Ok((added, removed)),
                _ => Err(Error::schema(
                    "lines of code",
                    format!("line totals overflow at {}", entry.repository)
                ))
            }
        })
}
