// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Immutable aggregated metrics for one run.

use std::{collections::BTreeSet, fmt};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::stats::AccountDetails;

/// Metric shown on the profile card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Stars,
    Repositories,
    ContributedRepositories,
    Followers,
    LinesOfCode,
    Commits
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Stars => "stars",
            Self::Repositories => "repositories",
            Self::ContributedRepositories => "contributed repositories",
            Self::Followers => "followers",
            Self::LinesOfCode => "lines of code",
            Self::Commits => "commits"
        };
        f.write_str(label)
    }
}

/// Numeric totals of a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub stars:                    u64,
    pub repositories:             u64,
    pub contributed_repositories: u64,
    pub followers:                u64,
    pub commits:                  u64,
    pub lines_added:              u64,
    pub lines_removed:            u64
}

/// Aggregated metrics for one run.
///
/// Built by [`crate::aggregate::aggregate`] and never mutated afterwards.
/// Metrics that could not be fetched hold `0` and are listed in
/// [`ProfileSnapshot::unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSnapshot {
    login:        String,
    counts:       Counts,
    generated_at: DateTime<Utc>,
    account:      Option<AccountDetails>,
    unknown:      BTreeSet<Metric>
}

impl ProfileSnapshot {
    pub(crate) fn new(
        login: String,
        counts: Counts,
        generated_at: DateTime<Utc>,
        account: Option<AccountDetails>,
        unknown: BTreeSet<Metric>
    ) -> Self {
        Self {
            login,
            counts,
            generated_at,
            account,
            unknown
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn counts(&self) -> &Counts {
        &self.counts
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Account details, absent when the profile query degraded.
    pub fn account(&self) -> Option<&AccountDetails> {
        self.account.as_ref()
    }

    /// Metrics that defaulted to zero because they could not be fetched.
    pub fn unknown(&self) -> &BTreeSet<Metric> {
        &self.unknown
    }

    /// Returns `true` when `metric` holds a fetched value.
    pub fn is_known(&self, metric: Metric) -> bool {
        !self.unknown.contains(&metric)
    }

    /// Lines added minus lines removed. May be negative.
    pub fn lines_net(&self) -> i128 {
        i128::from(self.counts.lines_added) - i128::from(self.counts.lines_removed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn snapshot(added: u64, removed: u64) -> ProfileSnapshot {
        ProfileSnapshot::new(
            "octocat".to_owned(),
            Counts {
                lines_added: added,
                lines_removed: removed,
                ..Counts::default()
            },
            Utc.with_ymd_and_hms(2025, 1, 1, 4, 0, 0).unwrap(),
            None,
            BTreeSet::from([Metric::Followers])
        )
    }

    #[test]
    fn lines_net_can_be_negative() {
        assert_eq!(snapshot(10, 25).lines_net(), -15);
        assert_eq!(snapshot(u64::MAX, 0).lines_net(), i128::from(u64::MAX));
    }

    #[test]
    fn unknown_metrics_are_reported() {
        let snapshot = snapshot(0, 0);
        assert!(!snapshot.is_known(Metric::Followers));
        assert!(snapshot.is_known(Metric::Stars));
        assert_eq!(Metric::ContributedRepositories.to_string(), "contributed repositories");
    }
}
