// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Metric collection.
//!
//! [`StatsSource`] is the seam between the pipeline and the hosting platform.
//! [`collect`] queries every metric independently: transient failures are
//! retried and then recorded as [`MetricOutcome::Missing`], while
//! authentication, lookup and schema failures abort collection.

use std::{
    collections::BTreeMap,
    fmt,
    future::Future,
    time::Instant,
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::Error,
    retry::{RetryConfig, retry_with_backoff},
};

/// Repository affiliation filter understood by the GraphQL API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Affiliation {
    Owner,
    Collaborator,
    OrganizationMember
}

/// Affiliations counted as "owned" repositories.
pub const OWNED: &[Affiliation] = &[Affiliation::Owner];

/// Affiliations counted as repositories the user contributed to.
pub const CONTRIBUTED: &[Affiliation] = &[
    Affiliation::Owner,
    Affiliation::Collaborator,
    Affiliation::OrganizationMember
];

/// Time range for contribution queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContributionWindow {
    pub from: DateTime<Utc>,
    pub to:   DateTime<Utc>
}

impl ContributionWindow {
    /// The 365 days ending at `now`.
    pub fn trailing_year(now: DateTime<Utc>) -> Self {
        Self {
            from: now - Duration::days(365),
            to:   now
        }
    }
}

/// Public account details shown on the card when the configuration leaves
/// them blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDetails {
    pub name:    Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub email:   Option<String>
}

/// Line statistics attributed to the user in one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryLines {
    /// Repository in `owner/name` form.
    pub repository: String,
    pub additions:  u64,
    pub deletions:  u64,
    pub commits:    u64
}

/// Per-repository line statistics plus the repositories that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCounts {
    pub repositories: Vec<RepositoryLines>,
    pub skipped:      Vec<String>
}

/// Why a metric could not be retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingReason {
    RateLimited,
    Network
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => f.write_str("rate limited"),
            Self::Network => f.write_str("network failure")
        }
    }
}

/// Result of fetching a single metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricOutcome<T> {
    Fetched(T),
    Missing(MissingReason)
}

impl<T> MetricOutcome<T> {
    /// Returns the fetched value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Fetched(value) => Some(value),
            Self::Missing(_) => None
        }
    }
}

/// Raw responses gathered for one run, before aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMetrics {
    pub login:                    String,
    pub account:                  Option<AccountDetails>,
    pub stars:                    MetricOutcome<u64>,
    pub repositories:             MetricOutcome<u64>,
    pub contributed_repositories: MetricOutcome<u64>,
    pub followers:                MetricOutcome<u64>,
    pub commits:                  MetricOutcome<u64>,
    pub lines:                    MetricOutcome<LineCounts>
}

/// Read-only access to the hosting platform's statistics.
///
/// Implementations map platform failures onto [`Error`]: throttling to
/// [`Error::RateLimit`], transport failures to [`Error::Network`], rejected
/// credentials to [`Error::Auth`] and unexpected payloads to
/// [`Error::Schema`].
pub trait StatsSource {
    /// Public profile details of `login`.
    fn account(&self, login: &str) -> impl Future<Output = Result<AccountDetails, Error>> + Send;

    /// Total stargazers across repositories owned by `login`.
    fn star_count(&self, login: &str) -> impl Future<Output = Result<u64, Error>> + Send;

    /// Number of repositories matching `affiliations`.
    fn repo_count(
        &self,
        login: &str,
        affiliations: &[Affiliation]
    ) -> impl Future<Output = Result<u64, Error>> + Send;

    /// Number of followers of `login`.
    fn follower_count(&self, login: &str) -> impl Future<Output = Result<u64, Error>> + Send;

    /// Commit contributions of `login` inside `window`.
    fn commit_count(
        &self,
        login: &str,
        window: ContributionWindow
    ) -> impl Future<Output = Result<u64, Error>> + Send;

    /// Lines added and removed by `login` across owned repositories.
    ///
    /// Implementations retry each repository on their own; [`collect`] calls
    /// this once.
    fn line_counts(&self, login: &str) -> impl Future<Output = Result<LineCounts, Error>> + Send;

    /// Requests issued so far, keyed by operation.
    fn request_counts(&self) -> BTreeMap<&'static str, u32> {
        BTreeMap::new()
    }
}

/// Collects every metric for `login`.
///
/// # Errors
///
/// Returns the first non-transient error. Transient errors that survive the
/// retry policy degrade the affected metric to [`MetricOutcome::Missing`].
pub async fn collect<S>(
    source: &S,
    login: &str,
    window: ContributionWindow,
    retry: &RetryConfig
) -> Result<RawMetrics, Error>
where
    S: StatsSource
{
    info!("Collecting GitHub statistics for {}", login);

    let account = match fetch(retry, "account", || source.account(login)).await? {
        MetricOutcome::Fetched(account) => Some(account),
        MetricOutcome::Missing(_) => None
    };

    let stars = fetch(retry, "stars", || source.star_count(login)).await?;
    let repositories = fetch(retry, "repositories", || source.repo_count(login, OWNED)).await?;
    let contributed_repositories = fetch(retry, "contributed repositories", || {
        source.repo_count(login, CONTRIBUTED)
    })
    .await?;
    let followers = fetch(retry, "followers", || source.follower_count(login)).await?;
    let commits = fetch(retry, "commits", || source.commit_count(login, window)).await?;
    let single_attempt = RetryConfig {
        max_attempts: 1,
        ..retry.clone()
    };
    let lines = fetch(&single_attempt, "lines of code", || source.line_counts(login)).await?;

    if let MetricOutcome::Fetched(counts) = &lines
        && !counts.skipped.is_empty()
    {
        warn!(
            "Line statistics unavailable for {} repositories: {}",
            counts.skipped.len(),
            counts.skipped.join(", ")
        );
    }

    let usage = source.request_counts();
    if !usage.is_empty() {
        let total: u32 = usage.values().sum();
        info!("API usage: {} requests", total);
        for (operation, count) in usage.iter().filter(|(_, count)| **count > 0) {
            debug!("   {}: {}", operation, count);
        }
    }

    Ok(RawMetrics {
        login: login.to_owned(),
        account,
        stars,
        repositories,
        contributed_repositories,
        followers,
        commits,
        lines
    })
}

async fn fetch<F, Fut, T>(
    retry: &RetryConfig,
    metric: &str,
    f: F
) -> Result<MetricOutcome<T>, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>
{
    let started = Instant::now();
    let result = retry_with_backoff(retry, metric, f).await;
    let elapsed = started.elapsed();

    match result {
        Ok(value) => {
            debug!("{} fetched in {:.3} ms", metric, elapsed.as_secs_f64() * 1000.0);
            Ok(MetricOutcome::Fetched(value))
        }
        Err(error) => {
            let reason = match &error {
                Error::RateLimit { .. } => MissingReason::RateLimited,
                Error::Network { .. } => MissingReason::Network,
                _ => return Err(error)
            };
            warn!("{} unavailable ({}), using default: {}", metric, reason, error);
            Ok(MetricOutcome::Missing(reason))
        }
    }
}
