// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! GitHub-backed [`StatsSource`].
//!
//! Most metrics come from the GraphQL API; line statistics use the REST
//! contributor statistics endpoint (see [`crate::contributors`]). Responses are
//! decoded into minimal structures so that unknown or additional fields are
//! ignored.

use std::{collections::BTreeMap, future::Future, sync::Mutex};

use chrono::SecondsFormat;
use octocrab::Octocrab;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use tracing::{debug, warn};

use crate::{
    contributors::fetch_repository_lines,
    credentials::Credentials,
    error::Error,
    retry::{RetryConfig, retry_with_backoff},
    stats::{
        AccountDetails, Affiliation, ContributionWindow, LineCounts, OWNED, RepositoryLines,
        StatsSource
    }
};

/// Upper bound on pages walked by paginated queries (100 repositories each).
const MAX_PAGES: u32 = 50;

const ACCOUNT_QUERY: &str = r#"
query($login: String!) {
    user(login: $login) {
        name
        websiteUrl
        email
        twitterUsername
    }
}
"#;

const STARS_QUERY: &str = r#"
query($login: String!, $affiliations: [RepositoryAffiliation], $cursor: String) {
    user(login: $login) {
        repositories(first: 100, after: $cursor, ownerAffiliations: $affiliations) {
            nodes {
                stargazerCount
            }
            pageInfo {
                endCursor
                hasNextPage
            }
        }
    }
}
"#;

const REPO_COUNT_QUERY: &str = r#"
query($login: String!, $affiliations: [RepositoryAffiliation]) {
    user(login: $login) {
        repositories(first: 1, ownerAffiliations: $affiliations) {
            totalCount
        }
    }
}
"#;

const FOLLOWERS_QUERY: &str = r#"
query($login: String!) {
    user(login: $login) {
        followers {
            totalCount
        }
    }
}
"#;

const COMMITS_QUERY: &str = r#"
query($login: String!, $from: DateTime!, $to: DateTime!) {
    user(login: $login) {
        contributionsCollection(from: $from, to: $to) {
            totalCommitContributions
            restrictedContributionsCount
        }
    }
}
"#;

const OWNED_REPOSITORIES_QUERY: &str = r#"
query($login: String!, $affiliations: [RepositoryAffiliation], $cursor: String) {
    user(login: $login) {
        repositories(first: 100, after: $cursor, ownerAffiliations: $affiliations) {
            nodes {
                nameWithOwner
                isFork
                isArchived
            }
            pageInfo {
                endCursor
                hasNextPage
            }
        }
    }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data:   Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(rename = "type", default)]
    kind:    Option<String>,
    #[serde(default)]
    message: String
}

#[derive(Debug, Deserialize)]
struct UserEnvelope<T> {
    user: Option<T>
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountNode {
    name:             Option<String>,
    website_url:      Option<String>,
    email:            Option<String>,
    twitter_username: Option<String>
}

#[derive(Debug, Deserialize)]
struct RepositoriesNode<T> {
    repositories: Connection<T>
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection<T> {
    #[serde(default = "Vec::new")]
    nodes:       Vec<T>,
    page_info:   Option<PageInfo>,
    total_count: Option<u64>
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor:    Option<String>,
    has_next_page: bool
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StarNode {
    stargazer_count: u64
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnedRepositoryNode {
    name_with_owner: String,
    #[serde(default)]
    is_fork:         bool,
    #[serde(default)]
    is_archived:     bool
}

#[derive(Debug, Deserialize)]
struct FollowersNode {
    followers: TotalCount
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TotalCount {
    total_count: u64
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsNode {
    contributions_collection: ContributionsCollection
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsCollection {
    total_commit_contributions:    u64,
    #[serde(default)]
    restricted_contributions_count: u64
}

impl<T> GraphQlResponse<T> {
    fn into_data(self, operation: &str) -> Result<T, Error> {
        if !self.errors.is_empty() {
            let message = self
                .errors
                .iter()
                .map(|error| error.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            let has_kind = |kind: &str| {
                self.errors
                    .iter()
                    .any(|error| error.kind.as_deref() == Some(kind))
            };

            if has_kind("RATE_LIMITED") {
                return Err(Error::rate_limit(operation, message));
            }
            if has_kind("NOT_FOUND") {
                return Err(Error::not_found(operation, message));
            }
            if has_kind("FORBIDDEN") {
                return Err(Error::auth(message));
            }
            return Err(Error::schema(operation, message));
        }

        self.data
            .ok_or_else(|| Error::schema(operation, "response contained no data"))
    }
}

/// [`StatsSource`] implementation backed by an authenticated [`Octocrab`]
/// client.
pub struct GitHubStats {
    client:   Octocrab,
    retry:    RetryConfig,
    requests: Mutex<BTreeMap<&'static str, u32>>
}

impl GitHubStats {
    /// Builds a client authenticated with the run's access token.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] when the client cannot be initialized.
    pub fn new(credentials: &Credentials) -> Result<Self, Error> {
        let client = Octocrab::builder()
            .personal_token(credentials.token().expose().to_owned())
            .build()
            .map_err(|e| Error::auth(format!("failed to initialize GitHub client: {e}")))?;
        Ok(Self::from_octocrab(client))
    }

    /// Wraps a pre-configured client.
    pub fn from_octocrab(client: Octocrab) -> Self {
        Self {
            client,
            retry: RetryConfig::default(),
            requests: Mutex::new(BTreeMap::new())
        }
    }

    /// Retry policy applied to each per-repository statistics request.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn record(&self, operation: &'static str) {
        if let Ok(mut requests) = self.requests.lock() {
            *requests.entry(operation).or_insert(0) += 1;
        }
    }

    async fn query<T>(
        &self,
        operation: &'static str,
        query: &str,
        variables: serde_json::Value
    ) -> Result<T, Error>
    where
        T: DeserializeOwned
    {
        self.record(operation);
        debug!("GraphQL {}", operation);

        let response: GraphQlResponse<T> = self
            .client
            .graphql(&json!({ "query": query, "variables": variables }))
            .await
            .map_err(|e| classify(operation, e))?;

        response.into_data(operation)
    }

    async fn user<T>(
        &self,
        operation: &'static str,
        login: &str,
        query: &str,
        variables: serde_json::Value
    ) -> Result<T, Error>
    where
        T: DeserializeOwned
    {
        let envelope: UserEnvelope<T> = self.query(operation, query, variables).await?;
        envelope
            .user
            .ok_or_else(|| Error::not_found(operation, format!("user '{login}' does not exist")))
    }

    /// Walks every page of a repositories connection.
    async fn repositories<T>(
        &self,
        operation: &'static str,
        login: &str,
        query: &str,
        affiliations: &[Affiliation]
    ) -> Result<Vec<T>, Error>
    where
        T: DeserializeOwned
    {
        let mut collected = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let variables = json!({
                "login": login,
                "affiliations": affiliations,
                "cursor": cursor,
            });
            let node: RepositoriesNode<T> = self.user(operation, login, query, variables).await?;
            let connection = node.repositories;
            collected.extend(connection.nodes);

            match connection.page_info {
                Some(PageInfo {
                    has_next_page: true,
                    end_cursor: Some(next)
                }) => cursor = Some(next),
                _ => return Ok(collected)
            }
        }

        warn!("{} stopped after {} pages", operation, MAX_PAGES);
        Ok(collected)
    }
}

impl StatsSource for GitHubStats {
    async fn account(&self, login: &str) -> Result<AccountDetails, Error> {
        let node: AccountNode = self
            .user("account", login, ACCOUNT_QUERY, json!({ "login": login }))
            .await?;

        Ok(AccountDetails {
            name:    non_blank(node.name),
            website: non_blank(node.website_url),
            twitter: non_blank(node.twitter_username),
            email:   non_blank(node.email)
        })
    }

    async fn star_count(&self, login: &str) -> Result<u64, Error> {
        let nodes: Vec<StarNode> = self
            .repositories("stars", login, STARS_QUERY, OWNED)
            .await?;
        Ok(nodes.iter().map(|node| node.stargazer_count).sum())
    }

    async fn repo_count(&self, login: &str, affiliations: &[Affiliation]) -> Result<u64, Error> {
        let variables = json!({ "login": login, "affiliations": affiliations });
        let node: RepositoriesNode<serde_json::Value> = self
            .user("repositories", login, REPO_COUNT_QUERY, variables)
            .await?;
        node.repositories
            .total_count
            .ok_or_else(|| Error::schema("repositories", "totalCount missing"))
    }

    async fn follower_count(&self, login: &str) -> Result<u64, Error> {
        let node: FollowersNode = self
            .user("followers", login, FOLLOWERS_QUERY, json!({ "login": login }))
            .await?;
        Ok(node.followers.total_count)
    }

    async fn commit_count(&self, login: &str, window: ContributionWindow) -> Result<u64, Error> {
        let variables = json!({
            "login": login,
            "from": window.from.to_rfc3339_opts(SecondsFormat::Secs, true),
            "to": window.to.to_rfc3339_opts(SecondsFormat::Secs, true),
        });
        let node: ContributionsNode = self
            .user("commits", login, COMMITS_QUERY, variables)
            .await?;
        let collection = node.contributions_collection;
        Ok(collection.total_commit_contributions + collection.restricted_contributions_count)
    }

    async fn line_counts(&self, login: &str) -> Result<LineCounts, Error> {
        let nodes: Vec<OwnedRepositoryNode> = self
            .repositories("owned repositories", login, OWNED_REPOSITORIES_QUERY, OWNED)
            .await?;

        let mut repositories = Vec::new();
        for node in nodes.into_iter().filter(|node| !node.is_fork && !node.is_archived) {
            if !node.name_with_owner.contains('/') {
                return Err(Error::schema(
                    "owned repositories",
                    format!("malformed repository name '{}'", node.name_with_owner)
                ));
            }
            repositories.push(node.name_with_owner);
        }

        sum_repository_lines(repositories, &self.retry, |repository| async move {
            let (owner, repo) = repository
                .split_once('/')
                .ok_or_else(|| Error::schema("owned repositories", "malformed repository name"))?;
            self.record("contributor stats");
            fetch_repository_lines(&self.client, owner, repo, login).await
        })
        .await
    }

    fn request_counts(&self) -> BTreeMap<&'static str, u32> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

/// Sums line statistics over `repositories`, retrying each one on its own.
///
/// Repositories whose statistics are unavailable are skipped: GitHub answers
/// `202` while it computes them, `204` for empty repositories and `404` once a
/// repository is gone. Every other failure that survives the retry policy is
/// returned, so a throttled run reports the metric as missing instead of
/// undercounting it.
pub(crate) async fn sum_repository_lines<F, Fut>(
    repositories: Vec<String>,
    retry: &RetryConfig,
    mut fetch: F
) -> Result<LineCounts, Error>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<RepositoryLines, Error>>
{
    let mut counts = LineCounts::default();

    for repository in repositories {
        let operation = format!("contributor stats for {repository}");
        match retry_with_backoff(retry, &operation, || fetch(repository.clone())).await {
            Ok(lines) => counts.repositories.push(lines),
            Err(error @ (Error::NotFound { .. } | Error::Schema { .. })) => {
                warn!("Could not fetch stats for {}: {}", repository, error);
                counts.skipped.push(repository);
            }
            Err(error) => return Err(error)
        }
    }

    Ok(counts)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

/// Maps an octocrab failure onto the crate taxonomy.
pub(crate) fn classify(operation: &str, error: octocrab::Error) -> Error {
    match &error {
        octocrab::Error::GitHub {
            source, ..
        } => classify_status(operation, source.status_code.as_u16(), &source.message),
        octocrab::Error::Serde {
            ..
        }
        | octocrab::Error::Json {
            ..
        } => Error::schema(operation, error.to_string()),
        _ => Error::network(operation, error.to_string())
    }
}

fn classify_status(operation: &str, status: u16, message: &str) -> Error {
    match status {
        401 => Error::auth(format!("{operation}: {message}")),
        429 => Error::rate_limit(operation, message),
        403 if is_rate_limit_message(message) => Error::rate_limit(operation, message),
        403 => Error::auth(format!("{operation}: {message}")),
        404 => Error::not_found(operation, message),
        500..=599 => Error::network(operation, format!("HTTP {status}: {message}")),
        _ => Error::schema(operation, format!("HTTP {status}: {message}"))
    }
}

fn is_rate_limit_message(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("rate limit")
        || message_lower.contains("secondary rate")
        || message_lower.contains("abuse detection")
}
