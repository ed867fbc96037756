// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Self-updating GitHub profile cards.
//!
//! The library collects a user's GitHub statistics, aggregates them into an
//! immutable [`ProfileSnapshot`], renders light and dark SVG cards plus a
//! README section, and commits the artifacts back to the repository only when
//! their bytes changed. Every stage is exposed separately so it can be tested
//! with in-memory fakes; [`pipeline::run`] wires them together.

pub mod aggregate;
pub mod config;
pub mod contributors;
pub mod credentials;
mod error;
pub mod format;
pub mod git;
pub mod github;
pub mod pipeline;
pub mod publish;
pub mod readme;
pub mod render;
mod retry;
pub mod snapshot;
pub mod stats;
pub mod template;

#[cfg(test)]
mod test_support;

pub use aggregate::aggregate;
pub use config::{CommitSettings, ProfileConfig};
pub use credentials::{AccessToken, Credentials, RepositoryId};
pub use error::{Error, io_error};
pub use git::{Git, VersionControl};
pub use github::GitHubStats;
pub use pipeline::{RunInputs, RunReport, run};
pub use publish::{CommitOutcome, publish};
pub use render::{RenderedArtifact, render};
pub use retry::{RetryConfig, retry_with_backoff};
pub use snapshot::{Metric, ProfileSnapshot};
pub use stats::{RawMetrics, StatsSource, collect};
pub use template::{Template, Variant};
