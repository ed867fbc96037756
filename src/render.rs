// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Snapshot to document rendering.
//!
//! Rendering is a pure function of the snapshot, the profile configuration and
//! the template: the same inputs always produce byte-identical output.

use std::path::{Path, PathBuf};

use crate::{
    config::ProfileConfig,
    error::Error,
    format::{build_timestamp, escape_xml, format_age, group_thousands},
    snapshot::ProfileSnapshot,
    template::Template
};

/// A rendered document and the file it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    /// Artifact name, such as `profile-light` or `readme`.
    pub name: String,
    /// Target path relative to the repository root.
    pub path: PathBuf,
    /// Document contents.
    pub body: String
}

/// Renders `template` for `snapshot`.
///
/// # Errors
///
/// Returns [`Error::Template`] when the template references a placeholder
/// without a value, including `{AGE}` when no birthday is configured.
pub fn render(
    snapshot: &ProfileSnapshot,
    profile: &ProfileConfig,
    template: &Template,
    path: &Path
) -> Result<RenderedArtifact, Error> {
    let body = template.fill(|placeholder| value_of(placeholder, snapshot, profile, template))?;

    Ok(RenderedArtifact {
        name: template.name().to_owned(),
        path: path.to_path_buf(),
        body
    })
}

fn value_of(
    placeholder: &str,
    snapshot: &ProfileSnapshot,
    profile: &ProfileConfig,
    template: &Template
) -> Result<String, Error> {
    let counts = snapshot.counts();
    let account = snapshot.account();

    let value = match placeholder {
        "STARS" => group_thousands(i128::from(counts.stars)),
        "REPOS" => group_thousands(i128::from(counts.repositories)),
        "CONTRIB" => group_thousands(i128::from(counts.contributed_repositories)),
        "FOLLOWERS" => group_thousands(i128::from(counts.followers)),
        "COMMITS" => group_thousands(i128::from(counts.commits)),
        "LOC_ADD" => group_thousands(i128::from(counts.lines_added)),
        "LOC_DEL" => group_thousands(i128::from(counts.lines_removed)),
        "LOC_TOTAL" => group_thousands(snapshot.lines_net()),
        "USER" => text(snapshot.login()),
        "NAME" => {
            let name = profile
                .display_name
                .as_deref()
                .filter(|name| !name.trim().is_empty())
                .or_else(|| account.and_then(|account| account.name.as_deref()))
                .unwrap_or(snapshot.login());
            text(name)
        }
        "OS" => text(&profile.environment.os),
        "EDITOR" => text(&profile.environment.editor),
        "LANGUAGES" => text(&profile.languages.join(", ")),
        "REGION" => text(&profile.region),
        "HOST" => text(&profile.host),
        "LINKEDIN" => text(&profile.social.linkedin),
        "TWITTER" => {
            let handle = account
                .and_then(|account| account.twitter.as_deref())
                .map(|handle| format!("twitter.com/{handle}"));
            text(fallback(&profile.social.twitter, handle.as_deref()))
        }
        "WEBSITE" => text(fallback(
            &profile.social.website,
            account.and_then(|account| account.website.as_deref())
        )),
        "EMAIL" => text(fallback(
            &profile.social.email,
            account.and_then(|account| account.email.as_deref())
        )),
        "AGE" => {
            let birthday = profile.birthday.ok_or_else(|| {
                Error::template(template.name(), "{AGE} requires a configured birthday")
            })?;
            text(&format_age(birthday, snapshot.generated_at().date_naive()))
        }
        "BUILD_TIMESTAMP" => build_timestamp(snapshot.generated_at()),
        other => {
            return Err(Error::template(
                template.name(),
                format!("unknown placeholder {{{other}}}")
            ));
        }
    };

    Ok(value)
}

fn text(value: &str) -> String {
    escape_xml(value).into_owned()
}

fn fallback<'a>(configured: &'a str, fetched: Option<&'a str>) -> &'a str {
    if configured.trim().is_empty() {
        fetched.unwrap_or_default()
    } else {
        configured
    }
}
