// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// README section embedding both card variants.
///
/// The section lives between [`SECTION_START`] and [`SECTION_END`] and holds a
/// `<picture>` element that serves the dark card to readers with a dark colour
/// scheme and the light card otherwise. Content outside the markers is kept
/// verbatim.
use std::path::{Component, Path};

use tracing::debug;

use crate::{error::Error, format::escape_xml, render::RenderedArtifact};

/// Artifact name of the README.
pub const README_ARTIFACT: &str = "readme";
/// Marker opening the generated section.
pub const SECTION_START: &str = "<!-- profile-card:start -->";
/// Marker closing the generated section.
pub const SECTION_END: &str = "<!-- profile-card:end -->";

/// Card locations referenced by the README section, relative to the
/// repository root.
#[derive(Debug, Clone, Copy)]
pub struct CardPaths<'a> {
    pub light: &'a Path,
    pub dark:  &'a Path
}

/// Renders the README with a refreshed profile section.
///
/// `existing` is the current README contents, `None` when the file does not
/// exist yet. A README without markers gets the section appended.
///
/// # Errors
///
/// Returns [`Error::Template`] when the start marker is present without a
/// matching end marker.
///
/// # Example
///
/// ```
/// use std::path::Path;
///
/// use profile_card::readme::{CardPaths, SECTION_START, render_readme};
///
/// let cards = CardPaths {
///     light: Path::new("profile-light.svg"),
///     dark:  Path::new("profile-dark.svg")
/// };
/// let artifact = render_readme(None, cards, "octocat", Path::new("README.md")).unwrap();
/// assert!(artifact.body.starts_with(SECTION_START));
/// ```
pub fn render_readme(
    existing: Option<&str>,
    cards: CardPaths<'_>,
    login: &str,
    path: &Path
) -> Result<RenderedArtifact, Error> {
    let section = section(cards, login, path);

    let body = match existing {
        None => {
            debug!("README not found, creating {}", path.display());
            format!("{section}\n")
        }
        Some(content) if content.contains(SECTION_START) => replace_section(content, &section)?,
        Some(content) => {
            debug!("No profile section markers in {}, appending", path.display());
            let trimmed = content.trim_end();
            if trimmed.is_empty() {
                format!("{section}\n")
            } else {
                format!("{trimmed}\n\n{section}\n")
            }
        }
    };

    Ok(RenderedArtifact {
        name: README_ARTIFACT.to_owned(),
        path: path.to_path_buf(),
        body
    })
}

fn replace_section(content: &str, section: &str) -> Result<String, Error> {
    let start_idx = content.find(SECTION_START).ok_or_else(|| {
        Error::template(README_ARTIFACT, format!("start marker not found: {SECTION_START}"))
    })?;

    let search_from = start_idx + SECTION_START.len();
    let end_idx = content[search_from..]
        .find(SECTION_END)
        .ok_or_else(|| {
            Error::template(README_ARTIFACT, format!("end marker not found: {SECTION_END}"))
        })?
        + search_from
        + SECTION_END.len();

    let mut result = String::with_capacity(content.len() + section.len());
    result.push_str(&content[..start_idx]);
    result.push_str(section);
    result.push_str(&content[end_idx..]);

    Ok(result)
}

fn section(cards: CardPaths<'_>, login: &str, readme: &Path) -> String {
    let dark = relative_link(readme, cards.dark);
    let light = relative_link(readme, cards.light);
    let alt = format!("{login}'s GitHub profile stats");

    format!(
        "{SECTION_START}\n<picture>\n  <source media=\"(prefers-color-scheme: dark)\" srcset=\"{}\">\n  <img alt=\"{}\" src=\"{}\">\n</picture>\n{SECTION_END}",
        escape_xml(&dark),
        escape_xml(&alt),
        escape_xml(&light)
    )
}

/// Link from the README's directory to `target`, both relative to the root.
fn relative_link(readme: &Path, target: &Path) -> String {
    let depth = readme
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter(|component| matches!(component, Component::Normal(_)))
                .count()
        })
        .unwrap_or(0);

    let mut link = "../".repeat(depth);
    let segments: Vec<String> = target
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None
        })
        .collect();
    link.push_str(&segments.join("/"));
    link
}
