// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Profile configuration document.
//!
//! The types in this module mirror the YAML document (`profile.yaml`) that
//! describes the static parts of the card: display name, environment, contact
//! links, output locations and commit settings. Every field has a default so a
//! missing document is equivalent to an empty one, while unknown keys are
//! rejected to surface typos early.

use std::{
    fs,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{self, Error};

/// File name looked up in the repository root when no path is supplied.
pub const DEFAULT_CONFIG_FILE: &str = "profile.yaml";
const DEFAULT_LIGHT_OUTPUT: &str = "profile-light.svg";
const DEFAULT_DARK_OUTPUT: &str = "profile-dark.svg";
const DEFAULT_README_OUTPUT: &str = "README.md";
const DEFAULT_BRANCH: &str = "main";
const DEFAULT_COMMIT_MESSAGE: &str = "chore(profile): refresh profile stats";

/// Root configuration document.
///
/// # Examples
///
/// ```
/// use profile_card::ProfileConfig;
///
/// let yaml = r#"
/// display_name: Octo Cat
/// languages: [Rust, Go]
/// social:
///   website: octo.cat
/// "#;
/// let config = ProfileConfig::parse(yaml,).expect("valid configuration",);
/// assert_eq!(config.languages, vec!["Rust".to_owned(), "Go".to_owned()]);
/// assert_eq!(config.outputs.light.to_str(), Some("profile-light.svg"));
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq,)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig
{
    /// Name printed on the card. Falls back to the GitHub profile name, then
    /// to the login.
    pub display_name: Option<String,>,

    /// Birthday used by the `{AGE}` placeholder.
    pub birthday: Option<NaiveDate,>,

    /// Operating system and editor shown on the card.
    pub environment: EnvironmentInfo,

    /// Languages listed on the card, joined with `, `.
    pub languages: Vec<String,>,

    /// Region shown on the card.
    pub region: String,

    /// Hosting platform shown on the card.
    pub host: String,

    /// Contact links. Empty values fall back to GitHub profile details.
    pub social: SocialLinks,

    /// Output locations relative to the repository root.
    pub outputs: OutputPaths,

    /// Optional custom template files replacing the built-in layouts.
    pub templates: TemplateOverrides,

    /// Branch and message used when committing refreshed artifacts.
    pub commit: CommitSettings,
}

impl Default for ProfileConfig
{
    fn default() -> Self
    {
        Self {
            display_name: None,
            birthday:     None,
            environment:  EnvironmentInfo::default(),
            languages:    Vec::new(),
            region:       "UTC".to_owned(),
            host:         "GitHub".to_owned(),
            social:       SocialLinks::default(),
            outputs:      OutputPaths::default(),
            templates:    TemplateOverrides::default(),
            commit:       CommitSettings::default(),
        }
    }
}

/// Operating system and editor description.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq,)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentInfo
{
    /// Operating system label.
    pub os:     String,
    /// Editor label.
    pub editor: String,
}

impl Default for EnvironmentInfo
{
    fn default() -> Self
    {
        Self {
            os: "Unknown".to_owned(), editor: "Unknown".to_owned(),
        }
    }
}

/// Contact links printed on the card.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default,)]
#[serde(default, deny_unknown_fields)]
pub struct SocialLinks
{
    pub linkedin: String,
    pub twitter:  String,
    pub website:  String,
    pub email:    String,
}

/// Output locations of the generated artifacts.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq,)]
#[serde(default, deny_unknown_fields)]
pub struct OutputPaths
{
    /// Light variant of the card.
    pub light:  PathBuf,
    /// Dark variant of the card.
    pub dark:   PathBuf,
    /// README embedding both variants.
    pub readme: PathBuf,
}

impl Default for OutputPaths
{
    fn default() -> Self
    {
        Self {
            light:  PathBuf::from(DEFAULT_LIGHT_OUTPUT,),
            dark:   PathBuf::from(DEFAULT_DARK_OUTPUT,),
            readme: PathBuf::from(DEFAULT_README_OUTPUT,),
        }
    }
}

/// Custom template files, relative to the repository root.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default,)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateOverrides
{
    pub light: Option<PathBuf,>,
    pub dark:  Option<PathBuf,>,
}

/// Commit settings for the publisher.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq,)]
#[serde(default, deny_unknown_fields)]
pub struct CommitSettings
{
    /// Branch receiving the push.
    pub branch:  String,
    /// Commit message.
    pub message: String,
}

impl Default for CommitSettings
{
    fn default() -> Self
    {
        Self {
            branch: DEFAULT_BRANCH.to_owned(), message: DEFAULT_COMMIT_MESSAGE.to_owned(),
        }
    }
}

impl ProfileConfig
{
    /// Loads the configuration for a repository checkout.
    ///
    /// When `path` is `None` the default `profile.yaml` in `root` is used and
    /// its absence yields the defaults. An explicit path must exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read,
    /// [`Error::ConfigParse`] for malformed YAML and [`Error::Config`] when the
    /// document violates invariants.
    pub fn load(root: &Path, path: Option<&Path,>,) -> Result<Self, Error,>
    {
        let (location, required,) = match path {
            Some(explicit,) => (resolve(root, explicit,), true,),
            None => (root.join(DEFAULT_CONFIG_FILE,), false,),
        };

        match fs::read_to_string(&location,) {
            Ok(contents,) => Self::parse(&contents,),
            Err(source,) if source.kind() == ErrorKind::NotFound && !required => {
                tracing::info!("{} not found, using default configuration", location.display());
                Ok(Self::default(),)
            }
            Err(source,) => Err(error::io_error(&location, source,),),
        }
    }

    /// Parses and validates a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] for malformed YAML and
    /// [`Error::Config`] when validation fails.
    pub fn parse(contents: &str,) -> Result<Self, Error,>
    {
        let config: Self = if contents.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(contents,)?
        };
        config.validate()?;
        Ok(config,)
    }

    /// Checks output paths and commit settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first violation.
    pub fn validate(&self,) -> Result<(), Error,>
    {
        let outputs = [
            ("outputs.light", &self.outputs.light,),
            ("outputs.dark", &self.outputs.dark,),
            ("outputs.readme", &self.outputs.readme,),
        ];

        for (field, path,) in outputs {
            validate_relative(field, path,)?;
        }

        if self.outputs.light == self.outputs.dark
            || self.outputs.light == self.outputs.readme
            || self.outputs.dark == self.outputs.readme
        {
            return Err(Error::config("outputs must point to distinct files",),);
        }

        let templates =
            [("templates.light", &self.templates.light,), ("templates.dark", &self.templates.dark,)];

        for (field, path,) in templates {
            if let Some(path,) = path {
                validate_relative(field, path,)?;
            }
        }

        let branch = self.commit.branch.trim();
        if branch.is_empty() {
            return Err(Error::config("commit.branch cannot be empty",),);
        }
        if branch.contains(char::is_whitespace,) {
            return Err(Error::config("commit.branch cannot contain whitespace",),);
        }
        if self.commit.message.trim().is_empty() {
            return Err(Error::config("commit.message cannot be empty",),);
        }

        Ok((),)
    }
}

fn resolve(root: &Path, path: &Path,) -> PathBuf
{
    if path.is_absolute() { path.to_path_buf() } else { root.join(path,) }
}

fn validate_relative(field: &str, path: &Path,) -> Result<(), Error,>
{
    if path.as_os_str().is_empty() {
        return Err(Error::config(format!("{field} cannot be empty"),),);
    }

    let escapes_root = path
        .components()
        .any(|component| !matches!(component, Component::Normal(_,) | Component::CurDir),);
    if escapes_root {
        return Err(Error::config(format!(
            "{field} must be a relative path inside the repository, got '{}'",
            path.display()
        ),),);
    }

    Ok((),)
}
