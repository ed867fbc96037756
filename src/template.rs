// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! SVG layout templates with `{PLACEHOLDER}` tokens.

use std::{
    collections::BTreeSet,
    fmt, fs,
    path::Path,
    sync::LazyLock
};

use regex::Regex;

use crate::error::{self, Error};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Z][A-Z0-9_]*)\}").unwrap_or_else(|e| unreachable!("invalid pattern: {e}"))
});

const LIGHT_LAYOUT: &str = include_str!("../templates/profile-light.svg");
const DARK_LAYOUT: &str = include_str!("../templates/profile-dark.svg");

/// Colour scheme of a rendered card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Light,
    Dark
}

impl Variant {
    /// Both variants, light first.
    pub const ALL: [Self; 2] = [Self::Light, Self::Dark];

    /// Artifact name of the variant.
    pub fn artifact_name(self) -> &'static str {
        match self {
            Self::Light => "profile-light",
            Self::Dark => "profile-dark"
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.artifact_name())
    }
}

/// A named layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name:   String,
    source: String
}

impl Template {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name:   name.into(),
            source: source.into()
        }
    }

    /// Built-in layout for `variant`.
    pub fn builtin(variant: Variant) -> Self {
        let source = match variant {
            Variant::Light => LIGHT_LAYOUT,
            Variant::Dark => DARK_LAYOUT
        };
        Self::new(variant.artifact_name(), source)
    }

    /// Reads a custom layout from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read.
    pub fn from_file(name: impl Into<String>, path: &Path) -> Result<Self, Error> {
        let source = fs::read_to_string(path).map_err(|e| error::io_error(path, e))?;
        Ok(Self::new(name, source))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Distinct placeholder names referenced by the layout.
    pub fn placeholders(&self) -> BTreeSet<&str> {
        PLACEHOLDER
            .captures_iter(&self.source)
            .filter_map(|captures| captures.get(1))
            .map(|name| name.as_str())
            .collect()
    }

    /// Replaces every placeholder with the value returned by `value_of`.
    ///
    /// Text outside placeholders is copied unchanged.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `value_of`.
    pub fn fill<F>(&self, mut value_of: F) -> Result<String, Error>
    where
        F: FnMut(&str) -> Result<String, Error>
    {
        let mut output = String::with_capacity(self.source.len());
        let mut last = 0;

        for captures in PLACEHOLDER.captures_iter(&self.source) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            output.push_str(&self.source[last..whole.start()]);
            output.push_str(&value_of(name.as_str())?);
            last = whole.end();
        }

        output.push_str(&self.source[last..]);
        Ok(output)
    }
}
