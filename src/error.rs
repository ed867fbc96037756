#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the profile-card crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.
//!
//! Variants follow the pipeline stages. [`Error::is_transient`] separates the
//! failures that only degrade a single metric from the ones that abort a run.

use std::path::{Path, PathBuf};

/// Unified error type returned by every pipeline stage and the CLI.
///
/// Messages never carry the access token. Callers that format remote URLs or
/// command output are responsible for redacting it before constructing a
/// variant.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// The access token is absent, invalid or expired.
    #[error("authentication failed: {message}")]
    Auth {
        /// Human readable description of the failure.
        message: String
    },
    /// GitHub throttled the request.
    #[error("rate limited while fetching {operation}: {message}")]
    RateLimit {
        /// Operation that was throttled.
        operation: String,
        /// Message reported by the API.
        message:   String
    },
    /// Transport failure or server-side error.
    #[error("network failure while fetching {operation}: {message}")]
    Network {
        /// Operation that failed.
        operation: String,
        /// Underlying transport message.
        message:   String
    },
    /// The requested account or resource does not exist.
    #[error("not found while fetching {operation}: {message}")]
    NotFound {
        /// Operation that failed.
        operation: String,
        /// Message reported by the API.
        message:   String
    },
    /// The API answered with a shape the client does not understand.
    #[error("unexpected response from {operation}: {message}")]
    Schema {
        /// Operation or stage that received the malformed input.
        operation: String,
        /// Description of the mismatch.
        message:   String
    },
    /// A template references a placeholder without a value or is malformed.
    #[error("template '{template}' is invalid: {message}")]
    Template {
        /// Name of the template being rendered.
        template: String,
        /// Description of the problem.
        message:  String
    },
    /// A version-control operation failed.
    #[error("failed to publish artifacts: {message}")]
    Publish {
        /// Description of the failing git operation.
        message: String
    },
    /// Returned when configuration or arguments violate invariants.
    #[error("invalid configuration: {message}")]
    Config {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// Wraps YAML decoding errors.
    #[error("failed to parse configuration: {source}")]
    ConfigParse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Wraps I/O errors raised while reading inputs or writing artifacts.
    #[error("I/O failure at {path:?}: {source}")]
    Io {
        /// Location of the file being processed.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    }
}

impl Error {
    /// Constructs an authentication error.
    pub fn auth<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Auth {
            message: message.into()
        }
    }

    /// Constructs a rate limit error for `operation`.
    pub fn rate_limit<O, M>(operation: O, message: M) -> Self
    where
        O: Into<String>,
        M: Into<String>
    {
        Self::RateLimit {
            operation: operation.into(),
            message:   message.into()
        }
    }

    /// Constructs a network error for `operation`.
    pub fn network<O, M>(operation: O, message: M) -> Self
    where
        O: Into<String>,
        M: Into<String>
    {
        Self::Network {
            operation: operation.into(),
            message:   message.into()
        }
    }

    /// Constructs a not-found error for `operation`.
    pub fn not_found<O, M>(operation: O, message: M) -> Self
    where
        O: Into<String>,
        M: Into<String>
    {
        Self::NotFound {
            operation: operation.into(),
            message:   message.into()
        }
    }

    /// Constructs a schema error for `operation`.
    pub fn schema<O, M>(operation: O, message: M) -> Self
    where
        O: Into<String>,
        M: Into<String>
    {
        Self::Schema {
            operation: operation.into(),
            message:   message.into()
        }
    }

    /// Constructs a template error for the template called `template`.
    pub fn template<T, M>(template: T, message: M) -> Self
    where
        T: Into<String>,
        M: Into<String>
    {
        Self::Template {
            template: template.into(),
            message:  message.into()
        }
    }

    /// Constructs a publish error.
    pub fn publish<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Publish {
            message: message.into()
        }
    }

    /// Constructs a configuration error.
    pub fn config<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Config {
            message: message.into()
        }
    }

    /// Reports whether the failure is worth retrying and, once retries are
    /// exhausted, may be downgraded to a missing metric.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimit { .. } | Self::Network { .. })
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::ConfigParse {
            source
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the file that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn config_constructor_populates_message() {
        let error = Error::config("something went wrong");
        match error {
            Error::Config {
                ref message
            } => {
                assert_eq!(message, "something went wrong");
            }
            other => panic!("expected config error, got {other:?}")
        }
    }

    #[test]
    fn to_display_string_matches_display() {
        let error = Error::publish("push rejected");
        assert_eq!(error.to_string(), error.to_display_string());
        assert_eq!(error.to_string(), "failed to publish artifacts: push rejected");
    }

    #[test]
    fn io_error_helper_wraps_path_and_source() {
        let path = std::path::Path::new("/tmp/profile-light.svg");
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = super::io_error(path, io_error);

        match error {
            Error::Io {
                path: ref stored_path,
                ref source
            } => {
                assert_eq!(stored_path, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected io error, got {other:?}")
        }
    }

    #[test]
    fn serde_yaml_conversion_maps_to_config_parse_variant() {
        let error = serde_yaml::from_str::<usize>("not-a-number").unwrap_err();
        let mapped: Error = error.into();
        assert!(matches!(mapped, Error::ConfigParse { .. }));
    }

    #[test]
    fn only_rate_limit_and_network_are_transient() {
        assert!(Error::rate_limit("stars", "slow down").is_transient());
        assert!(Error::network("stars", "reset").is_transient());
        assert!(!Error::auth("bad credentials").is_transient());
        assert!(!Error::schema("stars", "missing data").is_transient());
        assert!(!Error::not_found("account", "no such user").is_transient());
        assert!(!Error::template("profile-light", "unknown placeholder").is_transient());
        assert!(!Error::publish("rejected").is_transient());
    }
}
