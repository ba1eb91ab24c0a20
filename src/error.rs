//! Error types for configuration resolution

use thiserror::Error;

/// Result alias used across the resolution pipeline.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures raised while locating, parsing, filtering or merging configuration.
///
/// A missing configuration file at the default location is not represented
/// here: the locator reports it as `Ok(None)` and resolution continues with an
/// empty tree.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested path or URL could not be read.
    #[error("configuration source {source_id} is unavailable: {reason}")]
    SourceUnavailable { source_id: String, reason: String },

    /// Syntax error, coercion failure or ambiguous entry in a configuration source.
    #[error("malformed configuration in {source_id}{}: {message}", location_suffix(.location))]
    MalformedConfig { source_id: String, location: Option<String>, message: String },

    /// Strict mode found keys with no matching parameter.
    #[error(
        "unrecognized configuration option{} in {source_id}: {}",
        plural(.paths),
        joined(.paths)
    )]
    UnrecognizedConfigOption { source_id: String, paths: Vec<String> },

    /// Two distinct parameters derive the same environment variable name.
    #[error("environment variable {name} is read by both {first} and {second}")]
    DuplicateEnvVarName { name: String, first: String, second: String },
}

impl ConfigError {
    pub(crate) fn malformed(source_id: &str, message: impl Into<String>) -> Self {
        ConfigError::MalformedConfig {
            source_id: source_id.to_string(),
            location: None,
            message: message.into(),
        }
    }

    pub(crate) fn malformed_at(
        source_id: &str,
        location: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        ConfigError::MalformedConfig {
            source_id: source_id.to_string(),
            location,
            message: message.into(),
        }
    }
}

fn plural(paths: &[String]) -> &'static str {
    if paths.len() == 1 {
        ""
    } else {
        "s"
    }
}

fn joined(paths: &[String]) -> String {
    paths.join(", ")
}

fn location_suffix(location: &Option<String>) -> String {
    match location {
        Some(loc) => format!(" at {loc}"),
        None => String::new(),
    }
}
