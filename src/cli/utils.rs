//! Shared CLI utilities.

use cliconf::config::Resolution;
use cliconf::domain::Value;

/// Resolved string value of `path`, if it has one.
pub fn resolved_str<'a>(resolution: &'a Resolution, path: &str) -> Option<&'a str> {
    match resolution.values.get(path)?.value.as_ref()? {
        Value::String(text) => Some(text),
        _ => None,
    }
}

pub fn resolved_bool(resolution: &Resolution, path: &str) -> Option<bool> {
    match resolution.values.get(path)?.value.as_ref()? {
        Value::Boolean(flag) => Some(*flag),
        _ => None,
    }
}

/// Human-readable rendering of an optional value.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) if text.is_empty() => "\"\"".to_string(),
        Some(value) => value.to_string(),
        None => "-".to_string(),
    }
}
