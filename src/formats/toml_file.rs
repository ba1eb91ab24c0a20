//! TOML decoding

use serde_json::{Map, Value as Raw};

use super::line_col;
use crate::error::{ConfigError, ConfigResult};

pub(super) fn parse(content: &str, source_id: &str) -> ConfigResult<Raw> {
    let table: toml::Table = toml::from_str(content).map_err(|err| {
        let location = err.span().map(|span| line_col(content, span.start));
        ConfigError::malformed_at(source_id, location, err.message().to_string())
    })?;
    Ok(convert_table(table))
}

fn convert_table(table: toml::Table) -> Raw {
    let mut map = Map::new();
    for (key, value) in table {
        map.insert(key, convert(value));
    }
    Raw::Object(map)
}

fn convert(value: toml::Value) -> Raw {
    match value {
        toml::Value::String(s) => Raw::String(s),
        toml::Value::Integer(i) => Raw::from(i),
        // Non-finite floats have no JSON form; keep them as their TOML spelling.
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Raw::Number)
            .unwrap_or_else(|| Raw::String(f.to_string())),
        toml::Value::Boolean(b) => Raw::Bool(b),
        toml::Value::Datetime(dt) => Raw::String(dt.to_string()),
        toml::Value::Array(items) => Raw::Array(items.into_iter().map(convert).collect()),
        toml::Value::Table(table) => convert_table(table),
    }
}
