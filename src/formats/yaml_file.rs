//! YAML decoding

use serde_json::{Map, Value as Raw};
use serde_yaml::Value as Yaml;

use crate::error::{ConfigError, ConfigResult};

pub(super) fn parse(content: &str, source_id: &str) -> ConfigResult<Raw> {
    let doc: Yaml = serde_yaml::from_str(content).map_err(|err| {
        let location = err.location().map(|loc| format!("{}:{}", loc.line(), loc.column()));
        ConfigError::malformed_at(source_id, location, err.to_string())
    })?;
    convert(doc, source_id)
}

fn convert(value: Yaml, source_id: &str) -> ConfigResult<Raw> {
    Ok(match value {
        Yaml::Null => Raw::Null,
        Yaml::Bool(b) => Raw::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Raw::from(i)
            } else if let Some(u) = n.as_u64() {
                Raw::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Raw::Number)
                    .unwrap_or_else(|| Raw::String(n.to_string()))
            }
        }
        Yaml::String(s) => Raw::String(s),
        Yaml::Sequence(items) => Raw::Array(
            items.into_iter().map(|item| convert(item, source_id)).collect::<ConfigResult<_>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(key_string(key, source_id)?, convert(value, source_id)?);
            }
            Raw::Object(map)
        }
        Yaml::Tagged(tagged) => {
            let tagged = *tagged;
            convert(tagged.value, source_id)?
        }
    })
}

fn key_string(key: Yaml, source_id: &str) -> ConfigResult<String> {
    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Null => Ok("null".to_string()),
        other => Err(ConfigError::malformed(
            source_id,
            format!("unsupported mapping key {other:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_implicit_scalar_typing() {
        let content = "prog:\n  flag: yes\n  on: true\n  n: 3\n  x: 1.5\n  nothing: ~\n";
        let tree = parse(content, "c.yaml").unwrap();
        // YAML 1.2 core schema: `yes` stays a string.
        assert_eq!(
            tree,
            json!({"prog": {"flag": "yes", "on": true, "n": 3, "x": 1.5, "nothing": null}})
        );
    }

    #[test]
    fn test_sequences_and_nesting() {
        let tree = parse("prog:\n  tags: [a, b]\n  serve:\n    port: 80\n", "c.yml").unwrap();
        assert_eq!(tree, json!({"prog": {"tags": ["a", "b"], "serve": {"port": 80}}}));
    }

    #[test]
    fn test_syntax_error_reports_location() {
        let err = parse("prog:\n  a: [1, 2\n", "c.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedConfig { location: Some(_), .. }));
    }
}
