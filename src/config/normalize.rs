//! Lock-step walk of a raw configuration tree against the parameter tree
//!
//! Keys naming sub-commands descend, keys naming parameters are coerced,
//! everything else is collected as unmatched.

use std::collections::BTreeMap;

use serde_json::{Map, Value as Raw};

use crate::domain::{NormalizedConfig, ParamPath};
use crate::error::{ConfigError, ConfigResult};
use crate::params::{CommandNode, ParameterTree, IGNORED_KEYS};

/// Typed values of one configuration source plus the keys that matched nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub values: NormalizedConfig,
    /// Dotted key paths, in walk order, that matched no parameter.
    pub unmatched: Vec<String>,
}

/// Filter and coerce `raw` against `tree`.
///
/// In strict mode any unmatched key fails the whole pass with one
/// [`ConfigError::UnrecognizedConfigOption`] listing every offending path.
pub fn normalize(
    raw: &Raw,
    tree: &ParameterTree,
    strict: bool,
    source_id: &str,
) -> ConfigResult<Normalized> {
    let root = match raw {
        Raw::Null => return Ok(Normalized::default()),
        Raw::Object(map) => map,
        other => {
            return Err(ConfigError::malformed(
                source_id,
                format!("top level must be a mapping, found {}", kind_name(other)),
            ))
        }
    };

    let mut walker = Walker {
        source_id,
        values: NormalizedConfig::new(),
        origins: BTreeMap::new(),
        unmatched: Vec::new(),
    };

    for (key, value) in root {
        if IGNORED_KEYS.contains(&key.as_str()) {
            continue;
        }
        if key != tree.program() {
            walker.unmatched.push(key.clone());
            continue;
        }
        match value {
            Raw::Object(section) => walker.walk(&tree.root, section, key)?,
            Raw::Null => {}
            other => {
                return Err(ConfigError::malformed(
                    source_id,
                    format!("{key} must be a mapping, found {}", kind_name(other)),
                ))
            }
        }
    }

    let Walker { values, unmatched, .. } = walker;
    if !unmatched.is_empty() {
        if strict {
            return Err(ConfigError::UnrecognizedConfigOption {
                source_id: source_id.to_string(),
                paths: unmatched,
            });
        }
        for path in &unmatched {
            tracing::debug!(
                source = source_id,
                key = %path,
                "ignoring unrecognized configuration key"
            );
        }
    }
    Ok(Normalized { values, unmatched })
}

struct Walker<'a> {
    source_id: &'a str,
    values: NormalizedConfig,
    /// Key path that produced each parameter path, for ambiguity reports.
    origins: BTreeMap<ParamPath, String>,
    unmatched: Vec<String>,
}

impl Walker<'_> {
    fn walk(
        &mut self,
        node: &CommandNode,
        section: &Map<String, Raw>,
        key_path: &str,
    ) -> ConfigResult<()> {
        for (key, value) in section {
            if IGNORED_KEYS.contains(&key.as_str()) {
                continue;
            }
            let here = format!("{key_path}.{key}");

            if let Some(spec) = node.find_param(key) {
                if spec.excluded {
                    self.unmatched.push(here);
                    continue;
                }
                if value.is_null() {
                    continue;
                }
                let typed = spec.coerce_raw(value).map_err(|message| {
                    ConfigError::malformed(self.source_id, format!("{here}: {message}"))
                })?;
                if let Some(previous) = self.origins.get(&spec.path) {
                    return Err(ConfigError::malformed(
                        self.source_id,
                        format!("{previous} and {here} both set {}", spec.path),
                    ));
                }
                self.origins.insert(spec.path.clone(), here);
                self.values.insert(spec.path.clone(), typed);
            } else if let Some(child) = node.find_subcommand(key) {
                match value {
                    Raw::Object(inner) => self.walk(child, inner, &here)?,
                    Raw::Null => {}
                    other => {
                        return Err(ConfigError::malformed(
                            self.source_id,
                            format!(
                                "{here} names the {} sub-command and must be a mapping, found {}",
                                child.name,
                                kind_name(other)
                            ),
                        ))
                    }
                }
            } else {
                self.unmatched.push(here);
            }
        }
        Ok(())
    }
}

fn kind_name(raw: &Raw) -> &'static str {
    match raw {
        Raw::Null => "null",
        Raw::Bool(_) => "a boolean",
        Raw::Number(_) => "a number",
        Raw::String(_) => "a string",
        Raw::Array(_) => "a sequence",
        Raw::Object(_) => "a mapping",
    }
}
