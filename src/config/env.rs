//! Environment variable mapping
//!
//! Every parameter gets a derived name `PROG_SUB_PARAM`. A variable declared
//! on the parameter itself is consulted first. Values are read from an
//! [`EnvSnapshot`]; the process environment is never written.

use std::collections::BTreeMap;

use crate::domain::{NormalizedConfig, ParamKind, ParamPath};
use crate::error::{ConfigError, ConfigResult};
use crate::params::coerce::{check, coerce_strings};
use crate::params::{Constraints, ParameterTree};

/// Environment variable name derived from a dotted parameter path.
///
/// Segments are joined with `_`, upper-cased, and any character that is not
/// ASCII alphanumeric becomes `_`.
pub fn derive_name(path: &str) -> String {
    path.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

/// Candidate variable names for one parameter, in lookup order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvBinding {
    pub path: ParamPath,
    pub kind: ParamKind,
    pub constraints: Constraints,
    pub candidates: Vec<String>,
}

impl EnvBinding {
    pub fn derived(&self) -> &str {
        self.candidates.last().map(String::as_str).unwrap_or_default()
    }
}

/// Name table for every non-excluded parameter of a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVarMap {
    bindings: Vec<EnvBinding>,
}

impl EnvVarMap {
    /// Build the table, rejecting any variable name (declared or derived)
    /// that two parameters would read.
    pub fn build(tree: &ParameterTree) -> ConfigResult<Self> {
        let mut seen: BTreeMap<String, ParamPath> = BTreeMap::new();
        let mut bindings = Vec::new();

        for spec in tree.specs().into_iter().filter(|spec| !spec.excluded) {
            let derived = derive_name(&spec.path);
            let mut candidates = Vec::with_capacity(2);
            if let Some(explicit) = spec.envvar.as_ref().filter(|name| **name != derived) {
                candidates.push(explicit.clone());
            }
            candidates.push(derived);

            for name in &candidates {
                if let Some(first) = seen.get(name) {
                    return Err(ConfigError::DuplicateEnvVarName {
                        name: name.clone(),
                        first: first.clone(),
                        second: spec.path.clone(),
                    });
                }
                seen.insert(name.clone(), spec.path.clone());
            }

            bindings.push(EnvBinding {
                path: spec.path.clone(),
                kind: spec.kind,
                constraints: spec.constraints.clone(),
                candidates,
            });
        }
        Ok(Self { bindings })
    }

    pub fn bindings(&self) -> &[EnvBinding] {
        &self.bindings
    }

    pub fn get(&self, path: &str) -> Option<&EnvBinding> {
        self.bindings.iter().find(|binding| binding.path == path)
    }

    /// Typed values for every parameter with a non-empty variable in `snapshot`.
    ///
    /// Collection parameters split the value on whitespace.
    pub fn values(&self, snapshot: &EnvSnapshot) -> ConfigResult<NormalizedConfig> {
        let mut out = NormalizedConfig::new();
        for binding in &self.bindings {
            let found = binding
                .candidates
                .iter()
                .find_map(|name| snapshot.get(name).filter(|v| !v.is_empty()).map(|v| (name, v)));
            let Some((name, raw)) = found else {
                continue;
            };

            let parts: Vec<&str> = if binding.kind.is_collection() {
                raw.split_whitespace().collect()
            } else {
                vec![raw]
            };
            let value = coerce_strings(binding.kind, &parts)
                .and_then(|value| check(&binding.constraints, value))
                .map_err(|message| {
                    ConfigError::malformed(
                        &format!("env:{name}"),
                        format!("{}: {message}", binding.path),
                    )
                })?;

            tracing::debug!(var = %name, path = %binding.path, "using environment variable");
            out.insert(binding.path.clone(), value);
        }
        Ok(out)
    }
}

/// Read-only copy of the environment taken once per resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Copy the current process environment. Variables that are not valid
    /// Unicode are skipped.
    pub fn capture() -> Self {
        std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// Convenience for callers that only need the typed values.
pub fn env_values(tree: &ParameterTree, snapshot: &EnvSnapshot) -> ConfigResult<NormalizedConfig> {
    EnvVarMap::build(tree)?.values(snapshot)
}
