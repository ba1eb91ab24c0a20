//! Core value types shared by the parameter model, normalizer and merger

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Dotted parameter path: `prog.sub.option`.
pub type ParamPath = String;

/// Scalar type a parameter expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Integer,
    Float,
    Boolean,
}

/// Semantic type of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "shape", content = "item")]
pub enum ParamKind {
    Scalar(ScalarKind),
    /// Ordered collection; duplicates kept.
    List(ScalarKind),
    /// Unordered collection; duplicates dropped, first occurrence order kept.
    Set(ScalarKind),
}

impl ParamKind {
    pub fn scalar(&self) -> ScalarKind {
        match self {
            ParamKind::Scalar(kind) | ParamKind::List(kind) | ParamKind::Set(kind) => *kind,
        }
    }

    pub fn is_collection(&self) -> bool {
        !matches!(self, ParamKind::Scalar(_))
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Scalar(kind) => write!(f, "{kind}"),
            ParamKind::List(kind) => write!(f, "list<{kind}>"),
            ParamKind::Set(kind) => write!(f, "set<{kind}>"),
        }
    }
}

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    List(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// Which tier supplied a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Cli,
    Config,
    EnvVar,
    Default,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provenance::Cli => "cli",
            Provenance::Config => "config",
            Provenance::EnvVar => "envvar",
            Provenance::Default => "default",
        };
        f.write_str(name)
    }
}

/// Final value of one parameter with the tier it came from.
///
/// `value` is `None` only when the parameter has no default and no tier
/// supplied anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedValue {
    pub value: Option<Value>,
    pub provenance: Provenance,
}

/// Resolved value per parameter path.
pub type ResolvedValues = BTreeMap<ParamPath, ResolvedValue>;

/// Typed configuration-file values keyed by parameter path.
pub type NormalizedConfig = BTreeMap<ParamPath, Value>;
