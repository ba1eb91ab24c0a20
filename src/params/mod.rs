//! Declared parameter model
//!
//! A read-only snapshot of the command graph: every command and sub-command
//! with the parameters it declares. Built once per invocation (usually from a
//! `clap::Command`, see [`clap_tree`]) and never mutated during resolution.

use serde_json::Value as Raw;

use crate::domain::{ParamKind, ParamPath, Value};

pub mod clap_tree;
pub mod coerce;

pub use clap_tree::CliValues;
pub use coerce::{check, coerce_raw, coerce_str};

/// Configuration keys that are always skipped, whatever the mode.
pub const IGNORED_KEYS: &[&str] = &["help"];

/// Restrictions the command-line parser enforces beyond the value type.
///
/// Config and environment values are held to the same limits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints {
    /// Inclusive bounds of the declared integer type.
    pub range: Option<(i64, i64)>,
    /// Accepted spellings (names and aliases); empty means anything goes.
    pub allowed: Vec<String>,
    pub ignore_case: bool,
}

/// One declared command-line parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    /// Dotted path: command, sub-commands, then `id`.
    pub path: ParamPath,
    /// Identifier used as the configuration key.
    pub id: String,
    /// Long flag name (without dashes), accepted as an alternate key spelling.
    pub long: Option<String>,
    pub kind: ParamKind,
    pub default: Option<Value>,
    /// Accepts repeated occurrence on the command line.
    pub multiple: bool,
    /// Never matched from configuration files (config path, version).
    pub excluded: bool,
    /// Environment variable explicitly declared on the parameter.
    pub envvar: Option<String>,
    /// Id of the `--no-<flag>` counterpart folded into this boolean parameter.
    pub negation: Option<String>,
    pub constraints: Constraints,
}

impl ParameterSpec {
    pub fn new(path_prefix: &str, id: &str, kind: ParamKind) -> Self {
        Self {
            path: format!("{path_prefix}.{id}"),
            id: id.to_string(),
            long: None,
            kind,
            default: None,
            multiple: kind.is_collection(),
            excluded: false,
            envvar: None,
            negation: None,
            constraints: Constraints::default(),
        }
    }

    pub fn long(mut self, long: &str) -> Self {
        self.long = Some(long.to_string());
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn excluded(mut self, excluded: bool) -> Self {
        self.excluded = excluded;
        self
    }

    pub fn envvar(mut self, name: &str) -> Self {
        self.envvar = Some(name.to_string());
        self
    }

    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.constraints.range = Some((min, max));
        self
    }

    pub fn allowed(mut self, names: &[&str]) -> Self {
        self.constraints.allowed = names.iter().map(|name| name.to_string()).collect();
        self
    }

    /// Coerce a configuration leaf and hold it to the declared restrictions.
    pub fn coerce_raw(&self, raw: &Raw) -> Result<Value, String> {
        coerce::coerce_raw(self.kind, raw).and_then(|value| check(&self.constraints, value))
    }

    /// Coerce command-line style strings and hold them to the declared restrictions.
    pub fn coerce_strings<S: AsRef<str>>(&self, inputs: &[S]) -> Result<Value, String> {
        coerce::coerce_strings(self.kind, inputs).and_then(|value| check(&self.constraints, value))
    }

    /// True when `key` names this parameter, either by id or by long flag.
    pub fn matches_key(&self, key: &str) -> bool {
        self.id == key || self.long.as_deref() == Some(key)
    }
}

/// A command (or sub-command) node of the declared tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandNode {
    pub name: String,
    pub aliases: Vec<String>,
    /// Dotted path of this command (`prog`, `prog.sub`).
    pub path: ParamPath,
    pub params: Vec<ParameterSpec>,
    pub subcommands: Vec<CommandNode>,
}

impl CommandNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            path: name.to_string(),
            params: Vec::new(),
            subcommands: Vec::new(),
        }
    }

    /// Add a parameter whose path is rooted at this node.
    pub fn param(mut self, id: &str, kind: ParamKind) -> Self {
        self.params.push(ParameterSpec::new(&self.path, id, kind));
        self
    }

    /// Add a fully configured parameter; its path is re-rooted at this node.
    pub fn with_param(mut self, mut spec: ParameterSpec) -> Self {
        spec.path = format!("{}.{}", self.path, spec.id);
        self.params.push(spec);
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Attach a sub-command, re-rooting its paths under this node.
    pub fn subcommand(mut self, mut child: CommandNode) -> Self {
        child.reroot(&self.path);
        self.subcommands.push(child);
        self
    }

    fn reroot(&mut self, parent: &str) {
        self.path = format!("{parent}.{}", self.name);
        for spec in &mut self.params {
            spec.path = format!("{}.{}", self.path, spec.id);
        }
        let path = self.path.clone();
        for child in &mut self.subcommands {
            child.reroot(&path);
        }
    }

    pub fn find_param(&self, key: &str) -> Option<&ParameterSpec> {
        self.params.iter().find(|spec| spec.matches_key(key))
    }

    pub fn find_subcommand(&self, key: &str) -> Option<&CommandNode> {
        self.subcommands
            .iter()
            .find(|child| child.name == key || child.aliases.iter().any(|a| a == key))
    }
}

/// The whole declared parameter tree for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTree {
    pub root: CommandNode,
}

impl ParameterTree {
    pub fn new(root: CommandNode) -> Self {
        Self { root }
    }

    /// Name of the top-level command.
    pub fn program(&self) -> &str {
        &self.root.name
    }

    /// Every parameter in declaration order, parents before children.
    pub fn specs(&self) -> Vec<&ParameterSpec> {
        let mut out = Vec::new();
        collect_specs(&self.root, &mut out);
        out
    }

    pub fn get(&self, path: &str) -> Option<&ParameterSpec> {
        self.specs().into_iter().find(|spec| spec.path == path)
    }
}

fn collect_specs<'a>(node: &'a CommandNode, out: &mut Vec<&'a ParameterSpec>) {
    out.extend(node.params.iter());
    for child in &node.subcommands {
        collect_specs(child, out);
    }
}
