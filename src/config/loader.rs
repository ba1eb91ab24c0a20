//! Resolution pipeline
//!
//! Locate a source, parse it, filter it against the parameter tree, read the
//! environment snapshot and merge everything with precedence
//! CLI > config file > environment > defaults.

use serde::Serialize;

use super::env::{EnvSnapshot, EnvVarMap};
use super::locate::{Fetcher, FsFetcher, LoadedSource, SearchRules, SourceLocator};
use super::merge::merge;
use super::normalize::{normalize, Normalized};
use crate::domain::ResolvedValues;
use crate::error::ConfigResult;
use crate::formats::{self, Format};
use crate::params::{CliValues, ParameterTree};

/// Outcome of one resolution pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub values: ResolvedValues,
    /// Identity of the configuration source that was read, if any.
    pub source: Option<String>,
    pub format: Option<Format>,
    /// Keys dropped in lenient mode.
    pub unmatched: Vec<String>,
}

/// Configuration file contents after parsing and filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedConfig {
    pub source: Option<String>,
    pub format: Option<Format>,
    pub normalized: Normalized,
}

/// Builder for a resolution pass over one parameter tree.
pub struct Resolver<'a> {
    tree: &'a ParameterTree,
    rules: SearchRules,
    strict: bool,
    no_config: bool,
    format: Option<Format>,
    fetcher: Box<dyn Fetcher + 'a>,
}

impl<'a> Resolver<'a> {
    pub fn new(tree: &'a ParameterTree) -> Self {
        Self {
            tree,
            rules: SearchRules::default(),
            strict: false,
            no_config: false,
            format: None,
            fetcher: Box::new(FsFetcher),
        }
    }

    pub fn search_rules(mut self, rules: SearchRules) -> Self {
        self.rules = rules;
        self
    }

    /// Path or URL that must be read.
    pub fn explicit(mut self, source: Option<String>) -> Self {
        self.rules.explicit = source;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Skip configuration files entirely.
    pub fn no_config(mut self, no_config: bool) -> Self {
        self.no_config = no_config;
        self
    }

    /// Force a parser instead of going by extension or sniffing.
    pub fn format(mut self, format: Option<Format>) -> Self {
        self.format = format;
        self
    }

    pub fn fetcher(mut self, fetcher: impl Fetcher + 'a) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    pub fn tree(&self) -> &ParameterTree {
        self.tree
    }

    pub fn locator(&self) -> SourceLocator<'_> {
        SourceLocator::new(self.tree.program(), &self.rules, self.fetcher.as_ref())
    }

    /// Locate, parse and filter the configuration source.
    ///
    /// A missing default source yields an empty [`LoadedConfig`].
    pub fn load_config(&self) -> ConfigResult<LoadedConfig> {
        if self.no_config {
            tracing::debug!("configuration files disabled");
            return Ok(LoadedConfig::default());
        }
        let Some(LoadedSource { identity, content, format }) = self.locator().locate()? else {
            return Ok(LoadedConfig::default());
        };

        let (format, raw) = match self.format.or(format) {
            Some(format) => (format, format.parse(&content, &identity)?),
            None => formats::sniff(&content, &identity)?,
        };
        let normalized = normalize(&raw, self.tree, self.strict, &identity)?;
        tracing::info!(
            source = %identity,
            format = %format,
            values = normalized.values.len(),
            dropped = normalized.unmatched.len(),
            "loaded configuration"
        );
        Ok(LoadedConfig { source: Some(identity), format: Some(format), normalized })
    }

    /// Run the whole pipeline against explicit CLI values and an environment snapshot.
    pub fn resolve(&self, cli: &CliValues, env: &EnvSnapshot) -> ConfigResult<Resolution> {
        let env_map = EnvVarMap::build(self.tree)?;
        let loaded = self.load_config()?;
        let env_values = env_map.values(env)?;
        let values = merge(self.tree, cli, &loaded.normalized.values, &env_values);
        Ok(Resolution {
            values,
            source: loaded.source,
            format: loaded.format,
            unmatched: loaded.normalized.unmatched,
        })
    }
}
