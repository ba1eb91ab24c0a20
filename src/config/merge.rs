//! Precedence merge: cli > config > envvar > default

use crate::domain::{NormalizedConfig, Provenance, ResolvedValue, ResolvedValues};
use crate::params::{CliValues, ParameterTree};

/// Resolve every non-excluded parameter of `tree` from the four tiers.
///
/// Pure: no I/O and no logging; the same inputs always give the same output.
pub fn merge(
    tree: &ParameterTree,
    cli: &CliValues,
    config: &NormalizedConfig,
    env: &NormalizedConfig,
) -> ResolvedValues {
    tree.specs()
        .into_iter()
        .filter(|spec| !spec.excluded)
        .map(|spec| {
            let path = spec.path.as_str();
            let resolved = if let Some(value) = cli.get(path) {
                ResolvedValue { value: Some(value.clone()), provenance: Provenance::Cli }
            } else if let Some(value) = config.get(path) {
                ResolvedValue { value: Some(value.clone()), provenance: Provenance::Config }
            } else if let Some(value) = env.get(path) {
                ResolvedValue { value: Some(value.clone()), provenance: Provenance::EnvVar }
            } else {
                ResolvedValue { value: spec.default.clone(), provenance: Provenance::Default }
            };
            (spec.path.clone(), resolved)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ParamKind, ScalarKind, Value};
    use crate::params::{CommandNode, ParameterSpec};

    fn tree() -> ParameterTree {
        ParameterTree::new(
            CommandNode::new("prog")
                .with_param(
                    ParameterSpec::new("prog", "level", ParamKind::Scalar(ScalarKind::Integer))
                        .default_value(Value::Integer(0)),
                )
                .param("name", ParamKind::Scalar(ScalarKind::String))
                .with_param(
                    ParameterSpec::new("prog", "config", ParamKind::Scalar(ScalarKind::String))
                        .excluded(true),
                ),
        )
    }

    fn config(level: i64) -> NormalizedConfig {
        NormalizedConfig::from([("prog.level".to_string(), Value::Integer(level))])
    }

    #[test]
    fn test_precedence_ladder() {
        let tree = tree();
        let cli = CliValues::new().with("prog.level", Value::Integer(1));
        let none = NormalizedConfig::new();

        let all = merge(&tree, &cli, &config(2), &config(3));
        assert_eq!(all["prog.level"].value, Some(Value::Integer(1)));
        assert_eq!(all["prog.level"].provenance, Provenance::Cli);

        let no_cli = merge(&tree, &CliValues::new(), &config(2), &config(3));
        assert_eq!(no_cli["prog.level"].value, Some(Value::Integer(2)));
        assert_eq!(no_cli["prog.level"].provenance, Provenance::Config);

        let env_only = merge(&tree, &CliValues::new(), &none, &config(3));
        assert_eq!(env_only["prog.level"].value, Some(Value::Integer(3)));
        assert_eq!(env_only["prog.level"].provenance, Provenance::EnvVar);

        let nothing = merge(&tree, &CliValues::new(), &none, &none);
        assert_eq!(nothing["prog.level"].value, Some(Value::Integer(0)));
        assert_eq!(nothing["prog.level"].provenance, Provenance::Default);
    }

    #[test]
    fn test_unset_without_default_and_excluded_params() {
        let empty = NormalizedConfig::new();
        let merged = merge(&tree(), &CliValues::new(), &empty, &empty);
        assert_eq!(
            merged["prog.name"],
            ResolvedValue { value: None, provenance: Provenance::Default }
        );
        assert!(!merged.contains_key("prog.config"));
    }
}
