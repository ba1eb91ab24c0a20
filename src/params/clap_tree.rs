//! Adapter between clap's command model and the declared parameter tree

use std::any::TypeId;
use std::collections::BTreeMap;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};

use super::coerce::coerce_strings;
use super::{CommandNode, Constraints, ParameterSpec, ParameterTree, IGNORED_KEYS};
use crate::domain::{ParamKind, ParamPath, ScalarKind, Value};

/// Prefix marking the negative half of a `--flag/--no-flag` pair.
const NEGATION_PREFIX: &str = "no_";

impl ParameterTree {
    /// Snapshot the parameters declared by a clap command graph.
    ///
    /// `excluded_ids` names parameters that must never be read from a
    /// configuration file, typically the option that points at the file.
    /// Help and version flags are always excluded.
    pub fn from_command(command: &Command, excluded_ids: &[&str]) -> Self {
        let mut command = command.clone();
        command.build();
        let name = command.get_name().to_string();
        Self::new(node_from_command(&command, &name, excluded_ids, &[]))
    }
}

/// `inherited` holds ids of global args declared by ancestors; clap copies
/// those into every sub-command, but they belong to the declaring command.
fn node_from_command(
    command: &Command,
    path: &str,
    excluded_ids: &[&str],
    inherited: &[String],
) -> CommandNode {
    let args: Vec<&Arg> = command
        .get_arguments()
        .filter(|arg| {
            !(arg.is_global_set() && inherited.iter().any(|id| id == arg.get_id().as_str()))
        })
        .collect();

    let mut params = Vec::new();
    for arg in &args {
        let id = arg.get_id().as_str();
        if is_negation_of_sibling(arg, &args) {
            continue;
        }

        let kind = kind_of(arg);
        let excluded = excluded_ids.contains(&id)
            || IGNORED_KEYS.contains(&id)
            || matches!(
                arg.get_action(),
                ArgAction::Help | ArgAction::HelpShort | ArgAction::HelpLong | ArgAction::Version
            );

        let defaults: Vec<String> =
            arg.get_default_values().iter().map(|v| v.to_string_lossy().into_owned()).collect();
        let default = if defaults.is_empty() {
            None
        } else {
            match coerce_strings(kind, &defaults) {
                Ok(value) => Some(value),
                Err(err) => {
                    tracing::debug!(param = id, error = %err, "ignoring uncoercible default");
                    None
                }
            }
        };

        let negated_id = format!("{NEGATION_PREFIX}{id}");
        let negation = args
            .iter()
            .any(|other| {
                other.get_id().as_str() == negated_id && is_negation_of_sibling(other, &args)
            })
            .then_some(negated_id);

        params.push(ParameterSpec {
            path: format!("{path}.{id}"),
            id: id.to_string(),
            long: arg.get_long().filter(|long| *long != id).map(str::to_string),
            kind,
            default,
            multiple: kind.is_collection() || matches!(arg.get_action(), ArgAction::Count),
            excluded,
            envvar: arg.get_env().map(|v| v.to_string_lossy().into_owned()),
            negation,
            constraints: constraints_of(arg, kind),
        });
    }

    let mut globals = inherited.to_vec();
    globals.extend(
        args.iter().filter(|arg| arg.is_global_set()).map(|arg| arg.get_id().to_string()),
    );

    let subcommands = command
        .get_subcommands()
        .filter(|sub| !IGNORED_KEYS.contains(&sub.get_name()))
        .map(|sub| {
            node_from_command(sub, &format!("{path}.{}", sub.get_name()), excluded_ids, &globals)
        })
        .collect();

    CommandNode {
        name: command.get_name().to_string(),
        aliases: command.get_all_aliases().map(str::to_string).collect(),
        path: path.to_string(),
        params,
        subcommands,
    }
}

/// A `SetFalse` flag `no_<id>` paired with a `SetTrue` flag `<id>`.
fn is_negation_of_sibling(arg: &Arg, siblings: &[&Arg]) -> bool {
    let Some(base) = arg.get_id().as_str().strip_prefix(NEGATION_PREFIX) else {
        return false;
    };
    matches!(arg.get_action(), ArgAction::SetFalse)
        && siblings.iter().any(|other| {
            other.get_id().as_str() == base && matches!(other.get_action(), ArgAction::SetTrue)
        })
}

fn kind_of(arg: &Arg) -> ParamKind {
    match arg.get_action() {
        ArgAction::SetTrue | ArgAction::SetFalse => return ParamKind::Scalar(ScalarKind::Boolean),
        ArgAction::Count => return ParamKind::Scalar(ScalarKind::Integer),
        _ => {}
    }

    let scalar = scalar_of(arg);
    let takes_many = arg.get_num_args().is_some_and(|range| range.max_values() > 1);
    if matches!(arg.get_action(), ArgAction::Append) || takes_many {
        ParamKind::List(scalar)
    } else {
        ParamKind::Scalar(scalar)
    }
}

fn scalar_of(arg: &Arg) -> ScalarKind {
    let type_id = arg.get_value_parser().type_id();
    if integer_bounds(arg).is_some() {
        ScalarKind::Integer
    } else if type_id == TypeId::of::<f64>() || type_id == TypeId::of::<f32>() {
        ScalarKind::Float
    } else if type_id == TypeId::of::<bool>() {
        ScalarKind::Boolean
    } else {
        ScalarKind::String
    }
}

/// Inclusive bounds of the integer type the arg's value parser produces.
fn integer_bounds(arg: &Arg) -> Option<(i64, i64)> {
    let type_id = arg.get_value_parser().type_id();
    let table = [
        (TypeId::of::<i8>(), i64::from(i8::MIN), i64::from(i8::MAX)),
        (TypeId::of::<i16>(), i64::from(i16::MIN), i64::from(i16::MAX)),
        (TypeId::of::<i32>(), i64::from(i32::MIN), i64::from(i32::MAX)),
        (TypeId::of::<i64>(), i64::MIN, i64::MAX),
        (
            TypeId::of::<isize>(),
            i64::try_from(isize::MIN).unwrap_or(i64::MIN),
            i64::try_from(isize::MAX).unwrap_or(i64::MAX),
        ),
        (TypeId::of::<u8>(), 0, i64::from(u8::MAX)),
        (TypeId::of::<u16>(), 0, i64::from(u16::MAX)),
        (TypeId::of::<u32>(), 0, i64::from(u32::MAX)),
        (TypeId::of::<u64>(), 0, i64::MAX),
        (TypeId::of::<usize>(), 0, i64::try_from(usize::MAX).unwrap_or(i64::MAX)),
    ];
    table.iter().find(|(id, ..)| type_id == *id).map(|&(_, min, max)| (min, max))
}

fn constraints_of(arg: &Arg, kind: ParamKind) -> Constraints {
    match kind.scalar() {
        ScalarKind::Integer if !matches!(arg.get_action(), ArgAction::Count) => {
            Constraints { range: integer_bounds(arg), ..Constraints::default() }
        }
        ScalarKind::String => Constraints {
            range: None,
            allowed: arg
                .get_possible_values()
                .iter()
                .flat_map(|value| value.get_name_and_aliases().map(str::to_string))
                .collect(),
            ignore_case: arg.is_ignore_case_set(),
        },
        _ => Constraints::default(),
    }
}

/// Values the user explicitly typed on the command line for this invocation.
///
/// Defaults filled in by clap and values clap itself read from declared
/// environment variables are not included: only `ValueSource::CommandLine`
/// counts as explicit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliValues {
    values: BTreeMap<ParamPath, Value>,
}

impl CliValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<ParamPath>, value: Value) {
        self.values.insert(path.into(), value);
    }

    pub fn with(mut self, path: impl Into<ParamPath>, value: Value) -> Self {
        self.insert(path, value);
        self
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.values.get(path)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Collect explicit values from parsed matches, descending into the
    /// invoked sub-commands.
    pub fn from_matches(tree: &ParameterTree, matches: &ArgMatches) -> Result<Self, String> {
        let mut out = Self::new();
        collect_matches(&tree.root, matches, &mut out)?;
        Ok(out)
    }
}

fn collect_matches(
    node: &CommandNode,
    matches: &ArgMatches,
    out: &mut CliValues,
) -> Result<(), String> {
    for spec in node.params.iter().filter(|spec| !spec.excluded) {
        if let Some(value) = explicit_value(spec, matches)? {
            out.insert(spec.path.clone(), value);
        }
    }

    for child in &node.subcommands {
        if let Some(sub_matches) = matches.subcommand_matches(&child.name) {
            collect_matches(child, sub_matches, out)?;
        }
    }
    Ok(())
}

fn from_command_line(matches: &ArgMatches, id: &str) -> bool {
    matches!(matches.value_source(id), Some(ValueSource::CommandLine))
}

fn explicit_value(spec: &ParameterSpec, matches: &ArgMatches) -> Result<Option<Value>, String> {
    if let Some(negation) = &spec.negation {
        let positive = from_command_line(matches, &spec.id);
        let negative = from_command_line(matches, negation);
        // Later occurrence wins when both halves of the pair were given.
        return Ok(match (positive, negative) {
            (true, true) => {
                let last_positive = matches.index_of(&spec.id);
                let last_negative = matches.index_of(negation);
                Some(Value::Boolean(last_positive > last_negative))
            }
            (true, false) => Some(Value::Boolean(true)),
            (false, true) => Some(Value::Boolean(false)),
            (false, false) => None,
        });
    }

    if !from_command_line(matches, &spec.id) {
        return Ok(None);
    }

    if spec.kind == ParamKind::Scalar(ScalarKind::Boolean) {
        if let Ok(Some(flag)) = matches.try_get_one::<bool>(&spec.id) {
            return Ok(Some(Value::Boolean(*flag)));
        }
    }
    if spec.kind == ParamKind::Scalar(ScalarKind::Integer) {
        if let Ok(Some(count)) = matches.try_get_one::<u8>(&spec.id) {
            return Ok(Some(Value::Integer(i64::from(*count))));
        }
    }

    let raw: Vec<String> = matches
        .get_raw(&spec.id)
        .map(|values| values.map(|v| v.to_string_lossy().into_owned()).collect())
        .unwrap_or_default();
    if raw.is_empty() {
        return Ok(None);
    }
    let flag = spec.long.as_deref().unwrap_or(&spec.id);
    coerce_strings(spec.kind, &raw)
        .map(Some)
        .map_err(|err| format!("invalid value for --{flag}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{value_parser, Arg};

    fn demo_command() -> Command {
        Command::new("prog")
            .arg(Arg::new("config").long("config"))
            .arg(Arg::new("flag").long("flag").action(ArgAction::SetTrue))
            .arg(Arg::new("no_flag").long("no-flag").action(ArgAction::SetFalse))
            .arg(Arg::new("verbose").short('v').action(ArgAction::Count))
            .arg(
                Arg::new("max_size")
                    .long("max-size")
                    .value_parser(value_parser!(u32))
                    .default_value("10")
                    .env("PROG_SIZE"),
            )
            .arg(Arg::new("tag").long("tag").action(ArgAction::Append))
            .subcommand(
                Command::new("serve")
                    .visible_alias("s")
                    .arg(Arg::new("ratio").long("ratio").value_parser(value_parser!(f64))),
            )
    }

    #[test]
    fn test_tree_from_command_infers_kinds() {
        let tree = ParameterTree::from_command(&demo_command(), &["config"]);

        let flag = tree.get("prog.flag").expect("flag");
        assert_eq!(flag.kind, ParamKind::Scalar(ScalarKind::Boolean));
        assert_eq!(flag.default, Some(Value::Boolean(false)));
        assert_eq!(flag.negation.as_deref(), Some("no_flag"));
        assert!(tree.get("prog.no_flag").is_none(), "negation folds into its flag");

        let size = tree.get("prog.max_size").expect("max_size");
        assert_eq!(size.kind, ParamKind::Scalar(ScalarKind::Integer));
        assert_eq!(size.default, Some(Value::Integer(10)));
        assert_eq!(size.long.as_deref(), Some("max-size"));
        assert_eq!(size.envvar.as_deref(), Some("PROG_SIZE"));

        assert_eq!(tree.get("prog.tag").expect("tag").kind, ParamKind::List(ScalarKind::String));
        assert_eq!(
            tree.get("prog.serve.ratio").expect("ratio").kind,
            ParamKind::Scalar(ScalarKind::Float)
        );
        assert!(tree.get("prog.config").expect("config").excluded);
        assert!(tree.get("prog.help").expect("help").excluded);
        assert_eq!(tree.root.subcommands[0].aliases, vec!["s".to_string()]);
    }

    #[test]
    fn test_cli_values_only_include_explicit_arguments() {
        let command = demo_command();
        let tree = ParameterTree::from_command(&command, &["config"]);
        let args = ["prog", "-vv", "--tag", "a", "--tag", "b", "s", "--ratio", "0.5"];
        let matches = command.try_get_matches_from(args).expect("parse");

        let cli = CliValues::from_matches(&tree, &matches).expect("values");
        assert_eq!(cli.get("prog.verbose"), Some(&Value::Integer(2)));
        assert_eq!(
            cli.get("prog.tag"),
            Some(&Value::List(vec![Value::String("a".into()), Value::String("b".into())]))
        );
        assert_eq!(cli.get("prog.serve.ratio"), Some(&Value::Float(0.5)));
        assert!(cli.get("prog.max_size").is_none(), "default is not explicit");
        assert!(cli.get("prog.flag").is_none());
    }

    #[test]
    fn test_negated_flag_last_occurrence_wins() {
        let command = demo_command();
        let tree = ParameterTree::from_command(&command, &["config"]);

        let matches = command.clone().try_get_matches_from(["prog", "--no-flag"]).expect("parse");
        let cli = CliValues::from_matches(&tree, &matches).expect("values");
        assert_eq!(cli.get("prog.flag"), Some(&Value::Boolean(false)));

        let matches =
            command.try_get_matches_from(["prog", "--no-flag", "--flag"]).expect("parse");
        let cli = CliValues::from_matches(&tree, &matches).expect("values");
        assert_eq!(cli.get("prog.flag"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_value_limits_carry_over_from_clap() {
        let command = Command::new("prog")
            .arg(Arg::new("port").long("port").value_parser(value_parser!(u16)))
            .arg(Arg::new("mode").long("mode").value_parser(["fast", "slow"]))
            .arg(Arg::new("verbose").short('v').action(ArgAction::Count));
        let tree = ParameterTree::from_command(&command, &[]);

        let port = tree.get("prog.port").expect("port");
        assert_eq!(port.constraints.range, Some((0, 65535)));
        assert!(port.coerce_raw(&serde_json::json!(70000)).is_err());

        let mode = tree.get("prog.mode").expect("mode");
        assert_eq!(mode.kind, ParamKind::Scalar(ScalarKind::String));
        assert_eq!(mode.constraints.allowed, vec!["fast", "slow"]);
        assert!(mode.coerce_strings(&["purple"]).is_err());

        assert_eq!(tree.get("prog.verbose").expect("verbose").constraints, Constraints::default());
    }

    #[test]
    fn test_global_args_belong_to_the_declaring_command() {
        let command = Command::new("prog")
            .arg(Arg::new("quiet").long("quiet").global(true).action(ArgAction::SetTrue))
            .subcommand(Command::new("run").arg(Arg::new("jobs").long("jobs")));
        let tree = ParameterTree::from_command(&command, &[]);

        assert!(tree.get("prog.quiet").is_some());
        assert!(tree.get("prog.run.quiet").is_none());
        assert!(tree.get("prog.run.jobs").is_some());

        let matches = command.try_get_matches_from(["prog", "run", "--quiet"]).expect("parse");
        let cli = CliValues::from_matches(&tree, &matches).expect("values");
        assert_eq!(cli.get("prog.quiet"), Some(&Value::Boolean(true)));
    }
}
