//! Value coercion
//!
//! The same rules apply to command-line strings, environment variables and
//! configuration leaves, so that `"3"` in a file behaves exactly like `3` on
//! the command line.

use super::Constraints;
use crate::domain::{ParamKind, ScalarKind, Value};
use serde_json::Value as Raw;

const TRUE_WORDS: &[&str] = &["1", "true", "t", "yes", "y", "on"];
const FALSE_WORDS: &[&str] = &["0", "false", "f", "no", "n", "off"];

/// Coerce one command-line style string into a scalar of `kind`.
pub fn coerce_str(kind: ScalarKind, input: &str) -> Result<Value, String> {
    match kind {
        ScalarKind::String => Ok(Value::String(input.to_string())),
        ScalarKind::Integer => input
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| format!("{input:?} is not a valid integer")),
        ScalarKind::Float => input
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("{input:?} is not a valid float")),
        ScalarKind::Boolean => {
            let lowered = input.trim().to_ascii_lowercase();
            if TRUE_WORDS.contains(&lowered.as_str()) {
                Ok(Value::Boolean(true))
            } else if FALSE_WORDS.contains(&lowered.as_str()) {
                Ok(Value::Boolean(false))
            } else {
                Err(format!("{input:?} is not a valid boolean"))
            }
        }
    }
}

/// Coerce a sequence of strings (repeated flags, split env values) into `kind`.
pub fn coerce_strings<S: AsRef<str>>(kind: ParamKind, inputs: &[S]) -> Result<Value, String> {
    match kind {
        ParamKind::Scalar(scalar) => match inputs {
            [] => Err("expected a value".to_string()),
            // Repeated scalar options keep the last occurrence.
            [.., last] => coerce_str(scalar, last.as_ref()),
        },
        ParamKind::List(scalar) | ParamKind::Set(scalar) => {
            let items = inputs
                .iter()
                .map(|s| coerce_str(scalar, s.as_ref()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(finish_collection(kind, items))
        }
    }
}

/// Coerce a raw configuration leaf into `kind`.
///
/// Already-typed leaves are accepted when they fit; a scalar where a
/// collection is expected becomes a one-element list.
pub fn coerce_raw(kind: ParamKind, raw: &Raw) -> Result<Value, String> {
    match kind {
        ParamKind::Scalar(scalar) => match raw {
            Raw::Array(_) => Err(format!("expected a single {scalar}, found a list")),
            Raw::Object(_) => Err(format!("expected a single {scalar}, found a section")),
            leaf => coerce_leaf(scalar, leaf),
        },
        ParamKind::List(scalar) | ParamKind::Set(scalar) => {
            let items = match raw {
                Raw::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Raw::Array(_) | Raw::Object(_) => {
                            Err(format!("expected {scalar} items, found a nested container"))
                        }
                        leaf => coerce_leaf(scalar, leaf),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                Raw::Object(_) => {
                    return Err(format!("expected a list of {scalar}, found a section"))
                }
                leaf => vec![coerce_leaf(scalar, leaf)?],
            };
            Ok(finish_collection(kind, items))
        }
    }
}

fn coerce_leaf(kind: ScalarKind, leaf: &Raw) -> Result<Value, String> {
    match (kind, leaf) {
        (_, Raw::String(s)) => coerce_str(kind, s),
        (ScalarKind::String, Raw::Number(n)) => Ok(Value::String(n.to_string())),
        (ScalarKind::String, Raw::Bool(b)) => Ok(Value::String(b.to_string())),
        (ScalarKind::Integer, Raw::Number(n)) => n
            .as_i64()
            .map(Value::Integer)
            .ok_or_else(|| format!("{n} is not a valid integer")),
        (ScalarKind::Float, Raw::Number(n)) => n
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| format!("{n} is not a valid float")),
        (ScalarKind::Boolean, Raw::Bool(b)) => Ok(Value::Boolean(*b)),
        (ScalarKind::Boolean, Raw::Number(n)) => match n.as_i64() {
            Some(1) => Ok(Value::Boolean(true)),
            Some(0) => Ok(Value::Boolean(false)),
            _ => Err(format!("{n} is not a valid boolean")),
        },
        (_, Raw::Null) => Err(format!("expected a {kind}, found null")),
        (_, other) => Err(format!("{other} is not a valid {kind}")),
    }
}

/// Hold a coerced value (or every item of a collection) to `constraints`.
pub fn check(constraints: &Constraints, value: Value) -> Result<Value, String> {
    match &value {
        Value::List(items) => items.iter().try_for_each(|item| check_scalar(constraints, item))?,
        scalar => check_scalar(constraints, scalar)?,
    }
    Ok(value)
}

fn check_scalar(constraints: &Constraints, value: &Value) -> Result<(), String> {
    match value {
        Value::Integer(n) => match constraints.range {
            Some((min, max)) if !(min..=max).contains(n) => {
                Err(format!("{n} is not in {min}..={max}"))
            }
            _ => Ok(()),
        },
        Value::String(text) if !constraints.allowed.is_empty() => {
            let accepted = constraints.allowed.iter().any(|name| {
                if constraints.ignore_case {
                    name.eq_ignore_ascii_case(text)
                } else {
                    name == text
                }
            });
            if accepted {
                Ok(())
            } else {
                Err(format!("{text:?} is not one of: {}", constraints.allowed.join(", ")))
            }
        }
        _ => Ok(()),
    }
}

fn finish_collection(kind: ParamKind, items: Vec<Value>) -> Value {
    if matches!(kind, ParamKind::Set(_)) {
        let mut unique: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Value::List(unique)
    } else {
        Value::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bool_words_are_case_insensitive() {
        assert_eq!(coerce_str(ScalarKind::Boolean, "YES"), Ok(Value::Boolean(true)));
        assert_eq!(coerce_str(ScalarKind::Boolean, " off "), Ok(Value::Boolean(false)));
        assert!(coerce_str(ScalarKind::Boolean, "maybe").is_err());
    }

    #[test]
    fn test_config_string_matches_command_line_string() {
        let from_file = coerce_raw(ParamKind::Scalar(ScalarKind::Integer), &json!("3")).unwrap();
        let from_cli = coerce_str(ScalarKind::Integer, "3").unwrap();
        assert_eq!(from_file, from_cli);
    }

    #[test]
    fn test_typed_leaves_accepted_without_reparsing() {
        assert_eq!(
            coerce_raw(ParamKind::Scalar(ScalarKind::Boolean), &json!(true)),
            Ok(Value::Boolean(true))
        );
        assert_eq!(
            coerce_raw(ParamKind::Scalar(ScalarKind::Float), &json!(2)),
            Ok(Value::Float(2.0))
        );
        assert_eq!(
            coerce_raw(ParamKind::Scalar(ScalarKind::String), &json!(1.5)),
            Ok(Value::String("1.5".to_string()))
        );
        assert!(coerce_raw(ParamKind::Scalar(ScalarKind::Integer), &json!(1.5)).is_err());
    }

    #[test]
    fn test_scalar_wrapped_for_collections() {
        assert_eq!(
            coerce_raw(ParamKind::List(ScalarKind::String), &json!("a")),
            Ok(Value::List(vec![Value::String("a".to_string())]))
        );
    }

    #[test]
    fn test_sequence_rejected_for_scalar() {
        let err = coerce_raw(ParamKind::Scalar(ScalarKind::String), &json!(["a", "b"]));
        assert!(err.unwrap_err().contains("found a list"));
    }

    #[test]
    fn test_set_deduplicates_in_first_seen_order() {
        let value =
            coerce_raw(ParamKind::Set(ScalarKind::Integer), &json!([3, "1", 3, 1])).unwrap();
        assert_eq!(value, Value::List(vec![Value::Integer(3), Value::Integer(1)]));
    }

    #[test]
    fn test_out_of_range_integer_is_rejected() {
        let constraints = Constraints { range: Some((0, 65535)), ..Constraints::default() };
        assert_eq!(check(&constraints, Value::Integer(443)), Ok(Value::Integer(443)));
        let err = check(&constraints, Value::Integer(70000)).unwrap_err();
        assert_eq!(err, "70000 is not in 0..=65535");
        let mixed = Value::List(vec![Value::Integer(1), Value::Integer(-5)]);
        assert!(check(&constraints, mixed).is_err());
    }

    #[test]
    fn test_unknown_allowed_value_is_rejected() {
        let constraints = Constraints {
            allowed: vec!["fast".to_string(), "slow".to_string()],
            ..Constraints::default()
        };
        assert!(check(&constraints, Value::String("fast".into())).is_ok());
        assert!(check(&constraints, Value::String("FAST".into())).is_err());
        let err = check(&constraints, Value::String("purple".into())).unwrap_err();
        assert!(err.contains("fast, slow"), "{err}");

        let relaxed = Constraints { ignore_case: true, ..constraints };
        assert!(check(&relaxed, Value::String("FAST".into())).is_ok());
    }

    #[test]
    fn test_repeated_scalar_strings_keep_last() {
        let value = coerce_strings(ParamKind::Scalar(ScalarKind::Integer), &["1", "2"]).unwrap();
        assert_eq!(value, Value::Integer(2));
    }
}
