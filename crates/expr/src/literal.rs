//! Literal-only evaluation of argument nodes.

use serde_json::{Number, Value};

use crate::ast::{Constant, Expr};
use crate::{Error, Result};

/// Evaluate an argument node that must consist solely of literals.
///
/// Accepts `None`, booleans, numbers (with an optional unary sign),
/// strings, and lists, tuples, sets and dicts built from those. Tuples and
/// sets become arrays; dict keys are stringified the way a JSON encoder
/// does. Anything else fails with [`Error::Literal`].
pub fn literal_value(expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Constant(constant) => constant_value(constant, false),
        Expr::Unary { op, operand } if *op == "-" || *op == "+" => match operand.as_ref() {
            Expr::Constant(constant @ (Constant::Int { .. } | Constant::Float(_))) => {
                constant_value(constant, *op == "-")
            }
            other => Err(Error::Literal(format!(
                "sign applied to {}",
                other.describe()
            ))),
        },
        Expr::List(items) | Expr::Tuple(items) => items
            .iter()
            .map(literal_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Expr::Set(items) => {
            let mut values: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                if !is_hashable(item) {
                    return Err(Error::Literal(format!(
                        "unhashable set element: {}",
                        item.describe()
                    )));
                }
                let value = literal_value(item)?;
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            Ok(Value::Array(values))
        }
        Expr::Dict(entries) => {
            let mut map = serde_json::Map::with_capacity(entries.len());
            for (key, value) in entries {
                map.insert(object_key(key)?, literal_value(value)?);
            }
            Ok(Value::Object(map))
        }
        other => Err(Error::Literal(format!("{} is not a literal", other.describe()))),
    }
}

/// Lists, sets and dicts are unhashable; tuples are when their elements are.
fn is_hashable(expr: &Expr) -> bool {
    match expr {
        Expr::List(_) | Expr::Set(_) | Expr::Dict(_) => false,
        Expr::Tuple(items) => items.iter().all(is_hashable),
        _ => true,
    }
}

fn constant_value(constant: &Constant, negate: bool) -> Result<Value> {
    match constant {
        Constant::None => Ok(Value::Null),
        Constant::Bool(b) => Ok(Value::Bool(*b)),
        Constant::Str(s) => Ok(Value::String(s.clone())),
        Constant::Int { digits, radix } => {
            let out_of_range = || Error::Literal(format!("integer literal out of range: {digits}"));
            let magnitude = i128::from_str_radix(digits, *radix).map_err(|_| out_of_range())?;
            let n = if negate { -magnitude } else { magnitude };
            if let Ok(n) = i64::try_from(n) {
                Ok(Value::from(n))
            } else if let Ok(n) = u64::try_from(n) {
                Ok(Value::from(n))
            } else {
                Err(out_of_range())
            }
        }
        Constant::Float(text) => {
            let magnitude: f64 = text
                .parse()
                .map_err(|_| Error::Literal(format!("invalid float literal: {text}")))?;
            let n = if negate { -magnitude } else { magnitude };
            Number::from_f64(n)
                .map(Value::Number)
                .ok_or_else(|| Error::Literal(format!("float literal out of range: {text}")))
        }
    }
}

fn object_key(key: &Expr) -> Result<String> {
    match literal_value(key)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Array(_) | Value::Object(_) => Err(Error::Literal("unhashable dict key".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_expression;
    use serde_json::json;

    fn eval(source: &str) -> Result<Value> {
        literal_value(&parse_expression(source).unwrap())
    }

    #[test]
    fn scalars() {
        assert_eq!(eval("None").unwrap(), Value::Null);
        assert_eq!(eval("True").unwrap(), json!(true));
        assert_eq!(eval("12").unwrap(), json!(12));
        assert_eq!(eval("-12").unwrap(), json!(-12));
        assert_eq!(eval("+1.5").unwrap(), json!(1.5));
        assert_eq!(eval("0xff").unwrap(), json!(255));
        assert_eq!(eval("'a' \"b\"").unwrap(), json!("ab"));
    }

    #[test]
    fn large_integers() {
        assert_eq!(eval("18446744073709551615").unwrap(), json!(u64::MAX));
        assert_eq!(eval("-9223372036854775808").unwrap(), json!(i64::MIN));
        assert!(matches!(
            eval("18446744073709551616"),
            Err(Error::Literal(_))
        ));
    }

    #[test]
    fn non_finite_float_is_rejected() {
        assert!(matches!(eval("1e999"), Err(Error::Literal(_))));
    }

    #[test]
    fn containers() {
        assert_eq!(
            eval("[1, (2, 'x'), {'k': None, 3: False}]").unwrap(),
            json!([1, [2, "x"], {"k": null, "3": false}])
        );
        assert_eq!(eval("{1, 2, 1}").unwrap(), json!([1, 2]));
    }

    #[test]
    fn tuples_are_hashable_set_elements() {
        assert_eq!(eval("{(1, 2)}").unwrap(), json!([[1, 2]]));
        assert_eq!(
            eval("{(1, 2), 3, (1, 2), ('a', (None,))}").unwrap(),
            json!([[1, 2], 3, ["a", [null]]])
        );
    }

    #[test]
    fn dict_keeps_source_order() {
        let value = eval("{'b': 1, 'a': 2}").unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn rejects_non_literals() {
        for source in [
            "x",
            "g(1)",
            "os.path",
            "1 + 2",
            "--1",
            "-x",
            "not True",
            "[1, y]",
            "{'a': f()}",
            "{[1]: 2}",
            "{[1]}",
            "{(1, [2])}",
            "{1, {2}}",
            "{{'k': 1}}",
            "a[0]",
        ] {
            assert!(
                matches!(eval(source), Err(Error::Literal(_))),
                "{source} should be rejected"
            );
        }
    }

    #[test]
    fn evaluation_is_repeatable() {
        let expr = parse_expression("{'a': [1, 2.5, 'three']}").unwrap();
        assert_eq!(literal_value(&expr).unwrap(), literal_value(&expr).unwrap());
    }
}
