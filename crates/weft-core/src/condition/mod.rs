//! Run-condition expressions.
//!
//! Conditions are small boolean expressions evaluated over the results
//! accumulated so far, deciding whether a step runs or is skipped. The
//! language is a deliberately closed whitelist - no host capabilities, no
//! arbitrary name resolution:
//!
//! - boolean connectives `&&`, `||`, `!` and parentheses
//! - comparisons `==`, `!=`, `<`, `<=`, `>`, `>=`
//! - literals: double- or single-quoted strings, numbers, `true`,
//!   `false`, `null`
//! - dotted field access rooted at `results`
//!   (e.g. `results.fetch_data.status`)
//! - helpers: `len(x)`, `exists(x)`, `is_string(x)`, `is_number(x)`,
//!   `is_bool(x)`
//!
//! Missing path segments resolve to `null`; `len(null)` is `0`. A bare
//! non-boolean value is coerced by truthiness (empty strings, empty
//! collections, `0` and `null` are false).
//!
//! ```
//! use weft_core::condition::Condition;
//!
//! let condition = Condition::parse(
//!     "results.validate.status == \"success\" && len(results.validate.items) > 0",
//! ).unwrap();
//! ```

mod parser;

use serde_json::{Map, Value};
use thiserror::Error;

/// Condition parse or evaluation failure.
///
/// The engine treats any of these as "condition is false": the step is
/// skipped, logged, and the execution continues.
#[derive(Debug, Error)]
pub enum ConditionError {
    /// The expression did not match the grammar.
    #[error("Invalid condition expression: {0}")]
    Parse(String),

    /// A path was rooted at something other than `results`.
    #[error("Unknown identifier '{0}' (conditions may only reference 'results')")]
    UnknownIdentifier(String),

    /// A call named a function outside the whitelist.
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    /// An ordering comparison was applied to non-numeric operands.
    #[error("Operator '{op}' cannot compare {left} and {right}")]
    NotComparable {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    /// A helper received an argument of the wrong type.
    #[error("{func}() expects a {expected}, got {got}")]
    BadArgument {
        func: &'static str,
        expected: &'static str,
        got: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Literal {
    fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::from(*n),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Literal),
    /// Dotted access path; the first segment is the root identifier.
    Path(Vec<String>),
    Not(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        func: String,
        arg: Box<Expr>,
    },
}

impl Expr {
    pub(crate) fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// A parsed run condition.
#[derive(Debug, Clone)]
pub struct Condition {
    expr: Expr,
    source: String,
}

impl Condition {
    /// Parse an expression string.
    pub fn parse(source: &str) -> Result<Self, ConditionError> {
        let expr = parser::parse(source).map_err(ConditionError::Parse)?;
        Ok(Self {
            expr,
            source: source.to_string(),
        })
    }

    /// The original expression text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against the accumulated results map.
    pub fn evaluate(&self, results: &Map<String, Value>) -> Result<bool, ConditionError> {
        let value = eval(&self.expr, results)?;
        Ok(truthy(&value))
    }
}

fn eval(expr: &Expr, results: &Map<String, Value>) -> Result<Value, ConditionError> {
    match expr {
        Expr::Literal(literal) => Ok(literal.to_value()),
        Expr::Path(segments) => resolve(segments, results),
        Expr::Not(inner) => Ok(Value::Bool(!truthy(&eval(inner, results)?))),
        Expr::Binary { op, left, right } => eval_binary(*op, left, right, results),
        Expr::Call { func, arg } => eval_call(func, arg, results),
    }
}

fn resolve(segments: &[String], results: &Map<String, Value>) -> Result<Value, ConditionError> {
    let Some((root, rest)) = segments.split_first() else {
        return Ok(Value::Null);
    };
    if root != "results" {
        return Err(ConditionError::UnknownIdentifier(root.clone()));
    }
    let Some((first, rest)) = rest.split_first() else {
        return Ok(Value::Object(results.clone()));
    };

    let mut current = results.get(first);
    for segment in rest {
        current = current.and_then(|value| value.get(segment));
    }
    Ok(current.cloned().unwrap_or(Value::Null))
}

fn eval_binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    results: &Map<String, Value>,
) -> Result<Value, ConditionError> {
    match op {
        BinaryOp::And => {
            if !truthy(&eval(left, results)?) {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(truthy(&eval(right, results)?)))
        }
        BinaryOp::Or => {
            if truthy(&eval(left, results)?) {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(truthy(&eval(right, results)?)))
        }
        BinaryOp::Eq => Ok(Value::Bool(loose_eq(
            &eval(left, results)?,
            &eval(right, results)?,
        ))),
        BinaryOp::Ne => Ok(Value::Bool(!loose_eq(
            &eval(left, results)?,
            &eval(right, results)?,
        ))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let left = eval(left, results)?;
            let right = eval(right, results)?;
            match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => Ok(Value::Bool(match op {
                    BinaryOp::Lt => a < b,
                    BinaryOp::Le => a <= b,
                    BinaryOp::Gt => a > b,
                    _ => a >= b,
                })),
                _ => Err(ConditionError::NotComparable {
                    op: op.symbol(),
                    left: type_name(&left),
                    right: type_name(&right),
                }),
            }
        }
    }
}

/// Equality with numeric normalization, so `1 == 1.0` holds across
/// integer and float result values.
fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn eval_call(func: &str, arg: &Expr, results: &Map<String, Value>) -> Result<Value, ConditionError> {
    let value = eval(arg, results)?;
    match func {
        "len" => match &value {
            Value::String(s) => Ok(Value::from(s.chars().count() as u64)),
            Value::Array(items) => Ok(Value::from(items.len() as u64)),
            Value::Object(map) => Ok(Value::from(map.len() as u64)),
            Value::Null => Ok(Value::from(0u64)),
            other => Err(ConditionError::BadArgument {
                func: "len",
                expected: "string, array, or object",
                got: type_name(other),
            }),
        },
        "exists" => Ok(Value::Bool(!value.is_null())),
        "is_string" => Ok(Value::Bool(value.is_string())),
        "is_number" => Ok(Value::Bool(value.is_number())),
        "is_bool" => Ok(Value::Bool(value.is_boolean())),
        other => Err(ConditionError::UnknownFunction(other.to_string())),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn results() -> Map<String, Value> {
        let value = json!({
            "fetch_data": {"status": "success", "items": ["a", "b", "c"], "count": 3},
            "validate": {"status": "error", "message": ""},
        });
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn eval_str(source: &str) -> bool {
        Condition::parse(source).unwrap().evaluate(&results()).unwrap()
    }

    #[test]
    fn test_status_equality() {
        assert!(eval_str("results.fetch_data.status == \"success\""));
        assert!(!eval_str("results.validate.status == \"success\""));
        assert!(eval_str("results.validate.status != \"success\""));
    }

    #[test]
    fn test_single_quoted_strings() {
        assert!(eval_str("results.fetch_data.status == 'success'"));
    }

    #[test]
    fn test_numeric_comparisons() {
        assert!(eval_str("results.fetch_data.count > 2"));
        assert!(eval_str("results.fetch_data.count >= 3"));
        assert!(!eval_str("results.fetch_data.count < 3"));
        assert!(eval_str("results.fetch_data.count == 3.0"));
    }

    #[test]
    fn test_boolean_connectives() {
        assert!(eval_str(
            "results.fetch_data.status == \"success\" && results.fetch_data.count > 0"
        ));
        assert!(eval_str(
            "results.validate.status == \"success\" || results.fetch_data.count > 0"
        ));
        assert!(eval_str("!(results.fetch_data.count < 1)"));
    }

    #[test]
    fn test_len_helper() {
        assert!(eval_str("len(results.fetch_data.items) == 3"));
        assert!(eval_str("len(results.validate.message) == 0"));
        // len of a missing path is 0, mirroring lookups with empty defaults
        assert!(eval_str("len(results.missing.field) == 0"));
    }

    #[test]
    fn test_type_predicates() {
        assert!(eval_str("is_string(results.fetch_data.status)"));
        assert!(eval_str("is_number(results.fetch_data.count)"));
        assert!(!eval_str("is_bool(results.fetch_data.count)"));
        assert!(eval_str("exists(results.fetch_data)"));
        assert!(!eval_str("exists(results.missing)"));
    }

    #[test]
    fn test_missing_path_is_null() {
        assert!(eval_str("results.missing.deeply.nested == null"));
        assert!(!eval_str("results.missing"));
    }

    #[test]
    fn test_bare_truthiness() {
        assert!(eval_str("results.fetch_data.status"));
        assert!(!eval_str("results.validate.message"));
        assert!(!eval_str("0"));
        assert!(eval_str("1"));
    }

    #[test]
    fn test_unknown_root_identifier() {
        let condition = Condition::parse("secrets.token == \"x\"").unwrap();
        let err = condition.evaluate(&results()).unwrap_err();
        assert!(matches!(err, ConditionError::UnknownIdentifier(_)));
    }

    #[test]
    fn test_unknown_function() {
        let condition = Condition::parse("getattr(results)").unwrap();
        let err = condition.evaluate(&results()).unwrap_err();
        assert!(matches!(err, ConditionError::UnknownFunction(_)));
    }

    #[test]
    fn test_ordering_non_numeric_fails() {
        let condition = Condition::parse("results.fetch_data.status > 1").unwrap();
        let err = condition.evaluate(&results()).unwrap_err();
        assert!(matches!(err, ConditionError::NotComparable { .. }));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Condition::parse("results.a =="),
            Err(ConditionError::Parse(_))
        ));
        assert!(matches!(
            Condition::parse("import os"),
            Err(ConditionError::Parse(_))
        ));
    }

    #[test]
    fn test_source_is_preserved() {
        let source = "results.a.status == \"success\"";
        let condition = Condition::parse(source).unwrap();
        assert_eq!(condition.source(), source);
    }
}
