//! Filter expressions in the VNDB query language.
//!
//! VNDB filters are JSON arrays: a comparison is `[field, operator, value]`
//! and a combinator is `["and" | "or", expr, expr, ...]`. The value of a
//! comparison may itself be a filter, which is how relations are queried
//! (e.g. `["vn", "=", ["rating", ">=", 70]]`).

use serde::de::Error as _;
use serde::ser::{Error as _, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::sources::SourceError;

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Operator {
    /// Wire representation of the operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
        }
    }

    /// Parse an operator from its wire representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "=" => Some(Operator::Eq),
            "!=" => Some(Operator::Ne),
            ">" => Some(Operator::Gt),
            ">=" => Some(Operator::Ge),
            "<" => Some(Operator::Lt),
            "<=" => Some(Operator::Le),
            _ => None,
        }
    }
}

/// Boolean combinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Combinator::And => "and",
            Combinator::Or => "or",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "and" => Some(Combinator::And),
            "or" => Some(Combinator::Or),
            _ => None,
        }
    }
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Number(i64),
    /// A nested filter applied to a related record type
    Filter(Box<FilterExpr>),
    /// Tuple values such as `birthday = [month, day]`.
    ///
    /// A list whose JSON form is itself a valid filter (e.g.
    /// `["id", "=", "c1"]`) parses back as [`FilterValue::Filter`]; the wire
    /// form cannot tell the two apart.
    List(Vec<FilterValue>),
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Number(n)
    }
}

impl From<FilterExpr> for FilterValue {
    fn from(expr: FilterExpr) -> Self {
        FilterValue::Filter(Box::new(expr))
    }
}

/// A VNDB filter expression tree.
///
/// Combinators must hold at least one operand. The constructors and the
/// deserializer reject empty combinators, and serializing one built directly
/// from the variant fails.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Comparison {
        field: String,
        operator: Operator,
        value: FilterValue,
    },
    Combinator {
        op: Combinator,
        operands: Vec<FilterExpr>,
    },
}

impl FilterExpr {
    /// Build a `[field, operator, value]` leaf
    pub fn compare(field: impl Into<String>, operator: Operator, value: impl Into<FilterValue>) -> Self {
        FilterExpr::Comparison {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Shorthand for `[field, "=", value]`
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::compare(field, Operator::Eq, value)
    }

    /// Shorthand for `[field, ">=", value]`
    pub fn ge(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::compare(field, Operator::Ge, value)
    }

    /// Combine operands with a boolean combinator
    pub fn combine(
        op: Combinator,
        operands: impl IntoIterator<Item = FilterExpr>,
    ) -> Result<Self, SourceError> {
        let operands: Vec<FilterExpr> = operands.into_iter().collect();
        if operands.is_empty() {
            return Err(SourceError::InvalidRequest(format!(
                "'{}' filter requires at least one operand",
                op.as_str()
            )));
        }
        Ok(FilterExpr::Combinator { op, operands })
    }

    /// `["and", ...]`
    pub fn and(operands: impl IntoIterator<Item = FilterExpr>) -> Result<Self, SourceError> {
        Self::combine(Combinator::And, operands)
    }

    /// `["or", ...]`
    pub fn or(operands: impl IntoIterator<Item = FilterExpr>) -> Result<Self, SourceError> {
        Self::combine(Combinator::Or, operands)
    }

    /// Depth of the tree, counting nested value filters. A single leaf is 1.
    pub fn depth(&self) -> usize {
        match self {
            FilterExpr::Comparison { value, .. } => 1 + value_depth(value),
            FilterExpr::Combinator { operands, .. } => {
                1 + operands.iter().map(FilterExpr::depth).max().unwrap_or(0)
            }
        }
    }

    fn from_value(value: Value) -> Result<Self, String> {
        let Value::Array(mut items) = value else {
            return Err(format!("filter must be an array, got {}", value));
        };
        let head = match items.first() {
            Some(Value::String(s)) => s.clone(),
            Some(other) => return Err(format!("filter must start with a string, got {}", other)),
            None => return Err("filter array is empty".to_string()),
        };

        if let Some(op) = Combinator::parse(&head) {
            let operands = items
                .drain(1..)
                .map(FilterExpr::from_value)
                .collect::<Result<Vec<_>, _>>()?;
            if operands.is_empty() {
                return Err(format!("'{}' filter has no operands", head));
            }
            return Ok(FilterExpr::Combinator { op, operands });
        }

        if items.len() != 3 {
            return Err(format!(
                "comparison '{}' must have 3 elements, got {}",
                head,
                items.len()
            ));
        }
        let value = filter_value_from(items.pop().unwrap_or(Value::Null))?;
        let operator = match items.pop() {
            Some(Value::String(s)) => {
                Operator::parse(&s).ok_or_else(|| format!("unknown operator '{}'", s))?
            }
            other => return Err(format!("invalid operator {:?}", other)),
        };
        Ok(FilterExpr::Comparison {
            field: head,
            operator,
            value,
        })
    }
}

fn value_depth(value: &FilterValue) -> usize {
    match value {
        FilterValue::Filter(expr) => expr.depth(),
        FilterValue::List(items) => items.iter().map(value_depth).max().unwrap_or(0),
        FilterValue::Text(_) | FilterValue::Number(_) => 0,
    }
}

// A nested array is a filter when it is shaped like one; otherwise it is a
// tuple value.
fn filter_value_from(value: Value) -> Result<FilterValue, String> {
    match value {
        Value::String(s) => Ok(FilterValue::Text(s)),
        Value::Number(n) => n
            .as_i64()
            .map(FilterValue::Number)
            .ok_or_else(|| format!("unsupported numeric filter value {}", n)),
        Value::Array(items) => {
            let candidate = Value::Array(items.clone());
            match FilterExpr::from_value(candidate) {
                Ok(expr) => Ok(FilterValue::Filter(Box::new(expr))),
                Err(_) => items
                    .into_iter()
                    .map(filter_value_from)
                    .collect::<Result<Vec<_>, _>>()
                    .map(FilterValue::List),
            }
        }
        other => Err(format!("unsupported filter value {}", other)),
    }
}

impl Serialize for FilterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterValue::Text(s) => serializer.serialize_str(s),
            FilterValue::Number(n) => serializer.serialize_i64(*n),
            FilterValue::Filter(expr) => expr.serialize(serializer),
            FilterValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for FilterExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterExpr::Comparison {
                field,
                operator,
                value,
            } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(field)?;
                seq.serialize_element(operator.as_str())?;
                seq.serialize_element(value)?;
                seq.end()
            }
            FilterExpr::Combinator { op, operands } => {
                if operands.is_empty() {
                    return Err(S::Error::custom(format!(
                        "'{}' filter requires at least one operand",
                        op.as_str()
                    )));
                }
                let mut seq = serializer.serialize_seq(Some(operands.len() + 1))?;
                seq.serialize_element(op.as_str())?;
                for operand in operands {
                    seq.serialize_element(operand)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for FilterExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        FilterExpr::from_value(value).map_err(D::Error::custom)
    }
}
