use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::Record;


/// Row predicate understood by every [`Store`](super::Store).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Eq(String, Value),
    Ne(String, Value),
    In(String, Vec<Value>),
    IsNull(String),
    NotNull(String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    /// Matches every row.
    #[must_use]
    pub fn all() -> Self {
        Self::And(Vec::new())
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Ne(field.into(), value.into())
    }

    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::IsNull(field.into())
    }

    pub fn not_null(field: impl Into<String>) -> Self {
        Self::NotNull(field.into())
    }

    /// Equality on every field of `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: &Record) -> Self {
        Self::And(
            lookup
                .iter()
                .map(|(field, value)| Self::Eq(field.clone(), value.clone()))
                .collect(),
        )
    }

    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        match self {
            Self::And(mut parts) => {
                parts.push(other);
                Self::And(parts)
            }
            first => Self::And(vec![first, other]),
        }
    }

    #[must_use]
    pub fn or(self, other: Filter) -> Self {
        match self {
            Self::Or(mut parts) => {
                parts.push(other);
                Self::Or(parts)
            }
            first => Self::Or(vec![first, other]),
        }
    }

    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Eq(field, value) => field_value(record, field) == value,
            Self::Ne(field, value) => field_value(record, field) != value,
            Self::In(field, values) => values.contains(field_value(record, field)),
            Self::IsNull(field) => field_value(record, field).is_null(),
            Self::NotNull(field) => !field_value(record, field).is_null(),
            Self::And(parts) => parts.iter().all(|f| f.matches(record)),
            Self::Or(parts) => parts.iter().any(|f| f.matches(record)),
            Self::Not(inner) => !inner.matches(record),
        }
    }

    /// True when every row the filter matches has `field` pinned by an `Eq` or `In`.
    ///
    /// An `And` pins through any conjunct, an `Or` only when all its branches pin.
    pub fn pins(&self, field: &str) -> bool {
        match self {
            Self::Eq(f, _) | Self::In(f, _) => f == field,
            Self::And(parts) => parts.iter().any(|f| f.pins(field)),
            Self::Or(parts) => !parts.is_empty() && parts.iter().all(|f| f.pins(field)),
            Self::Ne(..) | Self::IsNull(_) | Self::NotNull(_) | Self::Not(_) => false,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq(field, value) => write!(f, "{field}={value}"),
            Self::Ne(field, value) => write!(f, "{field}!={value}"),
            Self::In(field, values) => write!(f, "{field} IN {}", Value::Array(values.clone())),
            Self::IsNull(field) => write!(f, "{field} IS NULL"),
            Self::NotNull(field) => write!(f, "{field} IS NOT NULL"),
            Self::And(parts) if parts.is_empty() => write!(f, "*"),
            Self::And(parts) => join(f, parts, " AND "),
            Self::Or(parts) => join(f, parts, " OR "),
            Self::Not(inner) => write!(f, "NOT ({inner})"),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, parts: &[Filter], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{part}")?;
    }
    write!(f, ")")
}

fn field_value<'a>(record: &'a Record, field: &str) -> &'a Value {
    record.get(field).unwrap_or(&Value::Null)
}


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Select {
    pub filter: Filter,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<usize>,
}

impl Select {
    #[must_use]
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            order_by: Vec::new(),
            limit: None,
        }
    }

    /// Sorts in place by the ordering clauses, then truncates to the limit.
    pub fn finish(&self, rows: &mut Vec<Record>) {
        if !self.order_by.is_empty() {
            rows.sort_by(|a, b| {
                for order in &self.order_by {
                    let ord = compare_values(field_value(a, &order.field), field_value(b, &order.field));
                    let ord = if order.descending { ord.reverse() } else { ord };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }
        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
    }
}

/// Total order over JSON scalars: null < bool < number < string < everything else.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .unwrap_or(0.0)
                .partial_cmp(&y.as_f64().unwrap_or(0.0))
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
