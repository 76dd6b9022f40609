use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::ColumnType;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

/// `None` is null.
pub type Cell = Option<Value>;

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Boolean(b) => b.to_string(),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::String(_) => ColumnType::String,
            Value::Integer(_) => ColumnType::Integer,
            Value::Float(_) => ColumnType::Float,
            Value::Boolean(_) => ColumnType::Boolean,
        }
    }

    pub fn key(&self) -> ValueKey {
        match self {
            Value::String(s) => ValueKey::Text(s.clone()),
            Value::Integer(i) => ValueKey::Integer(*i),
            Value::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    ValueKey::Integer(*f as i64)
                } else {
                    ValueKey::Float(f.to_bits())
                }
            }
            Value::Boolean(b) => ValueKey::Boolean(*b),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Hashable identity of a cell. Integral floats collapse onto the integer
/// they equal so `1` and `1.0` match; text never matches numbers. Nulls share
/// one key, so null join keys match each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Text(String),
    Integer(i64),
    Float(u64),
    Boolean(bool),
}

pub fn cell_key(cell: &Cell) -> ValueKey {
    cell.as_ref().map_or(ValueKey::Null, Value::key)
}

const MISSING_TOKENS: &[&str] = &[
    "NA", "N/A", "n/a", "NULL", "null", "NaN", "nan", "-NaN", "-nan", "None", "#N/A", "<NA>",
];

pub fn is_missing_token(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || MISSING_TOKENS.contains(&trimmed)
}

pub fn parse_boolean_token(value: &str) -> Option<bool> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Converts a raw text token into a value of the column's inferred type.
/// Missing tokens yield `None`; a token that does not fit the type is kept
/// as text rather than dropped.
pub fn parse_typed_value(value: &str, ty: &ColumnType) -> Cell {
    if is_missing_token(value) {
        return None;
    }
    let trimmed = value.trim();
    let parsed = match ty {
        ColumnType::Integer => trimmed.parse::<i64>().ok().map(Value::Integer),
        ColumnType::Float => trimmed.parse::<f64>().ok().map(Value::Float),
        ColumnType::Boolean => parse_boolean_token(trimmed).map(Value::Boolean),
        ColumnType::String | ColumnType::Null => None,
    };
    Some(parsed.unwrap_or_else(|| Value::String(value.to_string())))
}
