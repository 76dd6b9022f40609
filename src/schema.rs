//! Column descriptors and the explicit type-classification pass.
//!
//! Every loader ends by classifying each column into a [`ColumnType`]:
//!
//! - text sources (delimited tables, text spreadsheet cells) feed raw tokens
//!   through [`TypeCandidate`], which decides the type before values are parsed;
//! - already-typed sources (JSON, merge output) classify the values they hold
//!   with [`classify_values`].
//!
//! The pivot scorer reads the resulting tag instead of guessing from values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::{Cell, Value, is_missing_token, parse_boolean_token};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    /// Text, or a column whose values are of more than one incompatible kind.
    String,
    /// No non-null values were observed.
    Null,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::String => "string",
            ColumnType::Null => "null",
        }
    }

    /// Whether values of this type can serve as a stable identifier.
    pub fn is_key_like(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::String)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Combines the classification of two value populations.
    pub fn unify(self, other: ColumnType) -> ColumnType {
        use ColumnType::*;
        match (self, other) {
            (Null, other) | (other, Null) => other,
            (a, b) if a == b => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => String,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub datatype: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, datatype: ColumnType) -> Self {
        Self {
            name: name.into(),
            datatype,
        }
    }
}

/// Tracks which interpretations every non-missing token of a text column
/// still admits.
#[derive(Debug, Clone)]
pub struct TypeCandidate {
    non_empty: usize,
    integer_matches: usize,
    float_matches: usize,
    boolean_matches: usize,
}

impl Default for TypeCandidate {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeCandidate {
    pub fn new() -> Self {
        Self {
            non_empty: 0,
            integer_matches: 0,
            float_matches: 0,
            boolean_matches: 0,
        }
    }

    pub fn update(&mut self, value: &str) {
        if is_missing_token(value) {
            return;
        }
        let trimmed = value.trim();
        self.non_empty += 1;
        if trimmed.parse::<i64>().is_ok() {
            self.integer_matches += 1;
        }
        if trimmed.parse::<f64>().is_ok() {
            self.float_matches += 1;
        }
        if parse_boolean_token(trimmed).is_some() {
            self.boolean_matches += 1;
        }
    }

    /// Records a value that arrived already typed (a native spreadsheet cell).
    pub fn observe_typed(&mut self, value: &Value) {
        self.non_empty += 1;
        match value {
            Value::Integer(_) => {
                self.integer_matches += 1;
                self.float_matches += 1;
            }
            Value::Float(f) => {
                if f.fract() == 0.0 {
                    self.integer_matches += 1;
                }
                self.float_matches += 1;
            }
            Value::Boolean(_) => self.boolean_matches += 1,
            Value::String(s) => {
                if parse_boolean_token(s).is_some() {
                    self.boolean_matches += 1;
                }
            }
        }
    }

    pub fn decide(&self) -> ColumnType {
        if self.non_empty == 0 {
            ColumnType::Null
        } else if self.integer_matches == self.non_empty {
            ColumnType::Integer
        } else if self.float_matches == self.non_empty {
            ColumnType::Float
        } else if self.boolean_matches == self.non_empty {
            ColumnType::Boolean
        } else {
            ColumnType::String
        }
    }
}

/// Classifies a column of typed values: uniform kinds keep their type,
/// integers mixed with floats become float, anything else is text.
pub fn classify_values<'a, I>(values: I) -> ColumnType
where
    I: IntoIterator<Item = &'a Cell>,
{
    values
        .into_iter()
        .flatten()
        .fold(ColumnType::Null, |acc, value| acc.unify(value.column_type()))
}
