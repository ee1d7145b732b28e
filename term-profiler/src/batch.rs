//! The tabular batch model consumed by the engine.
//!
//! A [`TabularBatch`] is an ordered set of named columns, each an ordered
//! sequence of [`CellValue`]s. Sources convert whatever they read (Arrow
//! record batches, query results, in-memory rows) into this model once, at
//! ingestion, so every analyzer can match on the cell variant exhaustively.

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{ProfilerError, Result};

/// A single raw cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDateTime),
}

/// The native kind of a non-null cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Bool,
    Int,
    Float,
    Text,
    Date,
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Returns the native kind, or `None` for nulls.
    pub fn kind(&self) -> Option<CellKind> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(_) => Some(CellKind::Bool),
            CellValue::Int(_) => Some(CellKind::Int),
            CellValue::Float(_) => Some(CellKind::Float),
            CellValue::Text(_) => Some(CellKind::Text),
            CellValue::Date(_) => Some(CellKind::Date),
        }
    }

    /// Numeric view of the cell. Text is parsed after trimming; non-finite
    /// values, booleans and dates have no numeric view.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            CellValue::Int(v) => *v as f64,
            CellValue::Float(v) => *v,
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Null | CellValue::Bool(_) | CellValue::Date(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// The hashable identity of a non-null cell.
    pub fn key(&self) -> Option<ValueKey> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(b) => Some(ValueKey::Bool(*b)),
            CellValue::Int(v) => Some(ValueKey::Int(*v)),
            CellValue::Float(v) => Some(ValueKey::from_f64(*v)),
            CellValue::Text(s) => Some(ValueKey::Text(s.clone())),
            CellValue::Date(d) => Some(ValueKey::Date(*d)),
        }
    }

    /// Canonical string used to match values across entities, so that an
    /// integer id and the same id stored as text compare equal.
    pub fn join_key(&self) -> Option<String> {
        self.key().map(|k| k.to_string())
    }

    /// Rough in-memory footprint used when the caller supplies no batch size.
    fn estimated_size(&self) -> u64 {
        match self {
            CellValue::Null | CellValue::Bool(_) => 1,
            CellValue::Int(_) | CellValue::Float(_) => 8,
            CellValue::Date(_) => 12,
            CellValue::Text(s) => s.len() as u64,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "null"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(v) => write!(f, "{v}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Int(i64::from(value))
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::Date(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

/// Normalized identity of a non-null value, used for distinct counting,
/// composite keys and joins.
///
/// Integral floats collapse onto integers (`1` and `1.0` are one value),
/// `-0.0` collapses onto `0`, and every NaN shares a single key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKey {
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(String),
    Date(NaiveDateTime),
}

impl ValueKey {
    fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return ValueKey::Float(f64::NAN.to_bits());
        }
        if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
            return ValueKey::Int(value as i64);
        }
        ValueKey::Float(value.to_bits())
    }
}

impl fmt::Display for ValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKey::Bool(b) => write!(f, "{b}"),
            ValueKey::Int(v) => write!(f, "{v}"),
            ValueKey::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            ValueKey::Text(s) => write!(f, "{s}"),
            ValueKey::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// A named column of raw cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Builds a column from anything convertible into cells.
    pub fn from_values<T: Into<CellValue>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        Self::new(name, values.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Iterator over the non-null cells in row order.
    pub fn non_null(&self) -> impl Iterator<Item = &CellValue> {
        self.values.iter().filter(|v| !v.is_null())
    }
}

/// An in-memory batch of equally sized, uniquely named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularBatch {
    name: String,
    columns: Vec<Column>,
    size_bytes: Option<u64>,
}

impl TabularBatch {
    /// Creates a batch, validating that all columns share a row count and
    /// that column names are unique.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let name = name.into();
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(ragged) = columns.iter().find(|c| c.len() != expected) {
                return Err(ProfilerError::batch_shape(format!(
                    "column '{}' has {} rows but column '{}' has {expected}",
                    ragged.name,
                    ragged.len(),
                    first.name
                )));
            }
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ProfilerError::batch_shape(format!(
                    "duplicate column name '{}' in batch '{name}'",
                    column.name
                )));
            }
        }

        Ok(Self {
            name,
            columns,
            size_bytes: None,
        })
    }

    /// Attaches a caller-supplied size figure.
    pub fn with_size_bytes(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The caller-supplied size, if any.
    pub fn size_bytes(&self) -> Option<u64> {
        self.size_bytes
    }

    /// The caller-supplied size, or an estimate from the cell contents.
    /// The flag is true when the figure is estimated.
    pub fn effective_size_bytes(&self) -> (u64, bool) {
        match self.size_bytes {
            Some(size) => (size, false),
            None => {
                let estimate = self
                    .columns
                    .iter()
                    .map(|c| {
                        c.name.len() as u64
                            + c.values.iter().map(CellValue::estimated_size).sum::<u64>()
                    })
                    .sum();
                (estimate, true)
            }
        }
    }
}
