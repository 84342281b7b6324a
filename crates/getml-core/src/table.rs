//! Local tabular data.
//!
//! A [`Table`] is an ordered set of equally long named columns held on the
//! client. Tables are what gets uploaded into engine data frames and what
//! comes back from `DataFrame.get`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::CoreError;
use crate::time_stamps::{from_days, parse_time_stamp, to_days};

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// Values of one local column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum Series {
    Numeric(Vec<f64>),
    Text(Vec<String>),
    TimeStamp(Vec<NaiveDateTime>),
}

impl Series {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(values) => values.len(),
            Self::Text(values) => values.len(),
            Self::TimeStamp(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// String rendition used for categorical uploads.
    #[must_use]
    pub fn to_text(&self) -> Vec<String> {
        match self {
            Self::Numeric(values) => values.iter().map(ToString::to_string).collect(),
            Self::Text(values) => values.clone(),
            Self::TimeStamp(values) => values.iter().map(ToString::to_string).collect(),
        }
    }

    /// Numbers for numeric uploads. Unparseable text becomes NaN.
    #[must_use]
    pub fn to_numeric_lossy(&self) -> Vec<f64> {
        match self {
            Self::Numeric(values) => values.clone(),
            Self::Text(values) => values
                .iter()
                .map(|value| value.trim().parse().unwrap_or(f64::NAN))
                .collect(),
            Self::TimeStamp(values) => values.iter().copied().map(to_days).collect(),
        }
    }

    /// Numbers for target uploads.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NonNumericTarget`] for the first text value that
    /// does not parse as a number.
    pub fn to_numeric_strict(&self, name: &str) -> Result<Vec<f64>, CoreError> {
        match self {
            Self::Text(values) => values
                .iter()
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| CoreError::NonNumericTarget {
                            name: name.to_string(),
                            value: value.clone(),
                        })
                })
                .collect(),
            other => Ok(other.to_numeric_lossy()),
        }
    }

    /// Fractional days since the epoch, for time stamp uploads.
    ///
    /// Numbers are taken to be day counts already. Text is parsed with
    /// [`parse_time_stamp`] and becomes NaN when that fails.
    #[must_use]
    pub fn to_days(&self) -> Vec<f64> {
        match self {
            Self::Numeric(values) => values.clone(),
            Self::Text(values) => values
                .iter()
                .map(|value| parse_time_stamp(value).map_or(f64::NAN, to_days))
                .collect(),
            Self::TimeStamp(values) => values.iter().copied().map(to_days).collect(),
        }
    }

    /// Decode engine day counts into time stamps. NaN becomes `None`.
    #[must_use]
    pub fn time_stamps_from_days(days: &[f64]) -> Vec<Option<NaiveDateTime>> {
        days.iter().copied().map(from_days).collect()
    }

    fn value_at(&self, row: usize) -> Value {
        match self {
            Self::Numeric(values) => values
                .get(row)
                .and_then(|value| serde_json::Number::from_f64(*value))
                .map_or(Value::Null, Value::Number),
            Self::Text(values) => values
                .get(row)
                .map_or(Value::Null, |value| Value::String(value.clone())),
            Self::TimeStamp(values) => values
                .get(row)
                .map_or(Value::Null, |value| Value::String(value.to_string())),
        }
    }
}

impl From<Vec<f64>> for Series {
    fn from(values: Vec<f64>) -> Self {
        Self::Numeric(values)
    }
}

impl From<Vec<String>> for Series {
    fn from(values: Vec<String>) -> Self {
        Self::Text(values)
    }
}

impl From<Vec<&str>> for Series {
    fn from(values: Vec<&str>) -> Self {
        Self::Text(values.into_iter().map(String::from).collect())
    }
}

impl From<Vec<NaiveDateTime>> for Series {
    fn from(values: Vec<NaiveDateTime>) -> Self {
        Self::TimeStamp(values)
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Named columns of equal length, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<(String, Series)>,
}

impl Table {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Table::insert`].
    ///
    /// # Errors
    ///
    /// See [`Table::insert`].
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        series: impl Into<Series>,
    ) -> Result<Self, CoreError> {
        self.insert(name, series)?;
        Ok(self)
    }

    /// Add or replace a column.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RaggedColumn`] when the new column's length
    /// differs from the table's row count.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        series: impl Into<Series>,
    ) -> Result<(), CoreError> {
        let name = name.into();
        let series = series.into();
        let replaces = self.columns.iter().position(|(existing, _)| *existing == name);
        let others = self
            .columns
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != replaces)
            .map(|(_, (_, column))| column.len())
            .next();
        if let Some(expected) = others.filter(|expected| *expected != series.len()) {
            return Err(CoreError::RaggedColumn {
                name,
                len: series.len(),
                expected,
            });
        }
        match replaces {
            Some(index) => self.columns[index].1 = series,
            None => self.columns.push((name, series)),
        }
        Ok(())
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Series> {
        self.columns
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, series)| series)
    }

    /// Like [`Table::column`], but a missing column is an error.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ColumnNotFound`].
    pub fn require(&self, name: &str) -> Result<&Series, CoreError> {
        self.column(name)
            .ok_or_else(|| CoreError::ColumnNotFound(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |(_, series)| series.len())
    }

    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_cols())
    }

    /// Row-oriented JSON records, as accepted by `DataFrame.from_json`.
    #[must_use]
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        (0..self.n_rows())
            .map(|row| {
                self.columns
                    .iter()
                    .map(|(name, series)| (name.clone(), series.value_at(row)))
                    .collect()
            })
            .collect()
    }

    /// Column-oriented JSON object (`{"name": [values...]}`).
    #[must_use]
    pub fn to_column_json(&self) -> Map<String, Value> {
        self.columns
            .iter()
            .map(|(name, series)| {
                let values = (0..series.len()).map(|row| series.value_at(row)).collect();
                (name.clone(), Value::Array(values))
            })
            .collect()
    }
}
