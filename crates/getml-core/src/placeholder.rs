//! Placeholders: data-free descriptions of the tables in a relational model.

use std::sync::atomic::{AtomicU64, Ordering};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::roles::{Schema, empty_string_as_default};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn next_sequence() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

/// How another placeholder is joined onto this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    join_key: String,
    time_stamp: String,
    other_join_key: Option<String>,
    other_time_stamp: Option<String>,
    upper_time_stamp: Option<String>,
}

impl Join {
    /// Join on `join_key`, using `time_stamp` of this table as the cut-off.
    #[must_use]
    pub fn on(join_key: impl Into<String>, time_stamp: impl Into<String>) -> Self {
        Self {
            join_key: join_key.into(),
            time_stamp: time_stamp.into(),
            other_join_key: None,
            other_time_stamp: None,
            upper_time_stamp: None,
        }
    }

    /// Join key of the other table, when it is named differently.
    #[must_use]
    pub fn other_join_key(mut self, name: impl Into<String>) -> Self {
        self.other_join_key = Some(name.into());
        self
    }

    /// Time stamp of the other table, when it is named differently.
    #[must_use]
    pub fn other_time_stamp(mut self, name: impl Into<String>) -> Self {
        self.other_time_stamp = Some(name.into());
        self
    }

    /// Time stamp in the other table after which its rows stop being relevant.
    #[must_use]
    pub fn upper_time_stamp(mut self, name: impl Into<String>) -> Self {
        self.upper_time_stamp = Some(name.into());
        self
    }
}

/// A table in the data model, without data.
///
/// A placeholder owns the placeholders joined onto it, so the data model is a
/// tree rooted at the population. [`Placeholder::join`] moves the child into
/// the tree and hands back a reference to it, and joins onto a table already
/// in the tree go through that reference or [`Placeholder::find_peripheral_mut`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Placeholder {
    #[serde(rename = "name_")]
    pub name: String,

    #[serde(flatten)]
    pub schema: Schema,

    #[serde(rename = "join_keys_used_", default, deserialize_with = "empty_string_as_default")]
    pub join_keys_used: Vec<String>,

    #[serde(rename = "other_join_keys_used_", default, deserialize_with = "empty_string_as_default")]
    pub other_join_keys_used: Vec<String>,

    #[serde(rename = "time_stamps_used_", default, deserialize_with = "empty_string_as_default")]
    pub time_stamps_used: Vec<String>,

    #[serde(rename = "other_time_stamps_used_", default, deserialize_with = "empty_string_as_default")]
    pub other_time_stamps_used: Vec<String>,

    #[serde(rename = "upper_time_stamps_used_", default, deserialize_with = "empty_string_as_default")]
    pub upper_time_stamps_used: Vec<String>,

    #[serde(rename = "joined_tables_", default, deserialize_with = "empty_string_as_default")]
    pub joined_tables: Vec<Placeholder>,

    #[serde(skip, default = "next_sequence")]
    sequence: u64,
}

impl PartialEq for Placeholder {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.schema == other.schema
            && self.join_keys_used == other.join_keys_used
            && self.other_join_keys_used == other.other_join_keys_used
            && self.time_stamps_used == other.time_stamps_used
            && self.other_time_stamps_used == other.other_time_stamps_used
            && self.upper_time_stamps_used == other.upper_time_stamps_used
            && self.joined_tables == other.joined_tables
    }
}

impl Placeholder {
    #[must_use]
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            join_keys_used: Vec::new(),
            other_join_keys_used: Vec::new(),
            time_stamps_used: Vec::new(),
            other_time_stamps_used: Vec::new(),
            upper_time_stamps_used: Vec::new(),
            joined_tables: Vec::new(),
            sequence: next_sequence(),
        }
    }

    /// Left-join `other` onto this placeholder and return the joined table,
    /// so its own peripherals can be joined in turn.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PlaceholderOrder`] when `other` was created before
    /// `self`. Requiring that order rules out cyclic data models.
    pub fn join(&mut self, other: Self, join: Join) -> Result<&mut Self, CoreError> {
        if other.sequence <= self.sequence {
            return Err(CoreError::PlaceholderOrder {
                this: self.name.clone(),
                other: other.name.clone(),
            });
        }
        let Join {
            join_key,
            time_stamp,
            other_join_key,
            other_time_stamp,
            upper_time_stamp,
        } = join;
        self.other_join_keys_used
            .push(other_join_key.unwrap_or_else(|| join_key.clone()));
        self.other_time_stamps_used
            .push(other_time_stamp.unwrap_or_else(|| time_stamp.clone()));
        self.join_keys_used.push(join_key);
        self.time_stamps_used.push(time_stamp);
        self.upper_time_stamps_used
            .push(upper_time_stamp.unwrap_or_default());
        let index = self.joined_tables.len();
        self.joined_tables.push(other);
        Ok(&mut self.joined_tables[index])
    }

    /// Depth-first search for a joined placeholder by name.
    #[must_use]
    pub fn find_peripheral(&self, name: &str) -> Option<&Self> {
        self.joined_tables
            .iter()
            .find(|table| table.name == name)
            .or_else(|| {
                self.joined_tables
                    .iter()
                    .find_map(|table| table.find_peripheral(name))
            })
    }

    /// Mutable counterpart of [`Placeholder::find_peripheral`].
    pub fn find_peripheral_mut(&mut self, name: &str) -> Option<&mut Self> {
        if let Some(index) = self.joined_tables.iter().position(|table| table.name == name) {
            return Some(&mut self.joined_tables[index]);
        }
        self.joined_tables
            .iter_mut()
            .find_map(|table| table.find_peripheral_mut(name))
    }

    /// Every joined table, depth-first, without the placeholder itself.
    #[must_use]
    pub fn peripherals(&self) -> Vec<&Self> {
        let mut tables = Vec::new();
        for table in &self.joined_tables {
            tables.push(table);
            tables.extend(table.peripherals());
        }
        tables
    }
}
