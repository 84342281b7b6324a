//! Column roles and per-role table schemas.
//!
//! Every column in an engine data frame plays exactly one of six roles. The
//! engine always lists roles in the same fixed order, which is also the order
//! in which column data is streamed on upload.

use std::collections::HashSet;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Role of a column inside a data frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Categorical,
    Discrete,
    JoinKey,
    Numerical,
    Target,
    TimeStamp,
}

impl Role {
    /// All roles, in wire order.
    pub const ALL: [Self; 6] = [
        Self::Categorical,
        Self::Discrete,
        Self::JoinKey,
        Self::Numerical,
        Self::Target,
        Self::TimeStamp,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Categorical => "categorical",
            Self::Discrete => "discrete",
            Self::JoinKey => "join_key",
            Self::Numerical => "numerical",
            Self::Target => "target",
            Self::TimeStamp => "time_stamp",
        }
    }

    /// Human-readable label used in error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Categorical => "categorical",
            Self::Discrete => "discrete",
            Self::JoinKey => "join key",
            Self::Numerical => "numerical",
            Self::Target => "target",
            Self::TimeStamp => "time stamp",
        }
    }

    /// Key of this role in schema replies and placeholders (`join_keys_`).
    #[must_use]
    pub const fn schema_key(self) -> &'static str {
        match self {
            Self::Categorical => "categorical_",
            Self::Discrete => "discrete_",
            Self::JoinKey => "join_keys_",
            Self::Numerical => "numerical_",
            Self::Target => "targets_",
            Self::TimeStamp => "time_stamps_",
        }
    }

    /// Key of this role in commands that declare columns (`categoricals_`).
    #[must_use]
    pub const fn command_key(self) -> &'static str {
        match self {
            Self::Categorical => "categoricals_",
            Self::Discrete => "discretes_",
            Self::JoinKey => "join_keys_",
            Self::Numerical => "numericals_",
            Self::Target => "targets_",
            Self::TimeStamp => "time_stamps_",
        }
    }

    /// Whether columns of this role hold strings rather than numbers.
    #[must_use]
    pub const fn is_categorical(self) -> bool {
        matches!(self, Self::Categorical | Self::JoinKey)
    }

    /// Whether columns of this role carry a unit.
    #[must_use]
    pub const fn has_unit(self) -> bool {
        matches!(self, Self::Discrete | Self::Numerical)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Column names of one table, grouped by role.
///
/// Deserializes from both spellings the engine uses (`categorical_` in data
/// frame replies, `categoricals_` in model schemas). The engine encodes an
/// empty list as `""`, which decodes to an empty `Vec`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    #[serde(
        rename = "categorical_",
        alias = "categoricals_",
        default,
        deserialize_with = "empty_string_as_default"
    )]
    pub categorical: Vec<String>,

    #[serde(
        rename = "discrete_",
        alias = "discretes_",
        default,
        deserialize_with = "empty_string_as_default"
    )]
    pub discrete: Vec<String>,

    #[serde(
        rename = "join_keys_",
        default,
        deserialize_with = "empty_string_as_default"
    )]
    pub join_keys: Vec<String>,

    #[serde(
        rename = "numerical_",
        alias = "numericals_",
        default,
        deserialize_with = "empty_string_as_default"
    )]
    pub numerical: Vec<String>,

    #[serde(
        rename = "targets_",
        default,
        deserialize_with = "empty_string_as_default"
    )]
    pub targets: Vec<String>,

    #[serde(
        rename = "time_stamps_",
        default,
        deserialize_with = "empty_string_as_default"
    )]
    pub time_stamps: Vec<String>,
}

impl Schema {
    /// Column names for one role.
    #[must_use]
    pub fn names(&self, role: Role) -> &[String] {
        match role {
            Role::Categorical => &self.categorical,
            Role::Discrete => &self.discrete,
            Role::JoinKey => &self.join_keys,
            Role::Numerical => &self.numerical,
            Role::Target => &self.targets,
            Role::TimeStamp => &self.time_stamps,
        }
    }

    pub fn names_mut(&mut self, role: Role) -> &mut Vec<String> {
        match role {
            Role::Categorical => &mut self.categorical,
            Role::Discrete => &mut self.discrete,
            Role::JoinKey => &mut self.join_keys,
            Role::Numerical => &mut self.numerical,
            Role::Target => &mut self.targets,
            Role::TimeStamp => &mut self.time_stamps,
        }
    }

    /// Builder-style setter for one role.
    #[must_use]
    pub fn with<I, S>(mut self, role: Role, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.names_mut(role) = names.into_iter().map(Into::into).collect();
        self
    }

    /// Iterate over `(role, column name)` pairs in wire order.
    pub fn columns(&self) -> impl Iterator<Item = (Role, &str)> {
        Role::ALL.into_iter().flat_map(move |role| {
            self.names(role)
                .iter()
                .map(move |name| (role, name.as_str()))
        })
    }

    /// Role of a column, if the schema lists it.
    #[must_use]
    pub fn role_of(&self, name: &str) -> Option<Role> {
        self.columns()
            .find(|(_, candidate)| *candidate == name)
            .map(|(role, _)| role)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        Role::ALL.iter().all(|role| self.names(*role).is_empty())
    }

    /// Column declarations in the command spelling (`categoricals_`, ...).
    #[must_use]
    pub fn command_fields(&self) -> Map<String, Value> {
        Role::ALL
            .into_iter()
            .map(|role| {
                let names = self.names(role).iter().cloned().map(Value::String);
                (role.command_key().to_string(), Value::Array(names.collect()))
            })
            .collect()
    }

    /// Reject schemas that repeat a column name within one role.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateColumns`] naming the first offending role.
    pub fn check_unique(&self) -> Result<(), CoreError> {
        for role in Role::ALL {
            let names = self.names(role);
            let distinct: HashSet<&String> = names.iter().collect();
            if distinct.len() != names.len() {
                return Err(CoreError::DuplicateColumns(role));
            }
        }
        Ok(())
    }

    /// Check that `other` lists exactly the same column names per role.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ColumnCountMismatch`] or
    /// [`CoreError::MissingColumn`] for the first disagreement found.
    pub fn check_same_columns(&self, other: &Self) -> Result<(), CoreError> {
        for role in [
            Role::Target,
            Role::JoinKey,
            Role::TimeStamp,
            Role::Categorical,
            Role::Numerical,
            Role::Discrete,
        ] {
            let mine = self.names(role);
            let theirs = other.names(role);
            if mine.len() != theirs.len() {
                return Err(CoreError::ColumnCountMismatch(role));
            }
            for name in mine.iter().chain(theirs) {
                if !mine.contains(name) || !theirs.contains(name) {
                    return Err(CoreError::MissingColumn {
                        role,
                        name: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Deserialize a value the engine may send as `""` when it is empty.
pub(crate) fn empty_string_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OrEmpty<T> {
        Value(T),
        Text(String),
    }

    match OrEmpty::<T>::deserialize(deserializer)? {
        OrEmpty::Value(value) => Ok(value),
        OrEmpty::Text(text) if text.is_empty() => Ok(T::default()),
        OrEmpty::Text(text) => Err(de::Error::custom(format!(
            "expected a list, found the string '{text}'"
        ))),
    }
}
