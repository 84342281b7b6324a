//! Cross-cutting error types for the getML client.
//!
//! These errors describe invalid local state: a malformed schema, a bad
//! hyperparameter, a table that cannot be uploaded. Transport and engine
//! failures live in `getml-client`, which wraps `CoreError`.

use thiserror::Error;

use crate::roles::Role;

/// Errors raised while building or validating engine-bound data.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A column name does not exist in the table or schema.
    #[error("Column named '{0}' does not exist!")]
    ColumnNotFound(String),

    /// The same column name appears twice within one role.
    #[error("{} columns not unique!", capitalize(.0.label()))]
    DuplicateColumns(Role),

    /// A role that must be present in every uploaded table is empty.
    #[error("You need to provide at least one {}!", .0.label())]
    MissingRole(Role),

    /// Two tables that must share a schema disagree on the number of columns.
    #[error("Number of {} columns does not match", .0.label())]
    ColumnCountMismatch(Role),

    /// Two tables that must share a schema disagree on a column name.
    #[error("Missing column in {}:'{name}'", .role.label())]
    MissingColumn { role: Role, name: String },

    /// Local columns of one table have different lengths.
    #[error("Column '{name}' has {len} rows, expected {expected}")]
    RaggedColumn {
        name: String,
        len: usize,
        expected: usize,
    },

    /// A target column holds a value that is not a number.
    #[error("Target column '{name}' contains the non-numeric value '{value}'")]
    NonNumericTarget { name: String, value: String },

    /// A placeholder was joined onto a placeholder created after it.
    #[error(
        "You cannot join a placeholder that was created before the placeholder it is joined to. \
         Please reverse the order in which the placeholders '{other}' and '{this}' are created!"
    )]
    PlaceholderOrder { this: String, other: String },

    /// Unknown hyperparameter or parameter-space key.
    #[error("Invalid parameter {0}.")]
    InvalidParameter(String),

    /// A hyperparameter search needs a model with a predictor.
    #[error("No predictor present in supplied model!")]
    MissingPredictor,

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// JSON (de)serialization of a wire type failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_use_human_role_labels() {
        assert_eq!(
            CoreError::DuplicateColumns(Role::JoinKey).to_string(),
            "Join key columns not unique!"
        );
        assert_eq!(
            CoreError::MissingRole(Role::TimeStamp).to_string(),
            "You need to provide at least one time stamp!"
        );
        assert_eq!(
            CoreError::MissingColumn {
                role: Role::Numerical,
                name: "price".into(),
            }
            .to_string(),
            "Missing column in numerical:'price'"
        );
    }

    #[test]
    fn column_not_found_quotes_name() {
        let err = CoreError::ColumnNotFound("age".into());
        assert_eq!(err.to_string(), "Column named 'age' does not exist!");
    }
}
