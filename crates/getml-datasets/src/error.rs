use getml_core::CoreError;
use thiserror::Error;

/// Errors raised while generating a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Peripheral rows need population rows to point their join keys at.
    #[error("{table} needs at least one row to join on, got {rows}")]
    EmptyJoinTarget { table: &'static str, rows: usize },

    /// Assembling a generated table failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}
