//! # getml-core
//!
//! Wire-level data types for talking to the getML engine.
//!
//! This crate performs no I/O. It provides the types every other getML crate
//! serializes onto (or parses from) the engine's JSON command protocol:
//! - Column roles and per-role table schemas
//! - Lazily evaluated column expressions and column aggregations
//! - Feature aggregations, loss functions and predictors
//! - Placeholders describing the relational data model
//! - Multirel and Relboost hyperparameters
//! - Hyperparameter search settings and parameter spaces
//! - Local tabular data and time stamp conversion
//! - The command envelope and cross-cutting error types

pub mod aggregations;
pub mod columns;
pub mod command;
pub mod errors;
pub mod hyperopt;
pub mod loss_functions;
pub mod models;
pub mod placeholder;
pub mod predictors;
pub mod roles;
pub mod table;
pub mod time_stamps;

pub use command::Command;
pub use errors::CoreError;
pub use roles::{Role, Schema};
