//! # getml-client
//!
//! Async client for the getML engine.
//!
//! The engine listens on a TCP port (1708 by default) and speaks a small
//! framed protocol: JSON commands, status strings and big-endian matrices.
//! Every request opens its own connection. Operations that upload data and
//! then act on it, such as fitting a model on local tables, run on a single
//! [`Connection`] from start to finish.
//!
//! - [`Engine`]: liveness, projects, listings, starting and stopping the engine
//! - [`DataFrame`]: upload, download, import, export and column edits
//! - [`Model`]: Multirel and Relboost feature learners
//! - [`HyperoptSearch`]: hyperparameter searches run by the engine
//! - [`Database`]: the engine's database connection

mod columns;
pub mod connection;
pub mod data_frame;
pub mod database;
pub mod engine;
pub mod error;
pub mod hyperopt;
pub mod models;
pub mod wire;

pub use connection::Connection;
pub use data_frame::{CsvOptions, DataFrame, JoinHow, JoinOptions};
pub use database::{CsvImport, Database, PostgresConnection};
pub use engine::Engine;
pub use error::ClientError;
pub use hyperopt::HyperoptSearch;
pub use models::{AnyModel, FrameSource, Model, MultirelModel, RelboostModel};
