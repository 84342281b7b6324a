//! # getml-datasets
//!
//! Artificial relational datasets whose targets are known aggregations over
//! peripheral tables, for trying out feature learning without real data.
//!
//! - [`make_numerical`], [`make_discrete`], [`make_categorical`]: one
//!   peripheral table aggregated under a time and value condition
//! - [`make_same_units_numerical`], [`make_same_units_categorical`]: the
//!   condition compares a peripheral column with a population column
//! - [`make_snowflake`]: two peripheral tables, the second joined onto the
//!   first
//!
//! Output is a local [`Table`](getml_core::table::Table) per table together
//! with the [`Schema`](getml_core::Schema) it should be uploaded with. Pass a
//! seed for reproducible data.

pub mod aggregate;
pub mod error;
pub mod generators;

pub use error::DatasetError;
pub use generators::{
    Dataset, GeneratedTable, Options, SnowflakeOptions, make_categorical, make_discrete,
    make_numerical, make_same_units_categorical, make_same_units_numerical, make_snowflake,
};
