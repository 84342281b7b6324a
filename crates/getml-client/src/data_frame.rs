//! Handles to data frames stored in the engine.
//!
//! A [`DataFrame`] never holds rows. It knows the frame's name and schema and
//! turns local [`Table`]s into uploads, engine columns into fetches, and
//! relational operations (`group_by`, `join`, `where`) into commands that
//! create new frames on the engine side.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use getml_core::columns::{BooleanColumn, CategoricalColumn, Column, ColumnAggregation, Expr};
use getml_core::placeholder::Placeholder;
use getml_core::table::Table;
use getml_core::time_stamps::default_time_formats;
use getml_core::{Command, CoreError, Role, Schema};
use serde::Serialize;

use crate::columns::fetch_series;
use crate::connection::Connection;
use crate::engine::Engine;
use crate::error::ClientError;
use crate::wire::{FOUND, SUCCESS};

/// Seed used by [`DataFrame::random`] when the caller has no preference.
pub const DEFAULT_RANDOM_SEED: u32 = 5849;

const TIME_STAMP_UNIT: &str = "time stamp";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Settings of `DataFrame.read_csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    /// Append to an existing frame instead of replacing it.
    pub append: bool,
    pub quotechar: char,
    pub sep: char,
    /// Engine format strings tried when parsing time stamps.
    pub time_formats: Vec<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            append: true,
            quotechar: '"',
            sep: ',',
            time_formats: default_time_formats(),
        }
    }
}

/// Kind of a `DataFrame.join`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinHow {
    #[default]
    Inner,
    Left,
    Right,
}

/// Optional parts of a `DataFrame.join`.
#[derive(Debug, Clone, Default)]
pub struct JoinOptions {
    /// Join key in the other frame, when it is named differently.
    pub other_join_key: Option<String>,
    /// Columns of this frame to keep. Empty keeps all.
    pub cols: Vec<Expr>,
    /// Columns of the other frame to keep. Empty keeps all.
    pub other_cols: Vec<Expr>,
    pub how: JoinHow,
    /// Rows of the result must satisfy this condition.
    pub condition: Option<BooleanColumn>,
}

// ---------------------------------------------------------------------------
// Upload encoding
// ---------------------------------------------------------------------------

enum Payload {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

struct Upload {
    column: Expr,
    payload: Payload,
}

// ---------------------------------------------------------------------------
// DataFrame
// ---------------------------------------------------------------------------

/// Named handle to a table held by the engine.
#[derive(Debug, Clone)]
pub struct DataFrame {
    engine: Engine,
    name: String,
    schema: Schema,
    units: BTreeMap<String, String>,
}

macro_rules! role_names {
    ($($role:expr => $names:ident, $count:ident;)*) => {
        $(
            #[must_use]
            pub fn $names(&self) -> &[String] {
                self.schema.names($role)
            }

            #[must_use]
            pub fn $count(&self) -> usize {
                self.schema.names($role).len()
            }
        )*
    };
}

macro_rules! remove_by_role {
    ($($method:ident => $role:expr;)*) => {
        $(
            /// Remove a column of this role, then refresh.
            ///
            /// # Errors
            ///
            /// Returns [`ClientError::Engine`] when the engine refuses.
            pub async fn $method(&mut self, name: &str) -> Result<(), ClientError> {
                self.remove_column(name, $role).await
            }
        )*
    };
}

impl Engine {
    /// Handle to the data frame `name` with a locally declared schema.
    #[must_use]
    pub fn data_frame(&self, name: impl Into<String>, schema: Schema) -> DataFrame {
        DataFrame::new(self.clone(), name, schema)
    }
}

impl DataFrame {
    #[must_use]
    pub fn new(engine: Engine, name: impl Into<String>, schema: Schema) -> Self {
        Self {
            engine,
            name: name.into(),
            schema,
            units: BTreeMap::new(),
        }
    }

    /// Units of discrete and numerical columns, by column name.
    #[must_use]
    pub fn with_units(mut self, units: BTreeMap<String, String>) -> Self {
        self.units = units;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub const fn units(&self) -> &BTreeMap<String, String> {
        &self.units
    }

    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    role_names! {
        Role::Categorical => categorical_names, n_categorical;
        Role::Discrete => discrete_names, n_discrete;
        Role::JoinKey => join_key_names, n_join_keys;
        Role::Numerical => numerical_names, n_numerical;
        Role::Target => target_names, n_targets;
        Role::TimeStamp => time_stamp_names, n_time_stamps;
    }

    // -- column handles ----------------------------------------------------

    fn unit_of(&self, role: Role, name: &str) -> &str {
        if role.has_unit() {
            self.units.get(name).map_or("", String::as_str)
        } else {
            ""
        }
    }

    fn require(&self, role: Role, name: &str) -> Result<(), CoreError> {
        if self.schema.names(role).iter().any(|candidate| candidate == name) {
            Ok(())
        } else {
            Err(CoreError::ColumnNotFound(name.to_string()))
        }
    }

    fn numeric_column(&self, role: Role, name: &str) -> Result<Column, CoreError> {
        self.require(role, name)?;
        Ok(Column::stored(&self.name, name, role, self.unit_of(role, name)))
    }

    fn categorical_column(&self, role: Role, name: &str) -> Result<CategoricalColumn, CoreError> {
        self.require(role, name)?;
        Ok(CategoricalColumn::stored(&self.name, name, role))
    }

    /// The wire description of a stored column.
    fn stored_expr(&self, role: Role, name: &str) -> Expr {
        if role.is_categorical() {
            CategoricalColumn::stored(&self.name, name, role).into_expr()
        } else {
            Column::stored(&self.name, name, role, self.unit_of(role, name)).into_expr()
        }
    }

    /// # Errors
    ///
    /// Returns [`CoreError::ColumnNotFound`] for names the schema does not list.
    pub fn categorical(&self, name: &str) -> Result<CategoricalColumn, CoreError> {
        self.categorical_column(Role::Categorical, name)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::ColumnNotFound`] for names the schema does not list.
    pub fn join_key(&self, name: &str) -> Result<CategoricalColumn, CoreError> {
        self.categorical_column(Role::JoinKey, name)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::ColumnNotFound`] for names the schema does not list.
    pub fn discrete(&self, name: &str) -> Result<Column, CoreError> {
        self.numeric_column(Role::Discrete, name)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::ColumnNotFound`] for names the schema does not list.
    pub fn numerical(&self, name: &str) -> Result<Column, CoreError> {
        self.numeric_column(Role::Numerical, name)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::ColumnNotFound`] for names the schema does not list.
    pub fn target(&self, name: &str) -> Result<Column, CoreError> {
        self.numeric_column(Role::Target, name)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::ColumnNotFound`] for names the schema does not list.
    pub fn time_stamp(&self, name: &str) -> Result<Column, CoreError> {
        self.numeric_column(Role::TimeStamp, name)
    }

    /// Uniform random numbers in `[0, 1)`, one per row.
    #[must_use]
    pub fn random(&self, seed: u32) -> Column {
        Column::random(&self.name, seed)
    }

    /// Row numbers, starting at 0.
    #[must_use]
    pub fn rowid(&self) -> Column {
        Column::rowid(&self.name)
    }

    // -- local checks ------------------------------------------------------

    /// Make sure `table` can be uploaded into this frame.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingRole`] without join keys or time stamps,
    /// [`CoreError::DuplicateColumns`] for repeated names and
    /// [`CoreError::ColumnNotFound`] for columns `table` lacks.
    pub fn check_plausibility(&self, table: &Table) -> Result<(), CoreError> {
        for role in [Role::JoinKey, Role::TimeStamp] {
            if self.schema.names(role).is_empty() {
                return Err(CoreError::MissingRole(role));
            }
        }
        self.schema.check_unique()?;
        for (_, name) in self.schema.columns() {
            table.require(name)?;
        }
        Ok(())
    }

    fn encode(&self, table: &Table) -> Result<Vec<Upload>, CoreError> {
        self.check_plausibility(table)?;
        self.schema
            .columns()
            .map(|(role, name)| {
                let series = table.require(name)?;
                let payload = if role.is_categorical() {
                    Payload::Text(series.to_text())
                } else if role == Role::Target {
                    Payload::Numeric(series.to_numeric_strict(name)?)
                } else if role == Role::TimeStamp
                    || self.unit_of(role, name).contains(TIME_STAMP_UNIT)
                {
                    Payload::Numeric(series.to_days())
                } else {
                    Payload::Numeric(series.to_numeric_lossy())
                };
                Ok(Upload {
                    column: self.stored_expr(role, name),
                    payload,
                })
            })
            .collect()
    }

    // -- uploads -----------------------------------------------------------

    async fn upload(
        &self,
        connection: &mut Connection,
        kind: &str,
        acknowledged: bool,
        uploads: &[Upload],
    ) -> Result<(), ClientError> {
        connection.send_command(&Command::new(kind, &self.name)).await?;
        if acknowledged {
            connection.expect_status(SUCCESS).await?;
        }
        for upload in uploads {
            connection.send_json(&upload.column).await?;
            match &upload.payload {
                Payload::Numeric(values) => connection.send_vector(values).await?,
                Payload::Text(values) => connection.send_categorical_vector(values).await?,
            }
            connection.expect_status(SUCCESS).await?;
        }
        self.close_exchange(connection).await
    }

    async fn close_exchange(&self, connection: &mut Connection) -> Result<(), ClientError> {
        connection
            .send_command(&Command::new("DataFrame.close", &self.name))
            .await?;
        connection.expect_status(SUCCESS).await
    }

    /// Upload `table`, replacing the frame's content.
    ///
    /// Columns are streamed in role order. Categorical columns and join keys
    /// go as strings. Time stamps, and numeric columns whose unit contains
    /// `time stamp`, are converted to days since the epoch.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Core`] when `table` fails the plausibility
    /// check or holds a non-numeric target, and [`ClientError::Engine`] when
    /// the engine rejects a column.
    pub async fn send(&self, table: &Table) -> Result<(), ClientError> {
        let uploads = self.encode(table)?;
        let mut connection = self.engine.connect().await?;
        self.upload(&mut connection, "DataFrame", true, &uploads).await?;
        connection.close().await;
        tracing::debug!(df = %self.name, rows = table.n_rows(), "data frame sent");
        Ok(())
    }

    /// Upload `table` on a connection that belongs to a larger exchange.
    pub(crate) async fn send_via(
        &self,
        connection: &mut Connection,
        table: &Table,
    ) -> Result<(), ClientError> {
        let uploads = self.encode(table)?;
        self.upload(connection, "DataFrame", true, &uploads).await
    }

    /// Append the rows of `table`.
    ///
    /// # Errors
    ///
    /// Same as [`DataFrame::send`].
    pub async fn append(&self, table: &Table) -> Result<(), ClientError> {
        let uploads = self.encode(table)?;
        let mut connection = self.engine.connect().await?;
        self.upload(&mut connection, "DataFrame.append", false, &uploads).await?;
        connection.close().await;
        tracing::debug!(df = %self.name, rows = table.n_rows(), "rows appended");
        Ok(())
    }

    /// Download every column.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when a column is not found.
    pub async fn get(&self) -> Result<Table, ClientError> {
        let mut connection = self
            .engine
            .send_and_receive(&Command::new("DataFrame.get", &self.name))
            .await?;
        let mut table = Table::new();
        for (role, name) in self.schema.columns() {
            let series = fetch_series(&mut connection, &self.stored_expr(role, name)).await?;
            table.insert(name, series)?;
        }
        self.close_exchange(&mut connection).await?;
        connection.close().await;
        Ok(table)
    }

    // -- engine state ------------------------------------------------------

    /// Replace the local schema with the one the engine holds.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the reply is not a schema.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let mut connection = self
            .engine
            .send_and_receive(&Command::new("DataFrame.refresh", &self.name))
            .await?;
        let reply = connection.recv_string().await?;
        connection.close().await;
        if !reply.starts_with('{') {
            return Err(ClientError::Engine(reply));
        }
        self.schema = serde_json::from_str(&reply)?;
        Ok(())
    }

    /// Load the frame from the project folder, then refresh.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine has no such frame.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        self.engine
            .send(&Command::new("DataFrame.load", &self.name))
            .await?;
        self.refresh().await
    }

    /// Write the frame to the project folder.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses.
    pub async fn save(&self) -> Result<(), ClientError> {
        self.engine
            .send(&Command::new("DataFrame.save", &self.name))
            .await
    }

    /// Delete the frame from memory, and from disk unless `mem_only`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses.
    pub async fn delete(self, mem_only: bool) -> Result<(), ClientError> {
        let command = Command::new("DataFrame.delete", &self.name).with("mem_only_", mem_only);
        self.engine.send(&command).await
    }

    async fn request_count(&self, kind: &str) -> Result<u64, ClientError> {
        let mut connection = self
            .engine
            .send_and_receive(&Command::new(kind, &self.name))
            .await?;
        connection.expect_status(FOUND).await?;
        let reply = connection.recv_string().await?;
        connection.close().await;
        reply
            .trim()
            .parse()
            .map_err(|_| ClientError::Protocol(format!("{kind} answered '{reply}'")))
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the frame does not exist.
    pub async fn n_rows(&self) -> Result<u64, ClientError> {
        self.request_count("DataFrame.nrows").await
    }

    /// Size of the frame's data in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the frame does not exist.
    pub async fn n_bytes(&self) -> Result<u64, ClientError> {
        self.request_count("DataFrame.nbytes").await
    }

    /// Refresh and describe this frame as a placeholder.
    ///
    /// # Errors
    ///
    /// See [`DataFrame::refresh`].
    pub async fn to_placeholder(&mut self) -> Result<Placeholder, ClientError> {
        self.refresh().await?;
        Ok(Placeholder::new(self.name.clone(), self.schema.clone()))
    }

    // -- ingestion and export ----------------------------------------------

    fn schema_command(&self, kind: &str) -> Command {
        Command::new(kind, &self.name).with_fields(self.schema.command_fields())
    }

    /// Let the engine read CSV files with a header line into this frame.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] when a path cannot be made absolute and
    /// [`ClientError::Engine`] when the engine cannot parse the files.
    pub async fn read_csv<P: AsRef<Path>>(
        &self,
        fnames: &[P],
        options: &CsvOptions,
    ) -> Result<(), ClientError> {
        let fnames = absolute_paths(fnames)?;
        let command = self
            .schema_command("DataFrame.read_csv")
            .with_serialized("fnames_", &fnames)?
            .with("append_", options.append)
            .with("quotechar_", options.quotechar.to_string())
            .with("sep_", options.sep.to_string())
            .with_serialized("time_formats_", &options.time_formats)?;
        self.engine.send(&command).await
    }

    /// Fill the frame from a table of the connected database.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses.
    pub async fn from_db(&self, table_name: &str, append: bool) -> Result<(), ClientError> {
        let command = self
            .schema_command("DataFrame.from_db")
            .with("table_name_", table_name)
            .with("append_", append);
        self.engine.send(&command).await
    }

    /// Fill the frame from the result of an SQL query.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses.
    pub async fn from_query(&self, query: &str, append: bool) -> Result<(), ClientError> {
        let command = self
            .schema_command("DataFrame.from_query")
            .with("query_", query)
            .with("append_", append);
        self.engine.send(&command).await
    }

    /// Fill the frame from a JSON object of column arrays.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine cannot parse `json`.
    pub async fn from_json(
        &self,
        json: &str,
        append: bool,
        time_formats: &[String],
    ) -> Result<(), ClientError> {
        let command = self
            .schema_command("DataFrame.from_json")
            .with("append_", append)
            .with_serialized("time_formats_", time_formats)?;
        let mut connection = self.engine.send_and_receive(&command).await?;
        connection.send_string(json).await?;
        let status = connection.expect_status(SUCCESS).await;
        connection.close().await;
        status
    }

    /// [`DataFrame::from_json`] for a local table, parsed by the engine.
    ///
    /// # Errors
    ///
    /// Same as [`DataFrame::from_json`].
    pub async fn from_table(&self, table: &Table, append: bool) -> Result<(), ClientError> {
        let json = serde_json::to_string(&table.to_column_json())?;
        self.from_json(&json, append, &default_time_formats()).await
    }

    /// Write the frame into a new CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine cannot write the file.
    pub async fn to_csv(
        &self,
        fname: impl AsRef<Path>,
        quotechar: char,
        sep: char,
    ) -> Result<(), ClientError> {
        let fname = std::path::absolute(fname)?;
        let command = Command::new("DataFrame.to_csv", &self.name)
            .with("fname_", fname.to_string_lossy().into_owned())
            .with("quotechar_", quotechar.to_string())
            .with("sep_", sep.to_string());
        self.engine.send(&command).await
    }

    /// Write the frame into a database table, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses.
    pub async fn to_db(&self, table_name: &str) -> Result<(), ClientError> {
        let command =
            Command::new("DataFrame.to_db", &self.name).with("table_name_", table_name);
        self.engine.send(&command).await
    }

    // -- columns -----------------------------------------------------------

    async fn add_expr(
        &mut self,
        kind: &str,
        column: &Expr,
        name: &str,
        role: Role,
        unit: &str,
    ) -> Result<(), ClientError> {
        let command = Command::new(kind, name)
            .with_serialized("col_", column)?
            .with("df_name_", self.name.as_str())
            .with("role_", role.as_str())
            .with("unit_", unit);
        self.engine.send(&command).await?;
        if !unit.is_empty() {
            self.units.insert(name.to_string(), unit.to_string());
        }
        self.refresh().await
    }

    /// Add a categorical column computed from `column`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses.
    pub async fn add_categorical(
        &mut self,
        column: &CategoricalColumn,
        name: &str,
        unit: &str,
    ) -> Result<(), ClientError> {
        self.add_expr("DataFrame.add_categorical_column", column.expr(), name, Role::Categorical, unit)
            .await
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses.
    pub async fn add_join_key(&mut self, column: &CategoricalColumn, name: &str) -> Result<(), ClientError> {
        self.add_expr("DataFrame.add_categorical_column", column.expr(), name, Role::JoinKey, "")
            .await
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses.
    pub async fn add_discrete(&mut self, column: &Column, name: &str, unit: &str) -> Result<(), ClientError> {
        self.add_expr("DataFrame.add_column", column.expr(), name, Role::Discrete, unit)
            .await
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses.
    pub async fn add_numerical(&mut self, column: &Column, name: &str, unit: &str) -> Result<(), ClientError> {
        self.add_expr("DataFrame.add_column", column.expr(), name, Role::Numerical, unit)
            .await
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses.
    pub async fn add_target(&mut self, column: &Column, name: &str) -> Result<(), ClientError> {
        self.add_expr("DataFrame.add_column", column.expr(), name, Role::Target, "")
            .await
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses.
    pub async fn add_time_stamp(&mut self, column: &Column, name: &str) -> Result<(), ClientError> {
        self.add_expr("DataFrame.add_column", column.expr(), name, Role::TimeStamp, "")
            .await
    }

    async fn remove_column(&mut self, name: &str, role: Role) -> Result<(), ClientError> {
        let command = Command::new("DataFrame.remove_column", name)
            .with("df_name_", self.name.as_str())
            .with("role_", role.as_str());
        self.engine.send(&command).await?;
        self.refresh().await
    }

    remove_by_role! {
        rm_categorical => Role::Categorical;
        rm_discrete => Role::Discrete;
        rm_join_key => Role::JoinKey;
        rm_numerical => Role::Numerical;
        rm_target => Role::Target;
        rm_time_stamp => Role::TimeStamp;
    }

    // -- derived frames ----------------------------------------------------

    async fn refreshed(&self, name: &str) -> Result<Self, ClientError> {
        let mut frame = Self::new(self.engine.clone(), name, Schema::default());
        frame.refresh().await?;
        Ok(frame)
    }

    /// Create the frame `name` by grouping over `join_key`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses.
    pub async fn group_by(
        &self,
        join_key: &str,
        name: &str,
        aggregations: &[ColumnAggregation],
    ) -> Result<Self, ClientError> {
        let command = Command::new("DataFrame.group_by", name)
            .with("join_key_name_", join_key)
            .with("df_name_", self.name.as_str())
            .with_serialized("aggregations_", aggregations)?;
        self.engine.send(&command).await?;
        self.refreshed(name).await
    }

    /// Create the frame `name` by joining `other` onto this frame.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses.
    pub async fn join(
        &self,
        name: &str,
        other: &Self,
        join_key: &str,
        options: JoinOptions,
    ) -> Result<Self, ClientError> {
        let JoinOptions {
            other_join_key,
            cols,
            other_cols,
            how,
            condition,
        } = options;
        let mut command = Command::new("DataFrame.join", name)
            .with("df1_name_", self.name.as_str())
            .with("df2_name_", other.name.as_str())
            .with("join_key_used_", join_key)
            .with("other_join_key_used_", other_join_key.unwrap_or_else(|| join_key.to_string()))
            .with_serialized("cols1_", &cols)?
            .with_serialized("cols2_", &other_cols)?
            .with_serialized("how_", &how)?;
        if let Some(condition) = condition {
            command = command.with_serialized("where_", condition.expr())?;
        }
        self.engine.send(&command).await?;
        self.refreshed(name).await
    }

    /// Create the frame `name` from the rows that satisfy `condition`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses.
    pub async fn where_(&self, name: &str, condition: &BooleanColumn) -> Result<Self, ClientError> {
        let command = Command::new("DataFrame.where", &self.name)
            .with("new_df_", name)
            .with_serialized("condition_", condition.expr())?;
        self.engine.send(&command).await?;
        self.refreshed(name).await
    }
}

pub(crate) fn absolute_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<String>, std::io::Error> {
    paths
        .iter()
        .map(|path| {
            std::path::absolute(path).map(|path: PathBuf| path.to_string_lossy().into_owned())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn frame() -> DataFrame {
        Engine::default()
            .data_frame(
                "sales",
                Schema::default()
                    .with(Role::JoinKey, ["customer_id"])
                    .with(Role::TimeStamp, ["ts"])
                    .with(Role::Numerical, ["amount"])
                    .with(Role::Target, ["churn"]),
            )
            .with_units([("amount".to_string(), "EUR".to_string())].into())
    }

    fn table() -> Table {
        Table::new()
            .with_column("customer_id", vec!["a", "b"])
            .unwrap()
            .with_column("ts", vec!["2020-01-01", "2020-01-02"])
            .unwrap()
            .with_column("amount", vec!["12.5", "n/a"])
            .unwrap()
            .with_column("churn", vec![0.0, 1.0])
            .unwrap()
    }

    #[test]
    fn names_and_counts_follow_schema() {
        let df = frame();
        assert_eq!(df.join_key_names(), ["customer_id"]);
        assert_eq!(df.n_numerical(), 1);
        assert_eq!(df.n_categorical(), 0);
    }

    #[test]
    fn column_handles_carry_role_and_unit() {
        let df = frame();
        assert_eq!(df.numerical("amount").unwrap().unit(), Some("EUR"));
        assert_eq!(df.target("churn").unwrap().unit(), Some(""));
        assert!(matches!(
            df.numerical("churn"),
            Err(CoreError::ColumnNotFound(name)) if name == "churn"
        ));
        assert_eq!(df.join_key("customer_id").unwrap().df_name(), "sales");
    }

    #[test]
    fn plausibility_requires_join_key_and_time_stamp() {
        let df = Engine::default().data_frame("x", Schema::default().with(Role::TimeStamp, ["ts"]));
        assert!(matches!(
            df.check_plausibility(&Table::new()),
            Err(CoreError::MissingRole(Role::JoinKey))
        ));
    }

    #[test]
    fn plausibility_reports_missing_local_column() {
        let partial = Table::new().with_column("customer_id", vec!["a"]).unwrap();
        assert!(matches!(
            frame().check_plausibility(&partial),
            Err(CoreError::ColumnNotFound(name)) if name == "ts"
        ));
        assert!(frame().check_plausibility(&table()).is_ok());
    }

    #[test]
    fn encoding_coerces_per_role() {
        let uploads = frame().encode(&table()).unwrap();
        let order: Vec<&str> = uploads.iter().map(|upload| upload.column.type_name()).collect();
        assert_eq!(order, ["CategoricalColumn", "Column", "Column", "Column"]);

        let Payload::Numeric(amount) = &uploads[1].payload else {
            panic!("amount should be numeric");
        };
        assert!((amount[0] - 12.5).abs() < f64::EPSILON);
        assert!(amount[1].is_nan());

        let Payload::Numeric(days) = &uploads[3].payload else {
            panic!("time stamps should be numeric");
        };
        assert!((days[0] - 18_262.0).abs() < 1e-9);
    }

    #[test]
    fn non_numeric_target_is_rejected_before_connecting() {
        let mut bad = table();
        bad.insert("churn", vec!["yes", "no"]).unwrap();
        assert!(matches!(
            frame().encode(&bad),
            Err(CoreError::NonNumericTarget { .. })
        ));
    }

    #[test]
    fn time_stamp_unit_converts_numerical_columns() {
        let df = frame().with_units([("amount".to_string(), "time stamp".to_string())].into());
        let mut local = table();
        local.insert("amount", vec!["1970-01-02", "1970-01-03"]).unwrap();
        let uploads = df.encode(&local).unwrap();
        let Payload::Numeric(days) = &uploads[1].payload else {
            panic!("amount should be numeric");
        };
        assert_eq!(days, &vec![1.0, 2.0]);
    }

    #[test]
    fn csv_defaults() {
        let options = CsvOptions::default();
        assert!(options.append);
        assert_eq!(options.sep, ',');
        assert_eq!(options.time_formats.len(), 3);
    }
}
