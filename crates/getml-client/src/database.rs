//! The engine's database connection.
//!
//! The engine holds one database connection at a time. These commands set it
//! up and run statements through it; the client never talks to the database
//! directly.

use std::path::Path;

use getml_core::Command;
use getml_core::time_stamps::default_time_formats;

use crate::data_frame::absolute_paths;
use crate::engine::Engine;
use crate::error::ClientError;
use crate::wire::SUCCESS;

/// Port of a PostgreSQL server when none is given.
pub const DEFAULT_POSTGRES_PORT: u16 = 5432;

/// Name of the in-memory SQLite3 database. It is passed through unchanged.
pub const SQLITE_IN_MEMORY: &str = ":memory:";

/// Login details for `connect_postgres`.
#[derive(Debug, Clone)]
pub struct PostgresConnection {
    pub host: String,
    pub hostaddr: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub time_formats: Vec<String>,
}

impl Default for PostgresConnection {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            hostaddr: "127.0.0.1".to_string(),
            port: DEFAULT_POSTGRES_PORT,
            dbname: String::new(),
            user: String::new(),
            password: String::new(),
            time_formats: default_time_formats(),
        }
    }
}

/// Settings shared by `read_csv` and `sniff_csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvImport {
    /// The first line holds column names.
    pub header: bool,
    pub quotechar: char,
    pub sep: char,
    /// Lines skipped at the start of each file, before the header.
    pub skip: u32,
}

impl Default for CsvImport {
    fn default() -> Self {
        Self {
            header: true,
            quotechar: '"',
            sep: ',',
            skip: 0,
        }
    }
}

impl CsvImport {
    fn apply(&self, command: Command) -> Command {
        command
            .with("header_", self.header)
            .with("quotechar_", self.quotechar.to_string())
            .with("sep_", self.sep.to_string())
            .with("skip_", self.skip)
    }
}

/// Handle to the engine's database connection.
#[derive(Debug, Clone)]
pub struct Database {
    engine: Engine,
}

impl Engine {
    #[must_use]
    pub fn database(&self) -> Database {
        Database {
            engine: self.clone(),
        }
    }
}

impl Database {
    /// Point the engine at a PostgreSQL database.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine cannot connect.
    pub async fn connect_postgres(&self, connection: &PostgresConnection) -> Result<(), ClientError> {
        let command = Command::new("Database.new", "")
            .with("db_", "postgres")
            .with("host_", connection.host.as_str())
            .with("hostaddr_", connection.hostaddr.as_str())
            .with("port_", connection.port)
            .with("dbname_", connection.dbname.as_str())
            .with("user_", connection.user.as_str())
            .with("password_", connection.password.as_str())
            .with_serialized("time_formats_", &connection.time_formats)?;
        self.engine.send(&command).await?;
        tracing::info!(host = %connection.host, dbname = %connection.dbname, "connected to postgres");
        Ok(())
    }

    /// Point the engine at a SQLite3 file, created if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] when the path cannot be made absolute and
    /// [`ClientError::Engine`] when the engine cannot open the file.
    pub async fn connect_sqlite3(
        &self,
        name: impl AsRef<Path>,
        time_formats: &[String],
    ) -> Result<(), ClientError> {
        let name = name.as_ref();
        let name = if name == Path::new(SQLITE_IN_MEMORY) {
            SQLITE_IN_MEMORY.to_string()
        } else {
            std::path::absolute(name)?.to_string_lossy().into_owned()
        };
        let command = Command::new("Database.new", name.as_str())
            .with("db_", "sqlite3")
            .with_serialized("time_formats_", time_formats)?;
        self.engine.send(&command).await?;
        tracing::info!(path = %name, "connected to sqlite3");
        Ok(())
    }

    /// Drop a table. The engine's reply is not checked.
    ///
    /// # Errors
    ///
    /// Returns connection errors.
    pub async fn drop_table(&self, name: &str) -> Result<(), ClientError> {
        let connection = self
            .engine
            .send_and_receive(&Command::new("Database.drop_table", name))
            .await?;
        connection.close().await;
        Ok(())
    }

    /// Run an SQL statement.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] with the database's message on failure.
    pub async fn execute(&self, query: &str) -> Result<(), ClientError> {
        let mut connection = self
            .engine
            .send_and_receive(&Command::new("Database.execute", ""))
            .await?;
        connection.send_string(query).await?;
        let status = connection.expect_status(SUCCESS).await;
        connection.close().await;
        status
    }

    /// Column names of a table.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the table does not exist.
    pub async fn get_colnames(&self, name: &str) -> Result<Vec<String>, ClientError> {
        self.engine
            .request_json(&Command::new("Database.get_colnames", name))
            .await
    }

    /// Tables and views in the database.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine has no database.
    pub async fn list_tables(&self) -> Result<Vec<String>, ClientError> {
        self.engine
            .request_json(&Command::new("Database.list_tables", ""))
            .await
    }

    /// Load CSV files into the table `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine cannot read the files.
    pub async fn read_csv<P: AsRef<Path>>(
        &self,
        name: &str,
        fnames: &[P],
        import: &CsvImport,
    ) -> Result<(), ClientError> {
        let command = import.apply(
            Command::new("Database.read_csv", name).with_serialized("fnames_", &absolute_paths(fnames)?)?,
        );
        self.engine.send(&command).await
    }

    /// Guess a `CREATE TABLE` statement for CSV files.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine cannot read the files.
    pub async fn sniff_csv<P: AsRef<Path>>(
        &self,
        name: &str,
        fnames: &[P],
        num_lines_sniffed: u32,
        import: &CsvImport,
    ) -> Result<String, ClientError> {
        let command = import.apply(
            Command::new("Database.sniff_csv", name)
                .with_serialized("fnames_", &absolute_paths(fnames)?)?
                .with("num_lines_sniffed_", num_lines_sniffed),
        );
        let mut connection = self.engine.send_and_receive(&command).await?;
        connection.expect_status(SUCCESS).await?;
        let statement = connection.recv_string().await?;
        connection.close().await;
        Ok(statement)
    }
}
