//! Engine-level commands: liveness, projects, listings and the engine
//! process itself.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use getml_config::EngineConfig;
use getml_core::Command;
use getml_core::models::{ModelKind, MultirelParams, RelboostParams};
use getml_core::time_stamps::timestamp_prefix;
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpStream;

use crate::connection::Connection;
use crate::error::ClientError;
use crate::models::AnyModel;
use crate::wire::SUCCESS;

/// Interval between liveness checks while waiting for a started engine.
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Deserialize)]
struct ProjectList {
    projects: Vec<String>,
}

/// Handle to a getML engine. Every request opens a fresh connection.
#[derive(Debug, Clone)]
pub struct Engine {
    address: String,
    connect_timeout: Duration,
    startup_timeout: Duration,
    read_timeout: Duration,
    training_timeout: Option<Duration>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl Engine {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            address: config.address(),
            connect_timeout: config.connect_timeout(),
            startup_timeout: config.startup_timeout(),
            read_timeout: config.read_timeout(),
            training_timeout: config.training_timeout(),
        }
    }

    /// `host:port` of the engine.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Limit for replies to training and hyperparameter searches.
    #[must_use]
    pub const fn training_timeout(&self) -> Option<Duration> {
        self.training_timeout
    }

    /// Open a connection whose reads are bounded by the read timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::EngineNotRunning`] when the connection is
    /// refused and [`ClientError::ConnectTimeout`] when it does not complete
    /// in time.
    pub async fn connect(&self) -> Result<Connection, ClientError> {
        let attempt = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address));
        match attempt.await {
            Ok(Ok(stream)) => Ok(Connection::new(stream, Some(self.read_timeout))),
            Ok(Err(error)) if error.kind() == std::io::ErrorKind::ConnectionRefused => {
                Err(ClientError::EngineNotRunning {
                    address: self.address.clone(),
                })
            }
            Ok(Err(error)) => Err(error.into()),
            Err(_) => Err(ClientError::ConnectTimeout {
                address: self.address.clone(),
            }),
        }
    }

    /// Send a command and require `Success!`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] with the engine's reply otherwise.
    pub async fn send(&self, command: &Command) -> Result<(), ClientError> {
        let mut connection = self.send_and_receive(command).await?;
        let status = connection.expect_status(SUCCESS).await;
        connection.close().await;
        status
    }

    /// Send a command and hand over the open connection. The caller reads
    /// the reply and finishes the exchange.
    ///
    /// # Errors
    ///
    /// Returns connection and write errors.
    pub async fn send_and_receive(&self, command: &Command) -> Result<Connection, ClientError> {
        let mut connection = self.connect().await?;
        connection.send_command(command).await?;
        Ok(connection)
    }

    /// Send a command, require `Success!` and decode the JSON that follows.
    pub(crate) async fn request_json<T: serde::de::DeserializeOwned>(
        &self,
        command: &Command,
    ) -> Result<T, ClientError> {
        let mut connection = self.send_and_receive(command).await?;
        connection.expect_status(SUCCESS).await?;
        let value = connection.recv_json().await?;
        connection.close().await;
        Ok(value)
    }

    /// Whether an engine accepts connections at the configured address.
    pub async fn is_alive(&self) -> bool {
        let Ok(mut connection) = self.connect().await else {
            return false;
        };
        let sent = connection.send_command(&Command::new("is_alive", "")).await;
        connection.close().await;
        sent.is_ok()
    }

    /// Select a project, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::EngineNotRunning`] when no engine answers.
    pub async fn set_project(&self, name: &str) -> Result<(), ClientError> {
        if !self.is_alive().await {
            return Err(ClientError::EngineNotRunning {
                address: self.address.clone(),
            });
        }
        self.send(&Command::new("set_project", name)).await?;
        tracing::info!(project = name, "project set");
        Ok(())
    }

    /// Delete a project with all its data frames and models.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses.
    pub async fn delete_project(&self, name: &str) -> Result<(), ClientError> {
        self.send(&Command::new("delete_project", name)).await
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] or [`ClientError::Json`].
    pub async fn list_projects(&self) -> Result<Vec<String>, ClientError> {
        let list: ProjectList = self.request_json(&Command::new("list_projects", "")).await?;
        Ok(list.projects)
    }

    /// Data frames in memory and in the project folder, as reported.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] or [`ClientError::Json`].
    pub async fn list_data_frames(&self) -> Result<Value, ClientError> {
        self.request_json(&Command::new("list_data_frames", "")).await
    }

    /// Models in memory, grouped by type.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] or [`ClientError::Json`].
    pub async fn list_models(&self) -> Result<Value, ClientError> {
        self.request_json(&Command::new("list_models", "")).await
    }

    /// Look up a model by name and refresh a handle of the matching kind.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine names no known kind.
    pub async fn get_model(&self, name: &str) -> Result<AnyModel, ClientError> {
        let mut connection = self
            .send_and_receive(&Command::new("get_model", name))
            .await?;
        let reply = connection.recv_string().await?;
        connection.close().await;
        match ModelKind::from_type_name(&reply) {
            Some(ModelKind::Multirel) => {
                let mut model = self.model(MultirelParams::default()).with_name(name);
                model.refresh().await?;
                Ok(AnyModel::Multirel(model))
            }
            Some(ModelKind::Relboost) => {
                let mut model = self.model(RelboostParams::default()).with_name(name);
                model.refresh().await?;
                Ok(AnyModel::Relboost(model))
            }
            None => Err(ClientError::Engine(reply)),
        }
    }

    /// Ask the engine to shut down. No reply is read.
    ///
    /// # Errors
    ///
    /// Returns connection errors.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        let connection = self.send_and_receive(&Command::new("shutdown", "all")).await?;
        connection.close().await;
        tracing::info!(address = %self.address, "shutdown requested");
        Ok(())
    }

    /// Start the engine found in `path` and wait until it answers.
    ///
    /// Output goes to `log-<YYYY-MM-DDTHH-MM-SS>.txt` in `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] when the script cannot be started and
    /// [`ClientError::StartupTimeout`] when the engine does not answer in time.
    pub async fn run(&self, path: &Path) -> Result<(), ClientError> {
        let script = if cfg!(windows) { "run.bat" } else { "run" };
        let log_name = format!("log-{}.txt", timestamp_prefix(chrono::Local::now().naive_local()));
        let log = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.join(&log_name))?;
        let log_err = log.try_clone()?;

        tokio::process::Command::new(path.join(script))
            .current_dir(path)
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .spawn()?;
        tracing::info!(path = %path.display(), log = %log_name, "engine started, waiting for it to answer");

        let wait = async {
            while !self.is_alive().await {
                tokio::time::sleep(STARTUP_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(self.startup_timeout, wait)
            .await
            .map_err(|_| ClientError::StartupTimeout {
                secs: self.startup_timeout.as_secs(),
            })
    }

    /// Run `sh setup.sh` in `path`. Does nothing on Windows.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ScriptFailed`] for a non-zero exit status.
    pub async fn setup(&self, path: &Path) -> Result<(), ClientError> {
        if cfg!(windows) {
            return Ok(());
        }
        let status = tokio::process::Command::new("sh")
            .arg("setup.sh")
            .current_dir(path)
            .status()
            .await?;
        if status.success() {
            Ok(())
        } else {
            Err(ClientError::ScriptFailed {
                script: "setup.sh".to_string(),
                status: status.to_string(),
            })
        }
    }
}
