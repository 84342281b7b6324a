//! One TCP exchange with the engine.

use std::future::Future;
use std::time::Duration;

use getml_core::Command;
use ndarray::Array2;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::error::ClientError;
use crate::wire;

/// An open connection on which a multi-step exchange is carried out.
///
/// Some engine operations must run entirely on one connection, for example
/// a model fit that uploads its data before sending the fit command. The
/// engine blocks if those steps are split across connections.
///
/// Every receive is bounded by the read timeout, if one is set.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    read_timeout: Option<Duration>,
}

/// Await `read`, failing with [`ClientError::ReadTimeout`] after `limit`.
async fn bounded<T>(
    limit: Option<Duration>,
    read: impl Future<Output = Result<T, ClientError>>,
) -> Result<T, ClientError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, read)
            .await
            .map_err(|_| ClientError::ReadTimeout {
                secs: limit.as_secs(),
            })?,
        None => read.await,
    }
}

impl Connection {
    pub(crate) const fn new(stream: TcpStream, read_timeout: Option<Duration>) -> Self {
        Self { stream, read_timeout }
    }

    /// Replace the read timeout. `None` waits as long as the engine needs,
    /// which suits replies that only arrive once training is done.
    pub const fn set_read_timeout(&mut self, read_timeout: Option<Duration>) {
        self.read_timeout = read_timeout;
    }

    /// # Errors
    ///
    /// See [`wire::send_command`].
    pub async fn send_command(&mut self, command: &Command) -> Result<(), ClientError> {
        wire::send_command(&mut self.stream, command).await
    }

    /// # Errors
    ///
    /// See [`wire::send_string`].
    pub async fn send_string(&mut self, text: &str) -> Result<(), ClientError> {
        wire::send_string(&mut self.stream, text).await
    }

    /// # Errors
    ///
    /// See [`wire::send_json`].
    pub async fn send_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ClientError> {
        wire::send_json(&mut self.stream, value).await
    }

    /// # Errors
    ///
    /// See [`wire::recv_string`]. Every receive also fails with
    /// [`ClientError::ReadTimeout`] once the read timeout elapses.
    pub async fn recv_string(&mut self) -> Result<String, ClientError> {
        bounded(self.read_timeout, wire::recv_string(&mut self.stream)).await
    }

    /// Receive a string and decode it as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Json`] when the string is not valid JSON for `T`.
    pub async fn recv_json<T: DeserializeOwned>(&mut self) -> Result<T, ClientError> {
        let text = self.recv_string().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// # Errors
    ///
    /// See [`wire::expect_status`].
    pub async fn expect_status(&mut self, expected: &str) -> Result<(), ClientError> {
        bounded(self.read_timeout, wire::expect_status(&mut self.stream, expected)).await
    }

    /// # Errors
    ///
    /// See [`wire::send_matrix`].
    pub async fn send_matrix(&mut self, matrix: &Array2<f64>) -> Result<(), ClientError> {
        wire::send_matrix(&mut self.stream, matrix).await
    }

    /// # Errors
    ///
    /// See [`wire::send_vector`].
    pub async fn send_vector(&mut self, values: &[f64]) -> Result<(), ClientError> {
        wire::send_vector(&mut self.stream, values).await
    }

    /// # Errors
    ///
    /// See [`wire::send_categorical_vector`].
    pub async fn send_categorical_vector(&mut self, values: &[String]) -> Result<(), ClientError> {
        wire::send_categorical_vector(&mut self.stream, values).await
    }

    /// # Errors
    ///
    /// See [`wire::recv_matrix`].
    pub async fn recv_matrix(&mut self) -> Result<Array2<f64>, ClientError> {
        bounded(self.read_timeout, wire::recv_matrix(&mut self.stream)).await
    }

    /// # Errors
    ///
    /// See [`wire::recv_boolean_matrix`].
    pub async fn recv_boolean_matrix(&mut self) -> Result<Array2<bool>, ClientError> {
        bounded(self.read_timeout, wire::recv_boolean_matrix(&mut self.stream)).await
    }

    /// # Errors
    ///
    /// See [`wire::recv_categorical_matrix`].
    pub async fn recv_categorical_matrix(&mut self) -> Result<Array2<String>, ClientError> {
        bounded(self.read_timeout, wire::recv_categorical_matrix(&mut self.stream)).await
    }

    /// Close the write half so the engine sees end of stream.
    ///
    /// A peer that already hung up is not an error here.
    pub async fn close(mut self) {
        if let Err(err) = self.stream.shutdown().await {
            tracing::debug!(%err, "shutdown failed");
        }
    }
}
