//! In-process stand-in for the getML engine.
//!
//! A script lists, per accepted connection, the messages the engine expects
//! to read and the replies it writes. Everything read is recorded and
//! returned when the script is done.

#![allow(dead_code)]

use getml_client::Engine;
use getml_client::wire;
use getml_config::EngineConfig;
use std::time::Duration;

use ndarray::Array2;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One step of a connection script.
#[derive(Debug, Clone)]
pub enum Step {
    /// Read a string.
    Recv,
    /// Read a numeric matrix.
    RecvMatrix,
    /// Read a categorical matrix.
    RecvCategorical,
    /// Write a string.
    Send(String),
    SendMatrix(Array2<f64>),
    SendCategorical(Vec<String>),
    SendBooleans(Vec<bool>),
    /// Write bytes as they are, framing included.
    SendRaw(Vec<u8>),
    /// Wait before the next step.
    Delay(Duration),
    /// Keep the connection open without ever answering.
    Stall,
}

pub fn recv() -> Step {
    Step::Recv
}

pub fn reply(text: &str) -> Step {
    Step::Send(text.to_string())
}

pub fn success() -> Step {
    reply(wire::SUCCESS)
}

pub fn found() -> Step {
    reply(wire::FOUND)
}

/// Something the fake engine read.
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    Text(String),
    Matrix(Array2<f64>),
    Categorical(Array2<String>),
}

impl Received {
    /// The text parsed as JSON. Panics for matrices and non-JSON text.
    pub fn json(&self) -> Value {
        match self {
            Self::Text(text) => serde_json::from_str(text).unwrap(),
            other => panic!("expected a JSON string, got {other:?}"),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            other => panic!("expected a string, got {other:?}"),
        }
    }

    pub fn matrix(&self) -> &Array2<f64> {
        match self {
            Self::Matrix(matrix) => matrix,
            other => panic!("expected a numeric matrix, got {other:?}"),
        }
    }

    pub fn categorical(&self) -> &Array2<String> {
        match self {
            Self::Categorical(matrix) => matrix,
            other => panic!("expected a categorical matrix, got {other:?}"),
        }
    }
}

pub struct FakeEngine {
    pub engine: Engine,
    handle: JoinHandle<Vec<Vec<Received>>>,
}

impl FakeEngine {
    /// Everything read, per connection.
    pub async fn received(self) -> Vec<Vec<Received>> {
        self.handle.await.unwrap()
    }

    /// The `type_` of the first message on every connection.
    pub async fn command_types(self) -> Vec<String> {
        self.received()
            .await
            .iter()
            .map(|messages| messages[0].json()["type_"].as_str().unwrap().to_string())
            .collect()
    }
}

/// Serve `script`, one entry per connection, in order.
pub async fn serve(script: Vec<Vec<Step>>) -> FakeEngine {
    serve_with(script, EngineConfig::default()).await
}

/// Like [`serve`], with the client built from `config` apart from its address.
pub async fn serve_with(script: Vec<Vec<Step>>, config: EngineConfig) -> FakeEngine {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let mut received = Vec::with_capacity(script.len());
        for steps in script {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut messages = Vec::new();
            for step in steps {
                match step {
                    Step::Recv => {
                        messages.push(Received::Text(wire::recv_string(&mut stream).await.unwrap()));
                    }
                    Step::RecvMatrix => {
                        messages.push(Received::Matrix(wire::recv_matrix(&mut stream).await.unwrap()));
                    }
                    Step::RecvCategorical => messages.push(Received::Categorical(
                        wire::recv_categorical_matrix(&mut stream).await.unwrap(),
                    )),
                    Step::Send(text) => wire::send_string(&mut stream, &text).await.unwrap(),
                    Step::SendMatrix(matrix) => wire::send_matrix(&mut stream, &matrix).await.unwrap(),
                    Step::SendCategorical(values) => {
                        let matrix = Array2::from_shape_vec((values.len(), 1), values).unwrap();
                        wire::send_categorical_matrix(&mut stream, &matrix).await.unwrap();
                    }
                    Step::SendBooleans(values) => {
                        let rows = i32::try_from(values.len()).unwrap();
                        let mut bytes = Vec::new();
                        bytes.extend_from_slice(&rows.to_be_bytes());
                        bytes.extend_from_slice(&1_i32.to_be_bytes());
                        for value in values {
                            bytes.extend_from_slice(&i32::from(value).to_be_bytes());
                        }
                        stream.write_all(&bytes).await.unwrap();
                    }
                    Step::SendRaw(bytes) => stream.write_all(&bytes).await.unwrap(),
                    Step::Delay(duration) => tokio::time::sleep(duration).await,
                    Step::Stall => std::future::pending::<()>().await,
                }
            }
            received.push(messages);
        }
        received
    });

    let engine = Engine::new(&EngineConfig {
        host: "127.0.0.1".into(),
        port,
        ..config
    });
    FakeEngine { engine, handle }
}

/// A column of values as the engine sends it.
pub fn column(values: &[f64]) -> Step {
    Step::SendMatrix(Array2::from_shape_vec((values.len(), 1), values.to_vec()).unwrap())
}
