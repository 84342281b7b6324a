//! Framing of the engine's TCP protocol.
//!
//! Every number on the wire is big-endian. A string is an `i32` byte length
//! followed by UTF-8 bytes. A matrix is an `i32` row count, an `i32` column
//! count and then the cells in row-major order: `f64` for numeric matrices,
//! `i32` (`1` is true) for boolean matrices and strings for categorical ones.
//!
//! The functions here work on any async byte stream so they can be tested
//! against in-memory pipes.

use getml_core::Command;
use ndarray::Array2;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ClientError;

/// Acknowledges a command.
pub const SUCCESS: &str = "Success!";

/// Acknowledges that a named object exists and more data follows.
pub const FOUND: &str = "Found!";

/// Largest single read issued while receiving a payload.
pub const CHUNK_SIZE: usize = 2048;

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// Fill `buf` completely, reading at most [`CHUNK_SIZE`] bytes at a time.
async fn fill<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<(), ClientError> {
    let mut filled = 0;
    while filled < buf.len() {
        let end = (filled + CHUNK_SIZE).min(buf.len());
        let read = reader.read(&mut buf[filled..end]).await?;
        if read == 0 {
            return Err(ClientError::ConnectionBroken);
        }
        filled += read;
    }
    Ok(())
}

/// Read `len` bytes. The buffer grows as chunks arrive, so a header that
/// announces more than the peer sends costs no more memory than was sent.
async fn recv_bytes<R: AsyncRead + Unpin>(reader: &mut R, len: usize) -> Result<Vec<u8>, ClientError> {
    let mut buf = Vec::with_capacity(len.min(CHUNK_SIZE));
    let mut chunk = [0_u8; CHUNK_SIZE];
    while buf.len() < len {
        let want = (len - buf.len()).min(CHUNK_SIZE);
        let read = reader.read(&mut chunk[..want]).await?;
        if read == 0 {
            return Err(ClientError::ConnectionBroken);
        }
        buf.extend_from_slice(&chunk[..read]);
    }
    Ok(buf)
}

async fn recv_i32<R: AsyncRead + Unpin>(reader: &mut R) -> Result<i32, ClientError> {
    let mut raw = [0_u8; 4];
    fill(reader, &mut raw).await?;
    Ok(i32::from_be_bytes(raw))
}

fn to_length(value: i32, what: &str) -> Result<usize, ClientError> {
    usize::try_from(value)
        .map_err(|_| ClientError::Protocol(format!("negative {what} on the wire: {value}")))
}

fn to_wire_length(value: usize, what: &str) -> Result<i32, ClientError> {
    i32::try_from(value)
        .map_err(|_| ClientError::Protocol(format!("{what} too large for the wire: {value}")))
}

async fn recv_shape<R: AsyncRead + Unpin>(reader: &mut R) -> Result<(usize, usize), ClientError> {
    let rows = to_length(recv_i32(reader).await?, "row count")?;
    let cols = to_length(recv_i32(reader).await?, "column count")?;
    Ok((rows, cols))
}

async fn send_shape<W: AsyncWrite + Unpin>(
    writer: &mut W,
    (rows, cols): (usize, usize),
) -> Result<(), ClientError> {
    let mut header = [0_u8; 8];
    header[..4].copy_from_slice(&to_wire_length(rows, "row count")?.to_be_bytes());
    header[4..].copy_from_slice(&to_wire_length(cols, "column count")?.to_be_bytes());
    writer.write_all(&header).await?;
    Ok(())
}

fn cell_count((rows, cols): (usize, usize), cell_size: usize) -> Result<usize, ClientError> {
    rows.checked_mul(cols)
        .and_then(|cells| cells.checked_mul(cell_size))
        .ok_or_else(|| ClientError::Protocol(format!("matrix of shape {rows}x{cols} is too large")))
}

fn into_matrix<T>(shape: (usize, usize), cells: Vec<T>) -> Result<Array2<T>, ClientError> {
    Array2::from_shape_vec(shape, cells).map_err(|e| ClientError::Protocol(e.to_string()))
}

// ---------------------------------------------------------------------------
// Strings and commands
// ---------------------------------------------------------------------------

/// Send a length-prefixed UTF-8 string.
///
/// # Errors
///
/// Returns [`ClientError::Io`] when the write fails.
pub async fn send_string<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> Result<(), ClientError> {
    let len = to_wire_length(text.len(), "string length")?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(text.as_bytes()).await?;
    Ok(())
}

/// Receive a length-prefixed UTF-8 string.
///
/// # Errors
///
/// Returns [`ClientError::ConnectionBroken`] when the peer hangs up and
/// [`ClientError::Protocol`] for negative lengths or invalid UTF-8.
pub async fn recv_string<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String, ClientError> {
    let len = to_length(recv_i32(reader).await?, "string length")?;
    let bytes = recv_bytes(reader, len).await?;
    String::from_utf8(bytes).map_err(|e| ClientError::Protocol(e.to_string()))
}

/// Serialize any value to JSON and send it as a string.
///
/// # Errors
///
/// Returns [`ClientError::Json`] or [`ClientError::Io`].
pub async fn send_json<W: AsyncWrite + Unpin, T: Serialize + ?Sized>(
    writer: &mut W,
    value: &T,
) -> Result<(), ClientError> {
    send_string(writer, &serde_json::to_string(value)?).await
}

/// Send a command envelope.
///
/// # Errors
///
/// Returns [`ClientError::Core`] when the command cannot be serialized and
/// [`ClientError::Io`] when the write fails.
pub async fn send_command<W: AsyncWrite + Unpin>(writer: &mut W, command: &Command) -> Result<(), ClientError> {
    tracing::debug!(command = %command.kind, name = %command.name, "sending command");
    send_string(writer, &command.to_json()?).await
}

/// Read one status string and fail unless it is `expected`.
///
/// # Errors
///
/// Returns [`ClientError::Engine`] carrying the engine's message verbatim.
pub async fn expect_status<R: AsyncRead + Unpin>(reader: &mut R, expected: &str) -> Result<(), ClientError> {
    let message = recv_string(reader).await?;
    if message == expected {
        Ok(())
    } else {
        Err(ClientError::Engine(message))
    }
}

// ---------------------------------------------------------------------------
// Matrices
// ---------------------------------------------------------------------------

/// Send a numeric matrix.
///
/// # Errors
///
/// Returns [`ClientError::Io`] when the write fails.
pub async fn send_matrix<W: AsyncWrite + Unpin>(writer: &mut W, matrix: &Array2<f64>) -> Result<(), ClientError> {
    send_shape(writer, matrix.dim()).await?;
    let mut body = Vec::with_capacity(matrix.len() * 8);
    for value in matrix {
        body.extend_from_slice(&value.to_be_bytes());
    }
    writer.write_all(&body).await?;
    Ok(())
}

/// Send a numeric vector as a `[len, 1]` matrix.
///
/// # Errors
///
/// Returns [`ClientError::Io`] when the write fails.
pub async fn send_vector<W: AsyncWrite + Unpin>(writer: &mut W, values: &[f64]) -> Result<(), ClientError> {
    send_shape(writer, (values.len(), 1)).await?;
    let body: Vec<u8> = values.iter().flat_map(|value| value.to_be_bytes()).collect();
    writer.write_all(&body).await?;
    Ok(())
}

/// Receive a numeric matrix.
///
/// # Errors
///
/// Returns [`ClientError::ConnectionBroken`] or [`ClientError::Protocol`].
pub async fn recv_matrix<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Array2<f64>, ClientError> {
    let shape = recv_shape(reader).await?;
    let bytes = recv_bytes(reader, cell_count(shape, 8)?).await?;
    let cells = bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0_u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_be_bytes(raw)
        })
        .collect();
    into_matrix(shape, cells)
}

/// Receive a boolean matrix sent as `i32` cells.
///
/// # Errors
///
/// Returns [`ClientError::ConnectionBroken`] or [`ClientError::Protocol`].
pub async fn recv_boolean_matrix<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Array2<bool>, ClientError> {
    let shape = recv_shape(reader).await?;
    let bytes = recv_bytes(reader, cell_count(shape, 4)?).await?;
    let cells = bytes
        .chunks_exact(4)
        .map(|chunk| {
            let mut raw = [0_u8; 4];
            raw.copy_from_slice(chunk);
            i32::from_be_bytes(raw) == 1
        })
        .collect();
    into_matrix(shape, cells)
}

/// Send a matrix of strings.
///
/// # Errors
///
/// Returns [`ClientError::Io`] when the write fails.
pub async fn send_categorical_matrix<W: AsyncWrite + Unpin>(
    writer: &mut W,
    matrix: &Array2<String>,
) -> Result<(), ClientError> {
    send_shape(writer, matrix.dim()).await?;
    for cell in matrix {
        send_string(writer, cell).await?;
    }
    Ok(())
}

/// Send strings as a `[len, 1]` categorical matrix.
///
/// # Errors
///
/// Returns [`ClientError::Io`] when the write fails.
pub async fn send_categorical_vector<W: AsyncWrite + Unpin>(
    writer: &mut W,
    values: &[String],
) -> Result<(), ClientError> {
    send_shape(writer, (values.len(), 1)).await?;
    for value in values {
        send_string(writer, value).await?;
    }
    Ok(())
}

/// Receive a matrix of strings.
///
/// # Errors
///
/// Returns [`ClientError::ConnectionBroken`] or [`ClientError::Protocol`].
pub async fn recv_categorical_matrix<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<Array2<String>, ClientError> {
    let shape = recv_shape(reader).await?;
    let count = cell_count(shape, 1)?;
    let mut cells = Vec::with_capacity(count.min(1 << 16));
    for _ in 0..count {
        cells.push(recv_string(reader).await?);
    }
    into_matrix(shape, cells)
}
