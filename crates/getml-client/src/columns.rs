//! Evaluating column expressions on the engine.

use chrono::NaiveDateTime;
use getml_core::columns::{BooleanColumn, CategoricalColumn, Column, ColumnAggregation, Expr};
use getml_core::table::Series;
use getml_core::Command;

use crate::connection::Connection;
use crate::engine::Engine;
use crate::error::ClientError;
use crate::wire::{FOUND, SUCCESS};

fn is_categorical(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::CategoricalColumn(_) | Expr::VirtualCategoricalColumn(_)
    )
}

fn get_command(kind: &str, expr: &Expr) -> Result<Command, ClientError> {
    Ok(Command::new(kind, expr.df_name()).with_serialized("col_", expr)?)
}

/// Request one numeric column on an open connection.
pub(crate) async fn fetch_numeric(
    connection: &mut Connection,
    expr: &Expr,
) -> Result<Vec<f64>, ClientError> {
    connection.send_command(&get_command("Column.get", expr)?).await?;
    connection.expect_status(FOUND).await?;
    Ok(connection.recv_matrix().await?.iter().copied().collect())
}

/// Request one categorical column on an open connection.
pub(crate) async fn fetch_categorical(
    connection: &mut Connection,
    expr: &Expr,
) -> Result<Vec<String>, ClientError> {
    connection
        .send_command(&get_command("CategoricalColumn.get", expr)?)
        .await?;
    connection.expect_status(FOUND).await?;
    Ok(connection.recv_categorical_matrix().await?.iter().cloned().collect())
}

/// Fetch a column as a local series.
///
/// Time stamp columns come back as [`Series::TimeStamp`] unless some value
/// does not decode (NaN), in which case the raw day counts are kept.
pub(crate) async fn fetch_series(
    connection: &mut Connection,
    expr: &Expr,
) -> Result<Series, ClientError> {
    if is_categorical(expr) {
        return Ok(Series::Text(fetch_categorical(connection, expr).await?));
    }
    let values = fetch_numeric(connection, expr).await?;
    if expr.is_time_stamp() {
        let decoded: Option<Vec<NaiveDateTime>> =
            Series::time_stamps_from_days(&values).into_iter().collect();
        if let Some(stamps) = decoded {
            return Ok(Series::TimeStamp(stamps));
        }
    }
    Ok(Series::Numeric(values))
}

impl Engine {
    /// Values of a numeric column.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the expression cannot be evaluated.
    pub async fn get_column(&self, column: &Column) -> Result<Vec<f64>, ClientError> {
        let mut connection = self.connect().await?;
        let values = fetch_numeric(&mut connection, column.expr()).await?;
        connection.close().await;
        Ok(values)
    }

    /// Values of a time stamp column. NaN becomes `None`.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::get_column`].
    pub async fn get_time_stamps(
        &self,
        column: &Column,
    ) -> Result<Vec<Option<NaiveDateTime>>, ClientError> {
        let days = self.get_column(column).await?;
        Ok(Series::time_stamps_from_days(&days))
    }

    /// Values of a categorical column.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the expression cannot be evaluated.
    pub async fn get_categorical(&self, column: &CategoricalColumn) -> Result<Vec<String>, ClientError> {
        let mut connection = self.connect().await?;
        let values = fetch_categorical(&mut connection, column.expr()).await?;
        connection.close().await;
        Ok(values)
    }

    /// Values of a boolean column.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the expression cannot be evaluated.
    pub async fn get_boolean(&self, column: &BooleanColumn) -> Result<Vec<bool>, ClientError> {
        let command = get_command("BooleanColumn.get", column.expr())?;
        let mut connection = self.send_and_receive(&command).await?;
        connection.expect_status(FOUND).await?;
        let matrix = connection.recv_boolean_matrix().await?;
        connection.close().await;
        Ok(matrix.iter().copied().collect())
    }

    /// Evaluate an aggregation over a whole column.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses, and
    /// [`ClientError::Protocol`] when it answers with an empty matrix.
    pub async fn aggregate(&self, aggregation: &ColumnAggregation) -> Result<f64, ClientError> {
        let command = Command::new("Column.aggregate", "")
            .with_serialized("aggregation_", aggregation)?
            .with("df_name_", aggregation.df_name());
        let mut connection = self.send_and_receive(&command).await?;
        connection.expect_status(SUCCESS).await?;
        let matrix = connection.recv_matrix().await?;
        connection.close().await;
        matrix
            .iter()
            .next()
            .copied()
            .ok_or_else(|| ClientError::Protocol("aggregation returned no value".into()))
    }

    /// Change the unit of a stored numeric column and return the updated handle.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Core`] for virtual columns and
    /// [`ClientError::Engine`] when the engine refuses.
    pub async fn set_unit(&self, column: &Column, unit: &str) -> Result<Column, ClientError> {
        let updated = column.with_unit(unit)?;
        let expr = updated.expr();
        let mut command: Command = serde_json::from_value(serde_json::to_value(expr)?)?;
        command.kind = format!("{}.set_unit", expr.type_name());
        self.send(&command).await?;
        Ok(updated)
    }
}
