//! Feature learning models held by the engine.
//!
//! A [`Model`] pairs a hyperparameter set with the data model (population
//! and peripheral placeholders) it learns features on. Training, transforming
//! and scoring each run as one session on a single connection: the session is
//! opened, local tables are uploaded as temporary frames, the sub-command is
//! sent and the session is closed.

use std::time::{Duration, Instant};

use getml_core::columns::Column;
use getml_core::models::{ModelDescription, ModelKind, ModelParams, MultirelParams, RelboostParams, Scores};
use getml_core::placeholder::Placeholder;
use getml_core::table::Table;
use getml_core::{Command, CoreError, Role, Schema};
use ndarray::Array2;
use rand::Rng;
use serde_json::Value;

use crate::columns::fetch_numeric;
use crate::connection::Connection;
use crate::data_frame::DataFrame;
use crate::engine::Engine;
use crate::error::ClientError;
use crate::wire::{FOUND, SUCCESS};

const TEMP_PREFIX: &str = "temp-";
const TEMP_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const TEMP_LEN: usize = 15;

/// `temp-` followed by 15 random ASCII letters.
fn temp_name() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..TEMP_LEN)
        .map(|_| char::from(TEMP_LETTERS[rng.gen_range(0..TEMP_LETTERS.len())]))
        .collect();
    format!("{TEMP_PREFIX}{suffix}")
}

/// Training time as `{h}h:{m}m:{s}`, seconds to six decimals.
#[allow(clippy::cast_precision_loss)]
fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = (total % 60) as f64 + f64::from(elapsed.subsec_nanos()) / 1e9;
    let seconds = (seconds * 1e6).round() / 1e6;
    format!("{hours}h:{minutes}m:{seconds:?}")
}

// ---------------------------------------------------------------------------
// Frame sources
// ---------------------------------------------------------------------------

/// Data handed to a model: a frame already in the engine, or a local table
/// uploaded for the duration of the call.
#[derive(Debug, Clone, Copy)]
pub enum FrameSource<'a> {
    Engine(&'a DataFrame),
    Local(&'a Table),
}

impl<'a> From<&'a DataFrame> for FrameSource<'a> {
    fn from(frame: &'a DataFrame) -> Self {
        Self::Engine(frame)
    }
}

impl<'a> From<&'a Table> for FrameSource<'a> {
    fn from(table: &'a Table) -> Self {
        Self::Local(table)
    }
}

/// Which population targets a temporary upload declares.
#[derive(Clone, Copy)]
enum Targets {
    /// Every target of the population placeholder (training).
    All,
    /// Only the placeholder targets the local table actually has.
    Present,
}

struct Session {
    peripheral_names: Vec<String>,
    population: DataFrame,
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Handle to a model of kind `P::KIND`.
#[derive(Debug, Clone)]
pub struct Model<P: ModelParams> {
    engine: Engine,
    name: String,
    params: P,
    population: Option<Placeholder>,
    peripheral: Option<Vec<Placeholder>>,
}

pub type MultirelModel = Model<MultirelParams>;
pub type RelboostModel = Model<RelboostParams>;

impl Engine {
    /// A model with a generated name (`<timestamp>-multirel`, ...).
    #[must_use]
    pub fn model<P: ModelParams>(&self, params: P) -> Model<P> {
        Model::new(self.clone(), params)
    }
}

impl<P: ModelParams> Model<P> {
    #[must_use]
    pub fn new(engine: Engine, params: P) -> Self {
        Self {
            engine,
            name: P::KIND.default_name(chrono::Local::now().naive_local()),
            params,
            population: None,
            peripheral: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the population placeholder and the peripheral placeholders, in
    /// the order peripheral tables will be passed.
    #[must_use]
    pub fn with_data_model(mut self, population: Placeholder, peripheral: Vec<Placeholder>) -> Self {
        self.population = Some(population);
        self.peripheral = Some(peripheral);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> ModelKind {
        P::KIND
    }

    #[must_use]
    pub const fn params(&self) -> &P {
        &self.params
    }

    pub const fn params_mut(&mut self) -> &mut P {
        &mut self.params
    }

    #[must_use]
    pub const fn population(&self) -> Option<&Placeholder> {
        self.population.as_ref()
    }

    #[must_use]
    pub fn peripheral(&self) -> Option<&[Placeholder]> {
        self.peripheral.as_deref()
    }

    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Set one hyperparameter locally. Call [`Model::send`] to apply it.
    ///
    /// # Errors
    ///
    /// See [`ModelParams::set_param`].
    pub fn set_param(&mut self, key: &str, value: Value) -> Result<(), CoreError> {
        self.params.set_param(key, value)
    }

    fn command(&self, operation: &str) -> Command {
        Command::new(P::KIND.command(operation), &self.name)
    }

    fn require_population(&self) -> Result<&Placeholder, ClientError> {
        self.population
            .as_ref()
            .ok_or(ClientError::MissingPlaceholder("Population"))
    }

    fn require_peripheral(&self) -> Result<&[Placeholder], ClientError> {
        self.peripheral
            .as_deref()
            .ok_or(ClientError::MissingPlaceholder("Peripheral"))
    }

    // -- lifecycle ---------------------------------------------------------

    /// Create or replace the model on the engine.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingPlaceholder`] without a data model and
    /// [`ClientError::Engine`] when the engine refuses.
    pub async fn send(&self) -> Result<(), ClientError> {
        let population = self.require_population()?;
        let peripheral: Vec<&str> = self
            .require_peripheral()?
            .iter()
            .map(|placeholder| placeholder.name.as_str())
            .collect();
        let command = Command::new(P::KIND.type_name(), &self.name)
            .with_serialized("population_", population)?
            .with_serialized("peripheral_", &peripheral)?
            .with("hyperparameters_", Value::Object(self.params.to_hyperparameters()?));
        self.engine.send(&command).await?;
        tracing::debug!(model = %self.name, kind = %P::KIND, "model sent");
        Ok(())
    }

    /// Replace hyperparameters and data model with what the engine holds.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the reply is not a model
    /// description.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let mut connection = self.engine.send_and_receive(&self.command("refresh")).await?;
        let reply = connection.recv_string().await?;
        connection.close().await;
        if !reply.starts_with('{') {
            return Err(ClientError::Engine(reply));
        }
        let description: ModelDescription = serde_json::from_str(&reply)?;
        let ignored = self.params.merge_hyperparameters(&description.hyperparameters)?;
        if !ignored.is_empty() {
            tracing::debug!(model = %self.name, ?ignored, "refresh: ignored unknown hyperparameters");
        }
        self.peripheral = Some(description.peripherals()?);
        self.population = Some(description.population());
        Ok(())
    }

    /// Load the model from the project folder, then refresh.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when no such model was saved.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        self.engine.send(&self.command("load")).await?;
        self.refresh().await
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses.
    pub async fn save(&self) -> Result<(), ClientError> {
        self.engine.send(&self.command("save")).await
    }

    /// Copy hyperparameters and placeholders of the model `other`, then refresh.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when `other` does not exist.
    pub async fn copy(&mut self, other: &str) -> Result<(), ClientError> {
        self.engine
            .send(&self.command("copy").with("other_", other))
            .await?;
        self.refresh().await
    }

    /// Delete the model from memory, and from disk unless `mem_only`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the engine refuses.
    pub async fn delete(self, mem_only: bool) -> Result<(), ClientError> {
        self.engine
            .send(&self.command("delete").with("mem_only_", mem_only))
            .await
    }

    /// SQL statements equivalent to the learned features.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the model is not fitted.
    pub async fn to_sql(&self) -> Result<String, ClientError> {
        let mut connection = self.engine.send_and_receive(&self.command("to_sql")).await?;
        connection.expect_status(FOUND).await?;
        let sql = connection.recv_string().await?;
        connection.close().await;
        Ok(sql)
    }

    // -- sessions ----------------------------------------------------------

    async fn open_session(&self, operation: &str) -> Result<Connection, ClientError> {
        let mut connection = self.engine.send_and_receive(&self.command(operation)).await?;
        if let Err(error) = connection.expect_status(FOUND).await {
            connection.close().await;
            return Err(error);
        }
        Ok(connection)
    }

    async fn close_session(&self, connection: &mut Connection) -> Result<(), ClientError> {
        connection.send_command(&self.command("close")).await?;
        connection.expect_status(SUCCESS).await
    }

    async fn upload_frames(
        &self,
        connection: &mut Connection,
        population: FrameSource<'_>,
        peripheral: &[FrameSource<'_>],
        targets: Targets,
    ) -> Result<Session, ClientError> {
        let mut peripheral_names = Vec::with_capacity(peripheral.len());
        for (index, source) in peripheral.iter().enumerate() {
            let name = match source {
                FrameSource::Engine(frame) => frame.name().to_string(),
                FrameSource::Local(table) => {
                    let placeholder = self
                        .require_peripheral()?
                        .get(index)
                        .ok_or(ClientError::MissingPlaceholder("Peripheral"))?;
                    let schema = placeholder.schema.clone().with(Role::Target, Vec::<String>::new());
                    let frame = self.temp_frame(schema);
                    frame.send_via(connection, table).await?;
                    frame.name().to_string()
                }
            };
            peripheral_names.push(name);
        }

        let population = match population {
            FrameSource::Engine(frame) => frame.clone(),
            FrameSource::Local(table) => {
                let placeholder = self.require_population()?;
                let declared = placeholder.schema.names(Role::Target);
                let kept: Vec<String> = match targets {
                    Targets::All => declared.to_vec(),
                    Targets::Present => declared
                        .iter()
                        .filter(|name| table.column(name).is_some())
                        .cloned()
                        .collect(),
                };
                let frame = self.temp_frame(placeholder.schema.clone().with(Role::Target, kept));
                frame.send_via(connection, table).await?;
                frame
            }
        };

        Ok(Session {
            peripheral_names,
            population,
        })
    }

    fn temp_frame(&self, schema: Schema) -> DataFrame {
        DataFrame::new(self.engine.clone(), temp_name(), schema).with_units(self.params.units().clone())
    }

    /// Learn features (and train the predictor, if any) on the given data.
    ///
    /// Local tables are uploaded as temporary frames. Once trained, the model
    /// is saved and refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingPlaceholder`] when a local table has no
    /// placeholder and [`ClientError::Engine`] when training fails.
    pub async fn fit(
        &mut self,
        population: FrameSource<'_>,
        peripheral: &[FrameSource<'_>],
    ) -> Result<(), ClientError> {
        let mut connection = self.open_session("fit").await?;
        let session = self
            .upload_frames(&mut connection, population, peripheral, Targets::All)
            .await?;

        let command = self
            .command("fit")
            .with_serialized("peripheral_names_", &session.peripheral_names)?
            .with("population_name_", session.population.name());
        connection.send_command(&command).await?;
        tracing::info!(model = %self.name, "Loaded data. Features are now being trained...");

        connection.set_read_timeout(self.engine.training_timeout());
        let begin = Instant::now();
        let reply = connection.recv_string().await?;
        let elapsed = begin.elapsed();

        if reply.contains("Trained") {
            tracing::info!(model = %self.name, time_taken = %format_elapsed(elapsed), "{reply}");
            self.close_session(&mut connection).await?;
        } else if reply.contains("has already been fitted") {
            tracing::info!(model = %self.name, "{reply}");
        } else {
            connection.close().await;
            return Err(ClientError::Engine(reply));
        }
        connection.close().await;

        self.save().await?;
        self.refresh().await
    }

    async fn run_transform(
        &self,
        connection: &mut Connection,
        session: &Session,
        score: bool,
        predict: bool,
        table_name: &str,
    ) -> Result<Option<Array2<f64>>, ClientError> {
        let command = self
            .command("transform")
            .with("score_", score)
            .with("predict_", predict)
            .with_serialized("peripheral_names_", &session.peripheral_names)?
            .with("population_name_", session.population.name())
            .with("table_name_", table_name);
        connection.send_command(&command).await?;
        connection.set_read_timeout(self.engine.training_timeout());
        connection.expect_status(SUCCESS).await?;
        if table_name.is_empty() {
            Ok(Some(connection.recv_matrix().await?))
        } else {
            Ok(None)
        }
    }

    async fn transform_session(
        &self,
        population: FrameSource<'_>,
        peripheral: &[FrameSource<'_>],
        predict: bool,
        table_name: &str,
    ) -> Result<Option<Array2<f64>>, ClientError> {
        let mut connection = self.open_session("transform").await?;
        let session = self
            .upload_frames(&mut connection, population, peripheral, Targets::Present)
            .await?;
        let output = self
            .run_transform(&mut connection, &session, false, predict, table_name)
            .await?;
        self.close_session(&mut connection).await?;
        connection.close().await;
        Ok(output)
    }

    /// Learned features for the population.
    ///
    /// With a non-empty `table_name` the features are written to that
    /// database table and `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the model is not fitted.
    pub async fn transform(
        &self,
        population: FrameSource<'_>,
        peripheral: &[FrameSource<'_>],
        table_name: &str,
    ) -> Result<Option<Array2<f64>>, ClientError> {
        self.transform_session(population, peripheral, false, table_name)
            .await
    }

    /// Predictions for the population. Needs a predictor.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the model is not fitted or has
    /// no predictor.
    pub async fn predict(
        &self,
        population: FrameSource<'_>,
        peripheral: &[FrameSource<'_>],
        table_name: &str,
    ) -> Result<Option<Array2<f64>>, ClientError> {
        self.transform_session(population, peripheral, true, table_name)
            .await
    }

    /// Predict the population and score the predictions against its targets.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the model is not fitted and
    /// [`ClientError::Protocol`] when the target columns disagree in length.
    pub async fn score(
        &self,
        population: FrameSource<'_>,
        peripheral: &[FrameSource<'_>],
    ) -> Result<Scores, ClientError> {
        let mut connection = self.open_session("transform").await?;
        let session = self
            .upload_frames(&mut connection, population, peripheral, Targets::Present)
            .await?;
        let yhat = self
            .run_transform(&mut connection, &session, true, true, "")
            .await?
            .ok_or_else(|| ClientError::Protocol("transform returned no predictions".into()))?;

        let mut targets = Vec::new();
        for name in session.population.target_names() {
            let column = Column::stored(session.population.name(), name, Role::Target, "");
            targets.push(fetch_numeric(&mut connection, column.expr()).await?);
        }
        self.close_session(&mut connection).await?;
        connection.close().await;

        let y = target_matrix(&targets)?;
        let mut connection = self.open_session("score").await?;
        connection.send_matrix(&yhat).await?;
        connection.send_matrix(&y).await?;
        connection.expect_status(SUCCESS).await?;
        let scores: Scores = connection.recv_json().await?;
        connection.close().await;

        self.save().await?;
        Ok(scores)
    }
}

/// Stack target columns side by side.
fn target_matrix(columns: &[Vec<f64>]) -> Result<Array2<f64>, ClientError> {
    let rows = columns.first().map_or(0, Vec::len);
    if columns.iter().any(|column| column.len() != rows) {
        return Err(ClientError::Protocol("target columns differ in length".into()));
    }
    Ok(Array2::from_shape_fn((rows, columns.len()), |(row, col)| {
        columns[col][row]
    }))
}

// ---------------------------------------------------------------------------
// AnyModel
// ---------------------------------------------------------------------------

/// A model whose kind is only known at runtime.
#[derive(Debug, Clone)]
pub enum AnyModel {
    Multirel(MultirelModel),
    Relboost(RelboostModel),
}

impl AnyModel {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Multirel(model) => model.name(),
            Self::Relboost(model) => model.name(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ModelKind {
        match self {
            Self::Multirel(_) => ModelKind::Multirel,
            Self::Relboost(_) => ModelKind::Relboost,
        }
    }

    /// # Errors
    ///
    /// See [`Model::to_sql`].
    pub async fn to_sql(&self) -> Result<String, ClientError> {
        match self {
            Self::Multirel(model) => model.to_sql().await,
            Self::Relboost(model) => model.to_sql().await,
        }
    }

    /// # Errors
    ///
    /// See [`Model::delete`].
    pub async fn delete(self, mem_only: bool) -> Result<(), ClientError> {
        match self {
            Self::Multirel(model) => model.delete(mem_only).await,
            Self::Relboost(model) => model.delete(mem_only).await,
        }
    }

    /// Hyperparameters in wire form.
    ///
    /// # Errors
    ///
    /// See [`ModelParams::to_hyperparameters`].
    pub fn hyperparameters(&self) -> Result<serde_json::Map<String, Value>, CoreError> {
        match self {
            Self::Multirel(model) => model.params().to_hyperparameters(),
            Self::Relboost(model) => model.params().to_hyperparameters(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn temp_names_are_prefixed_ascii_letters() {
        let name = temp_name();
        assert!(name.starts_with("temp-"));
        let suffix = &name[TEMP_PREFIX.len()..];
        assert_eq!(suffix.len(), 15);
        assert!(suffix.chars().all(|c| c.is_ascii_alphabetic()));
        assert_ne!(temp_name(), temp_name());
    }

    #[test]
    fn elapsed_time_is_split_into_hours_minutes_seconds() {
        assert_eq!(format_elapsed(Duration::from_millis(3_725_500)), "1h:2m:5.5");
        assert_eq!(format_elapsed(Duration::from_secs(59)), "0h:0m:59.0");
    }

    #[test]
    fn targets_are_stacked_as_columns() {
        let y = target_matrix(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(y.shape(), &[2, 2]);
        assert!((y[[1, 0]] - 2.0).abs() < f64::EPSILON);
        assert!((y[[0, 1]] - 3.0).abs() < f64::EPSILON);
        assert!(target_matrix(&[vec![1.0], vec![]]).is_err());
    }

    #[tokio::test]
    async fn send_needs_a_data_model() {
        let model = Engine::default().model(RelboostParams::default());
        let err = model.send().await.unwrap_err();
        assert_eq!(err.to_string(), "Population cannot be None!");
    }

    #[test]
    fn default_name_ends_with_kind() {
        let model = Engine::default().model(MultirelParams::default());
        assert!(model.name().ends_with("-multirel"));
        assert_eq!(model.kind(), ModelKind::Multirel);
    }
}
