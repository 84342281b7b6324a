//! Hyperparameter searches run by the engine.

use getml_core::hyperopt::{
    HyperoptParams, ParamSpace, Replacement, SearchKind, default_session_name, resolve_score,
};
use getml_core::models::ModelParams;
use getml_core::{Command, CoreError};
use serde::Deserialize;
use serde_json::Value;

use crate::data_frame::DataFrame;
use crate::error::ClientError;
use crate::models::Model;
use crate::wire::{FOUND, SUCCESS};

#[derive(Deserialize)]
struct HyperoptNames {
    names_: Vec<String>,
}

fn warn_replacements(replacements: &[Replacement]) {
    for replacement in replacements {
        tracing::warn!(key = %replacement.key, "{replacement}");
    }
}

/// A search over the hyperparameters of a base model.
///
/// The base model must exist on the engine (see [`Model::send`]) and carry a
/// predictor. Every model fitted during the search is stored under the
/// session name.
#[derive(Debug, Clone)]
pub struct HyperoptSearch<P: ModelParams> {
    kind: SearchKind,
    model: Model<P>,
    param_space: ParamSpace,
    params: HyperoptParams,
}

impl<P: ModelParams> HyperoptSearch<P> {
    /// Prepare a search. Without `param_space` the default space of the
    /// model and predictor is used.
    ///
    /// Ranges and settings outside their legal bounds are replaced, with a
    /// warning per replacement.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingPredictor`] when the model has no
    /// predictor and [`CoreError::InvalidParameter`] for foreign keys in
    /// `param_space`.
    pub fn new(
        kind: SearchKind,
        model: Model<P>,
        param_space: Option<ParamSpace>,
    ) -> Result<Self, ClientError> {
        let predictor = model
            .params()
            .predictor()
            .ok_or(CoreError::MissingPredictor)?
            .clone();
        let mut param_space =
            param_space.unwrap_or_else(|| ParamSpace::default_for(P::KIND, &predictor));
        warn_replacements(&param_space.validate(P::KIND, &predictor)?);

        let mut params = HyperoptParams::for_kind(kind);
        params.session_name =
            default_session_name(kind, P::KIND, chrono::Local::now().naive_local());
        warn_replacements(&params.sanitize());

        Ok(Self {
            kind,
            model,
            param_space,
            params,
        })
    }

    #[must_use]
    pub fn with_session_name(mut self, name: impl Into<String>) -> Self {
        self.params.session_name = name.into();
        self
    }

    /// Change one search setting, e.g. `n_iter`.
    ///
    /// # Errors
    ///
    /// See [`HyperoptParams::set`].
    pub fn set(&mut self, key: &str, value: &Value) -> Result<(), ClientError> {
        warn_replacements(&self.params.set(key, value)?);
        Ok(())
    }

    #[must_use]
    pub const fn kind(&self) -> SearchKind {
        self.kind
    }

    #[must_use]
    pub const fn model(&self) -> &Model<P> {
        &self.model
    }

    #[must_use]
    pub const fn param_space(&self) -> &ParamSpace {
        &self.param_space
    }

    #[must_use]
    pub const fn params(&self) -> &HyperoptParams {
        &self.params
    }

    #[must_use]
    pub fn session_name(&self) -> &str {
        &self.params.session_name
    }

    /// Launch the search and wait for it to finish.
    ///
    /// Models are fitted on `training` and scored on `validation` with
    /// `score`, which falls back to the default score of the loss function.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ColumnMismatch`] when the two populations do
    /// not share their columns and [`ClientError::Engine`] when the base
    /// model is unknown or the search fails.
    pub async fn fit(
        &mut self,
        training: &DataFrame,
        validation: &DataFrame,
        peripheral: &[&DataFrame],
        score: Option<&str>,
    ) -> Result<(), ClientError> {
        training
            .schema()
            .check_same_columns(validation.schema())
            .map_err(ClientError::ColumnMismatch)?;
        self.params.score = Some(resolve_score(self.model.params().loss_function(), score));

        let command = Command::new(P::KIND.command("launch_hyperopt"), self.model.name());
        let mut connection = self.model.engine().send_and_receive(&command).await?;
        connection.expect_status(FOUND).await?;

        let peripheral_names: Vec<&str> = peripheral.iter().map(|frame| frame.name()).collect();
        let command = command
            .with_serialized("peripheral_names_", &peripheral_names)?
            .with("population_training_name_", training.name())
            .with("population_validation_name_", validation.name())
            .with("session_name_", self.params.session_name.as_str())
            .with_serialized("param_space_", &self.param_space)?
            .with_serialized("params_", &self.params)?;
        connection.send_command(&command).await?;
        tracing::info!(session = %self.params.session_name, search = %self.kind, "Launched hyperparameter optimization...");

        connection.set_read_timeout(self.model.engine().training_timeout());
        let status = connection.expect_status(SUCCESS).await;
        connection.close().await;
        status
    }

    /// Every model fitted during the search, refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the session is unknown.
    pub async fn get_models(&self) -> Result<Vec<Model<P>>, ClientError> {
        let command = Command::new(P::KIND.command("get_hyperopt_names"), self.session_name());
        let names: HyperoptNames = self.model.engine().request_json(&command).await?;
        let mut models = Vec::with_capacity(names.names_.len());
        for name in names.names_ {
            let mut model = self.model.engine().model(P::default()).with_name(name);
            model.refresh().await?;
            models.push(model);
        }
        Ok(models)
    }

    /// Scores of every model fitted during the search.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Engine`] when the session is unknown.
    pub async fn get_scores(&self) -> Result<Value, ClientError> {
        let command = Command::new(P::KIND.command("get_hyperopt_scores"), self.session_name());
        self.model.engine().request_json(&command).await
    }
}

#[cfg(test)]
mod tests {
    use getml_core::loss_functions::LossFunction;
    use getml_core::models::RelboostParams;
    use getml_core::predictors::Predictor;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::engine::Engine;

    fn relboost_with_predictor() -> Model<RelboostParams> {
        Engine::default().model(RelboostParams {
            predictor: Some(Predictor::linear_regression()),
            loss_function: LossFunction::SquareLoss,
            ..RelboostParams::default()
        })
    }

    #[test]
    fn search_needs_a_predictor() {
        let model = Engine::default().model(RelboostParams::default());
        let err = HyperoptSearch::new(SearchKind::Random, model, None).unwrap_err();
        assert_eq!(err.to_string(), "No predictor present in supplied model!");
    }

    #[test]
    fn default_session_name_describes_search() {
        let search =
            HyperoptSearch::new(SearchKind::LatinHypercube, relboost_with_predictor(), None).unwrap();
        assert!(search.session_name().ends_with("-hyperopt-latin-relboost"));
        assert_eq!(search.params().n_iter, 30);
        assert!(!search.param_space().is_empty());
    }

    #[test]
    fn invalid_settings_are_replaced() {
        let mut search =
            HyperoptSearch::new(SearchKind::Gaussian, relboost_with_predictor(), None).unwrap();
        search.set("n_iter", &json!(1)).unwrap();
        assert_eq!(search.params().n_iter, 2);
        assert!(search.set("no_such_setting", &json!(1)).is_err());
    }
}
