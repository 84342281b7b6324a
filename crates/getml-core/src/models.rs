//! Feature learning models: kinds, hyperparameters and engine descriptions.
//!
//! Two model kinds exist, Multirel and Relboost. Their hyperparameters are
//! plain structs whose serde form is exactly what the engine expects under
//! `hyperparameters_` (every key carries a trailing underscore).

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::aggregations::Aggregation;
use crate::errors::CoreError;
use crate::loss_functions::LossFunction;
use crate::placeholder::Placeholder;
use crate::predictors::Predictor;
use crate::roles::{Schema, empty_string_as_default};
use crate::time_stamps::timestamp_prefix;

// ---------------------------------------------------------------------------
// ModelKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ModelKind {
    #[serde(rename = "MultirelModel")]
    Multirel,
    #[serde(rename = "RelboostModel")]
    Relboost,
}

impl ModelKind {
    /// The engine's type name, also the prefix of every model command.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Multirel => "MultirelModel",
            Self::Relboost => "RelboostModel",
        }
    }

    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Multirel => "multirel",
            Self::Relboost => "relboost",
        }
    }

    /// Command type for an operation, e.g. `MultirelModel.fit`.
    #[must_use]
    pub fn command(self, operation: &str) -> String {
        format!("{}.{operation}", self.type_name())
    }

    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "MultirelModel" => Some(Self::Multirel),
            "RelboostModel" => Some(Self::Relboost),
            _ => None,
        }
    }

    /// Model name used when the caller does not pick one.
    #[must_use]
    pub fn default_name(self, now: NaiveDateTime) -> String {
        format!("{}-{}", timestamp_prefix(now), self.short_name())
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

// ---------------------------------------------------------------------------
// Hyperparameters
// ---------------------------------------------------------------------------

/// Behaviour shared by the hyperparameter sets of all model kinds.
pub trait ModelParams:
    Serialize + DeserializeOwned + Clone + Default + fmt::Debug + Send + Sync + 'static
{
    const KIND: ModelKind;

    fn loss_function(&self) -> LossFunction;

    fn predictor(&self) -> Option<&Predictor>;

    fn units(&self) -> &BTreeMap<String, String>;

    fn session_name(&self) -> &str;

    fn set_session_name(&mut self, name: String);

    /// Hyperparameters in wire form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] if serialization fails.
    fn to_hyperparameters(&self) -> Result<Map<String, Value>, CoreError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(CoreError::Validation(format!(
                "hyperparameters serialized to {other}, expected an object"
            ))),
        }
    }

    /// Set one hyperparameter. `key` may be given with or without the
    /// trailing underscore.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidParameter`] for unknown keys and
    /// [`CoreError::Json`] when `value` has the wrong type.
    fn set_param(&mut self, key: &str, value: Value) -> Result<(), CoreError> {
        let bare = key.strip_suffix('_').unwrap_or(key);
        let wire = format!("{bare}_");
        let mut map = self.to_hyperparameters()?;
        if !map.contains_key(&wire) {
            return Err(CoreError::InvalidParameter(bare.to_string()));
        }
        map.insert(wire, value);
        *self = serde_json::from_value(Value::Object(map))?;
        Ok(())
    }

    /// Overlay the known keys of an engine reply and return the keys that
    /// were ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] when a known key has the wrong type.
    fn merge_hyperparameters(&mut self, reply: &Map<String, Value>) -> Result<Vec<String>, CoreError> {
        let mut map = self.to_hyperparameters()?;
        let mut ignored = Vec::new();
        for (key, value) in reply {
            if map.contains_key(key) {
                map.insert(key.clone(), value.clone());
            } else {
                ignored.push(key.clone());
            }
        }
        *self = serde_json::from_value(Value::Object(map))?;
        Ok(ignored)
    }
}

/// Hyperparameters of a Multirel model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MultirelParams {
    /// Aggregations the feature learner may use.
    #[serde(rename = "aggregation_", deserialize_with = "empty_string_as_default")]
    pub aggregation: Vec<Aggregation>,
    #[serde(rename = "allow_sets_")]
    pub allow_sets: bool,
    /// Lag step for time series. `0.0` disables lags.
    #[serde(rename = "delta_t_")]
    pub delta_t: f64,
    #[serde(rename = "feature_selector_")]
    pub feature_selector: Option<Predictor>,
    /// Density of the grid of critical values tried for numerical columns.
    #[serde(rename = "grid_factor_")]
    pub grid_factor: f64,
    #[serde(rename = "include_categorical_")]
    pub include_categorical: bool,
    #[serde(rename = "loss_function_")]
    pub loss_function: LossFunction,
    /// Maximum number of conditions joined by `AND` inside one bracket.
    #[serde(rename = "max_length_")]
    pub max_length: u32,
    #[serde(rename = "min_num_samples_")]
    pub min_num_samples: u32,
    #[serde(rename = "num_features_")]
    pub num_features: u32,
    /// Subfeatures per snowflake join.
    #[serde(rename = "num_subfeatures_")]
    pub num_subfeatures: u32,
    /// `0` lets the engine decide.
    #[serde(rename = "num_threads_")]
    pub num_threads: i32,
    #[serde(rename = "predictor_")]
    pub predictor: Option<Predictor>,
    #[serde(rename = "regularization_")]
    pub regularization: f64,
    #[serde(rename = "round_robin_")]
    pub round_robin: bool,
    #[serde(rename = "sampling_factor_")]
    pub sampling_factor: f64,
    #[serde(rename = "seed_")]
    pub seed: u32,
    #[serde(rename = "session_name_")]
    pub session_name: String,
    #[serde(rename = "share_aggregations_")]
    pub share_aggregations: f64,
    #[serde(rename = "share_conditions_")]
    pub share_conditions: f64,
    /// Share of features kept by the feature selector. `0.0` keeps all.
    #[serde(rename = "share_selected_features_")]
    pub share_selected_features: f64,
    #[serde(rename = "shrinkage_")]
    pub shrinkage: f64,
    /// Column name to unit. Columns with equal units may be compared.
    #[serde(rename = "units_", deserialize_with = "empty_string_as_default")]
    pub units: BTreeMap<String, String>,
    #[serde(rename = "use_timestamps_")]
    pub use_timestamps: bool,
}

impl Default for MultirelParams {
    fn default() -> Self {
        Self {
            aggregation: vec![Aggregation::Avg, Aggregation::Count, Aggregation::Sum],
            allow_sets: true,
            delta_t: 0.0,
            feature_selector: None,
            grid_factor: 1.0,
            include_categorical: false,
            loss_function: LossFunction::SquareLoss,
            max_length: 4,
            min_num_samples: 200,
            num_features: 100,
            num_subfeatures: 10,
            num_threads: 0,
            predictor: None,
            regularization: 0.0,
            round_robin: false,
            sampling_factor: 1.0,
            seed: 5489,
            session_name: String::new(),
            share_aggregations: 0.25,
            share_conditions: 1.0,
            share_selected_features: 0.0,
            shrinkage: 0.0,
            units: BTreeMap::new(),
            use_timestamps: true,
        }
    }
}

/// Hyperparameters of a Relboost model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RelboostParams {
    #[serde(rename = "delta_t_")]
    pub delta_t: f64,
    #[serde(rename = "feature_selector_")]
    pub feature_selector: Option<Predictor>,
    /// Minimum loss reduction required to split a node.
    #[serde(rename = "gamma_")]
    pub gamma: f64,
    #[serde(rename = "include_categorical_")]
    pub include_categorical: bool,
    #[serde(rename = "loss_function_")]
    pub loss_function: LossFunction,
    #[serde(rename = "max_depth_")]
    pub max_depth: u32,
    #[serde(rename = "min_num_samples_")]
    pub min_num_samples: u32,
    #[serde(rename = "num_features_")]
    pub num_features: u32,
    #[serde(rename = "num_subfeatures_")]
    pub num_subfeatures: u32,
    #[serde(rename = "num_threads_")]
    pub num_threads: i32,
    #[serde(rename = "predictor_")]
    pub predictor: Option<Predictor>,
    /// L2 regularization on the weights.
    #[serde(rename = "reg_lambda_")]
    pub reg_lambda: f64,
    #[serde(rename = "sampling_factor_")]
    pub sampling_factor: f64,
    #[serde(rename = "seed_")]
    pub seed: u32,
    #[serde(rename = "session_name_")]
    pub session_name: String,
    #[serde(rename = "share_selected_features_")]
    pub share_selected_features: f64,
    #[serde(rename = "shrinkage_")]
    pub shrinkage: f64,
    #[serde(rename = "silent_")]
    pub silent: bool,
    /// Index of the target to learn features for.
    #[serde(rename = "target_num_")]
    pub target_num: u32,
    #[serde(rename = "units_", deserialize_with = "empty_string_as_default")]
    pub units: BTreeMap<String, String>,
    #[serde(rename = "use_timestamps_")]
    pub use_timestamps: bool,
}

impl Default for RelboostParams {
    fn default() -> Self {
        Self {
            delta_t: 0.0,
            feature_selector: None,
            gamma: 0.0,
            include_categorical: false,
            loss_function: LossFunction::SquareLoss,
            max_depth: 3,
            min_num_samples: 200,
            num_features: 100,
            num_subfeatures: 100,
            num_threads: 0,
            predictor: None,
            reg_lambda: 0.01,
            sampling_factor: 1.0,
            seed: 5843,
            session_name: String::new(),
            share_selected_features: 0.0,
            shrinkage: 0.3,
            silent: false,
            target_num: 0,
            units: BTreeMap::new(),
            use_timestamps: true,
        }
    }
}

macro_rules! impl_model_params {
    ($params:ty, $kind:expr) => {
        impl ModelParams for $params {
            const KIND: ModelKind = $kind;

            fn loss_function(&self) -> LossFunction {
                self.loss_function
            }

            fn predictor(&self) -> Option<&Predictor> {
                self.predictor.as_ref()
            }

            fn units(&self) -> &BTreeMap<String, String> {
                &self.units
            }

            fn session_name(&self) -> &str {
                &self.session_name
            }

            fn set_session_name(&mut self, name: String) {
                self.session_name = name;
            }
        }
    };
}

impl_model_params!(MultirelParams, ModelKind::Multirel);
impl_model_params!(RelboostParams, ModelKind::Relboost);

// ---------------------------------------------------------------------------
// Engine descriptions
// ---------------------------------------------------------------------------

/// Reply to `<Kind>.refresh`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ModelDescription {
    #[serde(rename = "hyperparameters_", default)]
    pub hyperparameters: Map<String, Value>,
    #[serde(rename = "placeholder_")]
    pub placeholder: Placeholder,
    #[serde(rename = "population_schema_")]
    pub population_schema: Schema,
    #[serde(rename = "peripheral_", default, deserialize_with = "empty_string_as_default")]
    pub peripheral: Vec<String>,
    #[serde(rename = "peripheral_schema_", default, deserialize_with = "empty_string_as_default")]
    pub peripheral_schema: Vec<Schema>,
}

impl ModelDescription {
    /// The population placeholder, with the schema the engine recorded.
    #[must_use]
    pub fn population(&self) -> Placeholder {
        let mut population = self.placeholder.clone();
        population.schema = self.population_schema.clone();
        population
    }

    /// One placeholder per peripheral table.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] when the engine reports a different
    /// number of peripheral names and schemas.
    pub fn peripherals(&self) -> Result<Vec<Placeholder>, CoreError> {
        if self.peripheral.len() != self.peripheral_schema.len() {
            return Err(CoreError::Validation(
                "peripheral_ and peripheral_schema_ must have the same length!".into(),
            ));
        }
        Ok(self
            .peripheral
            .iter()
            .zip(&self.peripheral_schema)
            .map(|(name, schema)| Placeholder::new(name.clone(), schema.clone()))
            .collect())
    }
}

/// Scores reported by the engine: metric name (`rmse_`, `auc_`, ...) to
/// one value per target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Scores(pub BTreeMap<String, Value>);

impl Scores {
    /// Values of one metric. Accepts the name with or without trailing `_`.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<Vec<f64>> {
        let bare = name.strip_suffix('_').unwrap_or(name);
        let value = self.0.get(&format!("{bare}_")).or_else(|| self.0.get(bare))?;
        match value {
            Value::Number(number) => number.as_f64().map(|value| vec![value]),
            Value::Array(values) => values.iter().map(Value::as_f64).collect(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn default_names_use_kind_suffix() {
        let now = NaiveDate::from_ymd_opt(2019, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        assert_eq!(ModelKind::Multirel.default_name(now), "2019-05-06T07-08-09-multirel");
        assert_eq!(ModelKind::Relboost.command("fit"), "RelboostModel.fit");
    }

    #[test]
    fn multirel_defaults_serialize_with_underscores() {
        let map = MultirelParams::default().to_hyperparameters().unwrap();
        assert_eq!(map["aggregation_"], json!(["AVG", "COUNT", "SUM"]));
        assert_eq!(map["loss_function_"], "SquareLoss");
        assert_eq!(map["seed_"], 5489);
        assert_eq!(map["predictor_"], Value::Null);
        assert!(map.keys().all(|key| key.ends_with('_')));
    }

    #[test]
    fn set_param_accepts_both_spellings() {
        let mut params = RelboostParams::default();
        params.set_param("max_depth", json!(5)).unwrap();
        params.set_param("shrinkage_", json!(0.1)).unwrap();
        assert_eq!(params.max_depth, 5);
        assert!((params.shrinkage - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn set_param_rejects_unknown_key() {
        let mut params = MultirelParams::default();
        let err = params.set_param("max_depth", json!(5)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameter max_depth.");
    }

    #[test]
    fn set_param_rejects_wrong_type() {
        let mut params = MultirelParams::default();
        assert!(matches!(
            params.set_param("num_features", json!("many")),
            Err(CoreError::Json(_))
        ));
        assert_eq!(params.num_features, 100);
    }

    #[test]
    fn predictor_can_be_set_through_json() {
        let mut params = MultirelParams::default();
        let predictor = serde_json::to_value(Predictor::linear_regression()).unwrap();
        params.set_param("predictor", predictor).unwrap();
        assert_eq!(params.predictor(), Some(&Predictor::linear_regression()));
    }

    #[test]
    fn merge_keeps_current_values_and_reports_unknown_keys() {
        let mut params = MultirelParams {
            num_features: 42,
            ..MultirelParams::default()
        };
        let reply = json!({"max_length_": 7, "host_": "localhost"});
        let ignored = params.merge_hyperparameters(reply.as_object().unwrap()).unwrap();
        assert_eq!(params.max_length, 7);
        assert_eq!(params.num_features, 42);
        assert_eq!(ignored, vec!["host_"]);
    }

    #[test]
    fn description_rebuilds_placeholders() {
        let reply = json!({
            "hyperparameters_": {"num_features_": 10},
            "placeholder_": {"name_": "population", "joined_tables_": ""},
            "population_schema_": {"join_keys_": ["id"], "time_stamps_": ["ts"], "targets_": ["y"]},
            "peripheral_": ["peripheral"],
            "peripheral_schema_": [{"join_keys_": ["id"], "numericals_": ["x"]}]
        });
        let description: ModelDescription = serde_json::from_value(reply).unwrap();
        let population = description.population();
        assert_eq!(population.schema.targets, vec!["y"]);
        let peripherals = description.peripherals().unwrap();
        assert_eq!(peripherals[0].name, "peripheral");
        assert_eq!(peripherals[0].schema.numerical, vec!["x"]);
    }

    #[test]
    fn mismatched_peripheral_lists_are_rejected() {
        let reply = json!({
            "placeholder_": {"name_": "population"},
            "population_schema_": {},
            "peripheral_": ["a", "b"],
            "peripheral_schema_": [{}]
        });
        let description: ModelDescription = serde_json::from_value(reply).unwrap();
        assert!(matches!(description.peripherals(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn scores_accept_scalars_and_vectors() {
        let scores: Scores =
            serde_json::from_value(json!({"rmse_": [0.5, 0.25], "auc_": 0.9})).unwrap();
        assert_eq!(scores.metric("rmse"), Some(vec![0.5, 0.25]));
        assert_eq!(scores.metric("auc_"), Some(vec![0.9]));
        assert_eq!(scores.metric("mae"), None);
    }
}
