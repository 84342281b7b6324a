//! Hyperparameter search settings and parameter spaces.
//!
//! The engine runs the search; the client only describes it. Values that
//! the engine cannot handle are replaced by legal ones before launch, and
//! every replacement is reported back as a [`Replacement`] so the caller can
//! log it.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::errors::CoreError;
use crate::loss_functions::LossFunction;
use crate::models::ModelKind;
use crate::predictors::Predictor;
use crate::time_stamps::timestamp_prefix;

/// Smallest positive increment used for open lower bounds.
const RESOLUTION: f64 = 1e-15;
#[allow(clippy::cast_lossless)]
const INT_MAX: f64 = i32::MAX as f64;

// ---------------------------------------------------------------------------
// Algorithms
// ---------------------------------------------------------------------------

/// Strategy that picks the next hyperparameter combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Random,
    LatinHypercube,
    Gaussian,
}

impl SearchKind {
    /// Name used inside generated session names.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::LatinHypercube => "latin",
            Self::Gaussian => "gaussian",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::LatinHypercube => "latin_hypercube",
            Self::Gaussian => "gaussian",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum OptimizationAlgorithm {
    #[default]
    #[serde(rename = "nelderMead")]
    NelderMead,
    #[serde(rename = "bfgs")]
    Bfgs,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum BurnInAlgorithm {
    #[serde(rename = "random")]
    Random,
    #[default]
    #[serde(rename = "latinHypercube")]
    LatinHypercube,
}

/// Kernel of the Gaussian process surrogate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    Matern32,
    #[default]
    Matern52,
    Gauss,
    Exp,
}

// ---------------------------------------------------------------------------
// Replacement
// ---------------------------------------------------------------------------

/// An invalid value that was replaced before launching a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub key: String,
    pub old: String,
    pub new: String,
}

impl Replacement {
    fn new(key: &str, old: impl fmt::Display, new: impl fmt::Display) -> Self {
        Self {
            key: key.to_string(),
            old: old.to_string(),
            new: new.to_string(),
        }
    }

    fn range(key: &str, old: [f64; 2], new: [f64; 2]) -> Self {
        Self::new(
            key,
            format_args!("{},{}", old[0], old[1]),
            format_args!("{},{}", new[0], new[1]),
        )
    }
}

impl fmt::Display for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Replacing invalid value [{}] in key [{}] with new value [{}]",
            self.old, self.key, self.new
        )
    }
}

// ---------------------------------------------------------------------------
// HyperoptParams
// ---------------------------------------------------------------------------

/// Settings of one search, sent as `params_`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HyperoptParams {
    /// Number of models fitted in total.
    pub n_iter: u32,
    /// Share of `n_iter` spent in the burn-in phase.
    pub ratio_iter: f64,
    pub optimization_algorithm: OptimizationAlgorithm,
    pub optimization_burn_in_algorithm: BurnInAlgorithm,
    pub optimization_burn_ins: u32,
    pub surrogate_burn_in_algorithm: BurnInAlgorithm,
    #[serde(rename = "gaussian__kernel")]
    pub gaussian_kernel: Kernel,
    #[serde(rename = "gaussian__optimization_algorithm")]
    pub gaussian_optimization_algorithm: OptimizationAlgorithm,
    #[serde(rename = "gaussian__optimization_burn_in_algorithm")]
    pub gaussian_optimization_burn_in_algorithm: BurnInAlgorithm,
    #[serde(rename = "gaussian__optimization_burn_ins")]
    pub gaussian_optimization_burn_ins: u32,
    pub session_name: String,
    /// Filled in when the search is launched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
}

impl Default for HyperoptParams {
    fn default() -> Self {
        Self {
            n_iter: 100,
            ratio_iter: 0.75,
            optimization_algorithm: OptimizationAlgorithm::NelderMead,
            optimization_burn_in_algorithm: BurnInAlgorithm::LatinHypercube,
            optimization_burn_ins: 15,
            surrogate_burn_in_algorithm: BurnInAlgorithm::LatinHypercube,
            gaussian_kernel: Kernel::Matern52,
            gaussian_optimization_algorithm: OptimizationAlgorithm::NelderMead,
            gaussian_optimization_burn_in_algorithm: BurnInAlgorithm::LatinHypercube,
            gaussian_optimization_burn_ins: 50,
            session_name: String::new(),
            score: None,
        }
    }
}

impl HyperoptParams {
    /// Default settings of a search kind.
    #[must_use]
    pub fn for_kind(kind: SearchKind) -> Self {
        match kind {
            SearchKind::Random => Self {
                n_iter: 30,
                ratio_iter: 1.0,
                surrogate_burn_in_algorithm: BurnInAlgorithm::Random,
                ..Self::default()
            },
            SearchKind::LatinHypercube => Self {
                n_iter: 30,
                ratio_iter: 1.0,
                surrogate_burn_in_algorithm: BurnInAlgorithm::LatinHypercube,
                ..Self::default()
            },
            SearchKind::Gaussian => Self::default(),
        }
    }

    /// Clamp numeric settings into their legal ranges.
    pub fn sanitize(&mut self) -> Vec<Replacement> {
        let mut replaced = Vec::new();
        if self.n_iter < 2 {
            replaced.push(Replacement::new("n_iter", self.n_iter, 2));
            self.n_iter = 2;
        }
        if self.ratio_iter.is_nan() || !(0.0..=1.0).contains(&self.ratio_iter) {
            let clamped = if self.ratio_iter > 1.0 { 1.0 } else { 0.0 };
            replaced.push(Replacement::new("ratio_iter", self.ratio_iter, clamped));
            self.ratio_iter = clamped;
        }
        for (key, burn_ins) in [
            ("optimization_burn_ins", &mut self.optimization_burn_ins),
            ("gaussian__optimization_burn_ins", &mut self.gaussian_optimization_burn_ins),
        ] {
            if *burn_ins < 1 {
                replaced.push(Replacement::new(key, *burn_ins, 1));
                *burn_ins = 1;
            }
        }
        replaced
    }

    /// Set one setting from loosely typed input, such as a CLI flag.
    ///
    /// Unknown algorithm or kernel names fall back to the default and are
    /// reported as replacements.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidParameter`] for unknown keys and
    /// [`CoreError::Validation`] for values of the wrong JSON type.
    pub fn set(&mut self, key: &str, value: &Value) -> Result<Vec<Replacement>, CoreError> {
        let key = key.strip_suffix('_').unwrap_or(key);
        let mut replaced = Vec::new();
        match key {
            "n_iter" => self.n_iter = count(key, value)?,
            "ratio_iter" => self.ratio_iter = number(key, value)?,
            "optimization_burn_ins" => self.optimization_burn_ins = count(key, value)?,
            "gaussian__optimization_burn_ins" => {
                self.gaussian_optimization_burn_ins = count(key, value)?;
            }
            "optimization_algorithm" => {
                self.optimization_algorithm = named(key, value, &mut replaced)?;
            }
            "optimization_burn_in_algorithm" => {
                self.optimization_burn_in_algorithm = named(key, value, &mut replaced)?;
            }
            "surrogate_burn_in_algorithm" => {
                self.surrogate_burn_in_algorithm = named(key, value, &mut replaced)?;
            }
            "gaussian__kernel" => self.gaussian_kernel = named(key, value, &mut replaced)?,
            "gaussian__optimization_algorithm" => {
                self.gaussian_optimization_algorithm = named(key, value, &mut replaced)?;
            }
            "gaussian__optimization_burn_in_algorithm" => {
                self.gaussian_optimization_burn_in_algorithm = named(key, value, &mut replaced)?;
            }
            "session_name" => {
                self.session_name = value
                    .as_str()
                    .ok_or_else(|| only_strings(key))?
                    .to_string();
            }
            other => return Err(CoreError::InvalidParameter(other.to_string())),
        }
        replaced.extend(self.sanitize());
        Ok(replaced)
    }
}

fn only_strings(key: &str) -> CoreError {
    CoreError::Validation(format!("Parameter '{key}' only supports strings!"))
}

fn number(key: &str, value: &Value) -> Result<f64, CoreError> {
    value.as_f64().ok_or_else(|| {
        CoreError::Validation(format!("Parameter '{key}' only supports numerical values!"))
    })
}

/// Non-negative integer setting. Lower limits are applied by `sanitize`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count(key: &str, value: &Value) -> Result<u32, CoreError> {
    let raw = number(key, value)?;
    Ok(raw.clamp(0.0, INT_MAX) as u32)
}

fn named<T>(key: &str, value: &Value, replaced: &mut Vec<Replacement>) -> Result<T, CoreError>
where
    T: for<'de> Deserialize<'de> + Default + Serialize,
{
    let text = value.as_str().ok_or_else(|| only_strings(key))?;
    if let Ok(parsed) = serde_json::from_value::<T>(Value::String(text.to_string())) {
        return Ok(parsed);
    }
    let fallback = T::default();
    let shown = serde_json::to_value(&fallback)
        .ok()
        .and_then(|value| value.as_str().map(String::from))
        .unwrap_or_default();
    replaced.push(Replacement::new(key, text, shown));
    Ok(fallback)
}

// ---------------------------------------------------------------------------
// ParamSpace
// ---------------------------------------------------------------------------

struct Bound {
    key: &'static str,
    low: f64,
    high: f64,
    integer: bool,
}

const fn bound(key: &'static str, low: f64, high: f64, integer: bool) -> Bound {
    Bound { key, low, high, integer }
}

const MULTIREL_BOUNDS: &[Bound] = &[
    bound("grid_factor", RESOLUTION, f64::MAX, false),
    bound("max_length", 0.0, INT_MAX, true),
    bound("min_num_samples", 1.0, INT_MAX, true),
    bound("num_features", 1.0, INT_MAX, true),
    bound("regularization", 0.0, 1.0, false),
    bound("share_aggregations", RESOLUTION, 1.0, false),
    bound("share_selected_features", 0.0, 1.0, false),
    bound("shrinkage", 0.0, 1.0, false),
];

const RELBOOST_BOUNDS: &[Bound] = &[
    bound("max_depth", 0.0, INT_MAX, true),
    bound("min_num_samples", 1.0, INT_MAX, true),
    bound("num_features", 1.0, INT_MAX, true),
    bound("share_selected_features", 0.0, 1.0, false),
    bound("reg_lambda", 0.0, f64::MAX, false),
    bound("shrinkage", 0.0, 1.0, false),
];

const LINEAR_BOUNDS: &[Bound] = &[
    bound("predictor__learning_rate", RESOLUTION, f64::MAX, false),
    bound("predictor__lambda", 0.0, f64::MAX, false),
];

const XGBOOST_BOUNDS: &[Bound] = &[
    bound("predictor__n_estimators", 10.0, INT_MAX, true),
    bound("predictor__learning_rate", 0.0, f64::MAX, false),
    bound("predictor__max_depth", 1.0, INT_MAX, true),
    bound("predictor__reg_lambda", 0.0, f64::MAX, false),
];

fn bounds_for(model: ModelKind, predictor: &Predictor) -> impl Iterator<Item = &'static Bound> {
    let model_bounds = match model {
        ModelKind::Multirel => MULTIREL_BOUNDS,
        ModelKind::Relboost => RELBOOST_BOUNDS,
    };
    let predictor_bounds = match predictor {
        Predictor::LinearRegression(_) | Predictor::LogisticRegression(_) => LINEAR_BOUNDS,
        Predictor::XgBoost(_) => XGBOOST_BOUNDS,
    };
    model_bounds.iter().chain(predictor_bounds)
}

/// Lower and upper bound per hyperparameter, sent as `param_space_`.
///
/// Predictor hyperparameters are prefixed with `predictor__`. A key whose
/// bounds are equal stays fixed during the search.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ParamSpace(BTreeMap<String, [f64; 2]>);

impl ParamSpace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, low: f64, high: f64) -> Self {
        self.0.insert(key.into(), [low, high]);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<[f64; 2]> {
        self.0.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Space searched when the caller does not provide one.
    #[must_use]
    pub fn default_for(model: ModelKind, predictor: &Predictor) -> Self {
        let space = match model {
            ModelKind::Multirel => Self::new()
                .with("grid_factor", 1.0, 16.0)
                .with("max_length", 1.0, 10.0)
                .with("min_num_samples", 100.0, 500.0)
                .with("num_features", 10.0, 500.0)
                .with("regularization", 0.0, 0.01)
                .with("share_aggregations", 0.01, 1.0)
                .with("share_selected_features", 0.1, 1.0)
                .with("shrinkage", 0.01, 0.4),
            ModelKind::Relboost => Self::new()
                .with("max_depth", 1.0, 10.0)
                .with("min_num_samples", 100.0, 500.0)
                .with("num_features", 10.0, 500.0)
                .with("reg_lambda", 0.0, 0.1)
                .with("share_selected_features", 0.1, 1.0)
                .with("shrinkage", 0.01, 0.4),
        };
        match predictor {
            Predictor::LinearRegression(_) => space
                .with("predictor__learning_rate", 0.5, 1.0)
                .with("predictor__lambda", 0.0, 1.0),
            Predictor::LogisticRegression(_) => space
                .with("predictor__learning_rate", 0.0, 1.0)
                .with("predictor__lambda", 0.0, 1.0),
            Predictor::XgBoost(_) => space
                .with("predictor__n_estimators", 10.0, 500.0)
                .with("predictor__learning_rate", 0.0, 1.0)
                .with("predictor__max_depth", 3.0, 15.0)
                .with("predictor__reg_lambda", 0.0, 10.0),
        }
    }

    /// Reorder and clamp every range into the legal bounds of its key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidParameter`] for a key that the model and
    /// predictor combination does not know, and [`CoreError::Validation`]
    /// for NaN bounds.
    pub fn validate(
        &mut self,
        model: ModelKind,
        predictor: &Predictor,
    ) -> Result<Vec<Replacement>, CoreError> {
        let mut replaced = Vec::new();
        for (key, range) in &mut self.0 {
            let Some(legal) = bounds_for(model, predictor).find(|bound| bound.key == key.as_str()) else {
                return Err(CoreError::InvalidParameter(key.clone()));
            };
            if range.iter().any(|value| value.is_nan()) {
                return Err(CoreError::Validation(format!(
                    "Please provide a numerical list of length two for [{key}]"
                )));
            }
            if range[0] > range[1] {
                range.swap(0, 1);
            }
            let before = *range;
            if range[0] < legal.low {
                *range = if range[1] < legal.low {
                    [legal.low, legal.low]
                } else {
                    [legal.low, range[1]]
                };
            }
            if range[0] > legal.high {
                *range = [legal.high, legal.high];
            }
            if range[1] > legal.high {
                range[1] = legal.high;
            }
            if *range != before {
                replaced.push(Replacement::range(key, before, *range));
            }
        }
        Ok(replaced)
    }

    fn is_integer(key: &str) -> bool {
        MULTIREL_BOUNDS
            .iter()
            .chain(RELBOOST_BOUNDS)
            .chain(XGBOOST_BOUNDS)
            .any(|bound| bound.key == key && bound.integer)
    }
}

impl Serialize for ParamSpace {
    /// Integer hyperparameters are written as JSON integers.
    #[allow(clippy::cast_possible_truncation)]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, range) in &self.0 {
            if Self::is_integer(key) && range.iter().all(|value| value.fract().abs() < f64::EPSILON) {
                map.serialize_entry(key, &[range[0] as i64, range[1] as i64])?;
            } else {
                map.serialize_entry(key, range)?;
            }
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Score optimized by a search, in wire spelling.
///
/// A missing trailing underscore is added. Scores that do not fit the loss
/// function fall back to its default score.
#[must_use]
pub fn resolve_score(loss: LossFunction, requested: Option<&str>) -> String {
    let requested = requested.map(|score| {
        if score.ends_with('_') {
            score.to_string()
        } else {
            format!("{score}_")
        }
    });
    match requested {
        Some(score) if loss.allowed_scores().contains(&score.as_str()) => score,
        _ => loss.default_score().to_string(),
    }
}

/// `<YYYY-MM-DDTHH-MM-SS>-hyperopt-<search>-<model>`.
#[must_use]
pub fn default_session_name(search: SearchKind, model: ModelKind, now: NaiveDateTime) -> String {
    format!(
        "{}-hyperopt-{}-{}",
        timestamp_prefix(now),
        search.short_name(),
        model.short_name()
    )
}
