//! Predictors trained on top of the learned features.
//!
//! A model may carry one predictor and one feature selector. Both are sent as
//! a `type_`-tagged object, or `null` when absent.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters shared by the linear and logistic regression predictors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LinearParams {
    /// L2 regularization.
    #[serde(rename = "lambda_")]
    pub reg_lambda: f64,
    #[serde(rename = "learning_rate_")]
    pub learning_rate: f64,
}

impl Default for LinearParams {
    fn default() -> Self {
        Self {
            reg_lambda: 1e-10,
            learning_rate: 0.9,
        }
    }
}

/// Gradient boosted trees, configured like the `xgboost` library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct XgBoostParams {
    #[serde(rename = "booster_")]
    pub booster: String,
    #[serde(rename = "colsample_bylevel_")]
    pub colsample_bylevel: f64,
    #[serde(rename = "colsample_bytree_")]
    pub colsample_bytree: f64,
    #[serde(rename = "gamma_")]
    pub gamma: f64,
    #[serde(rename = "learning_rate_")]
    pub learning_rate: f64,
    #[serde(rename = "max_delta_step_")]
    pub max_delta_step: f64,
    #[serde(rename = "max_depth_")]
    pub max_depth: u32,
    #[serde(rename = "min_child_weights_")]
    pub min_child_weight: f64,
    #[serde(rename = "n_estimators_")]
    pub n_estimators: u32,
    #[serde(rename = "normalize_type_")]
    pub normalize_type: String,
    #[serde(rename = "num_parallel_tree_")]
    pub num_parallel_tree: u32,
    #[serde(rename = "n_jobs_")]
    pub n_jobs: u32,
    #[serde(rename = "objective_")]
    pub objective: String,
    #[serde(rename = "one_drop_")]
    pub one_drop: bool,
    #[serde(rename = "rate_drop_")]
    pub rate_drop: f64,
    #[serde(rename = "reg_alpha_")]
    pub reg_alpha: f64,
    #[serde(rename = "reg_lambda_")]
    pub reg_lambda: f64,
    #[serde(rename = "sample_type_")]
    pub sample_type: String,
    #[serde(rename = "silent_")]
    pub silent: bool,
    #[serde(rename = "skip_drop_")]
    pub skip_drop: f64,
    #[serde(rename = "subsample_")]
    pub subsample: f64,
}

impl XgBoostParams {
    pub const CLASSIFIER_OBJECTIVE: &'static str = "binary:logistic";
    pub const REGRESSOR_OBJECTIVE: &'static str = "reg:linear";
}

impl Default for XgBoostParams {
    fn default() -> Self {
        Self {
            booster: "gbtree".into(),
            colsample_bylevel: 1.0,
            colsample_bytree: 1.0,
            gamma: 0.0,
            learning_rate: 0.1,
            max_delta_step: 0.0,
            max_depth: 3,
            min_child_weight: 1.0,
            n_estimators: 100,
            normalize_type: "tree".into(),
            num_parallel_tree: 1,
            n_jobs: 1,
            objective: Self::CLASSIFIER_OBJECTIVE.into(),
            one_drop: false,
            rate_drop: 0.0,
            reg_alpha: 0.0,
            reg_lambda: 1.0,
            sample_type: "uniform".into(),
            silent: true,
            skip_drop: 0.0,
            subsample: 1.0,
        }
    }
}

/// A predictor or feature selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type_")]
pub enum Predictor {
    LinearRegression(LinearParams),
    LogisticRegression(LinearParams),
    /// Both the classifier and the regressor; `objective_` tells them apart.
    #[serde(rename = "XGBoostPredictor")]
    XgBoost(XgBoostParams),
}

/// Predictor families that share a hyperparameter search space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictorFamily {
    Linear,
    XgBoost,
}

impl Predictor {
    #[must_use]
    pub fn linear_regression() -> Self {
        Self::LinearRegression(LinearParams::default())
    }

    #[must_use]
    pub fn logistic_regression() -> Self {
        Self::LogisticRegression(LinearParams::default())
    }

    #[must_use]
    pub fn xgboost_classifier() -> Self {
        Self::XgBoost(XgBoostParams::default())
    }

    /// XGBoost with the regression objective fixed.
    #[must_use]
    pub fn xgboost_regressor() -> Self {
        Self::XgBoost(XgBoostParams {
            objective: XgBoostParams::REGRESSOR_OBJECTIVE.into(),
            ..XgBoostParams::default()
        })
    }

    #[must_use]
    pub const fn family(&self) -> PredictorFamily {
        match self {
            Self::LinearRegression(_) | Self::LogisticRegression(_) => PredictorFamily::Linear,
            Self::XgBoost(_) => PredictorFamily::XgBoost,
        }
    }

    /// The wire `type_` tag.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::LinearRegression(_) => "LinearRegression",
            Self::LogisticRegression(_) => "LogisticRegression",
            Self::XgBoost(_) => "XGBoostPredictor",
        }
    }
}
