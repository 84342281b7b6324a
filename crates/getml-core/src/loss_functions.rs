//! Loss functions and the scores that go with them.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Objective the feature learner optimizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum LossFunction {
    /// Recommended for regression.
    #[default]
    SquareLoss,
    /// Recommended for classification.
    CrossEntropyLoss,
}

impl LossFunction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SquareLoss => "SquareLoss",
            Self::CrossEntropyLoss => "CrossEntropyLoss",
        }
    }

    /// Score a hyperparameter search optimizes when none is given.
    #[must_use]
    pub const fn default_score(self) -> &'static str {
        match self {
            Self::SquareLoss => "rmse_",
            Self::CrossEntropyLoss => "cross_entropy_",
        }
    }

    /// Scores the engine reports for this loss, in wire spelling.
    #[must_use]
    pub const fn allowed_scores(self) -> &'static [&'static str] {
        match self {
            Self::SquareLoss => &["rmse_", "mae_", "rsquared_"],
            Self::CrossEntropyLoss => &["cross_entropy_", "auc_", "accuracy_"],
        }
    }

    /// Whether this is a classification loss.
    #[must_use]
    pub const fn is_classification(self) -> bool {
        matches!(self, Self::CrossEntropyLoss)
    }
}

impl fmt::Display for LossFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&LossFunction::CrossEntropyLoss).unwrap();
        assert_eq!(json, "\"CrossEntropyLoss\"");
    }

    #[test]
    fn default_score_is_allowed() {
        for loss in [LossFunction::SquareLoss, LossFunction::CrossEntropyLoss] {
            assert!(loss.allowed_scores().contains(&loss.default_score()));
        }
    }
}
