//! Aggregations that feature learning may use when building features.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Aggregation available to the Multirel feature learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Aggregation {
    /// Mean of a numeric column.
    #[serde(rename = "AVG")]
    Avg,
    /// Number of rows.
    #[serde(rename = "COUNT")]
    Count,
    /// Number of distinct values.
    #[serde(rename = "COUNT DISTINCT")]
    CountDistinct,
    /// Number of rows minus the number of distinct values.
    #[serde(rename = "COUNT MINUS COUNT DISTINCT")]
    CountMinusCountDistinct,
    #[serde(rename = "MAX")]
    Max,
    #[serde(rename = "MEDIAN")]
    Median,
    #[serde(rename = "MIN")]
    Min,
    /// Standard deviation.
    #[serde(rename = "STDDEV")]
    Stddev,
    #[serde(rename = "SUM")]
    Sum,
    /// Variance.
    #[serde(rename = "VAR")]
    Var,
}

impl Aggregation {
    pub const ALL: [Self; 10] = [
        Self::Avg,
        Self::Count,
        Self::CountDistinct,
        Self::CountMinusCountDistinct,
        Self::Max,
        Self::Median,
        Self::Min,
        Self::Stddev,
        Self::Sum,
        Self::Var,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Avg => "AVG",
            Self::Count => "COUNT",
            Self::CountDistinct => "COUNT DISTINCT",
            Self::CountMinusCountDistinct => "COUNT MINUS COUNT DISTINCT",
            Self::Max => "MAX",
            Self::Median => "MEDIAN",
            Self::Min => "MIN",
            Self::Stddev => "STDDEV",
            Self::Sum => "SUM",
            Self::Var => "VAR",
        }
    }

    /// Parse the engine spelling, ignoring case.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|aggregation| aggregation.as_str().eq_ignore_ascii_case(text.trim()))
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_serde_roundtrip {
        ($name:ident, $variant:expr, $expected:literal) => {
            #[test]
            fn $name() {
                let json = serde_json::to_string(&$variant).unwrap();
                assert_eq!(json, format!("\"{}\"", $expected));
                let back: Aggregation = serde_json::from_str(&json).unwrap();
                assert_eq!(back, $variant);
            }
        };
    }

    test_serde_roundtrip!(avg, Aggregation::Avg, "AVG");
    test_serde_roundtrip!(count_distinct, Aggregation::CountDistinct, "COUNT DISTINCT");
    test_serde_roundtrip!(
        count_minus,
        Aggregation::CountMinusCountDistinct,
        "COUNT MINUS COUNT DISTINCT"
    );
    test_serde_roundtrip!(stddev, Aggregation::Stddev, "STDDEV");

    #[test]
    fn display_matches_serde() {
        for aggregation in Aggregation::ALL {
            let json = serde_json::to_string(&aggregation).unwrap();
            assert_eq!(json, format!("\"{aggregation}\""));
        }
    }

    #[test]
    fn parse_ignores_case() {
        assert_eq!(Aggregation::parse("count distinct"), Some(Aggregation::CountDistinct));
        assert_eq!(Aggregation::parse("mode"), None);
    }
}
