//! Reference implementations of the feature learning aggregations.
//!
//! Targets of the generated datasets are these aggregations applied to the
//! matching peripheral rows. Statistics follow the usual sample conventions:
//! `STDDEV` and `VAR` divide by `n - 1` and are NaN for a single value.

use std::collections::HashSet;

use getml_core::aggregations::Aggregation;

/// Aggregate `values`. Empty input yields NaN for every aggregation except
/// the counts, which yield `0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate(aggregation: Aggregation, values: &[f64]) -> f64 {
    let count = values.len() as f64;
    match aggregation {
        Aggregation::Count => count,
        Aggregation::CountDistinct => distinct(values),
        Aggregation::CountMinusCountDistinct => count - distinct(values),
        Aggregation::Sum => {
            if values.is_empty() {
                f64::NAN
            } else {
                values.iter().sum()
            }
        }
        Aggregation::Avg => mean(values),
        Aggregation::Max => values.iter().copied().reduce(f64::max).unwrap_or(f64::NAN),
        Aggregation::Min => values.iter().copied().reduce(f64::min).unwrap_or(f64::NAN),
        Aggregation::Median => median(values),
        Aggregation::Var => variance(values),
        Aggregation::Stddev => variance(values).sqrt(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn distinct(values: &[f64]) -> f64 {
    values
        .iter()
        .map(|value| value.to_bits())
        .collect::<HashSet<_>>()
        .len() as f64
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    }
}

#[allow(clippy::cast_precision_loss)]
fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = mean(values);
    let squares: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
    squares / (values.len() - 1) as f64
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Aggregation::Count, 4.0)]
    #[case(Aggregation::CountDistinct, 3.0)]
    #[case(Aggregation::CountMinusCountDistinct, 1.0)]
    #[case(Aggregation::Sum, 10.0)]
    #[case(Aggregation::Avg, 2.5)]
    #[case(Aggregation::Max, 5.0)]
    #[case(Aggregation::Min, 1.0)]
    #[case(Aggregation::Median, 2.0)]
    #[case(Aggregation::Var, 3.0)]
    fn aggregates_sample(#[case] aggregation: Aggregation, #[case] expected: f64) {
        let values = [1.0, 2.0, 2.0, 5.0];
        assert!((aggregate(aggregation, &values) - expected).abs() < 1e-12);
    }

    #[test]
    fn empty_groups() {
        assert!(aggregate(Aggregation::Count, &[]).abs() < f64::EPSILON);
        assert!(aggregate(Aggregation::Sum, &[]).is_nan());
        assert!(aggregate(Aggregation::Stddev, &[1.0]).is_nan());
    }
}
