//! Artificial population/peripheral datasets with known targets.
//!
//! Every generator draws a population table whose `join_key` is the row
//! number, one or two peripheral tables whose join keys point at random
//! rows of their parent, and time stamps uniform in `[0, 1)` days. The
//! population's `targets` column is an aggregation over the peripheral rows
//! that match on `join_key`, happened no later than the population row, and
//! satisfy a generator-specific condition. Rows without any match get `0.0`.

use getml_core::aggregations::Aggregation;
use getml_core::table::Table;
use getml_core::{Role, Schema};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::aggregate::aggregate;
use crate::error::DatasetError;

const COLUMN_01: &str = "column_01";
const COLUMN_02: &str = "column_02";
const JOIN_KEY: &str = "join_key";
const JOIN_KEY_2: &str = "join_key2";
const TIME_STAMP: &str = "time_stamp";
const TARGETS: &str = "targets";

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

/// Size, seed and target aggregation of a two-table dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub n_rows_population: usize,
    pub n_rows_peripheral: usize,
    /// Fixed seed for reproducible output. `None` draws from the OS.
    pub seed: Option<u64>,
    pub aggregation: Aggregation,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            n_rows_population: 500,
            n_rows_peripheral: 125_000,
            seed: None,
            aggregation: Aggregation::Count,
        }
    }
}

/// Size, seed and aggregations of the snowflake dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnowflakeOptions {
    pub n_rows_population: usize,
    pub n_rows_peripheral1: usize,
    pub n_rows_peripheral2: usize,
    /// Aggregates the first peripheral table onto the population.
    pub aggregation1: Aggregation,
    /// Aggregates the second peripheral table onto the first.
    pub aggregation2: Aggregation,
    pub seed: Option<u64>,
}

impl Default for SnowflakeOptions {
    fn default() -> Self {
        Self {
            n_rows_population: 500,
            n_rows_peripheral1: 5_000,
            n_rows_peripheral2: 125_000,
            aggregation1: Aggregation::Sum,
            aggregation2: Aggregation::Count,
            seed: None,
        }
    }
}

/// One generated table with the roles its columns should be uploaded with.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTable {
    pub name: &'static str,
    pub table: Table,
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub population: GeneratedTable,
    /// Peripheral tables, parents before children.
    pub peripheral: Vec<GeneratedTable>,
}

impl Dataset {
    /// Population first, then the peripheral tables.
    pub fn tables(&self) -> impl Iterator<Item = &GeneratedTable> {
        std::iter::once(&self.population).chain(&self.peripheral)
    }
}

// ---------------------------------------------------------------------------
// Sampling helpers
// ---------------------------------------------------------------------------

fn rng(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

fn uniform(rng: &mut StdRng, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.r#gen::<f64>()).collect()
}

/// Uniform in `[-1, 1)`.
fn signed(rng: &mut StdRng, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.r#gen::<f64>() * 2.0 - 1.0).collect()
}

/// Integers `0..=9`.
fn digits(rng: &mut StdRng, n: usize) -> Vec<f64> {
    (0..n).map(|_| f64::from(rng.gen_range(0_u8..10))).collect()
}

fn foreign_keys(
    rng: &mut StdRng,
    n: usize,
    parent_rows: usize,
    parent: &'static str,
) -> Result<Vec<usize>, DatasetError> {
    if n > 0 && parent_rows == 0 {
        return Err(DatasetError::EmptyJoinTarget {
            table: parent,
            rows: parent_rows,
        });
    }
    Ok((0..n).map(|_| rng.gen_range(0..parent_rows)).collect())
}

fn to_text(values: &[f64]) -> Vec<String> {
    values.iter().map(|value| format!("{value}")).collect()
}

fn key_text(keys: impl IntoIterator<Item = usize>) -> Vec<String> {
    keys.into_iter().map(|key| key.to_string()).collect()
}

/// Aggregate the `values` of child rows onto their parent rows.
///
/// `matches(parent, child)` decides whether a child row takes part. Parents
/// without any matching child get `0.0`, as do NaN aggregates.
fn aggregate_onto(
    parent_rows: usize,
    keys: &[usize],
    values: &[f64],
    aggregation: Aggregation,
    mut matches: impl FnMut(usize, usize) -> bool,
) -> Vec<f64> {
    let mut groups = vec![Vec::new(); parent_rows];
    for (child, &parent) in keys.iter().enumerate() {
        if matches(parent, child) {
            groups[parent].push(values[child]);
        }
    }
    groups
        .iter()
        .map(|group| {
            let value = aggregate(aggregation, group);
            if value.is_nan() { 0.0 } else { value }
        })
        .collect()
}

fn schema(numeric_role: Role, join_keys: &[&str], extra: Option<(Role, &str)>) -> Schema {
    let mut schema = Schema::default()
        .with(numeric_role, [COLUMN_01])
        .with(Role::JoinKey, join_keys.iter().copied())
        .with(Role::TimeStamp, [TIME_STAMP]);
    if let Some((role, name)) = extra {
        schema.names_mut(role).push(name.to_string());
    }
    schema
}

/// Population table shared by every generator.
fn population(column_01: Table, time_stamps: Vec<f64>, targets: Vec<f64>) -> Result<Table, DatasetError> {
    let rows = time_stamps.len();
    Ok(column_01
        .with_column(JOIN_KEY, key_text(0..rows))?
        .with_column(TIME_STAMP, time_stamps)?
        .with_column(TARGETS, targets)?)
}

fn two_tables(
    population_table: Table,
    population_role: Role,
    peripheral_table: Table,
    peripheral_schema: Schema,
) -> Dataset {
    Dataset {
        population: GeneratedTable {
            name: "population",
            table: population_table,
            schema: schema(population_role, &[JOIN_KEY], Some((Role::Target, TARGETS))),
        },
        peripheral: vec![GeneratedTable {
            name: "peripheral",
            table: peripheral_table,
            schema: peripheral_schema,
        }],
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Numerical `column_01` in `[-1, 1)`. Peripheral rows count when they lie
/// within half a day before the population row.
///
/// # Errors
///
/// Returns [`DatasetError::EmptyJoinTarget`] for peripheral rows without a
/// population to join on.
pub fn make_numerical(options: &Options) -> Result<Dataset, DatasetError> {
    let mut rng = rng(options.seed);
    let population_values = signed(&mut rng, options.n_rows_population);
    let population_ts = uniform(&mut rng, options.n_rows_population);
    let peripheral_values = signed(&mut rng, options.n_rows_peripheral);
    let keys = foreign_keys(&mut rng, options.n_rows_peripheral, options.n_rows_population, "population")?;
    let peripheral_ts = uniform(&mut rng, options.n_rows_peripheral);

    let targets = aggregate_onto(
        options.n_rows_population,
        &keys,
        &peripheral_values,
        options.aggregation,
        |parent, child| {
            peripheral_ts[child] <= population_ts[parent]
                && peripheral_ts[child] >= population_ts[parent] - 0.5
        },
    );

    let population_table = population(
        Table::new().with_column(COLUMN_01, population_values)?,
        population_ts,
        targets,
    )?;
    let peripheral_table = Table::new()
        .with_column(COLUMN_01, peripheral_values)?
        .with_column(JOIN_KEY, key_text(keys))?
        .with_column(TIME_STAMP, peripheral_ts)?;
    tracing::debug!(dataset = "numerical", rows = options.n_rows_population, "dataset generated");
    Ok(two_tables(
        population_table,
        Role::Numerical,
        peripheral_table,
        schema(Role::Numerical, &[JOIN_KEY], None),
    ))
}

/// Categorical population `column_01` (`"0"` to `"9"`) and discrete
/// peripheral `column_01` (`-11` to `10`). Only positive peripheral values
/// take part.
///
/// # Errors
///
/// Returns [`DatasetError::EmptyJoinTarget`] for peripheral rows without a
/// population to join on.
pub fn make_discrete(options: &Options) -> Result<Dataset, DatasetError> {
    let mut rng = rng(options.seed);
    let population_values = digits(&mut rng, options.n_rows_population);
    let population_ts = uniform(&mut rng, options.n_rows_population);
    let peripheral_values: Vec<f64> = (0..options.n_rows_peripheral)
        .map(|_| f64::from(rng.gen_range(-11_i8..11)))
        .collect();
    let keys = foreign_keys(&mut rng, options.n_rows_peripheral, options.n_rows_population, "population")?;
    let peripheral_ts = uniform(&mut rng, options.n_rows_peripheral);

    let targets = aggregate_onto(
        options.n_rows_population,
        &keys,
        &peripheral_values,
        options.aggregation,
        |parent, child| peripheral_ts[child] <= population_ts[parent] && peripheral_values[child] > 0.0,
    );

    let population_table = population(
        Table::new().with_column(COLUMN_01, to_text(&population_values))?,
        population_ts,
        targets,
    )?;
    let peripheral_table = Table::new()
        .with_column(COLUMN_01, peripheral_values)?
        .with_column(JOIN_KEY, key_text(keys))?
        .with_column(TIME_STAMP, peripheral_ts)?;
    tracing::debug!(dataset = "discrete", rows = options.n_rows_population, "dataset generated");
    Ok(two_tables(
        population_table,
        Role::Categorical,
        peripheral_table,
        schema(Role::Discrete, &[JOIN_KEY], None),
    ))
}

/// Categorical `column_01` (`"0"` to `"9"`) in both tables. Peripheral rows
/// in categories `1`, `2` and `9` are left out.
///
/// # Errors
///
/// Returns [`DatasetError::EmptyJoinTarget`] for peripheral rows without a
/// population to join on.
pub fn make_categorical(options: &Options) -> Result<Dataset, DatasetError> {
    let mut rng = rng(options.seed);
    let population_values = digits(&mut rng, options.n_rows_population);
    let population_ts = uniform(&mut rng, options.n_rows_population);
    let peripheral_values = digits(&mut rng, options.n_rows_peripheral);
    let keys = foreign_keys(&mut rng, options.n_rows_peripheral, options.n_rows_population, "population")?;
    let peripheral_ts = uniform(&mut rng, options.n_rows_peripheral);

    let excluded = [1.0, 2.0, 9.0];
    let targets = aggregate_onto(
        options.n_rows_population,
        &keys,
        &peripheral_values,
        options.aggregation,
        |parent, child| {
            peripheral_ts[child] <= population_ts[parent]
                && !excluded.contains(&peripheral_values[child])
        },
    );

    let population_table = population(
        Table::new().with_column(COLUMN_01, to_text(&population_values))?,
        population_ts,
        targets,
    )?;
    let peripheral_table = Table::new()
        .with_column(COLUMN_01, to_text(&peripheral_values))?
        .with_column(JOIN_KEY, key_text(keys))?
        .with_column(TIME_STAMP, peripheral_ts)?;
    tracing::debug!(dataset = "categorical", rows = options.n_rows_population, "dataset generated");
    Ok(two_tables(
        population_table,
        Role::Categorical,
        peripheral_table,
        schema(Role::Categorical, &[JOIN_KEY], None),
    ))
}

/// Numerical `column_01` in both tables, compared across tables: a
/// peripheral row takes part when its value exceeds the population's value
/// minus `0.5`.
///
/// # Errors
///
/// Returns [`DatasetError::EmptyJoinTarget`] for peripheral rows without a
/// population to join on.
pub fn make_same_units_numerical(options: &Options) -> Result<Dataset, DatasetError> {
    let mut rng = rng(options.seed);
    let population_values = signed(&mut rng, options.n_rows_population);
    let population_ts = uniform(&mut rng, options.n_rows_population);
    let peripheral_values = signed(&mut rng, options.n_rows_peripheral);
    let keys = foreign_keys(&mut rng, options.n_rows_peripheral, options.n_rows_population, "population")?;
    let peripheral_ts = uniform(&mut rng, options.n_rows_peripheral);

    let targets = aggregate_onto(
        options.n_rows_population,
        &keys,
        &peripheral_values,
        options.aggregation,
        |parent, child| {
            peripheral_ts[child] <= population_ts[parent]
                && peripheral_values[child] > population_values[parent] - 0.5
        },
    );

    let population_table = population(
        Table::new().with_column(COLUMN_01, population_values)?,
        population_ts,
        targets,
    )?;
    let peripheral_table = Table::new()
        .with_column(COLUMN_01, peripheral_values)?
        .with_column(JOIN_KEY, key_text(keys))?
        .with_column(TIME_STAMP, peripheral_ts)?;
    tracing::debug!(dataset = "same_units_numerical", rows = options.n_rows_population, "dataset generated");
    Ok(two_tables(
        population_table,
        Role::Numerical,
        peripheral_table,
        schema(Role::Numerical, &[JOIN_KEY], None),
    ))
}

/// Categorical `column_01` in both tables and numerical peripheral
/// `column_02`, aggregated over the peripheral rows whose category equals
/// the population row's.
///
/// # Errors
///
/// Returns [`DatasetError::EmptyJoinTarget`] for peripheral rows without a
/// population to join on.
pub fn make_same_units_categorical(options: &Options) -> Result<Dataset, DatasetError> {
    let mut rng = rng(options.seed);
    let population_values = digits(&mut rng, options.n_rows_population);
    let population_ts = uniform(&mut rng, options.n_rows_population);
    let peripheral_values = digits(&mut rng, options.n_rows_peripheral);
    let peripheral_numbers = signed(&mut rng, options.n_rows_peripheral);
    let keys = foreign_keys(&mut rng, options.n_rows_peripheral, options.n_rows_population, "population")?;
    let peripheral_ts = uniform(&mut rng, options.n_rows_peripheral);

    let targets = aggregate_onto(
        options.n_rows_population,
        &keys,
        &peripheral_numbers,
        options.aggregation,
        |parent, child| {
            peripheral_ts[child] <= population_ts[parent]
                && peripheral_values[child].to_bits() == population_values[parent].to_bits()
        },
    );

    let population_table = population(
        Table::new().with_column(COLUMN_01, to_text(&population_values))?,
        population_ts,
        targets,
    )?;
    let peripheral_table = Table::new()
        .with_column(COLUMN_01, to_text(&peripheral_values))?
        .with_column(COLUMN_02, peripheral_numbers)?
        .with_column(JOIN_KEY, key_text(keys))?
        .with_column(TIME_STAMP, peripheral_ts)?;
    tracing::debug!(dataset = "same_units_categorical", rows = options.n_rows_population, "dataset generated");
    Ok(two_tables(
        population_table,
        Role::Categorical,
        peripheral_table,
        schema(Role::Categorical, &[JOIN_KEY], Some((Role::Numerical, COLUMN_02))),
    ))
}

/// A population, a first peripheral table joined on `join_key` and a second
/// peripheral table joined onto the first on `join_key2`.
///
/// The second table is aggregated onto the first with `aggregation2` over
/// rows within half a day before the first table's row; the result is then
/// aggregated onto the population with `aggregation1`.
///
/// # Errors
///
/// Returns [`DatasetError::EmptyJoinTarget`] when a peripheral table has
/// rows but its parent has none.
pub fn make_snowflake(options: &SnowflakeOptions) -> Result<Dataset, DatasetError> {
    let mut rng = rng(options.seed);
    let n_population = options.n_rows_population;
    let n_first = options.n_rows_peripheral1;
    let n_second = options.n_rows_peripheral2;

    let population_values = signed(&mut rng, n_population);
    let population_ts = uniform(&mut rng, n_population);

    let first_values = signed(&mut rng, n_first);
    let first_keys = foreign_keys(&mut rng, n_first, n_population, "population")?;
    let first_ts = uniform(&mut rng, n_first);

    let second_values = signed(&mut rng, n_second);
    let second_keys = foreign_keys(&mut rng, n_second, n_first, "peripheral")?;
    let second_ts = uniform(&mut rng, n_second);

    let intermediate = aggregate_onto(
        n_first,
        &second_keys,
        &second_values,
        options.aggregation2,
        |parent, child| second_ts[child] <= first_ts[parent] && second_ts[child] >= first_ts[parent] - 0.5,
    );
    let targets = aggregate_onto(
        n_population,
        &first_keys,
        &intermediate,
        options.aggregation1,
        |parent, child| first_ts[child] <= population_ts[parent],
    );

    let population_table = population(
        Table::new().with_column(COLUMN_01, population_values)?,
        population_ts,
        targets,
    )?;
    let first_table = Table::new()
        .with_column(COLUMN_01, first_values)?
        .with_column(JOIN_KEY, key_text(first_keys))?
        .with_column(JOIN_KEY_2, key_text(0..n_first))?
        .with_column(TIME_STAMP, first_ts)?;
    let second_table = Table::new()
        .with_column(COLUMN_01, second_values)?
        .with_column(JOIN_KEY_2, key_text(second_keys))?
        .with_column(TIME_STAMP, second_ts)?;
    tracing::debug!(dataset = "snowflake", rows = n_population, "dataset generated");

    Ok(Dataset {
        population: GeneratedTable {
            name: "population",
            table: population_table,
            schema: schema(Role::Numerical, &[JOIN_KEY], Some((Role::Target, TARGETS))),
        },
        peripheral: vec![
            GeneratedTable {
                name: "peripheral",
                table: first_table,
                schema: schema(Role::Numerical, &[JOIN_KEY, JOIN_KEY_2], None),
            },
            GeneratedTable {
                name: "peripheral2",
                table: second_table,
                schema: schema(Role::Numerical, &[JOIN_KEY_2], None),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn matches_are_grouped_per_parent() {
        let keys = [0, 1, 0, 2];
        let values = [1.0, 2.0, 3.0, 4.0];
        let sums = aggregate_onto(4, &keys, &values, Aggregation::Sum, |_, child| child != 3);
        assert_eq!(sums, vec![4.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn digits_render_without_decimals() {
        assert_eq!(to_text(&[0.0, 7.0]), vec!["0", "7"]);
    }

    #[test]
    fn peripheral_rows_need_a_population() {
        let err = make_numerical(&Options {
            n_rows_population: 0,
            n_rows_peripheral: 3,
            seed: Some(1),
            ..Options::default()
        })
        .unwrap_err();
        assert!(matches!(err, DatasetError::EmptyJoinTarget { table: "population", rows: 0 }));
    }
}
