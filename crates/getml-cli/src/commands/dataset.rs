use anyhow::Context;
use getml_core::aggregations::Aggregation;
use getml_datasets::{
    Dataset, Options, SnowflakeOptions, make_categorical, make_discrete, make_numerical,
    make_same_units_categorical, make_same_units_numerical, make_snowflake,
};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{DatasetCommands, DatasetKind, GenerateArgs};
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

#[derive(Debug, Serialize)]
struct TableSummary {
    table: &'static str,
    rows: usize,
    columns: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame: Option<String>,
}

/// Handle `getml dataset`.
pub async fn handle(
    action: &DatasetCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        DatasetCommands::Generate(args) => generate(args, ctx, flags).await,
    }
}

async fn generate(args: &GenerateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let dataset = build(args)?;
    let mut summaries = summarize(&dataset);

    if let Some(prefix) = &args.upload {
        ctx.select_project().await?;
        let progress = Progress::spinner("uploading");
        let uploaded = upload(&dataset, prefix, &mut summaries, ctx, &progress).await;
        progress.settle(uploaded, "upload failed")?;
    }

    output(&summaries, flags.format)
}

async fn upload(
    dataset: &Dataset,
    prefix: &str,
    summaries: &mut [TableSummary],
    ctx: &AppContext,
    progress: &Progress,
) -> anyhow::Result<()> {
    for (generated, summary) in dataset.tables().zip(summaries) {
        let name = format!("{prefix}_{}", generated.name);
        progress.set_message(&format!("uploading {name}"));
        ctx.engine
            .data_frame(name.as_str(), generated.schema.clone())
            .send(&generated.table)
            .await
            .with_context(|| format!("failed to upload '{name}'"))?;
        summary.frame = Some(name);
    }
    Ok(())
}

fn build(args: &GenerateArgs) -> anyhow::Result<Dataset> {
    let dataset = match args.kind {
        DatasetKind::Numerical => make_numerical(&options(args)?),
        DatasetKind::Discrete => make_discrete(&options(args)?),
        DatasetKind::Categorical => make_categorical(&options(args)?),
        DatasetKind::SameUnitsNumerical => make_same_units_numerical(&options(args)?),
        DatasetKind::SameUnitsCategorical => make_same_units_categorical(&options(args)?),
        DatasetKind::Snowflake => make_snowflake(&snowflake_options(args)?),
    };
    dataset.with_context(|| format!("failed to generate the {} dataset", args.kind.label()))
}

fn options(args: &GenerateArgs) -> anyhow::Result<Options> {
    let defaults = Options::default();
    Ok(Options {
        n_rows_population: args.population_rows.unwrap_or(defaults.n_rows_population),
        n_rows_peripheral: args.peripheral_rows.unwrap_or(defaults.n_rows_peripheral),
        seed: args.seed,
        aggregation: aggregation(args.aggregation.as_deref(), defaults.aggregation)?,
    })
}

fn snowflake_options(args: &GenerateArgs) -> anyhow::Result<SnowflakeOptions> {
    let defaults = SnowflakeOptions::default();
    Ok(SnowflakeOptions {
        n_rows_population: args.population_rows.unwrap_or(defaults.n_rows_population),
        n_rows_peripheral1: args.peripheral_rows.unwrap_or(defaults.n_rows_peripheral1),
        n_rows_peripheral2: args.peripheral2_rows.unwrap_or(defaults.n_rows_peripheral2),
        aggregation1: aggregation(args.aggregation.as_deref(), defaults.aggregation1)?,
        aggregation2: aggregation(args.aggregation2.as_deref(), defaults.aggregation2)?,
        seed: args.seed,
    })
}

fn aggregation(text: Option<&str>, default: Aggregation) -> anyhow::Result<Aggregation> {
    let Some(text) = text else {
        return Ok(default);
    };
    Aggregation::parse(&text.replace(['_', '-'], " "))
        .with_context(|| format!("unknown aggregation '{text}'"))
}

fn summarize(dataset: &Dataset) -> Vec<TableSummary> {
    dataset
        .tables()
        .map(|generated| TableSummary {
            table: generated.name,
            rows: generated.table.n_rows(),
            columns: generated.table.n_cols(),
            frame: None,
        })
        .collect()
}
