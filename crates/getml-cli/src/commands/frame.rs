use anyhow::Context;
use getml_client::CsvOptions;
use getml_core::{Role, Schema};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{FrameCommands, ImportCsvArgs};
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

#[derive(Debug, Serialize)]
struct RowCount<'a> {
    name: &'a str,
    rows: u64,
}

/// Handle `getml frame`.
pub async fn handle(
    action: &FrameCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    ctx.select_project().await?;

    match action {
        FrameCommands::List => {
            let frames = ctx
                .engine
                .list_data_frames()
                .await
                .context("failed to list data frames")?;
            output(&frames, flags.format)
        }
        FrameCommands::Show { name, rows } => {
            let mut frame = ctx.engine.data_frame(name.as_str(), Schema::default());
            frame
                .refresh()
                .await
                .with_context(|| format!("failed to read the schema of '{name}'"))?;
            let table = frame
                .get()
                .await
                .with_context(|| format!("failed to fetch '{name}'"))?;
            let mut records = table.to_records();
            records.truncate(*rows);
            output(&records, flags.format)
        }
        FrameCommands::Rows { name } => {
            let frame = ctx.engine.data_frame(name.as_str(), Schema::default());
            let rows = frame
                .n_rows()
                .await
                .with_context(|| format!("failed to count the rows of '{name}'"))?;
            output(&RowCount { name, rows }, flags.format)
        }
        FrameCommands::Delete { name, mem_only } => ctx
            .engine
            .data_frame(name.as_str(), Schema::default())
            .delete(*mem_only)
            .await
            .with_context(|| format!("failed to delete '{name}'")),
        FrameCommands::ImportCsv(args) => import_csv(args, ctx).await,
    }
}

async fn import_csv(args: &ImportCsvArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let schema = csv_schema(args);
    schema.check_unique()?;

    let options = CsvOptions {
        append: !args.replace,
        quotechar: args.quotechar,
        sep: args.sep,
        ..CsvOptions::default()
    };
    let frame = ctx.engine.data_frame(args.name.as_str(), schema);

    let progress = Progress::spinner(&format!("reading {} file(s) into {}", args.files.len(), args.name));
    let read = frame.read_csv(args.files.as_slice(), &options).await;
    progress
        .settle(read, "import failed")
        .with_context(|| format!("failed to import CSV into '{}'", args.name))?;
    tracing::info!(frame = %args.name, files = args.files.len(), "csv imported");
    Ok(())
}

fn csv_schema(args: &ImportCsvArgs) -> Schema {
    Schema::default()
        .with(Role::Categorical, args.categorical.iter().cloned())
        .with(Role::Discrete, args.discrete.iter().cloned())
        .with(Role::JoinKey, args.join_key.iter().cloned())
        .with(Role::Numerical, args.numerical.iter().cloned())
        .with(Role::Target, args.target.iter().cloned())
        .with(Role::TimeStamp, args.time_stamp.iter().cloned())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use getml_core::Role;
    use pretty_assertions::assert_eq;

    use super::csv_schema;
    use crate::cli::subcommands::FrameCommands;
    use crate::cli::{Cli, Commands};

    #[test]
    fn role_flags_become_the_schema() {
        let cli = Cli::try_parse_from([
            "getml",
            "frame",
            "import-csv",
            "orders",
            "a.csv",
            "b.csv",
            "--numerical",
            "amount,discount",
            "--time-stamp",
            "ordered_at",
        ])
        .expect("cli should parse");
        let Commands::Frame {
            action: FrameCommands::ImportCsv(args),
        } = cli.command
        else {
            panic!("expected frame import-csv");
        };

        let schema = csv_schema(&args);
        assert_eq!(schema.names(Role::Numerical), ["amount", "discount"]);
        assert_eq!(schema.names(Role::TimeStamp), ["ordered_at"]);
        assert!(schema.names(Role::Target).is_empty());
        assert_eq!(args.files.len(), 2);
    }
}
