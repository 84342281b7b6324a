use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ModelCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `getml model`.
pub async fn handle(
    action: &ModelCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    ctx.select_project().await?;

    match action {
        ModelCommands::List => {
            let models = ctx.engine.list_models().await.context("failed to list models")?;
            output(&models, flags.format)
        }
        ModelCommands::Show { name } => {
            let model = ctx
                .engine
                .get_model(name)
                .await
                .with_context(|| format!("failed to load model '{name}'"))?;
            output(&model.hyperparameters()?, flags.format)
        }
        ModelCommands::Sql { name } => {
            let model = ctx
                .engine
                .get_model(name)
                .await
                .with_context(|| format!("failed to load model '{name}'"))?;
            let sql = model
                .to_sql()
                .await
                .with_context(|| format!("failed to transpile '{name}' to SQL"))?;
            println!("{sql}");
            Ok(())
        }
        ModelCommands::Delete { name, mem_only } => {
            let model = ctx
                .engine
                .get_model(name)
                .await
                .with_context(|| format!("failed to load model '{name}'"))?;
            model
                .delete(*mem_only)
                .await
                .with_context(|| format!("failed to delete model '{name}'"))
        }
    }
}
