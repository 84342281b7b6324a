use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ProjectCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `getml project`.
pub async fn handle(
    action: &ProjectCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        ProjectCommands::List => {
            let projects = ctx.engine.list_projects().await.context("failed to list projects")?;
            output(&projects, flags.format)
        }
        ProjectCommands::Set { name } => ctx
            .engine
            .set_project(name)
            .await
            .with_context(|| format!("failed to select project '{name}'")),
        ProjectCommands::Delete { name } => ctx
            .engine
            .delete_project(name)
            .await
            .with_context(|| format!("failed to delete project '{name}'")),
    }
}
