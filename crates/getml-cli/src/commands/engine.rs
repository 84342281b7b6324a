use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::EngineCommands;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

#[derive(Debug, Serialize)]
struct EngineStatus<'a> {
    address: &'a str,
    alive: bool,
}

/// Handle `getml engine`.
pub async fn handle(
    action: &EngineCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        EngineCommands::Status => {
            let alive = ctx.engine.is_alive().await;
            output(
                &EngineStatus {
                    address: ctx.engine.address(),
                    alive,
                },
                flags.format,
            )
        }
        EngineCommands::Run { path } => {
            let path = install_path(path.as_deref(), ctx)?;
            let progress = Progress::spinner(&format!("starting engine in {}", path.display()));
            let started = ctx.engine.run(&path).await;
            progress
                .settle(started, "engine did not start")
                .context("failed to start the engine")?;
            output(
                &EngineStatus {
                    address: ctx.engine.address(),
                    alive: true,
                },
                flags.format,
            )
        }
        EngineCommands::Setup { path } => {
            let path = install_path(path.as_deref(), ctx)?;
            ctx.engine
                .setup(&path)
                .await
                .with_context(|| format!("setup failed in {}", path.display()))
        }
        EngineCommands::Shutdown => ctx
            .engine
            .shutdown()
            .await
            .context("failed to shut the engine down"),
    }
}

fn install_path(explicit: Option<&Path>, ctx: &AppContext) -> anyhow::Result<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| ctx.config.engine.install_path.clone())
        .context("no install directory given and engine.install_path is not configured")
}
