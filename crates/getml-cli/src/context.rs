use anyhow::Context;
use getml_client::Engine;
use getml_config::GetmlConfig;

use crate::cli::GlobalFlags;

/// Everything a command handler needs to reach the engine.
pub struct AppContext {
    pub engine: Engine,
    pub config: GetmlConfig,
    project: Option<String>,
}

impl AppContext {
    /// Build the engine handle. Nothing is sent until a handler asks.
    pub fn new(config: GetmlConfig, flags: &GlobalFlags) -> Self {
        Self {
            engine: Engine::new(&config.engine),
            config,
            project: flags.project.clone(),
        }
    }

    /// Select the `--project` (or configured default project), if any.
    pub async fn select_project(&self) -> anyhow::Result<()> {
        if let Some(project) = &self.project {
            self.engine
                .set_project(project)
                .await
                .with_context(|| format!("failed to select project '{project}'"))?;
        }
        Ok(())
    }
}
