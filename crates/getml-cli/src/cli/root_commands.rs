use clap::{Args, Subcommand};

use crate::cli::subcommands::{
    DatasetCommands, EngineCommands, FrameCommands, ModelCommands, ProjectCommands, WireType,
};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Engine process and liveness.
    Engine {
        #[command(subcommand)]
        action: EngineCommands,
    },
    /// Projects.
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },
    /// Data frames held by the engine.
    Frame {
        #[command(subcommand)]
        action: FrameCommands,
    },
    /// Feature learning models.
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Artificial datasets with known targets.
    Dataset {
        #[command(subcommand)]
        action: DatasetCommands,
    },
    /// Print the JSON schema of a wire type.
    Schema(SchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Wire type to describe.
    pub type_name: WireType,
}
