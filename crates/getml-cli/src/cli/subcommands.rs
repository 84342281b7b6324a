use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

#[derive(Clone, Debug, Subcommand)]
pub enum EngineCommands {
    /// Report whether an engine answers at the configured address.
    Status,
    /// Start the engine and wait until it answers.
    Run {
        /// Install directory [default: engine.install_path]
        path: Option<PathBuf>,
    },
    /// Run the install directory's setup script.
    Setup {
        /// Install directory [default: engine.install_path]
        path: Option<PathBuf>,
    },
    /// Shut the engine down.
    Shutdown,
}

#[derive(Clone, Debug, Subcommand)]
pub enum ProjectCommands {
    /// List projects.
    List,
    /// Select a project, creating it if needed.
    Set { name: String },
    /// Delete a project and everything in it.
    Delete { name: String },
}

#[derive(Clone, Debug, Subcommand)]
pub enum FrameCommands {
    /// List data frames in memory and on disk.
    List,
    /// Print the first rows of a data frame.
    Show {
        name: String,
        /// Rows to print.
        #[arg(long, default_value_t = 20)]
        rows: usize,
    },
    /// Print a data frame's row count.
    Rows { name: String },
    /// Delete a data frame.
    Delete {
        name: String,
        /// Only drop it from memory, keep the project copy.
        #[arg(long)]
        mem_only: bool,
    },
    /// Let the engine read CSV files into a data frame.
    ImportCsv(ImportCsvArgs),
}

#[derive(Clone, Debug, Args)]
pub struct ImportCsvArgs {
    /// Data frame to fill.
    pub name: String,
    /// CSV files with a header line.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    #[arg(long, value_delimiter = ',')]
    pub categorical: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    pub discrete: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    pub numerical: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    pub join_key: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    pub target: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    pub time_stamp: Vec<String>,
    /// Field separator.
    #[arg(long, default_value_t = ',')]
    pub sep: char,
    #[arg(long, default_value_t = '"')]
    pub quotechar: char,
    /// Replace existing rows instead of appending.
    #[arg(long)]
    pub replace: bool,
}

#[derive(Clone, Debug, Subcommand)]
pub enum ModelCommands {
    /// List models by type.
    List,
    /// Print a model's hyperparameters.
    Show { name: String },
    /// Print the SQL of a fitted model's features.
    Sql { name: String },
    /// Delete a model.
    Delete {
        name: String,
        /// Only drop it from memory, keep the project copy.
        #[arg(long)]
        mem_only: bool,
    },
}

#[derive(Clone, Debug, Subcommand)]
pub enum DatasetCommands {
    /// Generate a dataset, optionally uploading it as data frames.
    Generate(GenerateArgs),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum DatasetKind {
    Numerical,
    Discrete,
    Categorical,
    SameUnitsNumerical,
    SameUnitsCategorical,
    Snowflake,
}

impl DatasetKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Numerical => "numerical",
            Self::Discrete => "discrete",
            Self::Categorical => "categorical",
            Self::SameUnitsNumerical => "same units numerical",
            Self::SameUnitsCategorical => "same units categorical",
            Self::Snowflake => "snowflake",
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct GenerateArgs {
    pub kind: DatasetKind,
    #[arg(long)]
    pub population_rows: Option<usize>,
    /// Rows of the (first) peripheral table.
    #[arg(long)]
    pub peripheral_rows: Option<usize>,
    /// Rows of the second peripheral table (snowflake only).
    #[arg(long)]
    pub peripheral2_rows: Option<usize>,
    /// Target aggregation, e.g. COUNT or AVG.
    #[arg(long)]
    pub aggregation: Option<String>,
    /// Aggregation of the second peripheral table (snowflake only).
    #[arg(long)]
    pub aggregation2: Option<String>,
    #[arg(long)]
    pub seed: Option<u64>,
    /// Upload the tables as data frames named `<PREFIX>_<table>`.
    #[arg(long, value_name = "PREFIX")]
    pub upload: Option<String>,
}

/// Wire types `getml schema` can describe.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum WireType {
    Command,
    Schema,
    Placeholder,
    Aggregation,
    Predictor,
    Multirel,
    Relboost,
    HyperoptParams,
    ParamSpace,
}
