use anyhow::Context;
use clap::{Parser, ValueEnum};
use getml_config::GetmlConfig;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `getml` binary.
#[derive(Debug, Parser)]
#[command(name = "getml", version, about = "getml - client for the getML engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw [default: general.output_format]
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Quiet mode (errors only, no progress)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine host [default: engine.host]
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Engine port [default: engine.port]
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Project to work in [default: general.default_project]
    #[arg(short, long, global = true)]
    pub project: Option<String>,
}

impl Cli {
    /// Resolve global flags, falling back to the `general` config section.
    pub fn global_flags(&self, config: &GetmlConfig) -> anyhow::Result<GlobalFlags> {
        let format = match self.format {
            Some(format) => format,
            None => OutputFormat::from_str(&config.general.output_format, true)
                .map_err(anyhow::Error::msg)
                .with_context(|| {
                    format!(
                        "invalid general.output_format '{}'",
                        config.general.output_format
                    )
                })?,
        };
        Ok(GlobalFlags {
            format,
            quiet: self.quiet,
            project: self
                .project
                .clone()
                .or_else(|| config.general.default_project.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use getml_config::GetmlConfig;
    use pretty_assertions::assert_eq;

    use super::subcommands::{DatasetCommands, DatasetKind, EngineCommands, FrameCommands};
    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from([
            "getml", "--format", "table", "--port", "1800", "--verbose", "engine", "status",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, Some(OutputFormat::Table));
        assert_eq!(cli.port, Some(1800));
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Engine {
                action: EngineCommands::Status
            }
        ));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["getml", "frame", "list", "--format", "raw", "--quiet"])
            .expect("cli should parse");

        assert_eq!(cli.format, Some(OutputFormat::Raw));
        assert!(cli.quiet);
        assert!(matches!(
            cli.command,
            Commands::Frame {
                action: FrameCommands::List
            }
        ));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let parsed = Cli::try_parse_from(["getml", "--format", "xml", "project", "list"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn format_falls_back_to_config() {
        let cli = Cli::try_parse_from(["getml", "project", "list"]).expect("cli should parse");
        let mut config = GetmlConfig::default();
        config.general.output_format = "Table".to_string();
        config.general.default_project = Some("churn".to_string());

        let flags = cli.global_flags(&config).expect("flags should resolve");
        assert_eq!(flags.format, OutputFormat::Table);
        assert_eq!(flags.project.as_deref(), Some("churn"));
    }

    #[test]
    fn unknown_configured_format_is_an_error() {
        let cli = Cli::try_parse_from(["getml", "project", "list"]).expect("cli should parse");
        let mut config = GetmlConfig::default();
        config.general.output_format = "yaml".to_string();

        let err = cli.global_flags(&config).unwrap_err();
        assert!(format!("{err:#}").contains("general.output_format"));
    }

    #[test]
    fn csv_import_takes_comma_separated_roles() {
        let cli = Cli::try_parse_from([
            "getml",
            "frame",
            "import-csv",
            "orders",
            "orders.csv",
            "--join-key",
            "customer,store",
            "--target",
            "churn",
            "--sep",
            ";",
        ])
        .expect("cli should parse");

        let Commands::Frame {
            action: FrameCommands::ImportCsv(args),
        } = cli.command
        else {
            panic!("expected frame import-csv");
        };
        assert_eq!(args.join_key, ["customer", "store"]);
        assert_eq!(args.target, ["churn"]);
        assert_eq!(args.sep, ';');
        assert!(!args.replace);
    }

    #[test]
    fn dataset_kinds_use_kebab_case() {
        let cli = Cli::try_parse_from([
            "getml",
            "dataset",
            "generate",
            "same-units-categorical",
            "--seed",
            "7",
        ])
        .expect("cli should parse");

        let Commands::Dataset {
            action: DatasetCommands::Generate(args),
        } = cli.command
        else {
            panic!("expected dataset generate");
        };
        assert_eq!(args.kind, DatasetKind::SameUnitsCategorical);
        assert_eq!(args.seed, Some(7));
    }
}
