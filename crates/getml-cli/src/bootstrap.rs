use anyhow::Context;
use figment::Figment;
use figment::providers::Serialized;
use getml_config::GetmlConfig;

use crate::cli::Cli;

/// Load `.env`, the layered config files and environment, then apply
/// `--host`/`--port` on top.
pub fn load_config(cli: &Cli) -> anyhow::Result<GetmlConfig> {
    load_dotenv()?;
    config_from(GetmlConfig::figment(), cli.host.as_deref(), cli.port)
}

fn load_dotenv() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let env_path = cwd.join(".env");
    if env_path.exists() {
        dotenvy::from_path(&env_path)
            .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
    }
    Ok(())
}

fn config_from(
    mut figment: Figment,
    host: Option<&str>,
    port: Option<u16>,
) -> anyhow::Result<GetmlConfig> {
    if let Some(host) = host {
        figment = figment.merge(Serialized::default("engine.host", host));
    }
    if let Some(port) = port {
        figment = figment.merge(Serialized::default("engine.port", port));
    }
    GetmlConfig::from_figment(figment).context("failed to load getml configuration")
}

#[cfg(test)]
mod tests {
    use getml_config::GetmlConfig;
    use pretty_assertions::assert_eq;

    use super::config_from;

    #[test]
    fn flags_override_environment() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GETML_ENGINE__HOST", "engine.internal");
            jail.set_env("GETML_ENGINE__PORT", "1800");

            let config = config_from(GetmlConfig::figment(), None, Some(1900))
                .map_err(|error| format!("{error:#}"))?;
            assert_eq!(config.engine.host, "engine.internal");
            assert_eq!(config.engine.port, 1900);
            Ok(())
        });
    }

    #[test]
    fn project_file_is_read() {
        figment::Jail::expect_with(|jail| {
            jail.create_dir(".getml")?;
            jail.create_file(
                ".getml/config.toml",
                "[general]\noutput_format = \"table\"\ndefault_project = \"churn\"\n",
            )?;

            let config = config_from(GetmlConfig::figment(), Some("10.0.0.2"), None)
                .map_err(|error| format!("{error:#}"))?;
            assert_eq!(config.general.output_format, "table");
            assert_eq!(config.general.default_project.as_deref(), Some("churn"));
            assert_eq!(config.engine.host, "10.0.0.2");
            Ok(())
        });
    }
}
