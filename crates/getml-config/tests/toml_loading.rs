//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for sandboxed files and env vars.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use getml_config::GetmlConfig;
use pretty_assertions::assert_eq;

#[test]
fn loads_engine_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[engine]
host = "engine.internal"
port = 1809
connect_timeout_secs = 2
startup_timeout_secs = 120
install_path = "/opt/getml"
"#,
        )?;

        let config: GetmlConfig = Figment::from(Serialized::defaults(GetmlConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.engine.address(), "engine.internal:1809");
        assert_eq!(config.engine.connect_timeout_secs, 2);
        assert_eq!(config.engine.startup_timeout_secs, 120);
        assert!(config.engine.is_configured());
        Ok(())
    });
}

#[test]
fn partial_section_keeps_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[general]
default_project = "churn"
"#,
        )?;

        let config: GetmlConfig = Figment::from(Serialized::defaults(GetmlConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.general.default_project.as_deref(), Some("churn"));
        assert_eq!(config.general.output_format, "json");
        assert_eq!(config.engine.port, 1708);
        Ok(())
    });
}

#[test]
fn project_local_file_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_dir(".getml")?;
        jail.create_file(
            ".getml/config.toml",
            r#"
[engine]
port = 2000
"#,
        )?;

        let config = GetmlConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.engine.port, 2000);
        assert_eq!(config.engine.host, "localhost");
        Ok(())
    });
}

#[test]
fn invalid_port_in_file_is_rejected() {
    Jail::expect_with(|jail| {
        jail.create_dir(".getml")?;
        jail.create_file(
            ".getml/config.toml",
            r#"
[engine]
port = 0
"#,
        )?;

        let err = GetmlConfig::load().unwrap_err();
        assert!(err.to_string().contains("engine.port"), "{err}");
        Ok(())
    });
}
