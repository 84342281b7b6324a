//! General client configuration.

use serde::{Deserialize, Serialize};

fn default_output_format() -> String {
    "json".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Project selected by the CLI before running a command, if any.
    #[serde(default)]
    pub default_project: Option<String>,

    /// Default CLI output format (`json`, `table` or `raw`).
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_project: None,
            output_format: default_output_format(),
        }
    }
}
