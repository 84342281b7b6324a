use getml_core::aggregations::Aggregation;
use getml_core::hyperopt::{HyperoptParams, ParamSpace};
use getml_core::models::{MultirelParams, RelboostParams};
use getml_core::placeholder::Placeholder;
use getml_core::predictors::Predictor;
use getml_core::{Command, Schema};
use schemars::schema_for;
use serde_json::Value;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SchemaArgs;
use crate::cli::subcommands::WireType;
use crate::output::output;

/// Handle `getml schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    output(&schema_of(args.type_name)?, flags.format)
}

fn schema_of(wire_type: WireType) -> anyhow::Result<Value> {
    let schema = match wire_type {
        WireType::Command => schema_for!(Command),
        WireType::Schema => schema_for!(Schema),
        WireType::Placeholder => schema_for!(Placeholder),
        WireType::Aggregation => schema_for!(Aggregation),
        WireType::Predictor => schema_for!(Predictor),
        WireType::Multirel => schema_for!(MultirelParams),
        WireType::Relboost => schema_for!(RelboostParams),
        WireType::HyperoptParams => schema_for!(HyperoptParams),
        WireType::ParamSpace => schema_for!(ParamSpace),
    };
    Ok(serde_json::to_value(schema)?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::schema_of;
    use crate::cli::subcommands::WireType;

    #[test]
    fn relboost_schema_lists_wire_keys() {
        let schema = schema_of(WireType::Relboost).expect("schema");
        assert!(schema["properties"]["num_features_"].is_object());
        assert!(schema["properties"]["loss_function_"].is_object());
    }

    #[test]
    fn aggregation_schema_enumerates_the_sql_names() {
        let schema = schema_of(WireType::Aggregation).expect("schema");
        let rendered = schema.to_string();
        for name in ["COUNT DISTINCT", "MEDIAN", "STDDEV"] {
            assert!(rendered.contains(name), "{name} missing from {rendered}");
        }
    }

    #[test]
    fn every_wire_type_has_a_titled_schema() {
        use clap::ValueEnum;

        for wire_type in WireType::value_variants() {
            let schema = schema_of(*wire_type).expect("schema");
            assert_eq!(schema["$schema"], json!("https://json-schema.org/draft/2020-12/schema"));
            assert!(schema["title"].is_string(), "{wire_type:?}");
        }
    }
}
