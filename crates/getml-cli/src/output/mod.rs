use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => Ok(render_table(
            &serde_json::to_value(value)?,
            ui::prefs().term_width,
        )),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

fn render_table(value: &Value, max_width: Option<usize>) -> String {
    match value {
        Value::Array(items) => render_array_table(items, max_width),
        Value::Object(map) => {
            let rows = map
                .iter()
                .map(|(key, value)| vec![key.clone(), value_to_cell(value)])
                .collect::<Vec<_>>();
            table::render(&["key", "value"], &rows, max_width)
        }
        scalar => table::render(&["value"], &[vec![value_to_cell(scalar)]], max_width),
    }
}

fn render_array_table(items: &[Value], max_width: Option<usize>) -> String {
    if items.is_empty() {
        return String::from("(no rows)");
    }

    if !items.iter().all(Value::is_object) {
        let rows = items
            .iter()
            .map(|item| vec![value_to_cell(item)])
            .collect::<Vec<_>>();
        return table::render(&["value"], &rows, max_width);
    }

    // Keys of the first row, then any keys later rows add.
    let mut headers = Vec::<&str>::new();
    for map in items.iter().filter_map(Value::as_object) {
        for key in map.keys() {
            if !headers.contains(&key.as_str()) {
                headers.push(key);
            }
        }
    }

    let rows = items
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            headers
                .iter()
                .map(|header| map.get(*header).map_or_else(|| String::from("-"), value_to_cell))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    table::render(&headers, &rows, max_width)
}

fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("null"),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| String::from("<invalid-json>")),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde::Serialize;
    use serde_json::json;

    use super::{render, render_table};
    use crate::cli::OutputFormat;

    #[derive(Serialize)]
    struct Summary {
        table: &'static str,
        rows: usize,
    }

    #[test]
    fn raw_render_is_single_line_json() {
        let value = Summary {
            table: "population",
            rows: 500,
        };
        let out = render(&value, OutputFormat::Raw).expect("raw render should work");
        assert_eq!(out, r#"{"table":"population","rows":500}"#);
    }

    #[test]
    fn json_render_is_pretty() {
        let out = render(&json!({"alive": true}), OutputFormat::Json).expect("json render");
        assert_eq!(out, "{\n  \"alive\": true\n}");
    }

    #[test]
    fn later_keys_become_trailing_columns() {
        let records = json!([
            {"table": "population", "rows": 500},
            {"table": "peripheral", "rows": 125000, "frame": "demo_peripheral"},
        ]);
        let out = render_table(&records, None);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 4);
        let mut header: Vec<&str> = lines[0].split_whitespace().collect();
        assert_eq!(header.pop(), Some("frame"));
        header.sort_unstable();
        assert_eq!(header, ["rows", "table"]);
        assert!(lines[2].trim_end().ends_with('-'));
        assert!(lines[3].contains("demo_peripheral"));
    }

    #[test]
    fn nested_values_render_as_json() {
        let out = render_table(&json!({"multirel": ["m1", "m2"]}), None);
        assert!(out.contains(r#"["m1","m2"]"#));
    }

    #[test]
    fn empty_listing() {
        assert_eq!(render_table(&json!([]), None), "(no rows)");
    }
}
