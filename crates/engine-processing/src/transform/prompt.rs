use model::{core::column::ColumnSpec, records::row::Row};
use serde_json::{Map, Value, json};
use std::fmt::Write;

pub const SYSTEM_PROMPT: &str = "You are a data processing assistant. You analyze input data and extract or generate the requested information in a structured format.
Always return valid values for all requested fields. If a value cannot be determined, use \"N/A\" or an appropriate default.
Be consistent in your formatting across all rows.";

pub const TOOL_NAME: &str = "extract_data";
const TOOL_DESCRIPTION: &str = "Extract or generate the requested data fields";
const EMPTY_MARKER: &str = "[empty]";

/// `Data:\n<field: value lines>\n\nTask: <instruction>`, fields in header order.
pub fn user_message(row: &Row, instruction: &str) -> String {
    let mut context = String::new();
    for (name, value) in row.iter() {
        let value = if value.is_empty() { EMPTY_MARKER } else { value };
        let _ = writeln!(context, "{name}: {value}");
    }
    format!("Data:\n{context}\n\nTask: {instruction}")
}

/// JSON schema with one required string property per target column.
pub fn output_schema(columns: &[ColumnSpec]) -> Value {
    let properties: Map<String, Value> = columns
        .iter()
        .map(|c| {
            (
                c.name.clone(),
                json!({
                    "type": "string",
                    "description": format!("Value for {} column", c.name),
                }),
            )
        })
        .collect();
    let required: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

/// The single tool the model is forced to call.
pub fn tool_definition(columns: &[ColumnSpec]) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": TOOL_NAME,
            "description": TOOL_DESCRIPTION,
            "parameters": output_schema(columns),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn row() -> Row {
        let headers: Arc<[String]> =
            vec!["name".to_string(), "city".to_string(), "notes".to_string()].into();
        Row::new(
            headers,
            vec!["Ada".to_string(), "London".to_string(), String::new()],
        )
    }

    #[test]
    fn user_message_follows_header_order_and_marks_empty_fields() {
        let message = user_message(&row(), "Guess the country");
        assert_eq!(
            message,
            "Data:\nname: Ada\ncity: London\nnotes: [empty]\n\n\nTask: Guess the country"
        );
    }

    #[test]
    fn schema_requires_every_target_column() {
        let columns = vec![ColumnSpec::text("country"), ColumnSpec::text("continent")];
        let schema = output_schema(&columns);

        assert_eq!(schema["required"], json!(["country", "continent"]));
        assert_eq!(schema["properties"]["country"]["type"], "string");
        assert_eq!(schema["additionalProperties"], false);

        let keys: Vec<&String> = schema["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["country", "continent"]);
    }

    #[test]
    fn tool_is_named_extract_data() {
        let tool = tool_definition(&[ColumnSpec::text("x")]);
        assert_eq!(tool["function"]["name"], TOOL_NAME);
        assert_eq!(tool["type"], "function");
    }
}
