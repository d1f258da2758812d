//! Response schema declared to the completion service.
//!
//! Uses the OpenAPI subset Gemini accepts in `generationConfig.responseSchema`
//! (upper-case type names, `enum` on strings, `required` lists).

use crate::model::Relevance;
use serde_json::{json, Value};

pub const TOP_LEVEL_FIELDS: [&str; 4] = [
    "gazetteDate",
    "norms",
    "designatedAppointments",
    "concludedAppointments",
];

pub const NORM_FIELDS: [&str; 7] = [
    "sector",
    "normId",
    "title",
    "publicationDate",
    "summary",
    "relevanceToWaterSector",
    "pageNumber",
];

pub const APPOINTMENT_FIELDS: [&str; 4] = ["institution", "personName", "position", "summary"];

fn string() -> Value {
    json!({ "type": "STRING" })
}

fn norm_schema() -> Value {
    let relevance: Vec<&str> = Relevance::ALL.iter().map(|r| r.as_str()).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "sector": string(),
            "normId": string(),
            "title": string(),
            "publicationDate": string(),
            "summary": string(),
            "relevanceToWaterSector": { "type": "STRING", "enum": relevance },
            "pageNumber": { "type": "NUMBER" },
        },
        "required": NORM_FIELDS,
    })
}

fn appointment_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "institution": string(),
            "personName": string(),
            "position": string(),
            "summary": string(),
        },
        "required": APPOINTMENT_FIELDS,
    })
}

/// The full `responseSchema` for an extraction request.
pub fn analysis_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "gazetteDate": string(),
            "norms": { "type": "ARRAY", "items": norm_schema() },
            "designatedAppointments": { "type": "ARRAY", "items": appointment_schema() },
            "concludedAppointments": { "type": "ARRAY", "items": appointment_schema() },
        },
        "required": TOP_LEVEL_FIELDS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(v: &Value) -> Vec<&str> {
        v["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s.as_str().unwrap())
            .collect()
    }

    #[test]
    fn top_level_requires_four_fields() {
        let schema = analysis_response_schema();
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(required(&schema), TOP_LEVEL_FIELDS);
    }

    #[test]
    fn norm_items_require_every_field_and_enumerate_relevance() {
        let schema = analysis_response_schema();
        let items = &schema["properties"]["norms"]["items"];
        assert_eq!(required(items), NORM_FIELDS);
        assert_eq!(
            items["properties"]["relevanceToWaterSector"]["enum"],
            json!(["Alta", "Media", "Baja", "Ninguna"])
        );
    }

    #[test]
    fn both_appointment_lists_share_item_shape() {
        let schema = analysis_response_schema();
        let designated = &schema["properties"]["designatedAppointments"]["items"];
        let concluded = &schema["properties"]["concludedAppointments"]["items"];
        assert_eq!(designated, concluded);
        assert_eq!(required(designated), APPOINTMENT_FIELDS);
    }
}
