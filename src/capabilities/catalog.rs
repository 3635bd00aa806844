//! Typed function catalog describing each capability to an orchestrator.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::player::{FeatureKind, PlayerRecord, WIRE_FIELD_NAMES};

pub const GET_PLAYER_PROBABILITY_OF_HALL_OF_FAME: &str = "GetPlayerProbabilityOfHallOfFame";
pub const GET_BASEBALL_PLAYER_STATS: &str = "GetBaseballPlayerStats";
pub const GET_WEB_SEARCH_RESULTS: &str = "GetWebSearchResults";
pub const GET_WEB_SEARCH_EVIDENCE: &str = "GetWebSearchEvidence";

pub const STATS_PARAM: &str = "baseballStatistics";
pub const NAME_PARAM: &str = "nameOfBaseballPlayer";

#[derive(Debug, Clone, Serialize)]
pub struct CapabilityDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON Schema of the argument object.
    pub parameters: Value,
    /// JSON Schema of the result.
    pub returns: Value,
}

pub fn catalog() -> Vec<CapabilityDescriptor> {
    vec![
        CapabilityDescriptor {
            name: GET_PLAYER_PROBABILITY_OF_HALL_OF_FAME,
            description: "Retrieves a Machine Learning probability of a player being Inducted \
                          to Hall Of Fame using the player's baseball statistics.",
            parameters: object_schema(
                STATS_PARAM,
                "The statistics of the baseball player.",
                player_record_schema(),
            ),
            returns: json!({ "type": "number", "minimum": 0.0, "maximum": 1.0 }),
        },
        CapabilityDescriptor {
            name: GET_BASEBALL_PLAYER_STATS,
            description: "Retrieves baseball statistics for a given baseball player.",
            parameters: name_parameters(),
            returns: player_record_schema(),
        },
        CapabilityDescriptor {
            name: GET_WEB_SEARCH_RESULTS,
            description: "Retrieves the web search results with identified URL sources for a \
                          given baseball player.",
            parameters: name_parameters(),
            returns: json!({ "type": "string" }),
        },
        CapabilityDescriptor {
            name: GET_WEB_SEARCH_EVIDENCE,
            description: "Retrieves numbered web search evidence for a given baseball player: \
                          the cited narrative, the matching footnote table and each source.",
            parameters: name_parameters(),
            returns: evidence_report_schema(),
        },
    ]
}

pub fn descriptor(name: &str) -> Option<CapabilityDescriptor> {
    catalog().into_iter().find(|d| d.name == name)
}

fn name_parameters() -> Value {
    object_schema(
        NAME_PARAM,
        "The name of the baseball player to search for.",
        json!({ "type": "string", "minLength": 1 }),
    )
}

fn object_schema(param: &str, description: &str, mut schema: Value) -> Value {
    if let Some(obj) = schema.as_object_mut() {
        obj.insert("description".into(), Value::String(description.into()));
    }
    let mut properties = Map::new();
    properties.insert(param.to_string(), schema);
    json!({
        "type": "object",
        "properties": properties,
        "required": [param],
        "additionalProperties": false,
    })
}

/// JSON Schema of the record's camelCase wire shape.
pub fn player_record_schema() -> Value {
    let mut kinds = vec![None, None];
    kinds.extend(PlayerRecord::feature_schema().into_iter().map(|c| Some(c.kind)));

    let mut properties = Map::new();
    for (field, kind) in WIRE_FIELD_NAMES.iter().zip(kinds) {
        let ty = match kind {
            None => "boolean",
            Some(FeatureKind::Text) => "string",
            Some(FeatureKind::Numeric) => "number",
        };
        properties.insert((*field).to_string(), json!({ "type": ty }));
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": WIRE_FIELD_NAMES,
        "additionalProperties": false,
    })
}

fn evidence_report_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "narrative": { "type": "string" },
            "footnotes": { "type": "string" },
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "ordinal": { "type": "integer", "minimum": 1 },
                        "title": { "type": "string" },
                        "snippet": { "type": "string" },
                        "url": { "type": "string" }
                    },
                    "required": ["ordinal", "title", "snippet", "url"]
                }
            }
        },
        "required": ["narrative", "footnotes", "items"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_every_capability_once() {
        let names: Vec<&str> = catalog().iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                GET_PLAYER_PROBABILITY_OF_HALL_OF_FAME,
                GET_BASEBALL_PLAYER_STATS,
                GET_WEB_SEARCH_RESULTS,
                GET_WEB_SEARCH_EVIDENCE,
            ]
        );
        assert!(descriptor("Nope").is_none());
    }

    #[test]
    fn record_schema_tracks_wire_field_names() {
        let schema = player_record_schema();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 19);
        assert_eq!(schema["properties"]["homeRuns"]["type"], "number");
        assert_eq!(schema["properties"]["fullName"]["type"], "string");
        assert_eq!(schema["properties"]["inductedToHallOfFame"]["type"], "boolean");
        assert_eq!(schema["properties"]["id"]["type"], "string");
    }
}
