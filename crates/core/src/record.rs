use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single parsed record destined for the datastore.
///
/// Every record carries its source-file annotation alongside the parsed
/// body; JSON-line bodies are the line's own fields, delimited-line bodies
/// are a generic wrapper (see [`Record::delimited`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub file_id: String,
    pub file_name: String,
    pub processed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl Record {
    /// Record from a self-describing JSON object line.
    ///
    /// Annotation fields win over same-named keys in the body; the body's
    /// copies are dropped so the serialized record has no duplicate keys.
    pub fn structured(file_id: &str, file_name: &str, mut body: Map<String, Value>) -> Self {
        body.remove("fileId");
        body.remove("fileName");
        body.remove("processedAt");
        Self {
            file_id: file_id.to_string(),
            file_name: file_name.to_string(),
            processed_at: Utc::now(),
            body,
        }
    }

    /// Record from a delimited text line: the raw line plus its split fields.
    pub fn delimited(file_id: &str, file_name: &str, line: &str, parts: Vec<&str>, line_number: u64) -> Self {
        let mut body = Map::new();
        body.insert("rawLine".to_string(), Value::String(line.to_string()));
        body.insert(
            "parts".to_string(),
            Value::Array(parts.into_iter().map(|p| Value::String(p.to_string())).collect()),
        );
        body.insert("lineNumber".to_string(), Value::Number(line_number.into()));
        Self {
            file_id: file_id.to_string(),
            file_name: file_name.to_string(),
            processed_at: Utc::now(),
            body,
        }
    }
}
