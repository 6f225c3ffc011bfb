//! Input prescription records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One scanned prescription as delivered by the OCR export.
///
/// The payload fields may hold structured JSON or a string encoding of it;
/// decoding is left to the field extractors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionRecord {
    /// Source identifier, when the export carries one
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    /// Labeled drug list
    #[serde(default)]
    pub confirmed_drugs: Value,
    /// Full-page OCR annotation (`{"text": ...}`)
    #[serde(default)]
    pub full_text_annotation: Value,
    /// Token-level OCR annotations (`[{"description": ...}, ...]`)
    #[serde(default)]
    pub text_annotations: Value,
}

impl PrescriptionRecord {
    /// Record carrying only OCR text, as a full-text annotation.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            full_text_annotation: serde_json::json!({ "text": text.into() }),
            ..Self::default()
        }
    }
}

/// Spreadsheet exports store ids as numbers or strings.
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
