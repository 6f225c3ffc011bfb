//! Record field decoding.
//!
//! Export fields arrive either structured or as a string encoding of the
//! structure. Strings go through an ordered chain of decoders (JSON, then
//! Python literal); when every decoder rejects the string it is treated as
//! an opaque raw value.

use serde_json::Value;
use tracing::{debug, warn};

use super::literal::parse_literal;
use super::{FieldParseError, FieldResult};
use crate::models::DrugCandidate;

/// String values that mean "no data" in spreadsheet exports.
const BLANK_MARKERS: &[&str] = &["", "null", "None"];

/// A single decoding strategy for string-encoded fields.
pub trait FieldDecoder: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Decode `raw` into a structured value.
    fn decode(&self, raw: &str) -> FieldResult<Value>;
}

/// Strict JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl FieldDecoder for JsonDecoder {
    fn name(&self) -> &'static str {
        "json"
    }

    fn decode(&self, raw: &str) -> FieldResult<Value> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Python literal (`repr` output).
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralDecoder;

impl FieldDecoder for LiteralDecoder {
    fn name(&self) -> &'static str {
        "literal"
    }

    fn decode(&self, raw: &str) -> FieldResult<Value> {
        parse_literal(raw)
    }
}

/// Decoders tried left to right; the first success wins.
pub struct DecoderChain {
    decoders: Vec<Box<dyn FieldDecoder>>,
}

impl Default for DecoderChain {
    fn default() -> Self {
        Self::new(vec![Box::new(JsonDecoder), Box::new(LiteralDecoder)])
    }
}

impl std::fmt::Debug for DecoderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.decoders.iter().map(|d| d.name()).collect();
        f.debug_struct("DecoderChain").field("decoders", &names).finish()
    }
}

impl DecoderChain {
    pub fn new(decoders: Vec<Box<dyn FieldDecoder>>) -> Self {
        Self { decoders }
    }

    /// Decode with the first decoder that accepts `raw`, or `None` if all reject it.
    pub fn decode(&self, raw: &str) -> Option<Value> {
        for decoder in &self.decoders {
            match decoder.decode(raw) {
                Ok(value) => return Some(value),
                Err(e) => debug!(decoder = decoder.name(), error = %e, "field decoder rejected value"),
            }
        }
        None
    }
}

/// Whether a field holds no data at all.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => BLANK_MARKERS.contains(&s.trim()),
        _ => false,
    }
}

/// Reads labeled drug lists at full confidence.
#[derive(Debug, Default)]
pub struct ConfirmedDrugExtractor {
    chain: DecoderChain,
}

impl ConfirmedDrugExtractor {
    pub fn new(chain: DecoderChain) -> Self {
        Self { chain }
    }

    /// Confirmed drugs in the field; any decoding problem yields an empty list.
    pub fn extract(&self, field: &Value) -> Vec<DrugCandidate> {
        match self.try_extract(field) {
            Ok(drugs) => drugs,
            Err(e) => {
                warn!(error = %e, "could not read confirmed drugs");
                Vec::new()
            }
        }
    }

    /// Confirmed drugs in the field, reporting why a non-blank field was unusable.
    pub fn try_extract(&self, field: &Value) -> FieldResult<Vec<DrugCandidate>> {
        if is_blank(field) {
            return Ok(Vec::new());
        }

        let decoded;
        let structured = match field {
            Value::String(raw) => match self.chain.decode(raw) {
                Some(value) => {
                    decoded = value;
                    &decoded
                }
                None => {
                    debug!("confirmed drug field is not an encoded list; ignoring");
                    return Ok(Vec::new());
                }
            },
            other => other,
        };

        let items = structured
            .as_array()
            .ok_or_else(|| FieldParseError::UnexpectedShape {
                expected: "list",
                found: shape_of(structured),
            })?;

        Ok(items.iter().filter_map(confirmed_entry).collect())
    }
}

fn confirmed_entry(item: &Value) -> Option<DrugCandidate> {
    let name = match item.as_object()?.get("name")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => {
            debug!(name = %other, "skipping confirmed drug with unusable name");
            return None;
        }
    };
    Some(DrugCandidate::confirmed(name))
}

/// Pulls OCR text out of annotation fields.
#[derive(Debug, Default)]
pub struct TextFieldExtractor {
    chain: DecoderChain,
}

impl TextFieldExtractor {
    pub fn new(chain: DecoderChain) -> Self {
        Self { chain }
    }

    /// OCR text held by the field, or "" when there is none.
    ///
    /// Full-text annotations are objects with a `text` key; token annotations
    /// are lists whose first element's `description` covers the whole page.
    /// A string that decodes to neither is taken as the text itself.
    pub fn extract_text(&self, field: &Value) -> String {
        if is_blank(field) {
            return String::new();
        }

        match field {
            Value::String(raw) => match self.chain.decode(raw) {
                Some(decoded) => text_of(&decoded),
                None => raw.clone(),
            },
            other => text_of(other),
        }
    }
}

fn text_of(value: &Value) -> String {
    let text = match value {
        Value::Object(map) => map.get("text"),
        Value::Array(items) => items.first().and_then(|first| first.get("description")),
        _ => None,
    };
    text.and_then(Value::as_str).unwrap_or_default().to_string()
}

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
