//! Inter-stage interchange format.
//!
//! Stages exchange JSON text in one of two shapes: a bare array of documents,
//! or an object `{"filtered": [...], "commentary": "..."}`. Model output and
//! free-text stage output can be anything at all, so every boundary goes
//! through [`Interchange::parse`], which never fails.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::{Document, Metadata};

/// Normalized view of a stage boundary payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Interchange {
    RawList(Vec<Document>),
    Wrapped {
        filtered: Vec<Document>,
        commentary: Option<String>,
    },
    Unparseable(String),
}

impl Interchange {
    pub fn parse(raw: &str) -> Self {
        let value = match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => value,
            Err(_) => return Interchange::Unparseable(raw.to_string()),
        };

        match value {
            Value::Array(items) => {
                Interchange::RawList(items.into_iter().map(document_from_value).collect())
            }
            Value::Object(mut map) => match map.remove("filtered") {
                Some(Value::Array(items)) => Interchange::Wrapped {
                    filtered: items.into_iter().map(document_from_value).collect(),
                    commentary: map
                        .get("commentary")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                },
                _ => Interchange::Unparseable(raw.to_string()),
            },
            _ => Interchange::Unparseable(raw.to_string()),
        }
    }

    pub fn is_parsed(&self) -> bool {
        !matches!(self, Interchange::Unparseable(_))
    }

    /// Documents carried by the payload. Unparseable input becomes a single
    /// document holding the raw text.
    pub fn into_documents(self) -> Vec<Document> {
        match self {
            Interchange::RawList(docs) => docs,
            Interchange::Wrapped { filtered, .. } => filtered,
            Interchange::Unparseable(raw) => vec![Document::from_text(raw)],
        }
    }
}

/// Outcome marker for the structured validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// The model listed documents it was not given; those were dropped.
    Trimmed,
    /// The model never produced parsable JSON; every input document was kept.
    UnparsedFallback,
}

/// Wrapped interchange object written by the structured validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedSet {
    pub filtered: Vec<Document>,
    pub commentary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ValidationStatus>,
}

impl ValidatedSet {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{\"filtered\":[]}".to_string())
    }
}

pub fn serialize_documents(docs: &[Document]) -> String {
    serde_json::to_string(docs).unwrap_or_else(|_| "[]".to_string())
}

/// Removes a surrounding markdown code fence (```` ```json ... ``` ````).
pub fn strip_code_fences(text: &str) -> &str {
    static OPEN: OnceLock<Regex> = OnceLock::new();
    static CLOSE: OnceLock<Regex> = OnceLock::new();
    let open = OPEN.get_or_init(|| Regex::new(r"^```[A-Za-z0-9_-]*[ \t]*\r?\n?").expect("valid regex"));
    let close = CLOSE.get_or_init(|| Regex::new(r"\r?\n?```$").expect("valid regex"));

    let mut cleaned = text.trim();
    if let Some(m) = open.find(cleaned) {
        cleaned = &cleaned[m.end()..];
    }
    if let Some(m) = close.find(cleaned) {
        cleaned = &cleaned[..m.start()];
    }
    cleaned.trim()
}

fn document_from_value(value: Value) -> Document {
    match value {
        Value::Object(mut map) => {
            let content = map
                .remove("content")
                .or_else(|| map.remove("page_content"));
            match content {
                Some(Value::String(content)) => {
                    let metadata = match map.remove("metadata") {
                        Some(Value::Object(metadata)) => metadata,
                        _ => Metadata::new(),
                    };
                    Document::new(content, metadata)
                }
                other => {
                    // Put the object back together so nothing is lost in the stringified form.
                    if let Some(other) = other {
                        map.insert("content".to_string(), other);
                    }
                    tracing::debug!("Non-document object in interchange list, stringifying");
                    Document::from_text(Value::Object(map).to_string())
                }
            }
        }
        Value::String(text) => Document::from_text(text),
        other => Document::from_text(other.to_string()),
    }
}
