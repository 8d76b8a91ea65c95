//! The record that flows through every pipeline stage.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Open metadata mapping. Keys such as `type` or `page` are read defensively;
/// absence means "unknown".
pub type Metadata = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(alias = "page_content")]
    pub content: String,
    #[serde(default, deserialize_with = "nullable_metadata")]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// A document with no metadata, used when raw text has to stand in for a
    /// parsed collection.
    pub fn from_text(content: impl Into<String>) -> Self {
        Self::new(content, Metadata::new())
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// The `type` tag assigned by the document partitioner, if any.
    pub fn doc_type(&self) -> Option<&str> {
        self.meta_str("type")
    }

    /// Page label for display; numbers and strings are both accepted.
    pub fn page_label(&self) -> String {
        match self.metadata.get("page") {
            Some(Value::String(page)) if !page.is_empty() => page.clone(),
            Some(Value::Number(page)) => page.to_string(),
            _ => "unknown".to_string(),
        }
    }
}

fn nullable_metadata<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Metadata>::deserialize(deserializer)?.unwrap_or_default())
}
