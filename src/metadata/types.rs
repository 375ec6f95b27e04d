//! Rows and frames exchanged with the metadata backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::{MetadataError, MetadataResult};

const TEXT_FIELD: &str = "__text";

/// One picker entry returned by a metadata query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFindValue {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl MetricFindValue {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: None,
        }
    }

    pub fn with_value(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: Some(value.into()),
        }
    }

    /// The value to bind, falling back to the display text.
    pub fn value_or_text(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.text)
    }

    /// Convert a result frame into picker rows.
    ///
    /// A single field is text only. With two fields the first is the
    /// display text only when it is named `__text`; otherwise the second
    /// field is the text and the first the value.
    pub fn from_frame(frame: &ResultFrame) -> MetadataResult<Vec<MetricFindValue>> {
        match frame.fields.as_slice() {
            [] => Err(MetadataError::MalformedFrame(
                "frame has no fields".to_string(),
            )),
            [field] => Ok(field
                .values
                .iter()
                .map(|v| MetricFindValue::text(cell_text(v)))
                .collect()),
            fields => {
                if fields.len() > 2 {
                    tracing::warn!(
                        fields = fields.len(),
                        "metadata frame has more than two fields, extra fields ignored"
                    );
                }

                let (text, value) = if fields[0].name == TEXT_FIELD {
                    (&fields[0], &fields[1])
                } else {
                    (&fields[1], &fields[0])
                };

                if text.values.len() != value.values.len() {
                    return Err(MetadataError::MalformedFrame(format!(
                        "field '{}' has {} rows but '{}' has {}",
                        text.name,
                        text.values.len(),
                        value.name,
                        value.values.len()
                    )));
                }

                Ok(text
                    .values
                    .iter()
                    .zip(&value.values)
                    .map(|(t, v)| MetricFindValue::with_value(cell_text(t), cell_text(v)))
                    .collect())
            }
        }
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A named column of a result frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameField {
    pub name: String,
    #[serde(default)]
    pub values: Vec<Value>,
}

impl FrameField {
    pub fn new(name: &str, values: Vec<Value>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }
}

/// Columnar query result as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultFrame {
    #[serde(default)]
    pub fields: Vec<FrameField>,
}

impl ResultFrame {
    pub fn new(fields: Vec<FrameField>) -> Self {
        Self { fields }
    }
}
