//! multipart/form-data uploads
//!
//! A descriptor's data is flattened into an ordered list of parts once per
//! send. Each attempt turns that list into a fresh [`reqwest::multipart::Form`],
//! so a retried upload carries the same parts.

use bytes::Bytes;
use reqwest::multipart::{Form, Part as FormPart};
use serde_json::{Map, Value};

use super::error::ClientError;
use super::request::ProgressTracker;

const DEFAULT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// Binary content of a file part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: Option<String>,
    pub content: Bytes,
}

impl FilePart {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            content: content.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    File(FilePart),
}

/// One named part of the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub value: PartValue,
}

impl Part {
    /// Size of the part's content, without multipart framing
    pub(crate) fn content_len(&self) -> u64 {
        match &self.value {
            PartValue::Text(text) => text.len() as u64,
            PartValue::File(file) => file.content.len() as u64,
        }
    }
}

/// Flatten structured data plus binary attachments into form parts
///
/// An array value becomes one part per element under the same name; any
/// other value becomes a single part. Attachments follow the data parts.
pub(crate) fn form_parts(data: &Map<String, Value>, attachments: &[(String, FilePart)]) -> Vec<Part> {
    let mut parts = Vec::new();
    for (key, value) in data {
        match value {
            Value::Array(items) => {
                parts.extend(items.iter().map(|item| text_part(key, item)));
            }
            other => parts.push(text_part(key, other)),
        }
    }
    parts.extend(attachments.iter().map(|(key, file)| Part {
        name: key.clone(),
        value: PartValue::File(file.clone()),
    }));
    parts
}

/// Build the request form; with a tracker every part reports its bytes as they go out
pub(crate) fn build_form(parts: &[Part], progress: Option<&ProgressTracker>) -> Result<Form, ClientError> {
    let mut form = Form::new();
    for part in parts {
        let form_part = match &part.value {
            PartValue::Text(text) => match progress {
                Some(tracker) => FormPart::stream_with_length(
                    tracker.body(Bytes::from(text.clone())),
                    part.content_len(),
                ),
                None => FormPart::text(text.clone()),
            },
            PartValue::File(file) => {
                let content = match progress {
                    Some(tracker) => FormPart::stream_with_length(
                        tracker.body(file.content.clone()),
                        part.content_len(),
                    ),
                    None => FormPart::bytes(file.content.to_vec()),
                };
                content.file_name(file.file_name.clone()).mime_str(
                    file.content_type
                        .as_deref()
                        .unwrap_or(DEFAULT_FILE_CONTENT_TYPE),
                )?
            }
        };
        form = form.part(part.name.clone(), form_part);
    }
    Ok(form)
}

fn text_part(name: &str, value: &Value) -> Part {
    Part {
        name: name.to_string(),
        value: PartValue::Text(text_value(value)),
    }
}

/// Form text for a JSON value: strings verbatim, everything else as JSON
fn text_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
