use bytes::Bytes;
use serde::Deserialize;
use std::fmt;

pub const DEFAULT_TEST_PROMPT: &str = "Привет! Как дела?";

/// Opaque per-request token used to correlate log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    pub fn new() -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self {
            request_id: format!("{}-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S%3f"), &id[..8]),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.request_id)
    }
}

/// A file received through the `/analyze` upload form.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub content: Bytes,
}

impl UploadedDocument {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Suffix check only, case-sensitive. Content sniffing is left to the decoder.
    pub fn has_pdf_name(file_name: &str) -> bool {
        file_name.ends_with(".pdf")
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProviderTestForm {
    #[serde(default)]
    pub text: Option<String>,
}

impl ProviderTestForm {
    pub fn prompt(&self) -> &str {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or(DEFAULT_TEST_PROMPT)
    }
}
