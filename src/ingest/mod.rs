//! Attachment text extraction.
//!
//! OCR, PDF and office formats are handled by collaborators implementing
//! [`TextExtractor`]; this module only dispatches and formats the result so
//! it can be appended to a user message ahead of rendering.

use crate::error::IngestError;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

/// An uploaded file, either still raw or already turned into text upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Raw {
        name: String,
        mime: String,
        bytes: Vec<u8>,
    },
    PreExtracted {
        name: String,
        text: String,
    },
}

impl FileSource {
    pub fn raw(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::Raw {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn pre_extracted(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::PreExtracted {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Raw { name, .. } | Self::PreExtracted { name, .. } => name,
        }
    }
}

/// Turns raw file bytes of some MIME types into text.
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &str;

    fn supports(&self, mime: &str) -> bool;

    fn extract<'a>(
        &'a self,
        file_name: &'a str,
        bytes: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;
}

/// Decodes text-like payloads (`text/*`, JSON, XML) as UTF-8.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain_text"
    }

    fn supports(&self, content_type: &str) -> bool {
        let Ok(parsed) = content_type.trim().to_ascii_lowercase().parse::<mime::Mime>() else {
            return false;
        };
        parsed.type_() == mime::TEXT
            || parsed.subtype() == mime::JSON
            || parsed.subtype() == mime::XML
            || parsed.suffix() == Some(mime::JSON)
            || parsed.suffix() == Some(mime::XML)
    }

    fn extract<'a>(
        &'a self,
        file_name: &'a str,
        bytes: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
            Ok(match std::str::from_utf8(bytes) {
                Ok(text) => text.to_string(),
                Err(_) => {
                    tracing::warn!(file_name, "attachment is not valid UTF-8, decoding lossily");
                    String::from_utf8_lossy(bytes).into_owned()
                }
            })
        })
    }
}

/// MIME type to dispatch on: the declared one, or a sniffed one when the
/// upload carried none or only `application/octet-stream`.
pub fn effective_mime(declared: &str, bytes: &[u8]) -> String {
    let declared = declared.trim();
    if !declared.is_empty() && !declared.eq_ignore_ascii_case("application/octet-stream") {
        return declared.to_string();
    }
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }
    if std::str::from_utf8(bytes).is_ok() {
        "text/plain".into()
    } else {
        "application/octet-stream".into()
    }
}

/// Default extractor chain.
pub fn default_extractors() -> Vec<Arc<dyn TextExtractor>> {
    vec![Arc::new(PlainTextExtractor)]
}

/// Text of `source`. Pre-extracted text is used as is; raw bytes go to the
/// first extractor that supports the MIME type.
pub async fn extract_text(
    source: &FileSource,
    extractors: &[Arc<dyn TextExtractor>],
) -> Result<String, IngestError> {
    let text = match source {
        FileSource::PreExtracted { text, .. } => text.clone(),
        FileSource::Raw { name, mime, bytes } => {
            let mime = effective_mime(mime, bytes);
            let extractor = extractors
                .iter()
                .find(|extractor| extractor.supports(&mime))
                .ok_or_else(|| IngestError::Unsupported {
                    name: name.clone(),
                    mime: mime.clone(),
                })?;
            tracing::debug!(file = %name, extractor = extractor.name(), "extracting attachment text");
            extractor
                .extract(name, bytes)
                .await
                .map_err(|err| IngestError::Extraction {
                    name: name.clone(),
                    message: format!("{err:#}"),
                })?
        }
    };

    if text.trim().is_empty() {
        return Err(IngestError::Empty(source.name().to_string()));
    }
    Ok(text)
}

/// Format extracted text as a labelled fenced block for a user message.
///
/// The fence language comes from the file extension, so html and xml
/// attachments take the sentinel path through the code block codec.
/// Embedded triple backticks become `'''` to keep the fence closed.
pub fn attachment_block(file_name: &str, text: &str) -> String {
    let language = fence_language(file_name);
    let body = text.replace("```", "'''");
    let body = body.trim_end_matches('\n');
    format!("\n\n**{file_name}**\n```{language}\n{body}\n```")
}

fn fence_language(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("html" | "htm") => "html",
        Some("xml" | "svg") => "xml",
        Some("json") => "json",
        Some("md" | "markdown") => "markdown",
        Some("rs") => "rust",
        Some("py") => "python",
        Some("js") => "javascript",
        Some("ts") => "typescript",
        Some("csv") => "csv",
        _ => "",
    }
}
