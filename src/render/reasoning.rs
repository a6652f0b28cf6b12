//! Extraction of `<think>` reasoning blocks from model output.
//!
//! Both the literal form and the entity-escaped form (`&lt;think&gt;`) are
//! recognized. Removal happens in layers: complete blocks first, then an
//! unterminated opening tag (which swallows the rest of the text), then any
//! stray markers that neither pass anchored.

use super::escape::decode_entities;
use super::pattern::Pattern;
use crate::error::RenderError;
use serde::{Deserialize, Serialize};

static COMPLETE_BLOCK: Pattern =
    Pattern::new(r"(?s)<think>(.*?)</think>|&lt;think&gt;(.*?)&lt;/think&gt;");
static UNTERMINATED_BLOCK: Pattern = Pattern::new(r"(?s)(<think>|&lt;think&gt;)(.*)\z");
static PARAGRAPH_BREAK: Pattern = Pattern::new(r"\n\s*\n");

const THINK_MARKERS: [&str; 4] = ["<think>", "</think>", "&lt;think&gt;", "&lt;/think&gt;"];

/// One reasoning span pulled out of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningBlock {
    /// Block interior exactly as the model wrote it (entity-decoded when the
    /// block arrived in escaped form).
    pub raw_content: String,
    /// Paragraphs of the block, split on blank lines and trimmed.
    pub segments: Vec<String>,
    /// `false` when the closing tag never arrived (still streaming).
    pub complete: bool,
}

/// Result of [`extract_reasoning`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub cleaned: String,
    pub blocks: Vec<ReasoningBlock>,
}

impl Extraction {
    pub fn has_reasoning(&self) -> bool {
        !self.blocks.is_empty()
    }
}

/// Split reasoning blocks out of `text`.
///
/// Whitespace-only blocks are removed without producing a [`ReasoningBlock`].
/// Never fails: if a pattern cannot be used the markers are removed as plain
/// substrings and no blocks are reported.
pub fn extract_reasoning(text: &str) -> Extraction {
    match try_extract(text) {
        Ok(extraction) => extraction,
        Err(err) => {
            tracing::warn!("reasoning extraction failed, stripping markers only: {err}");
            Extraction {
                cleaned: strip_markers(text).trim().to_string(),
                blocks: Vec::new(),
            }
        }
    }
}

/// Remove every reasoning block and marker, returning the trimmed remainder.
pub fn strip_reasoning_tags(text: &str) -> String {
    extract_reasoning(text).cleaned
}

/// Whether any literal or escaped think marker occurs in `text`.
pub fn has_reasoning_markers(text: &str) -> bool {
    THINK_MARKERS.iter().any(|marker| text.contains(marker))
}

fn try_extract(text: &str) -> Result<Extraction, RenderError> {
    if !has_reasoning_markers(text) {
        return Ok(Extraction {
            cleaned: text.trim().to_string(),
            blocks: Vec::new(),
        });
    }

    let mut blocks = Vec::new();
    let mut remaining = String::with_capacity(text.len());
    let mut last_end = 0;

    for caps in COMPLETE_BLOCK.get()?.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        remaining.push_str(&text[last_end..whole.start()]);
        last_end = whole.end();

        let interior = match (caps.get(1), caps.get(2)) {
            (Some(literal), _) => literal.as_str().to_string(),
            (None, Some(escaped)) => decode_entities(escaped.as_str()),
            (None, None) => continue,
        };
        if let Some(block) = build_block(interior, true)? {
            blocks.push(block);
        }
    }
    remaining.push_str(&text[last_end..]);

    if let Some(caps) = UNTERMINATED_BLOCK.get()?.captures(&remaining) {
        let start = caps.get(0).map_or(remaining.len(), |m| m.start());
        let escaped = caps.get(1).is_some_and(|m| m.as_str().starts_with('&'));
        let tail = caps.get(2).map_or("", |m| m.as_str());
        let interior = strip_markers(tail);
        let interior = if escaped {
            decode_entities(&interior)
        } else {
            interior
        };
        if let Some(block) = build_block(interior, false)? {
            blocks.push(block);
        }
        remaining.truncate(start);
    }

    let cleaned = strip_markers(&remaining).trim().to_string();
    tracing::debug!(blocks = blocks.len(), "extracted reasoning blocks");
    Ok(Extraction { cleaned, blocks })
}

fn build_block(raw_content: String, complete: bool) -> Result<Option<ReasoningBlock>, RenderError> {
    if raw_content.trim().is_empty() {
        return Ok(None);
    }
    let segments = split_segments(&raw_content)?;
    Ok(Some(ReasoningBlock {
        raw_content,
        segments,
        complete,
    }))
}

fn split_segments(content: &str) -> Result<Vec<String>, RenderError> {
    Ok(PARAGRAPH_BREAK
        .get()?
        .split(content.trim())
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(ToString::to_string)
        .collect())
}

fn strip_markers(text: &str) -> String {
    THINK_MARKERS
        .iter()
        .fold(text.to_string(), |acc, marker| acc.replace(marker, ""))
}
