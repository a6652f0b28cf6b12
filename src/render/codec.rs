//! Storage / display encoding of fenced code blocks.
//!
//! HTML and XML code is stored between sentinel markers so that later
//! escaping passes leave it byte-for-byte intact. The only normalization is
//! on the fence header: trailing blanks after the language tag are dropped
//! and an html/xml fence always gets a newline after its tag.

use super::classify;
use super::escape::{decode_entities, escape_code_entities, looks_entity_escaped};
use super::pattern::Pattern;
use crate::error::RenderError;
use serde::{Deserialize, Serialize};

pub const SENTINEL_START: &str = "[HTML_CODE_BLOCK_START]";
pub const SENTINEL_END: &str = "[HTML_CODE_BLOCK_END]";

/// Earlier spellings still present in stored chats.
const LEGACY_SENTINELS: [&str; 6] = [
    "[HTMLCODEBLOCK]",
    "[/HTMLCODEBLOCK]",
    "[HTML_CODE_BLOCK]",
    "[/HTML_CODE_BLOCK]",
    "[HTML_CODE_BLOCK_EXACT]",
    "[/HTML_CODE_BLOCK_EXACT]",
];

static FENCE: Pattern = Pattern::new(r"(?s)```(?:([\w+#.-]*)[ \t]*\r?\n)?(.*?)```");
static SENTINEL_SPAN: Pattern = Pattern::new(
    r"(?s)\[(?:HTML_CODE_BLOCK_START|HTMLCODEBLOCK|HTML_CODE_BLOCK|HTML_CODE_BLOCK_EXACT)\](.*?)\[(?:HTML_CODE_BLOCK_END|/HTMLCODEBLOCK|/HTML_CODE_BLOCK|/HTML_CODE_BLOCK_EXACT)\]",
);

/// A fenced code span found in message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub raw_code: String,
    pub is_html_like: bool,
}

/// Borrowed view of one fence match.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fence<'a> {
    /// `None` when the opening backticks were not followed by a header line.
    pub language: Option<&'a str>,
    pub code: &'a str,
}

impl Fence<'_> {
    fn is_html_language(&self) -> bool {
        self.language.is_some_and(|lang| {
            lang.eq_ignore_ascii_case("html") || lang.eq_ignore_ascii_case("xml")
        })
    }

    /// Re-emit this fence around `code`, keeping the header shape.
    pub(crate) fn rebuild(&self, code: &str) -> String {
        match self.language {
            Some(lang) => format!("```{lang}\n{code}```"),
            None => format!("```{code}```"),
        }
    }
}

/// Prepare message text for persistence.
pub fn encode_for_storage(text: &str) -> String {
    match map_fences(text, encode_fence) {
        Ok(encoded) => encoded,
        Err(err) => {
            tracing::warn!("code block storage encoding failed, storing text as is: {err}");
            text.to_string()
        }
    }
}

/// Prepare stored message text for display.
///
/// Sentinel-wrapped code comes back raw; html/xml code without sentinels is
/// entity-escaped; everything else passes through.
pub fn decode_for_display(text: &str) -> String {
    match map_fences(text, decode_fence) {
        Ok(decoded) => decoded,
        Err(err) => {
            tracing::warn!("code block display decoding failed, showing text as is: {err}");
            text.to_string()
        }
    }
}

/// Remove every sentinel spelling, current or legacy, wherever it occurs.
pub fn strip_sentinels(text: &str) -> String {
    [SENTINEL_START, SENTINEL_END]
        .iter()
        .chain(LEGACY_SENTINELS.iter())
        .fold(text.to_string(), |acc, marker| acc.replace(marker, ""))
}

pub fn has_sentinels(text: &str) -> bool {
    [SENTINEL_START, SENTINEL_END]
        .iter()
        .chain(LEGACY_SENTINELS.iter())
        .any(|marker| text.contains(marker))
}

/// All fenced blocks in `text`, with sentinels removed and escaped code
/// decoded.
pub fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let collected = map_fences(text, |fence| {
        let mut raw_code = strip_sentinels(fence.code);
        if looks_entity_escaped(&raw_code) {
            raw_code = decode_entities(&raw_code);
        }
        let is_html_like = fence.is_html_language() || classify::is_html_content(&raw_code);
        blocks.push(CodeBlock {
            language: fence.language.filter(|lang| !lang.is_empty()).map(str::to_string),
            raw_code,
            is_html_like,
        });
        String::new()
    });
    if let Err(err) = collected {
        tracing::warn!("code block extraction failed: {err}");
        return Vec::new();
    }
    blocks
}

/// Interior of the first sentinel-delimited span, if any.
pub(crate) fn sentinel_interior(text: &str) -> Result<Option<&str>, RenderError> {
    if !has_sentinels(text) {
        return Ok(None);
    }
    Ok(SENTINEL_SPAN
        .get()?
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str()))
}

/// Rewrite every fence in `text` through `f`, copying the text between
/// fences unchanged.
pub(crate) fn map_fences(
    text: &str,
    f: impl FnMut(Fence<'_>) -> String,
) -> Result<String, RenderError> {
    if !text.contains("```") {
        return Ok(text.to_string());
    }
    map_segments(text, str::to_string, f)
}

/// Like [`map_fences`], but the text between fences goes through `prose`.
pub(crate) fn map_segments(
    text: &str,
    mut prose: impl FnMut(&str) -> String,
    mut fence: impl FnMut(Fence<'_>) -> String,
) -> Result<String, RenderError> {
    let mut out = String::with_capacity(text.len());
    let mut last_end = 0;
    for caps in FENCE.get()?.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&prose(&text[last_end..whole.start()]));
        out.push_str(&fence(Fence {
            language: caps.get(1).map(|m| m.as_str()),
            code: caps.get(2).map_or("", |m| m.as_str()),
        }));
        last_end = whole.end();
    }
    out.push_str(&prose(&text[last_end..]));
    Ok(out)
}

fn encode_fence(fence: Fence<'_>) -> String {
    let code = if looks_entity_escaped(fence.code) {
        decode_entities(fence.code)
    } else {
        fence.code.to_string()
    };
    if fence.is_html_language() {
        let lang = fence.language.unwrap_or("html");
        let inner = strip_sentinels(&code);
        return format!("```{lang}\n{SENTINEL_START}{inner}{SENTINEL_END}```");
    }
    fence.rebuild(&code)
}

fn decode_fence(fence: Fence<'_>) -> String {
    if has_sentinels(fence.code) {
        return fence.rebuild(&strip_sentinels(fence.code));
    }
    if fence.is_html_language() {
        return fence.rebuild(&escape_code_entities(fence.code));
    }
    fence.rebuild(fence.code)
}
