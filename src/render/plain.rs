//! Plain text for copy-to-clipboard actions.

use super::codec::strip_sentinels;
use super::escape::decode_entities;
use super::pattern::Pattern;
use super::reasoning::strip_reasoning_tags;

static BREAK_TAG: Pattern = Pattern::new(r"(?i)<br\s*/?>");
static ANY_TAG: Pattern = Pattern::new(r"<[^>]*>");

/// Message text as the user should get it when copying the whole message:
/// no reasoning, no storage sentinels.
pub fn plain_text(raw_text: &str) -> String {
    strip_sentinels(&strip_reasoning_tags(raw_text))
}

/// Source text of a rendered code block body (the inside of a
/// `data-multiline` element): breaks become newlines, tags are dropped and
/// references decoded.
pub fn code_copy_text(rendered: &str) -> String {
    let (Ok(breaks), Ok(tags)) = (BREAK_TAG.get(), ANY_TAG.get()) else {
        tracing::warn!("copy text patterns unavailable, decoding entities only");
        return decode_entities(rendered);
    };
    let with_newlines = breaks.replace_all(rendered, "\n");
    let untagged = tags.replace_all(&with_newlines, "");
    decode_entities(&untagged).replace('\u{a0}', " ")
}
