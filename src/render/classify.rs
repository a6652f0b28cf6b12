//! Decides whether a message body is HTML source that should be shown as
//! code instead of being run through the markdown stages.

use super::codec;
use super::pattern::Pattern;
use crate::error::RenderError;

static HTML_FENCE: Pattern = Pattern::new(r"(?is)```[ \t]*(?:html|htm)\b[^\n]*\n?(.*?)```");
static STRUCTURAL_TAG: Pattern = Pattern::new(
    r"(?i)<(?:!doctype|html|head|body|div|span|p|h[1-6]|meta|title|style|script|link)[\s>]",
);

/// `true` when `content` looks like HTML source.
///
/// A fenced `html`/`htm` block is judged by its interior only, as is a block
/// delimited by storage sentinels; anything else is judged as a whole.
pub fn is_html_content(content: &str) -> bool {
    match classify(content) {
        Ok(is_html) => is_html,
        Err(err) => {
            tracing::warn!("html classification failed, treating as prose: {err}");
            false
        }
    }
}

fn classify(content: &str) -> Result<bool, RenderError> {
    let tags = STRUCTURAL_TAG.get()?;

    if let Some(interior) = HTML_FENCE
        .get()?
        .captures(content)
        .and_then(|caps| caps.get(1))
    {
        return Ok(tags.is_match(interior.as_str()));
    }

    if let Some(interior) = codec::sentinel_interior(content)? {
        return Ok(tags.is_match(interior));
    }

    Ok(tags.is_match(content))
}
