//! Model output to display HTML.
//!
//! [`sanitize_input`] runs, in order:
//!
//! 1. reasoning extraction ([`super::reasoning`]),
//! 2. HTML-source detection ([`super::classify`]); HTML source is shown as an
//!    escaped code display and nothing below applies,
//! 3. the [`MARKDOWN_STAGES`] over the remaining text, with the rendered
//!    reasoning containers placed in front of the result.
//!
//! Escaping is always the first markdown stage. Every tag the later stages
//! add is trusted markup built around already escaped text.

use super::classify::is_html_content;
use super::codec::{self, Fence};
use super::escape::{
    decode_entities, escape_code_entities, escape_html, escape_source, looks_entity_escaped,
};
use super::pattern::Pattern;
use super::reasoning::{ReasoningBlock, extract_reasoning, has_reasoning_markers};
use crate::error::RenderError;

static INLINE_CODE: Pattern = Pattern::new(r"`([^`\n]+)`");
static HEADER: Pattern = Pattern::new(r"(?m)^(#{1,3})[ \t]+(.+?)[ \t]*$");
static BULLET_ITEM: Pattern = Pattern::new(r"(?m)^[ \t]*[*-][ \t]+(.+)$");
static NUMBERED_ITEM: Pattern = Pattern::new(r"(?m)^[ \t]*\d+\.[ \t]+(.+)$");
static STRONG_STAR: Pattern = Pattern::new(r"\*\*([^*\n]+?)\*\*");
static STRONG_UNDERSCORE: Pattern = Pattern::new(r"__([^_\n]+?)__");
static EMPHASIS: Pattern = Pattern::new(r"\*([^*\n]+?)\*");
static LINK: Pattern =
    Pattern::new(r"\[([^\]\n]+)\]\(((?:https?://|mailto:)[^\s()<>]+)\)");
static ESCAPED_TAG: Pattern = Pattern::new(r"&lt;/?[A-Za-z][\w-]*(?:\s.*?)?/?&gt;");
static FENCE_LINE: Pattern = Pattern::new(r"^\s*```[\w+#.-]*\s*$");

const BULLET_OPEN: &str = "<li class=\"ul-item\">";
const NUMBERED_OPEN: &str = "<li class=\"ol-item\">";
const BLOCK_PREFIXES: [&str; 12] = [
    "<h1", "<h2", "<h3", "<ul", "</ul", "<ol", "</ol", "<li", "<pre", "<div", "</div", "<blockquote",
];

/// One pure text-to-text pass of the markdown pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Escape prose (entity-preserving) and fenced code (strict).
    EscapeHtml,
    /// Fenced blocks become single-line `<pre>` elements with `<br>` breaks.
    FencedCode,
    InlineCode,
    /// `#`, `##`, `###` at line start.
    Headers,
    /// `*`, `-` and `1.` items become tagged `<li>` lines.
    ListItems,
    /// Consecutive items of one kind are wrapped in `<ul>` / `<ol>`.
    ListWrap,
    Emphasis,
    /// `[text](url)` for http(s) and mailto targets only.
    Links,
    /// Remaining lines become `<p>`, or `<pre class="html-code-line">` when
    /// they still show escaped tags.
    Paragraphs,
    ParagraphSpacing,
}

/// Fixed stage order. Each stage assumes all earlier ones already ran.
pub const MARKDOWN_STAGES: [Stage; 10] = [
    Stage::EscapeHtml,
    Stage::FencedCode,
    Stage::InlineCode,
    Stage::Headers,
    Stage::ListItems,
    Stage::ListWrap,
    Stage::Emphasis,
    Stage::Links,
    Stage::Paragraphs,
    Stage::ParagraphSpacing,
];

/// Stages that make sense inside a single reasoning paragraph.
const INLINE_STAGES: [Stage; 3] = [Stage::InlineCode, Stage::Emphasis, Stage::Links];

impl Stage {
    pub const fn name(self) -> &'static str {
        match self {
            Self::EscapeHtml => "escape_html",
            Self::FencedCode => "fenced_code",
            Self::InlineCode => "inline_code",
            Self::Headers => "headers",
            Self::ListItems => "list_items",
            Self::ListWrap => "list_wrap",
            Self::Emphasis => "emphasis",
            Self::Links => "links",
            Self::Paragraphs => "paragraphs",
            Self::ParagraphSpacing => "paragraph_spacing",
        }
    }

    /// Run the stage. A failure is reported under the stage name.
    pub fn apply(self, text: &str) -> Result<String, RenderError> {
        self.run(text).map_err(|err| self.failed(&err))
    }

    fn failed(self, err: &RenderError) -> RenderError {
        RenderError::Stage {
            stage: self.name(),
            message: err.to_string(),
        }
    }

    fn run(self, text: &str) -> Result<String, RenderError> {
        match self {
            Self::EscapeHtml => escape_stage(text),
            Self::FencedCode => fenced_code_stage(text),
            Self::InlineCode => inline_code_stage(text),
            Self::Headers => headers_stage(text),
            Self::ListItems => list_items_stage(text),
            Self::ListWrap => Ok(list_wrap_stage(text)),
            Self::Emphasis => emphasis_stage(text),
            Self::Links => links_stage(text),
            Self::Paragraphs => paragraphs_stage(text),
            Self::ParagraphSpacing => Ok(paragraph_spacing_stage(text)),
        }
    }
}

/// Render model output, reasoning blocks included.
pub fn sanitize_input(raw_text: &str) -> String {
    render_or_fallback(raw_text, true, false)
}

/// Render output of a model that never emits reasoning; think tags get no
/// special treatment and are simply escaped.
pub fn basic_sanitize_input(raw_text: &str) -> String {
    render_or_fallback(raw_text, false, false)
}

pub(crate) fn render_or_fallback(raw_text: &str, with_reasoning: bool, trace: bool) -> String {
    match render(raw_text, with_reasoning, trace) {
        Ok(html) => html,
        Err(err) => {
            tracing::warn!("markdown rendering failed, showing escaped text: {err}");
            escaped_fallback(raw_text, with_reasoning)
        }
    }
}

fn render(raw_text: &str, with_reasoning: bool, trace: bool) -> Result<String, RenderError> {
    let normalized = raw_text.replace("\r\n", "\n");

    let (text, blocks) = if with_reasoning {
        let extraction = extract_reasoning(&normalized);
        (extraction.cleaned, extraction.blocks)
    } else {
        (normalized.trim().to_string(), Vec::new())
    };
    let marker_only = with_reasoning && blocks.is_empty() && has_reasoning_markers(&normalized);
    let reasoning_html = render_reasoning_blocks(&blocks)?;

    let body = if is_html_content(&text) {
        tracing::debug!("message body classified as html source");
        format!(
            "<div class=\"message-content\">{reasoning_html}{}</div>",
            render_code_display(&text)?
        )
    } else {
        let mut html = codec::strip_sentinels(&text);
        for stage in MARKDOWN_STAGES {
            html = stage.apply(&html)?;
            if trace {
                tracing::debug!(stage = stage.name(), len = html.len(), "markdown stage applied");
            }
        }
        format!("{reasoning_html}{html}")
    };

    if marker_only {
        return Ok(format!(
            "<div class=\"reasoning-marker\" data-has-reasoning=\"true\">{body}</div>"
        ));
    }
    Ok(body)
}

fn escaped_fallback(raw_text: &str, with_reasoning: bool) -> String {
    let text = if with_reasoning {
        super::reasoning::strip_reasoning_tags(raw_text)
    } else {
        raw_text.trim().to_string()
    };
    format!("<p>{}</p>", escape_html(&text).replace('\n', "<br>"))
}

/// Containers for reasoning blocks, one per block, one step per paragraph.
pub fn render_reasoning_blocks(blocks: &[ReasoningBlock]) -> Result<String, RenderError> {
    let mut html = String::new();
    for block in blocks {
        let state = if block.complete { "" } else { " in-progress" };
        html.push_str(&format!(
            "<div class=\"reasoning-block{state}\" data-complete=\"{}\">\
             <div class=\"reasoning-header\">Reasoning Process</div>\
             <div class=\"reasoning-content\">",
            block.complete
        ));
        for segment in &block.segments {
            let mut step = escape_html(segment).replace('\n', "<br>");
            for stage in INLINE_STAGES {
                step = stage.apply(&step)?;
            }
            html.push_str(&format!("<div class=\"reasoning-step\">{step}</div>"));
        }
        html.push_str("</div></div>");
    }
    Ok(html)
}

/// Read-only display of HTML source: escaped line by line, leading
/// indentation kept as non-breaking spaces, fence lines dropped.
pub fn render_code_display(text: &str) -> Result<String, RenderError> {
    let fence_line = FENCE_LINE.get()?;
    let source = codec::strip_sentinels(text);
    let lines: Vec<String> = source
        .lines()
        .filter(|line| !fence_line.is_match(line))
        .map(|line| {
            let body = line.trim_start_matches([' ', '\t']);
            let indent = indent_as_nbsp(&line[..line.len() - body.len()]);
            format!("<span class=\"code-line\">{indent}{}</span>", escape_source(body))
        })
        .collect();
    Ok(format!(
        "<div class=\"html-code-display\" data-language=\"html\" data-multiline=\"true\">{}</div>",
        lines.join("<br>")
    ))
}

fn indent_as_nbsp(indent: &str) -> String {
    indent
        .chars()
        .map(|ch| if ch == '\t' { "&nbsp;".repeat(4) } else { "&nbsp;".to_string() })
        .collect()
}

// ── Stages ────────────────────────────────────────────────────────────────

fn escape_stage(text: &str) -> Result<String, RenderError> {
    codec::map_segments(text, escape_html, |fence: Fence<'_>| {
        let code = if looks_entity_escaped(fence.code) {
            decode_entities(fence.code)
        } else {
            fence.code.to_string()
        };
        fence.rebuild(&escape_code_entities(&code))
    })
}

fn fenced_code_stage(text: &str) -> Result<String, RenderError> {
    codec::map_fences(text, |fence: Fence<'_>| {
        let language = fence_language(fence.language);
        let code = fence.code.strip_suffix('\n').unwrap_or(fence.code);
        let multiline = code.contains('\n');
        let body = protect_markdown(code).replace('\n', "<br>");
        format!(
            "\n<pre class=\"code-block\" data-language=\"{language}\" data-multiline=\"{multiline}\">\
             <code class=\"language-{language}\">{body}</code></pre>\n"
        )
    })
}

/// Language tag for the code block attributes. Only characters that mean
/// nothing to the later stages survive.
fn fence_language(language: Option<&str>) -> String {
    let language: String = language
        .unwrap_or_default()
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '#' | '.' | '-'))
        .collect();
    if language.is_empty() {
        "plaintext".to_string()
    } else {
        language
    }
}

fn inline_code_stage(text: &str) -> Result<String, RenderError> {
    Ok(INLINE_CODE
        .get()?
        .replace_all(text, |caps: &regex::Captures<'_>| {
            format!("<code class=\"inline-code\">{}</code>", protect_markdown(&caps[1]))
        })
        .into_owned())
}

fn headers_stage(text: &str) -> Result<String, RenderError> {
    Ok(HEADER
        .get()?
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let level = caps[1].len();
            format!("<h{level}>{}</h{level}>", &caps[2])
        })
        .into_owned())
}

fn list_items_stage(text: &str) -> Result<String, RenderError> {
    let bullets = BULLET_ITEM
        .get()?
        .replace_all(text, format!("{BULLET_OPEN}$1</li>").as_str())
        .into_owned();
    Ok(NUMBERED_ITEM
        .get()?
        .replace_all(&bullets, format!("{NUMBERED_OPEN}$1</li>").as_str())
        .into_owned())
}

fn list_wrap_stage(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut open: Option<&str> = None;
    for line in text.split('\n') {
        let kind = if line.starts_with(BULLET_OPEN) {
            Some("ul")
        } else if line.starts_with(NUMBERED_OPEN) {
            Some("ol")
        } else {
            None
        };
        if open != kind {
            match open {
                Some("ul") => out.push("</ul>"),
                Some(_) => out.push("</ol>"),
                None => {}
            }
            match kind {
                Some("ul") => out.push("<ul>"),
                Some(_) => out.push("<ol>"),
                None => {}
            }
            open = kind;
        }
        out.push(line);
    }
    match open {
        Some("ul") => out.push("</ul>"),
        Some(_) => out.push("</ol>"),
        None => {}
    }
    out.join("\n")
}

fn emphasis_stage(text: &str) -> Result<String, RenderError> {
    let strong = STRONG_STAR.get()?.replace_all(text, "<strong>$1</strong>");
    let strong = STRONG_UNDERSCORE
        .get()?
        .replace_all(&strong, "<strong>$1</strong>")
        .into_owned();
    Ok(EMPHASIS
        .get()?
        .replace_all(&strong, "<em>$1</em>")
        .into_owned())
}

fn links_stage(text: &str) -> Result<String, RenderError> {
    Ok(LINK
        .get()?
        .replace_all(
            text,
            "<a href=\"$2\" target=\"_blank\" rel=\"noopener noreferrer\">$1</a>",
        )
        .into_owned())
}

fn paragraphs_stage(text: &str) -> Result<String, RenderError> {
    let escaped_tag = ESCAPED_TAG.get()?;
    let mut out = Vec::new();
    for line in text.split('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if BLOCK_PREFIXES.iter().any(|prefix| trimmed.starts_with(prefix)) {
            out.push(trimmed.to_string());
        } else if escaped_tag.is_match(trimmed) {
            out.push(format!("<pre class=\"html-code-line\">{line}</pre>"));
        } else {
            out.push(format!("<p>{trimmed}</p>"));
        }
    }
    Ok(out.join("\n"))
}

fn paragraph_spacing_stage(text: &str) -> String {
    text.replace(
        "</p>\n<p>",
        "</p>\n<div class=\"paragraph-spacer\"></div>\n<p>",
    )
}

/// Swap characters the inline stages react to for equivalent references.
/// `#` is left alone: it only matters at line start and it occurs inside the
/// numeric references the escapers emit.
fn protect_markdown(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    for ch in code.chars() {
        match ch {
            '*' => out.push_str("&#42;"),
            '_' => out.push_str("&#95;"),
            '`' => out.push_str("&#96;"),
            '[' => out.push_str("&#91;"),
            ']' => out.push_str("&#93;"),
            _ => out.push(ch),
        }
    }
    out
}
