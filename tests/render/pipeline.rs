use lmsa::render::{
    MARKDOWN_STAGES, MessageRenderer, Stage, basic_sanitize_input, code_copy_text, escape_html,
    plain_text, sanitize_input,
};
use lmsa::{Message, config::RenderConfig};

#[test]
fn scenario_html_block_is_shown_as_code() {
    let html = sanitize_input("```html\n<div>x</div>\n```");
    assert!(html.starts_with("<div class=\"message-content\">"));
    assert!(html.contains("html-code-display"));
    assert!(html.contains("&lt;div&gt;x&lt;/div&gt;"));
    assert!(!html.contains("<div>x</div>"));
}

#[test]
fn reasoning_is_kept_beside_html_code_display() {
    let html = sanitize_input("<think>plan</think>```html\n<p>x</p>\n```");
    let reasoning = html.find("reasoning-block").unwrap();
    let code = html.find("html-code-display").unwrap();
    assert!(reasoning < code);
}

#[test]
fn markdown_document_renders_all_constructs() {
    let text = "# Title\n\nSome **bold** and *soft* text with `code`.\n\n\
                * one\n* two\n\n1. first\n2. second\n\n\
                See [docs](https://example.com).\n\n\
                ```rust\nfn main() {}\n```";
    let html = sanitize_input(text);

    assert!(html.contains("<h1>Title</h1>"));
    assert!(html.contains("<strong>bold</strong>"));
    assert!(html.contains("<em>soft</em>"));
    assert!(html.contains("<code class=\"inline-code\">code</code>"));
    assert!(html.contains("<ul>\n<li class=\"ul-item\">one</li>\n<li class=\"ul-item\">two</li>\n</ul>"));
    assert!(html.contains("<li class=\"ol-item\">second</li>"));
    assert!(html.contains(
        "<a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">docs</a>"
    ));
    assert!(html.contains("data-language=\"rust\""));
}

#[test]
fn consecutive_paragraphs_get_spacers() {
    let html = sanitize_input("first line\nsecond line");
    assert_eq!(
        html,
        "<p>first line</p>\n<div class=\"paragraph-spacer\"></div>\n<p>second line</p>"
    );
}

#[test]
fn stages_can_be_applied_one_by_one() {
    let mut html = "plain".to_string();
    for stage in MARKDOWN_STAGES {
        html = stage.apply(&html).unwrap();
    }
    assert_eq!(html, sanitize_input("plain"));
    assert_eq!(Stage::Headers.name(), "headers");
}

#[test]
fn sanitizing_escaped_text_does_not_double_escape() {
    let raw = "Tom & Jerry say \"hi\" <3";
    let once = sanitize_input(&escape_html(raw));
    assert!(!once.contains("&amp;amp;"));
    assert!(!once.contains("&amp;lt;"));

    let twice = sanitize_input(&escape_html(&escape_html(raw)));
    assert!(!twice.contains("&amp;amp;"));
    assert_eq!(twice, once);
}

#[test]
fn html_source_display_keeps_author_entities() {
    let html = sanitize_input("```html\n<p>&copy; 2024 &lt;tag&gt;</p>\n```");
    assert!(html.contains("html-code-display"));
    assert!(html.contains("&amp;copy;"));
    assert!(html.contains("&amp;lt;tag&amp;gt;"));
    assert!(!html.contains(">&copy;"));
}

#[test]
fn basic_variant_leaves_think_tags_visible() {
    let html = basic_sanitize_input("<think>x</think>y");
    assert!(html.contains("&lt;think&gt;x&lt;/think&gt;y"));
    assert!(!html.contains("reasoning-block"));
}

#[test]
fn copy_text_of_rendered_code_matches_source() {
    let source = "let v = vec![1, 2];\nprintln!(\"{v:?} <ok>\");";
    let html = sanitize_input(&format!("```rust\n{source}\n```"));
    let start = html.find("<code class=\"language-rust\">").unwrap();
    let end = html.find("</code>").unwrap() + "</code>".len();
    assert_eq!(code_copy_text(&html[start..end]), source);
}

#[test]
fn plain_text_is_reasoning_free() {
    assert_eq!(plain_text("<think>x</think> Result "), "Result");
}

#[test]
fn renderer_follows_message_role() {
    let renderer = MessageRenderer::new(RenderConfig::default());
    let assistant = renderer.render_message(&Message::assistant("<think>r</think>ok"));
    let system = renderer.render_message(&Message::system("<think>r</think>ok"));
    assert!(assistant.contains("reasoning-step"));
    assert!(!system.contains("reasoning-step"));
}
