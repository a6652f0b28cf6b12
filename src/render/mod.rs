pub mod classify;
pub mod codec;
pub mod escape;
pub mod markdown;
mod pattern;
pub mod plain;
pub mod reasoning;

pub use classify::is_html_content;
pub use codec::{CodeBlock, decode_for_display, encode_for_storage, extract_code_blocks};
pub use escape::{escape_code_entities, escape_html, escape_source};
pub use markdown::{MARKDOWN_STAGES, Stage, basic_sanitize_input, sanitize_input};
pub use plain::{code_copy_text, plain_text};
pub use reasoning::{
    Extraction, ReasoningBlock, extract_reasoning, has_reasoning_markers, strip_reasoning_tags,
};

use crate::config::RenderConfig;
use crate::history::{Message, MessageRole};

/// Renderer bound to a [`RenderConfig`].
#[derive(Debug, Clone)]
pub struct MessageRenderer {
    config: RenderConfig,
}

impl MessageRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render model output, with reasoning handling when the config enables it.
    pub fn render(&self, content: &str) -> String {
        markdown::render_or_fallback(content, self.config.reasoning_enabled, self.config.trace_stages)
    }

    /// Render a chat message. Only assistant output gets reasoning handling;
    /// user and system text never hides anything behind think tags.
    pub fn render_message(&self, message: &Message) -> String {
        match message.role {
            MessageRole::Assistant => self.render(&message.content),
            MessageRole::User | MessageRole::System => {
                markdown::render_or_fallback(&message.content, false, self.config.trace_stages)
            }
        }
    }
}

impl Default for MessageRenderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}
