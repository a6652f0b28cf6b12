#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod config;
pub mod context;
pub mod error;
pub mod history;
pub mod ingest;
pub mod observability;
pub mod render;

pub use config::Config;
pub use context::CoreContext;
pub use error::{LmsaError, Result};
pub use history::{Chat, ChatHistoryOptimizer, Message, MessageRole};
pub use render::{
    MessageRenderer, basic_sanitize_input, decode_for_display, encode_for_storage,
    extract_reasoning, is_html_content, sanitize_input, strip_reasoning_tags,
};
