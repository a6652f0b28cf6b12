mod core;
mod history;
mod observability;
mod render;

pub use core::Config;
pub use history::HistoryConfig;
pub use observability::ObservabilityConfig;
pub use render::RenderConfig;
