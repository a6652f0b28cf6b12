pub mod schema;

pub use schema::{Config, HistoryConfig, ObservabilityConfig, RenderConfig};
