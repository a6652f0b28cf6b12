pub mod active;
pub mod compressor;
pub mod optimizer;
pub mod store;
pub mod types;

pub use active::ActiveChats;
#[cfg(feature = "gzip")]
pub use compressor::GzipCompressor;
pub use compressor::{Compressor, PassthroughCompressor, create_compressor};
pub use optimizer::{ChatHistoryOptimizer, HistoryStats};
pub use store::{ArchiveStore, InMemoryArchiveStore, archive_key};
pub use types::{Chat, Message, MessageRole};
