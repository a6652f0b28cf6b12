use crate::config::Config;
use crate::history::{ArchiveStore, ChatHistoryOptimizer, InMemoryArchiveStore};
use crate::ingest::{self, FileSource, TextExtractor};
use crate::render::MessageRenderer;
use std::sync::Arc;

/// Process-wide core state, built once from [`Config`] and handed to UI glue.
pub struct CoreContext {
    config: Config,
    renderer: MessageRenderer,
    history: ChatHistoryOptimizer,
    extractors: Vec<Arc<dyn TextExtractor>>,
}

impl CoreContext {
    /// Context with an in-memory archive store.
    pub fn new(config: Config) -> Self {
        Self::with_store(config, Arc::new(InMemoryArchiveStore::new()))
    }

    /// Context from `~/.lmsa/config.toml` with environment overrides applied.
    pub fn load() -> crate::Result<Self> {
        Self::try_new(Config::load_or_init()?)
    }

    /// Like [`CoreContext::new`], but rejects an invalid config.
    pub fn try_new(config: Config) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn with_store(config: Config, store: Arc<dyn ArchiveStore>) -> Self {
        let renderer = MessageRenderer::new(config.render.clone());
        let history = ChatHistoryOptimizer::new(config.history.clone(), store);
        tracing::debug!(
            reasoning = config.render.reasoning_enabled,
            max_resident = config.history.max_resident,
            "core context initialized"
        );
        Self {
            config,
            renderer,
            history,
            extractors: ingest::default_extractors(),
        }
    }

    /// Register an additional extractor ahead of the built-in ones.
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractors.insert(0, extractor);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn renderer(&self) -> &MessageRenderer {
        &self.renderer
    }

    pub fn history(&self) -> &ChatHistoryOptimizer {
        &self.history
    }

    pub fn extractors(&self) -> &[Arc<dyn TextExtractor>] {
        &self.extractors
    }

    /// Text of an upload, formatted as a block to append to a user message.
    pub async fn attachment(&self, source: &FileSource) -> crate::Result<String> {
        let text = ingest::extract_text(source, &self.extractors).await?;
        Ok(ingest::attachment_block(source.name(), &text))
    }

    /// Clear transient state. Archived history survives.
    pub async fn reset(&self) {
        self.history.reset().await;
    }
}
