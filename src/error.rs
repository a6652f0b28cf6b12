use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for the LMSA core.
///
/// Each subsystem defines its own error variant. The rendering and history
/// entry points never surface these to UI callers (they degrade to the input
/// text or an empty history instead); the typed errors travel between the
/// internal stages and show up in logs.
#[derive(Debug, Error)]
pub enum LmsaError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Rendering pipeline ──────────────────────────────────────────────
    #[error("render: {0}")]
    Render(#[from] RenderError),

    // ── Chat history archive ────────────────────────────────────────────
    #[error("history: {0}")]
    History(#[from] HistoryError),

    // ── File ingestion ──────────────────────────────────────────────────
    #[error("ingest: {0}")]
    Ingest(#[from] IngestError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Render errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),

    #[error("stage {stage} failed: {message}")]
    Stage {
        stage: &'static str,
        message: String,
    },
}

// ─── History errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("serialize archive: {0}")]
    Serialize(String),

    #[error("deserialize archive: {0}")]
    Deserialize(String),

    #[error("compress archive: {0}")]
    Compress(String),

    #[error("decompress archive: {0}")]
    Decompress(String),

    #[error("compressed archive found but no gzip support is compiled in")]
    CompressionUnavailable,

    #[error("archive store: {0}")]
    Store(String),
}

// ─── Ingest errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no extractor supports {mime} ({name})")]
    Unsupported { name: String, mime: String },

    #[error("file {0} produced no text")]
    Empty(String),

    #[error("extraction failed for {name}: {message}")]
    Extraction { name: String, message: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, LmsaError>;
