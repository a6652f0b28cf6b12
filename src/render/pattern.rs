use crate::error::RenderError;
use regex::Regex;
use std::sync::OnceLock;

/// A regex compiled on first use.
///
/// Compile failures are cached and reported as [`RenderError::Pattern`] on
/// every access so the calling stage can fall back instead of panicking.
pub(crate) struct Pattern {
    source: &'static str,
    compiled: OnceLock<Result<Regex, regex::Error>>,
}

impl Pattern {
    pub(crate) const fn new(source: &'static str) -> Self {
        Self {
            source,
            compiled: OnceLock::new(),
        }
    }

    pub(crate) fn get(&self) -> Result<&Regex, RenderError> {
        self.compiled
            .get_or_init(|| Regex::new(self.source))
            .as_ref()
            .map_err(|err| RenderError::Pattern(err.clone()))
    }
}
