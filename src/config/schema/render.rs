use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Extract `<think>` blocks into reasoning containers. Turn off for
    /// models that never emit reasoning.
    #[serde(default = "default_reasoning_enabled")]
    pub reasoning_enabled: bool,
    /// Log every markdown stage at debug level
    #[serde(default)]
    pub trace_stages: bool,
}

fn default_reasoning_enabled() -> bool {
    true
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            reasoning_enabled: default_reasoning_enabled(),
            trace_stages: false,
        }
    }
}
