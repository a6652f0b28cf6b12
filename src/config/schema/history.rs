use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Messages kept in memory per chat before older ones are archived
    #[serde(default = "default_max_resident")]
    pub max_resident: usize,
    /// Recently active chats exempt from archiving (FIFO on overflow)
    #[serde(default = "default_max_active_chats")]
    pub max_active_chats: usize,
    /// Archived messages restored per `load_older_page` call
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Archive encoding: "gzip" | "none"
    #[serde(default = "default_compression")]
    pub compression: String,
}

fn default_max_resident() -> usize {
    50
}
fn default_max_active_chats() -> usize {
    10
}
fn default_page_size() -> usize {
    20
}
fn default_compression() -> String {
    "gzip".into()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_resident: default_max_resident(),
            max_active_chats: default_max_active_chats(),
            page_size: default_page_size(),
            compression: default_compression(),
        }
    }
}
