use super::active::ActiveChats;
use super::compressor::{Compressor, create_compressor};
use super::store::{ArchiveStore, InMemoryArchiveStore, archive_key, chat_id_from_key};
use super::types::{Chat, CompactMessage, Message};
use crate::config::HistoryConfig;
use crate::error::HistoryError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Snapshot of optimizer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStats {
    pub archived_chats: usize,
    pub active_chats: usize,
    pub compressor: String,
}

/// Keeps long chats small in memory by moving their oldest messages into a
/// compressed archive entry keyed `<chat id>_older`.
///
/// No method returns an error: failures are logged and the caller gets the
/// chat it passed in (or, when an archive cannot be read back, the resident
/// messages alone).
pub struct ChatHistoryOptimizer {
    config: HistoryConfig,
    store: Arc<dyn ArchiveStore>,
    compressor: Arc<dyn Compressor>,
    active: Mutex<ActiveChats>,
    chat_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ChatHistoryOptimizer {
    pub fn new(config: HistoryConfig, store: Arc<dyn ArchiveStore>) -> Self {
        let compressor = create_compressor(&config);
        let active = ActiveChats::new(config.max_active_chats);
        Self {
            config,
            store,
            compressor,
            active: Mutex::new(active),
            chat_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Optimizer over a fresh [`InMemoryArchiveStore`].
    pub fn in_memory(config: HistoryConfig) -> Self {
        Self::new(config, Arc::new(InMemoryArchiveStore::new()))
    }

    pub fn with_compressor(mut self, compressor: Arc<dyn Compressor>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Access the underlying store.
    pub fn store(&self) -> &dyn ArchiveStore {
        self.store.as_ref()
    }

    /// Archive everything but the newest `max_resident` messages, unless the
    /// chat is short enough or currently active.
    pub async fn optimize(&self, chat: Chat) -> Chat {
        if chat.messages.len() <= self.config.max_resident || self.is_active(&chat.id).await {
            return chat;
        }

        let lock = self.chat_lock(&chat.id).await;
        let _guard = lock.lock().await;

        match self.archive_prefix(&chat).await {
            Ok(optimized) => {
                tracing::info!(
                    chat_id = %chat.id,
                    resident = optimized.messages.len(),
                    archived = optimized.archived_count(),
                    "archived older chat messages"
                );
                optimized
            }
            Err(err) => {
                tracing::warn!(chat_id = %chat.id, "history archive failed, keeping chat resident: {err}");
                chat
            }
        }
    }

    /// Restore the full message sequence of a previously optimized chat.
    pub async fn rehydrate(&self, chat: Chat) -> Chat {
        if !chat.has_compressed_history {
            return chat;
        }

        let lock = self.chat_lock(&chat.id).await;
        let _guard = lock.lock().await;

        let older = match self.read_archive(&chat.id).await {
            Ok(older) => older,
            Err(err) => {
                tracing::warn!(chat_id = %chat.id, "history archive unreadable, showing resident messages only: {err}");
                Vec::new()
            }
        };

        let mut messages: Vec<Message> = older.into_iter().map(Message::from).collect();
        messages.extend(chat.messages);
        Chat {
            id: chat.id,
            total_message_count: messages.len(),
            messages,
            has_compressed_history: false,
        }
    }

    /// Move up to `page_size` of the newest archived messages back in front
    /// of the resident ones.
    pub async fn load_older_page(&self, chat: Chat) -> Chat {
        if !chat.has_compressed_history {
            return chat;
        }

        let lock = self.chat_lock(&chat.id).await;
        let _guard = lock.lock().await;

        match self.restore_page(&chat).await {
            Ok(paged) => paged,
            Err(err) => {
                tracing::warn!(chat_id = %chat.id, "loading older messages failed: {err}");
                chat
            }
        }
    }

    /// Exempt `chat_id` from archiving until it is pushed out of the active set.
    pub async fn mark_active(&self, chat_id: &str) {
        if let Some(evicted) = self.active.lock().await.mark(chat_id) {
            tracing::debug!(chat_id = %evicted, "chat left the active set");
        }
    }

    pub async fn is_active(&self, chat_id: &str) -> bool {
        self.active.lock().await.contains(chat_id)
    }

    /// Drop archive entries whose chat is not in `current_chat_ids`.
    /// Returns the number of entries removed.
    pub async fn cleanup<I, S>(&self, current_chat_ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let current: HashSet<String> = current_chat_ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .collect();

        let keys = match self.store.keys().await {
            Ok(keys) => keys,
            Err(err) => {
                tracing::warn!("history cleanup could not list archive entries: {err}");
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys {
            let Some(chat_id) = chat_id_from_key(&key) else {
                continue;
            };
            if current.contains(chat_id) {
                continue;
            }
            if self.forget_chat(chat_id).await {
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed, "removed archives of deleted chats");
        }
        removed
    }

    /// Remove every trace of a deleted chat. Returns whether an archive
    /// entry existed.
    pub async fn forget_chat(&self, chat_id: &str) -> bool {
        let lock = self.chat_lock(chat_id).await;
        let removed = {
            let _guard = lock.lock().await;
            self.active.lock().await.remove(chat_id);
            match self.store.remove(&archive_key(chat_id)).await {
                Ok(removed) => removed,
                Err(err) => {
                    tracing::warn!(chat_id, "failed to remove history archive: {err}");
                    false
                }
            }
        };
        self.release_chat_lock(chat_id, lock).await;
        removed
    }

    pub async fn stats(&self) -> HistoryStats {
        let archived_chats = match self.store.keys().await {
            Ok(keys) => keys
                .iter()
                .filter(|key| chat_id_from_key(key).is_some())
                .count(),
            Err(err) => {
                tracing::warn!("could not list archive entries: {err}");
                0
            }
        };
        HistoryStats {
            archived_chats,
            active_chats: self.active.lock().await.len(),
            compressor: self.compressor.name().to_string(),
        }
    }

    /// Forget the active set and idle per-chat locks. Archives are untouched.
    pub async fn reset(&self) {
        self.active.lock().await.clear();
        self.chat_locks
            .lock()
            .await
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    async fn chat_lock(&self, chat_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.chat_locks.lock().await;
        Arc::clone(locks.entry(chat_id.to_string()).or_default())
    }

    /// Drop the map entry once no task holds or waits on the lock. Clones are
    /// only handed out under the map lock, so a count of one is final.
    async fn release_chat_lock(&self, chat_id: &str, lock: Arc<Mutex<()>>) {
        drop(lock);
        let mut locks = self.chat_locks.lock().await;
        if locks
            .get(chat_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(chat_id);
        }
    }

    async fn archive_prefix(&self, chat: &Chat) -> Result<Chat, HistoryError> {
        let split = chat.messages.len() - self.config.max_resident;
        let (older, recent) = chat.messages.split_at(split);

        let mut archived = if chat.has_compressed_history {
            self.read_archive(&chat.id).await?
        } else {
            Vec::new()
        };
        archived.extend(older.iter().map(CompactMessage::from));
        self.write_archive(&chat.id, &archived).await?;

        Ok(Chat {
            id: chat.id.clone(),
            messages: recent.to_vec(),
            has_compressed_history: true,
            total_message_count: archived.len() + recent.len(),
        })
    }

    async fn restore_page(&self, chat: &Chat) -> Result<Chat, HistoryError> {
        let mut archived = self.read_archive(&chat.id).await?;
        let split = archived.len().saturating_sub(self.config.page_size);
        let page = archived.split_off(split);

        let mut messages: Vec<Message> = page.into_iter().map(Message::from).collect();
        messages.extend(chat.messages.iter().cloned());

        if archived.is_empty() {
            self.store.remove(&archive_key(&chat.id)).await?;
        } else {
            self.write_archive(&chat.id, &archived).await?;
        }

        Ok(Chat {
            id: chat.id.clone(),
            total_message_count: archived.len() + messages.len(),
            has_compressed_history: !archived.is_empty(),
            messages,
        })
    }

    async fn read_archive(&self, chat_id: &str) -> Result<Vec<CompactMessage>, HistoryError> {
        let Some(payload) = self.store.get(&archive_key(chat_id)).await? else {
            tracing::debug!(chat_id, "no archive entry for chat");
            return Ok(Vec::new());
        };
        let json = self.compressor.decompress(&payload)?;
        serde_json::from_str(&json).map_err(|e| HistoryError::Deserialize(e.to_string()))
    }

    async fn write_archive(
        &self,
        chat_id: &str,
        messages: &[CompactMessage],
    ) -> Result<(), HistoryError> {
        let json =
            serde_json::to_string(messages).map_err(|e| HistoryError::Serialize(e.to_string()))?;
        let payload = self.compressor.compress(&json)?;
        self.store.put(&archive_key(chat_id), payload).await
    }
}
