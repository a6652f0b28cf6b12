use crate::error::HistoryError;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::RwLock;

type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, HistoryError>> + Send + 'a>>;

/// Suffix appended to a chat id to form its archive key.
pub const ARCHIVE_KEY_SUFFIX: &str = "_older";

pub fn archive_key(chat_id: &str) -> String {
    format!("{chat_id}{ARCHIVE_KEY_SUFFIX}")
}

/// Chat id an archive key belongs to, or `None` for foreign keys.
pub fn chat_id_from_key(key: &str) -> Option<&str> {
    key.strip_suffix(ARCHIVE_KEY_SUFFIX)
}

/// Async key-value persistence for archived chat prefixes.
pub trait ArchiveStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

    fn put<'a>(&'a self, key: &'a str, payload: String) -> StoreFuture<'a, ()>;

    /// Returns whether an entry was removed.
    fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool>;

    fn keys(&self) -> StoreFuture<'_, Vec<String>>;
}

/// Process-local store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryArchiveStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryArchiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl ArchiveStore for InMemoryArchiveStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move { Ok(self.entries.read().await.get(key).cloned()) })
    }

    fn put<'a>(&'a self, key: &'a str, payload: String) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.entries.write().await.insert(key.to_string(), payload);
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move { Ok(self.entries.write().await.remove(key).is_some()) })
    }

    fn keys(&self) -> StoreFuture<'_, Vec<String>> {
        Box::pin(async move { Ok(self.entries.read().await.keys().cloned().collect()) })
    }
}
