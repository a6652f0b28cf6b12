#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use lmsa::config::HistoryConfig;
use lmsa::error::HistoryError;
use lmsa::history::{ArchiveStore, Chat, ChatHistoryOptimizer, InMemoryArchiveStore, Message};

pub const CHAT_ID: &str = "chat-under-test";

/// Chat of `count` alternating user/assistant messages with distinct
/// timestamps and a few flagged entries.
pub fn chat_fixture(id: &str, count: usize) -> Chat {
    let messages = (0..count)
        .map(|i| {
            let ts = 1_700_000_000_000 + i64::try_from(i).expect("fixture size fits i64");
            let base = if i % 2 == 0 {
                Message::user(format!("question {i}\n\nwith a second paragraph"))
            } else {
                Message::assistant(format!("<think>plan {i}</think>\n```rust\n    let x = {i};\n```"))
            };
            let mut msg = base.with_timestamp(ts);
            if i % 7 == 0 {
                msg = msg.with_files();
            }
            if i % 11 == 0 {
                msg = msg.topic_boundary();
            }
            msg
        })
        .collect();
    Chat::from_messages(id, messages)
}

pub fn config(max_resident: usize, max_active_chats: usize, page_size: usize) -> HistoryConfig {
    HistoryConfig {
        max_resident,
        max_active_chats,
        page_size,
        ..HistoryConfig::default()
    }
}

/// Store wrapper counting writes, optionally failing them.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryArchiveStore,
    pub puts: AtomicUsize,
    pub fail_puts: bool,
}

impl CountingStore {
    pub fn failing() -> Self {
        Self {
            fail_puts: true,
            ..Self::default()
        }
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl ArchiveStore for CountingStore {
    fn get<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, HistoryError>> + Send + 'a>> {
        self.inner.get(key)
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        payload: String,
    ) -> Pin<Box<dyn Future<Output = Result<(), HistoryError>> + Send + 'a>> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts {
            return Box::pin(async { Err(HistoryError::Store("disk full".into())) });
        }
        self.inner.put(key, payload)
    }

    fn remove<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, HistoryError>> + Send + 'a>> {
        self.inner.remove(key)
    }

    fn keys(&self) -> Pin<Box<dyn Future<Output = Result<Vec<String>, HistoryError>> + Send + '_>> {
        self.inner.keys()
    }
}

/// Store whose writes and removals take `delay` and which records the
/// highest number of them in flight at once.
pub struct SlowStore {
    inner: InMemoryArchiveStore,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryArchiveStore::new(),
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn timed<T>(&self, op: impl Future<Output = T>) -> T {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let result = op.await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl ArchiveStore for SlowStore {
    fn get<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, HistoryError>> + Send + 'a>> {
        self.inner.get(key)
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        payload: String,
    ) -> Pin<Box<dyn Future<Output = Result<(), HistoryError>> + Send + 'a>> {
        Box::pin(self.timed(self.inner.put(key, payload)))
    }

    fn remove<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, HistoryError>> + Send + 'a>> {
        Box::pin(self.timed(self.inner.remove(key)))
    }

    fn keys(&self) -> Pin<Box<dyn Future<Output = Result<Vec<String>, HistoryError>> + Send + '_>> {
        self.inner.keys()
    }
}

pub fn optimizer_with(store: Arc<CountingStore>, config: HistoryConfig) -> ChatHistoryOptimizer {
    ChatHistoryOptimizer::new(config, store)
}
