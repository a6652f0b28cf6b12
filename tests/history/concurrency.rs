use std::sync::Arc;
use std::time::Duration;

use lmsa::history::{ArchiveStore, ChatHistoryOptimizer};

use super::history_harness;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_chats_archive_independently() {
    let optimizer = Arc::new(ChatHistoryOptimizer::in_memory(history_harness::config(
        10, 2, 5,
    )));

    let mut handles = Vec::new();
    for n in 0..8 {
        let optimizer = Arc::clone(&optimizer);
        handles.push(tokio::spawn(async move {
            let chat = history_harness::chat_fixture(&format!("chat-{n}"), 20 + n);
            let optimized = optimizer.optimize(chat.clone()).await;
            let restored = optimizer.rehydrate(optimized).await;
            assert_eq!(restored, chat);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(optimizer.stats().await.archived_chats, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_chat_operations_serialize() {
    let optimizer = Arc::new(ChatHistoryOptimizer::in_memory(history_harness::config(
        10, 2, 5,
    )));
    let chat = history_harness::chat_fixture(history_harness::CHAT_ID, 40);
    let optimized = optimizer.optimize(chat.clone()).await;

    let mut handles = Vec::new();
    for _ in 0..6 {
        let optimizer = Arc::clone(&optimizer);
        let optimized = optimized.clone();
        handles.push(tokio::spawn(async move { optimizer.rehydrate(optimized).await }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), chat);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn forgetting_a_chat_keeps_waiters_serialized() {
    let store = Arc::new(history_harness::SlowStore::new(Duration::from_millis(150)));
    let optimizer = Arc::new(ChatHistoryOptimizer::new(
        history_harness::config(10, 2, 5),
        Arc::clone(&store) as Arc<dyn ArchiveStore>,
    ));
    let chat = history_harness::chat_fixture("c", 30);

    let forget = {
        let optimizer = Arc::clone(&optimizer);
        tokio::spawn(async move { optimizer.forget_chat("c").await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    let waiting = {
        let optimizer = Arc::clone(&optimizer);
        let chat = chat.clone();
        tokio::spawn(async move { optimizer.optimize(chat).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert!(!forget.await.unwrap());
    let late = {
        let optimizer = Arc::clone(&optimizer);
        tokio::spawn(async move { optimizer.optimize(chat).await })
    };

    assert!(waiting.await.unwrap().has_compressed_history);
    assert!(late.await.unwrap().has_compressed_history);
    assert_eq!(store.max_in_flight(), 1);
}
