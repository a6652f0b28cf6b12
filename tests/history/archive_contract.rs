use std::sync::Arc;

use lmsa::history::compressor::{PassthroughCompressor, decode_payload, is_base64_payload};
use lmsa::history::{ArchiveStore, ChatHistoryOptimizer, archive_key};

use super::history_harness::{self, CHAT_ID, CountingStore};

#[tokio::test]
async fn scenario_eighty_messages_keep_fifty_resident() {
    let optimizer = ChatHistoryOptimizer::in_memory(history_harness::config(50, 10, 20));
    let chat = history_harness::chat_fixture(CHAT_ID, 80);

    let optimized = optimizer.optimize(chat.clone()).await;
    assert_eq!(optimized.messages.len(), 50);
    assert_eq!(optimized.messages[..], chat.messages[30..]);
    assert!(optimized.has_compressed_history);
    assert_eq!(optimized.total_message_count, 80);

    let payload = optimizer
        .store()
        .get(&archive_key(CHAT_ID))
        .await
        .unwrap()
        .expect("archive entry should exist");
    let json = decode_payload(&payload).unwrap();
    let archived: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
    assert_eq!(archived.len(), 30);
}

#[tokio::test]
async fn rehydrate_of_optimize_is_identity() {
    let optimizer = ChatHistoryOptimizer::in_memory(history_harness::config(10, 2, 5));
    for count in [11, 25, 64] {
        let chat = history_harness::chat_fixture(&format!("chat-{count}"), count);
        let optimized = optimizer.optimize(chat.clone()).await;
        assert_eq!(optimized.messages.len(), 10);
        assert_eq!(optimized.total_message_count, count);
        assert_eq!(optimizer.rehydrate(optimized).await, chat);
    }
}

#[tokio::test]
async fn chat_at_threshold_is_not_archived() {
    let optimizer = ChatHistoryOptimizer::in_memory(history_harness::config(10, 2, 5));
    let chat = history_harness::chat_fixture(CHAT_ID, 10);
    assert_eq!(optimizer.optimize(chat.clone()).await, chat);
    assert_eq!(optimizer.stats().await.archived_chats, 0);
}

#[tokio::test]
async fn uncompressed_chat_rehydrates_unchanged() {
    let optimizer = ChatHistoryOptimizer::in_memory(history_harness::config(10, 2, 5));
    let chat = history_harness::chat_fixture(CHAT_ID, 30);
    assert_eq!(optimizer.rehydrate(chat.clone()).await, chat);
}

#[tokio::test]
async fn active_set_evicts_in_insertion_order() {
    let optimizer = ChatHistoryOptimizer::in_memory(history_harness::config(5, 2, 5));
    optimizer.mark_active("a").await;
    optimizer.mark_active("b").await;
    optimizer.mark_active("a").await;
    optimizer.mark_active("c").await;

    assert!(!optimizer.is_active("a").await);
    let chat = history_harness::chat_fixture("a", 9);
    assert!(optimizer.optimize(chat).await.has_compressed_history);

    let chat = history_harness::chat_fixture("b", 9);
    assert!(!optimizer.optimize(chat).await.has_compressed_history);
}

#[tokio::test]
async fn passthrough_and_gzip_archives_are_interchangeable() {
    let store = Arc::new(CountingStore::default());
    let plain = ChatHistoryOptimizer::new(history_harness::config(5, 2, 5), store.clone())
        .with_compressor(Arc::new(PassthroughCompressor));
    let chat = history_harness::chat_fixture(CHAT_ID, 12);
    let optimized = plain.optimize(chat.clone()).await;

    let payload = store.get(&archive_key(CHAT_ID)).await.unwrap().unwrap();
    assert!(!is_base64_payload(&payload));

    let reader = ChatHistoryOptimizer::new(history_harness::config(5, 2, 5), store.clone());
    assert_eq!(reader.rehydrate(optimized).await, chat);
}

#[tokio::test]
async fn failed_archive_write_keeps_chat_resident() {
    let store = Arc::new(CountingStore::failing());
    let optimizer = history_harness::optimizer_with(store.clone(), history_harness::config(5, 2, 5));
    let chat = history_harness::chat_fixture(CHAT_ID, 12);

    assert_eq!(optimizer.optimize(chat.clone()).await, chat);
    assert_eq!(store.put_count(), 1);
}

#[tokio::test]
async fn missing_archive_rehydrates_to_resident_messages() {
    let optimizer = ChatHistoryOptimizer::in_memory(history_harness::config(5, 2, 5));
    let optimized = optimizer
        .optimize(history_harness::chat_fixture(CHAT_ID, 12))
        .await;
    assert!(optimizer.forget_chat(CHAT_ID).await);

    let restored = optimizer.rehydrate(optimized.clone()).await;
    assert_eq!(restored.messages, optimized.messages);
    assert_eq!(restored.total_message_count, 5);
}

#[tokio::test]
async fn paging_preserves_total_count() {
    let optimizer = ChatHistoryOptimizer::in_memory(history_harness::config(10, 2, 4));
    let original = history_harness::chat_fixture(CHAT_ID, 30);
    let mut chat = optimizer.optimize(original.clone()).await;

    let mut pages = 0;
    while chat.has_compressed_history {
        chat = optimizer.load_older_page(chat).await;
        assert_eq!(chat.total_message_count, 30);
        pages += 1;
    }
    assert_eq!(pages, 5);
    assert_eq!(chat, original);
}

#[tokio::test]
async fn cleanup_drops_archives_of_deleted_chats() {
    let optimizer = ChatHistoryOptimizer::in_memory(history_harness::config(5, 2, 5));
    for id in ["one", "two", "three"] {
        optimizer.optimize(history_harness::chat_fixture(id, 8)).await;
    }

    let removed = optimizer.cleanup(vec!["two".to_string()]).await;
    assert_eq!(removed, 2);
    assert_eq!(optimizer.stats().await.archived_chats, 1);
    assert_eq!(optimizer.cleanup(["two"]).await, 0);
}
