use lmsa::Config;
use lmsa::context::CoreContext;
use lmsa::history::Chat;

use super::history_harness;

#[test]
fn history_section_drives_optimizer_limits() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(
        &path,
        "[history]\nmax_resident = 3\nmax_active_chats = 1\npage_size = 2\ncompression = \"none\"\n",
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.history.max_resident, 3);
    assert_eq!(config.history.compression, "none");
    assert_eq!(config.observability.log_level, "info");
}

#[tokio::test]
async fn context_built_from_file_archives_with_passthrough() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[history]\nmax_resident = 3\ncompression = \"none\"\n").unwrap();

    let ctx = CoreContext::new(Config::load_from(&path).unwrap());
    let chat: Chat = history_harness::chat_fixture("file-chat", 7);
    let optimized = ctx.history().optimize(chat.clone()).await;
    assert_eq!(optimized.messages.len(), 3);

    let stats = ctx.history().stats().await;
    assert_eq!(stats.compressor, "none");
    assert_eq!(ctx.history().rehydrate(optimized).await, chat);
}

#[test]
fn zero_resident_limit_is_rejected() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[history]\nmax_resident = 0\n").unwrap();
    assert!(Config::load_from(&path).is_err());
}
