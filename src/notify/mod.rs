//! 通知通道抽象与实现（Telegram）
//!
//! send 是尽力而为：失败由调度器记日志，绝不升级为本轮或进程的致命错误。

pub mod telegram;

use async_trait::async_trait;

pub use telegram::TelegramNotifier;

/// 通知器 trait：向操作者投递一段文本
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> anyhow::Result<()>;
}
