//! Aula - Rust 课堂作业巡查机器人
//!
//! 入口：初始化日志、加载配置与凭据、构建协作方（门户 / LLM / 通知器 / 存储），
//! 然后把调度器跑到收到退出信号为止。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use aula::config::{load_config, Secrets};
use aula::core::{ReviewScheduler, ShutdownManager, TaskPipeline};
use aula::llm::{LlmClient, OpenAiClient};
use aula::notify::{Notifier, TelegramNotifier};
use aula::store::RecordStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    aula::observability::init();

    let cfg = load_config(None).context("Failed to load config")?;
    let secrets = Secrets::from_env().context("Failed to load secrets from environment")?;

    // 确保存储目录存在
    if let Some(parent) = cfg.app.store_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let llm: Arc<dyn LlmClient> = Arc::new(OpenAiClient::new(
        cfg.llm.base_url.as_deref(),
        &cfg.llm.model,
        secrets.openai_api_key.as_deref(),
        cfg.llm.temperature,
        cfg.llm.max_tokens,
        cfg.llm.request_timeout_secs,
    ));

    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(
        &cfg.telegram.api_base,
        &secrets.telegram_token,
        &secrets.telegram_chat_id,
    ));

    #[cfg(not(feature = "browser"))]
    {
        let _ = (llm, notifier);
        anyhow::bail!("Built without the \"browser\" feature; no portal backend available")
    }

    #[cfg(feature = "browser")]
    {
        let portal: Arc<dyn aula::portal::Portal> = Arc::new(aula::portal::ClassroomPortal::new(
            &cfg.portal,
            &secrets.gc_email,
            &secrets.gc_password,
        ));

        let store =
            RecordStore::load(&cfg.app.store_path).context("Failed to load record store")?;
        tracing::info!(known = store.len(), path = ?cfg.app.store_path, "Record store loaded");

        let shutdown = Arc::new(ShutdownManager::new());
        shutdown.install_signal_handlers();

        let pipeline = TaskPipeline::new(portal.clone(), llm, &cfg.llm.system_prompt);
        let mut scheduler = ReviewScheduler::new(
            portal,
            pipeline,
            notifier,
            store,
            Duration::from_secs(cfg.app.review_interval_secs),
            shutdown.token(),
        );

        scheduler.run().await;
        Ok(())
    }
}
