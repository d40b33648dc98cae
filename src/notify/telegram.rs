//! Telegram Bot API 集成
//!
//! 通过 sendMessage 接口向固定 chat_id 投递巡查结果。

use async_trait::async_trait;
use serde::Serialize;

use crate::notify::Notifier;

/// Telegram sendMessage 请求体
#[derive(Debug, Serialize)]
struct SendMessageRequest {
    chat_id: String,
    text: String,
}

/// Telegram 通知器：持有 bot token 与目标 chat_id
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// api_base 默认 https://api.telegram.org，可覆盖（自建代理或测试桩）
    pub fn new(api_base: &str, token: &str, chat_id: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        // Telegram 消息有长度限制（4096 字符），按字符分段
        let max_len = 4000usize;
        let chunks: Vec<String> = if text.chars().count() <= max_len {
            vec![text.to_string()]
        } else {
            text.chars()
                .collect::<Vec<_>>()
                .chunks(max_len)
                .map(|c| c.iter().collect())
                .collect()
        };

        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);

        for chunk in chunks {
            let req = SendMessageRequest {
                chat_id: self.chat_id.clone(),
                text: chunk,
            };

            let resp = self.client.post(&url).json(&req).send().await?;

            if !resp.status().is_success() {
                let body = resp.text().await?;
                anyhow::bail!("Telegram API error: {}", body);
            }
        }

        Ok(())
    }
}
