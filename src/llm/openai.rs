//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；
//! 整个请求包一层 tokio 超时，配额 / 限流类 API 错误归类为 QuotaExceeded。

use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError};

/// OpenAI 兼容客户端：持有 Client 与生成参数，complete 时组 system+user 两条消息
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    request_timeout: Duration,
}

impl OpenAiClient {
    pub fn new(
        base_url: Option<&str>,
        model: &str,
        api_key: Option<&str>,
        temperature: f32,
        max_tokens: u32,
        request_timeout_secs: u64,
    ) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            temperature,
            max_tokens,
            request_timeout: Duration::from_secs(request_timeout_secs),
        }
    }

    /// 按错误文本归类 API 错误（async_openai 的错误类型信息都在 Display 里）
    fn classify(message: String) -> LlmError {
        let lower = message.to_lowercase();
        if lower.contains("quota") || lower.contains("rate limit") || lower.contains("rate_limit") {
            LlmError::QuotaExceeded
        } else if lower.contains("timed out") || lower.contains("timeout") {
            LlmError::Timeout
        } else {
            LlmError::Api(message)
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system.to_string())
                    .build()
                    .map_err(|e| LlmError::Api(e.to_string()))?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user.to_string())
                    .build()
                    .map_err(|e| LlmError::Api(e.to_string()))?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .max_completion_tokens(self.max_tokens)
            .messages(messages)
            .build()
            .map_err(|e| LlmError::Api(e.to_string()))?;

        let response = tokio::time::timeout(self.request_timeout, async {
            self.client.chat().create(request).await
        })
        .await
        .map_err(|_| LlmError::Timeout)?
        .map_err(|e| Self::classify(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        // 空回答不可入库：视为无效响应，任务下轮重试
        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(LlmError::InvalidResponse(
                "empty completion content".to_string(),
            ));
        }

        Ok(content)
    }
}
