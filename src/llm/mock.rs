//! Mock LLM 客户端（用于测试与离线运行，无需 API）
//!
//! 对任意任务文本回显一段固定格式的回答，便于本地跑通整条巡查流水线。

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError};

/// Mock 客户端：回显任务文本摘要
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, _system: &str, user: &str) -> Result<String, LlmError> {
        let summary: String = user.chars().take(80).collect();
        Ok(format!("Borrador de respuesta (mock) para: {}", summary))
    }
}
