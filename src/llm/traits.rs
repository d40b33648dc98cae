//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock）实现 LlmClient：complete（非流式，system + user 两段）。

use async_trait::async_trait;
use thiserror::Error;

/// 生成失败的类型化错误：调度器据此决定日志与通知内容
///
/// 任何一种失败都不产生记录——任务留在「未处理」状态，下轮重试。
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("Generation quota exceeded")]
    QuotaExceeded,

    #[error("Generation request timed out")]
    Timeout,

    #[error("Invalid generation response: {0}")]
    InvalidResponse(String),

    #[error("LLM API error: {0}")]
    Api(String),
}

/// LLM 客户端 trait：给定系统提示与任务文本，返回完整回答
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}
