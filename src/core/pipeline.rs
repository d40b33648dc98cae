//! 单任务流水线：补全正文 → 生成回答 → 创建草稿 → 组装记录
//!
//! 本模块不做持久化：记录由调度器在整轮任务都处理完后统一合并入库，
//! 中途进程崩溃最多丢一轮进度，不会弄脏存储。
//! 单个任务失败通过 Result 返回，绝不影响同轮的其他任务。

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::llm::{LlmClient, LlmError};
use crate::portal::{Portal, PortalError};
use crate::task::{TaskObservation, TaskRecord};

/// 单任务失败：哪一步、什么原因；任务不入库，下轮重试
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("portal failed: {0}")]
    Portal(#[from] PortalError),

    #[error("observation has no usable description")]
    EmptyDescription,
}

/// 任务流水线：共享门户与 LLM 句柄，可处理任意多个任务
pub struct TaskPipeline {
    portal: Arc<dyn Portal>,
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl TaskPipeline {
    pub fn new(portal: Arc<dyn Portal>, llm: Arc<dyn LlmClient>, system_prompt: &str) -> Self {
        Self {
            portal,
            llm,
            system_prompt: system_prompt.to_string(),
        }
    }

    /// 处理一个新任务行，成功返回可入库的 TaskRecord
    ///
    /// 正文取「可得的最完整文本」：有链接时抓任务页全文，否则用观察行自带的描述。
    /// 草稿创建是尽力而为：失败只记 warn，不丢弃已生成的回答（答案仍会入库并通知）。
    pub async fn process(&self, obs: &TaskObservation) -> Result<TaskRecord, TaskError> {
        let id = obs.id().ok_or(TaskError::EmptyDescription)?;
        tracing::info!(task = %id, "Processing task");

        let description = match obs.link.as_deref() {
            Some(link) => self.portal.fetch_description(link).await?,
            None => obs.description.clone(),
        };
        if description.trim().is_empty() {
            return Err(TaskError::EmptyDescription);
        }

        let solution = self.llm.complete(&self.system_prompt, &description).await?;

        if let Some(link) = obs.link.as_deref() {
            if let Err(e) = self.portal.create_draft_document(link, &solution).await {
                tracing::warn!(task = %id, error = %e, "Draft document creation failed, answer kept");
            }
        }

        Ok(TaskRecord {
            id,
            description,
            solution,
            processed_at: Utc::now(),
        })
    }
}
