//! 课堂门户抽象
//!
//! 浏览器 / 会话层对调度器是黑盒：observe_tasks 返回当前待办任务的原始行，
//! fetch_description 补全任务正文，create_draft_document 在任务页创建答案草稿。

#[cfg(feature = "browser")]
pub mod classroom;

use async_trait::async_trait;
use thiserror::Error;

#[cfg(feature = "browser")]
pub use classroom::ClassroomPortal;

use crate::task::TaskObservation;

/// 门户层错误：任何一种都使当前操作失败；observe_tasks 的失败中止整轮巡查
#[derive(Error, Debug, Clone)]
pub enum PortalError {
    #[error("Portal session expired")]
    SessionExpired,

    #[error("Navigation timeout: {0}")]
    NavigationTimeout(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Browser error: {0}")]
    Browser(String),
}

/// 门户 trait：登录 / 导航细节由实现负责，调用方只拿到纯数据
#[async_trait]
pub trait Portal: Send + Sync {
    /// 抓取当前会话的所有待办任务行（可能为空）
    async fn observe_tasks(&self) -> Result<Vec<TaskObservation>, PortalError>;

    /// 打开任务页并返回正文全文
    async fn fetch_description(&self, link: &str) -> Result<String, PortalError>;

    /// 在任务页创建草稿文档并写入答案文本
    async fn create_draft_document(&self, link: &str, text: &str) -> Result<(), PortalError>;
}
