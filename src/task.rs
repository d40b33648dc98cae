//! 任务数据模型
//!
//! TaskId（按标题去重的稳定标识）、TaskObservation（本轮抓取的原始行）、
//! TaskRecord（生成成功后的不可变记录）、ReviewCycleResult（单轮巡查结果）。

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 任务标识：取自门户页面展示的标题（去首尾空白）
///
/// 同一标识视为同一任务，即使描述有变化（不检测任务编辑，见 store 模块说明）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// 从原始标题构造；空白标题返回 None（畸形抓取行）
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 门户抓取到的一条任务行：仅属于当前巡查轮，不持久化
///
/// description 可能是空的占位（列表页只有标题 + 链接），由 Pipeline 通过
/// fetch_description 补全。
#[derive(Debug, Clone)]
pub struct TaskObservation {
    pub title: String,
    pub description: String,
    pub link: Option<String>,
}

impl TaskObservation {
    /// 计算该行的任务标识；标题空白时为 None
    pub fn id(&self) -> Option<TaskId> {
        TaskId::new(&self.title)
    }
}

/// 处理成功的任务记录：生成一次、写入后不再变更
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub description: String,
    pub solution: String,
    pub processed_at: DateTime<Utc>,
}

/// 单轮巡查的结果：新记录与失败列表，按处理顺序排列
///
/// 仅存活一轮：由调度器消费，决定提交与通知内容。
#[derive(Debug, Default)]
pub struct ReviewCycleResult {
    pub new_records: Vec<TaskRecord>,
    pub failures: Vec<(TaskId, crate::core::TaskError)>,
}

impl ReviewCycleResult {
    pub fn is_empty(&self) -> bool {
        self.new_records.is_empty() && self.failures.is_empty()
    }
}
