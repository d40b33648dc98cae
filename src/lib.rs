//! Aula - Rust 课堂作业巡查机器人
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）与启动凭据
//! - **core**: 对账、单任务流水线、巡查调度状态机、优雅关闭
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **notify**: 通知通道抽象与 Telegram 实现
//! - **observability**: tracing 初始化
//! - **portal**: 课堂门户抽象与 Headless Chrome 实现（feature "browser"）
//! - **store**: 已处理任务的持久化存储（原子写盘的 JSON 文件）
//! - **task**: 任务数据模型

pub mod config;
pub mod core;
pub mod llm;
pub mod notify;
pub mod observability;
pub mod portal;
pub mod store;
pub mod task;
