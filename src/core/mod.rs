//! 核心引擎：对账、单任务流水线、巡查调度、优雅关闭

pub mod pipeline;
pub mod reconcile;
pub mod scheduler;
pub mod shutdown;

pub use pipeline::{TaskError, TaskPipeline};
pub use reconcile::reconcile;
pub use scheduler::{compose_notification, CyclePhase, ReviewScheduler, MSG_NO_NEW, MSG_NO_PENDING};
pub use shutdown::{ShutdownManager, ShutdownReason};
