//! 巡查调度器：固定间隔驱动「采集 → 对账 → 流水线 → 提交 → 通知」循环
//!
//! 状态机：Idle → Collecting → Reconciling → Pipelining → Committing → Notifying → Idle。
//! 同一时刻只有一轮在跑；间隔从上一轮结束起算，两轮绝不重叠。
//! 协作方的任何失败都被拦在本轮内，调度器外层循环不会因此终止；
//! 每轮结束恰好发出一条通知（成功摘要 / 无任务 / 错误说明）。

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::pipeline::TaskPipeline;
use crate::core::reconcile::reconcile;
use crate::notify::Notifier;
use crate::portal::Portal;
use crate::store::RecordStore;
use crate::task::ReviewCycleResult;

/// 门户没有任何待办任务时的通知文本
pub const MSG_NO_PENDING: &str = "🎉 No hay tareas pendientes.";
/// 有待办但全部已处理过时的通知文本
pub const MSG_NO_NEW: &str = "👌 Sin tareas nuevas.";

/// 巡查周期所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Collecting,
    Reconciling,
    Pipelining,
    Committing,
    Notifying,
}

/// 巡查调度器：持有全部协作方句柄与存储，run() 永不自行退出
pub struct ReviewScheduler {
    portal: Arc<dyn Portal>,
    pipeline: TaskPipeline,
    notifier: Arc<dyn Notifier>,
    store: RecordStore,
    interval: Duration,
    shutdown: CancellationToken,
    phase: CyclePhase,
}

impl ReviewScheduler {
    pub fn new(
        portal: Arc<dyn Portal>,
        pipeline: TaskPipeline,
        notifier: Arc<dyn Notifier>,
        store: RecordStore,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            portal,
            pipeline,
            notifier,
            store,
            interval,
            shutdown,
            phase: CyclePhase::Idle,
        }
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// 当前存储（测试用于断言提交结果）
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    fn enter(&mut self, phase: CyclePhase) {
        tracing::debug!(phase = ?phase, "Cycle phase");
        self.phase = phase;
    }

    /// 主循环：跑一轮、睡一个间隔，直到收到停止信号
    ///
    /// 停止信号在两轮之间生效；轮内只在任务与任务之间检查（见 run_cycle）。
    pub async fn run(&mut self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            known = self.store.len(),
            "Review scheduler started"
        );
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            self.run_cycle().await;
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        tracing::info!("Review scheduler stopped");
    }

    /// 执行完整的一轮巡查（公开给测试：无延时地模拟多轮）
    pub async fn run_cycle(&mut self) {
        tracing::info!("Starting review cycle");

        self.enter(CyclePhase::Collecting);
        let observations = match self.portal.observe_tasks().await {
            Ok(observations) => observations,
            Err(e) => {
                // 会话级失败中止整轮：存储不动，单条错误通知后回 Idle
                tracing::error!(error = %e, "Task collection failed, cycle aborted");
                self.enter(CyclePhase::Notifying);
                self.notify(&format!("❌ Error general en la revisión: {}", e))
                    .await;
                self.enter(CyclePhase::Idle);
                return;
            }
        };

        self.enter(CyclePhase::Reconciling);
        let fresh = reconcile(&observations, self.store.records());
        tracing::info!(
            observed = observations.len(),
            fresh = fresh.len(),
            "Reconciled observations"
        );

        self.enter(CyclePhase::Pipelining);
        let mut result = ReviewCycleResult::default();
        for obs in &fresh {
            if self.shutdown.is_cancelled() {
                tracing::info!("Shutdown requested, stopping between tasks");
                break;
            }
            // reconcile 已剔除无标识的行
            let Some(id) = obs.id() else { continue };
            match self.pipeline.process(obs).await {
                Ok(record) => result.new_records.push(record),
                Err(e) => {
                    tracing::warn!(task = %id, error = %e, "Task failed, will retry next cycle");
                    result.failures.push((id, e));
                }
            }
        }

        self.enter(CyclePhase::Committing);
        if !result.new_records.is_empty() {
            self.store.merge(&result.new_records);
            if let Err(e) = self.store.save() {
                // 落盘失败：本轮结果仍然通知，但回滚内存插入，未保存的任务
                // 下轮会重新处理（可能重复通知，属已知限制）
                tracing::error!(error = %e, "Store save failed, cycle results not persisted");
                self.store.rollback(&result.new_records);
            }
        }

        self.enter(CyclePhase::Notifying);
        let message = compose_notification(observations.len(), &result);
        self.notify(&message).await;
        self.enter(CyclePhase::Idle);
        tracing::info!("Review cycle completed");
    }

    /// 尽力而为的通知：失败只记日志，绝不中断调度
    async fn notify(&self, text: &str) {
        if let Err(e) = self.notifier.send(text).await {
            tracing::warn!(error = %e, "Notification failed");
        }
    }
}

/// 组装本轮的唯一一条通知
pub fn compose_notification(observed: usize, result: &ReviewCycleResult) -> String {
    if observed == 0 {
        return MSG_NO_PENDING.to_string();
    }
    if result.is_empty() {
        return MSG_NO_NEW.to_string();
    }

    let mut lines = vec![format!(
        "📚 Revisión completada: {} resueltas, {} con error.",
        result.new_records.len(),
        result.failures.len()
    )];
    for record in &result.new_records {
        lines.push(format!(
            "✅ Tarea '{}' completada. Pendiente de entregar.\n📝 {}",
            record.id, record.solution
        ));
    }
    for (id, error) in &result.failures {
        lines.push(format!("⚠️ Error con la tarea '{}': {}", id, error));
    }
    lines.join("\n\n")
}
