//! 单行重试流程 - 流程层
//!
//! 核心职责：把"对一行执行更新"包进一个带会话恢复的重试状态机
//!
//! 状态转移：
//! Pending -> Attempting -> {Succeeded | Attempting(重试) | Failed}

use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::{UpdateOutcome, UpdateRequest};
use crate::workflow::row_ctx::RowCtx;
use crate::workflow::update_session::UpdateSession;

/// 单行处理状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowState {
    /// 尚未开始
    Pending,
    /// 第 attempt 次尝试中（从 1 开始计数）
    Attempting { attempt: u32 },
    /// 成功，记录修改前的值（dry-run 时为 None）
    Succeeded { old_pos: Option<String> },
    /// 重试预算耗尽，记录最后一次的错误信息
    Failed { error: String },
}

/// 单行重试流程
///
/// - 编排"尝试 → 失败 → 重置会话 → 退避 → 再尝试"的循环
/// - 不持有任何资源，只依赖 UpdateSession 能力
/// - 总是产出一个终态结果，从不向上抛错（整批处理永远会跑完）
pub struct RetryFlow {
    retries: u32,
    backoff: Duration,
    dry_run: bool,
}

impl RetryFlow {
    /// 创建新的重试流程
    pub fn new(config: &Config) -> Self {
        Self {
            retries: config.retries,
            backoff: Duration::from_secs_f64(config.retry_backoff_seconds),
            dry_run: config.dry_run,
        }
    }

    /// 处理一行，返回该行的终态结果
    pub async fn run<S: UpdateSession>(
        &self,
        session: &mut S,
        request: &UpdateRequest,
        ctx: &RowCtx,
    ) -> UpdateOutcome {
        let mut state = RowState::Pending;
        loop {
            state = match state {
                RowState::Pending => self.start(request, ctx),
                RowState::Attempting { attempt } => {
                    self.attempt(session, request, ctx, attempt).await
                }
                RowState::Succeeded { old_pos } => {
                    return match old_pos {
                        Some(old_pos) => UpdateOutcome::ok(request, old_pos),
                        None => UpdateOutcome::dry_run(request),
                    };
                }
                RowState::Failed { error } => {
                    error!("{} ❌ 更新失败: {}", ctx, error);
                    return UpdateOutcome::failed(request, error);
                }
            };
        }
    }

    fn start(&self, request: &UpdateRequest, ctx: &RowCtx) -> RowState {
        info!(
            "{} 更新员工 {} -> POS {} (dry_run: {})",
            ctx, request.employee_id, request.pos_id, self.dry_run
        );
        if self.dry_run {
            // dry-run 完全不触碰远端会话，直接合成成功
            RowState::Succeeded { old_pos: None }
        } else {
            RowState::Attempting { attempt: 1 }
        }
    }

    async fn attempt<S: UpdateSession>(
        &self,
        session: &mut S,
        request: &UpdateRequest,
        ctx: &RowCtx,
        attempt: u32,
    ) -> RowState {
        match session.apply(request).await {
            Ok(old_pos) => {
                info!("{} ✓ 更新成功 (第 {} 次尝试)", ctx, attempt);
                RowState::Succeeded {
                    old_pos: Some(old_pos),
                }
            }
            Err(e) if attempt > self.retries => RowState::Failed {
                error: e.to_string(),
            },
            Err(e) => {
                warn!(
                    "{} ⚠️ 第 {}/{} 次尝试失败: {}，重置会话后重试",
                    ctx,
                    attempt,
                    self.retries + 1,
                    e
                );
                // 上一次失败可能把会话留在任意中间状态，先恢复到已知状态；
                // 恢复失败不终止这一行，下一次尝试自然会继续消耗预算
                if let Err(reset_err) = session.reset().await {
                    warn!("{} 重置会话失败: {}", ctx, reset_err);
                }
                sleep(self.backoff).await;
                RowState::Attempting {
                    attempt: attempt + 1,
                }
            }
        }
    }
}
