//! 交卷重试策略
//!
//! 默认只尝试一次，失败后由展示层重新触发；配置了多次尝试时按指数退避重试

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use super::TestSubmissionService;
use crate::error::SessionError;

/// 交卷重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitRetryPolicy {
    /// 最大尝试次数（包含第一次）
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl SubmitRetryPolicy {
    /// 只尝试一次，不重试
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// 第 `attempt` 次失败后的等待时间（attempt 从 1 开始）
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

impl Default for SubmitRetryPolicy {
    fn default() -> Self {
        Self::single_attempt()
    }
}

/// 按策略交卷
///
/// # 返回
/// 成功时返回后端成绩，全部尝试失败时返回 `SubmitFailure`
pub async fn submit_with_policy(
    service: &dyn TestSubmissionService,
    test_id: &str,
    policy: SubmitRetryPolicy,
) -> Result<serde_json::Value, SessionError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match service.submit_test(test_id).await {
            Ok(scores) => {
                if attempt > 1 {
                    info!("✓ 第 {} 次尝试交卷成功", attempt);
                }
                return Ok(scores);
            }
            Err(source) if attempt >= max_attempts => {
                return Err(SessionError::SubmitFailure {
                    attempts: attempt,
                    source,
                });
            }
            Err(e) => {
                let wait = policy.backoff_after(attempt);
                warn!(
                    "交卷失败 (尝试 {}/{}): {}，{:?} 后重试...",
                    attempt, max_attempts, e, wait
                );
                sleep(wait).await;
                attempt += 1;
            }
        }
    }
}
