//! 倒计时时钟 - 基础设施层
//!
//! 持有唯一的周期任务，只暴露"每秒回调一次"的能力

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// 可取消的周期任务
///
/// 职责：
/// - 每个周期调用一次回调，回调返回 false 时任务自行结束
/// - 错过的周期不会补发，每次回调只代表一个周期
/// - `stop()` 或 drop 时立即取消任务
pub struct Countdown {
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    /// 以一秒为周期启动
    pub fn start_seconds<F>(on_tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        Self::start(Duration::from_secs(1), on_tick)
    }

    /// 启动周期任务，第一次回调在一个周期之后
    pub fn start<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !on_tick() {
                    debug!("倒计时接收方已关闭，停止计时");
                    break;
                }
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    /// 停止计时，重复调用无副作用
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.stop();
    }
}
