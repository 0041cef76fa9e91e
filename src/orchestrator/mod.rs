//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 把会话控制器放进单独的任务里运行，是整个会话的"调度中心"。
//!
//! ### `session_runner` - 会话运行器
//! - 创建事件通道，启动控制器的事件循环
//! - 时钟、用户操作、服务回调按到达顺序串行处理
//! - 对外提供 `SessionHandle`：发送操作、订阅快照
//! - 会话进入终态后结束循环并返回结果

pub mod session_runner;

pub use session_runner::{spawn_session, SessionClosed, SessionHandle};
