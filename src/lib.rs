//! # Exam Session
//!
//! 限时考试会话控制器：跟踪当前题目、倒计时、标记状态，并按协议与考试后端交互
//!
//! ## 架构设计
//!
//! 本系统沿用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `Countdown` - 可取消的一秒周期任务
//!
//! ### ② 业务能力层（Services / Clients）
//! - `services/` - 外部协作方的 trait：取题、标记、交卷、成绩展示、作答转发
//! - `clients/` - `ExamApiClient`，基于 reqwest 的后端实现
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 会话状态机
//! - `SessionCtx` - 上下文封装（test_id + user_id + 时长）
//! - `SessionController` - 导航、标记、交卷、倒计时
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session_runner` - 事件循环，把时钟、操作、服务回调串行化
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use clients::ExamApiClient;
pub use config::Config;
pub use error::{ApiError, AppError, AppResult, SessionError};
pub use infrastructure::Countdown;
pub use models::{AnswerOption, Question, SessionState, TestReport};
pub use orchestrator::{spawn_session, SessionHandle};
pub use services::{SessionServices, SubmitRetryPolicy};
pub use workflow::{
    NavDirection, SessionController, SessionCtx, SessionOutcome, SessionPhase, SessionSnapshot,
};
