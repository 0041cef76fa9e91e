//! 会话运行器 - 编排层
//!
//! 把控制器放进独立任务，串行消费事件；展示层通过 `SessionHandle` 交互

use std::ops::ControlFlow;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

use crate::models::AnswerOption;
use crate::services::SessionServices;
use crate::workflow::{
    NavDirection, SessionCommand, SessionController, SessionCtx, SessionEvent, SessionOutcome,
    SessionSnapshot,
};

/// 会话已经结束，操作无法送达
#[derive(Debug, Error)]
#[error("会话已结束")]
pub struct SessionClosed;

/// 展示层持有的会话句柄
pub struct SessionHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub fn send(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.events
            .send(SessionEvent::Command(command))
            .map_err(|_| SessionClosed)
    }

    pub fn select_answer(&self, option: AnswerOption) -> Result<(), SessionClosed> {
        self.send(SessionCommand::SelectAnswer(option))
    }

    pub fn toggle_mark(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::ToggleMark)
    }

    pub fn navigate(&self, direction: NavDirection) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Navigate(direction))
    }

    pub fn confirm_submit(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::ConfirmSubmit)
    }

    pub fn dismiss_prompt(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::DismissPrompt)
    }

    pub fn submit(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Submit)
    }

    pub fn reload(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Reload)
    }

    pub fn abandon(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Abandon)
    }

    /// 当前快照
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// 新的快照接收端
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

/// 启动一个会话
///
/// # 返回
/// - `SessionHandle`: 发送操作、读取快照
/// - `JoinHandle`: 会话结束时返回结果
pub fn spawn_session(
    ctx: SessionCtx,
    services: SessionServices,
) -> (SessionHandle, JoinHandle<SessionOutcome>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let controller = SessionController::new(ctx, services, tx.clone());
    let handle = SessionHandle {
        events: tx,
        snapshots: controller.subscribe(),
    };

    let join = tokio::spawn(run(controller, rx));
    (handle, join)
}

/// 事件循环
async fn run(
    mut controller: SessionController,
    mut rx: mpsc::UnboundedReceiver<SessionEvent>,
) -> SessionOutcome {
    controller.begin();

    // 控制器自身持有发送端，通道不会在会话结束前关闭
    while let Some(event) = rx.recv().await {
        if let ControlFlow::Break(outcome) = controller.handle(event).await {
            info!("会话事件循环结束: {:?}", controller.phase());
            return outcome;
        }
    }
    SessionOutcome::Abandoned
}
