use std::str::FromStr;

use crate::error::{ApiError, SessionError};
use crate::models::{AnswerOption, LoadedQuestion};

/// 导航方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Previous,
    Next,
    Skip,
    Submit,
}

impl FromStr for NavDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "previous" | "prev" => Ok(Self::Previous),
            "next" => Ok(Self::Next),
            "skip" => Ok(Self::Skip),
            "submit" => Ok(Self::Submit),
            other => Err(format!("未知导航方向: {}", other)),
        }
    }
}

/// 导航的实际去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// 开始加载目标题目
    Loading { target: u32 },
    /// 转到交卷确认
    ConfirmSubmission,
    /// 当前状态下不处理
    Ignored,
}

/// 展示层发来的用户操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    SelectAnswer(AnswerOption),
    ToggleMark,
    Navigate(NavDirection),
    /// 在交卷确认框中选择"交卷"
    ConfirmSubmit,
    /// 关闭当前提示框（"继续作答"或确认时间到）
    DismissPrompt,
    /// 直接交卷，也用于交卷失败后的手动重试
    Submit,
    /// 加载失败后重新加载
    Reload,
    Abandon,
}

/// 会话事件循环处理的全部输入
#[derive(Debug)]
pub enum SessionEvent {
    Command(SessionCommand),
    Tick,
    /// 时间耗尽后排队的自动交卷
    AutoSubmit,
    QuestionLoaded {
        seq: u64,
        target: u32,
        result: Result<LoadedQuestion, ApiError>,
    },
    MarkToggled {
        load_seq: u64,
        question_number: u32,
        result: Result<bool, ApiError>,
    },
    SubmitFinished {
        result: Result<serde_json::Value, SessionError>,
    },
}

impl From<SessionCommand> for SessionEvent {
    fn from(command: SessionCommand) -> Self {
        SessionEvent::Command(command)
    }
}
