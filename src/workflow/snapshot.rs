use serde::Serialize;

use super::events::NavDirection;
use crate::models::{Question, SessionState, TestReport};

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Loading,
    Ready,
    Submitting,
    TimedOut,
    Errored,
    /// 交卷成功（终态）
    Submitted,
    /// 被展示层放弃（终态）
    Abandoned,
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Submitted | Self::Abandoned)
    }
}

/// 当前显示的提示框
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmitPrompt {
    /// "确定要交卷吗？"
    ConfirmSubmit,
    /// "时间到，正在自动交卷"
    TimeUp,
}

/// 发布给展示层的只读快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub test_name: String,
    pub phase: SessionPhase,
    pub state: SessionState,
    /// 最近一次成功加载的题目
    pub question: Option<Question>,
    pub prompt: Option<SubmitPrompt>,
    /// 最近一次加载或交卷失败的信息
    pub error: Option<String>,
    pub report: Option<TestReport>,
}

impl SessionSnapshot {
    /// 主按钮的动作：最后一题交卷，已选答案下一题，否则跳过
    pub fn primary_action(&self) -> NavDirection {
        if self.state.is_last_question() {
            NavDirection::Submit
        } else if self.state.selected_answer().is_some() {
            NavDirection::Next
        } else {
            NavDirection::Skip
        }
    }

    pub fn header_label(&self) -> String {
        format!(
            "{} – Question {} of {}",
            self.test_name,
            self.state.current_question_number(),
            self.state.total_questions()
        )
    }
}
