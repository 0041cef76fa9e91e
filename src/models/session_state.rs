//! 会话状态
//!
//! 只由会话控制器修改，展示层只能拿到快照副本

use std::collections::BTreeSet;

use serde::Serialize;

use super::answer::AnswerOption;
use crate::utils::time_fmt::format_mm_ss;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    test_id: String,
    current_question_number: u32,
    total_questions: u32,
    selected_answer: Option<AnswerOption>,
    is_marked: bool,
    remaining_seconds: u32,
    /// 只在加载题目时清空，不会累积（见 DESIGN.md）
    marked_questions: BTreeSet<u32>,
}

impl SessionState {
    pub fn new(test_id: impl Into<String>, start_question: u32, duration_seconds: u32) -> Self {
        Self {
            test_id: test_id.into(),
            current_question_number: start_question.max(1),
            total_questions: 0,
            selected_answer: None,
            is_marked: false,
            remaining_seconds: duration_seconds,
            marked_questions: BTreeSet::new(),
        }
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn current_question_number(&self) -> u32 {
        self.current_question_number
    }

    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    pub fn selected_answer(&self) -> Option<AnswerOption> {
        self.selected_answer
    }

    pub fn is_marked(&self) -> bool {
        self.is_marked
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn marked_questions(&self) -> &BTreeSet<u32> {
        &self.marked_questions
    }

    pub fn is_last_question(&self) -> bool {
        self.current_question_number == self.total_questions
    }

    pub fn can_go_previous(&self) -> bool {
        self.current_question_number > 1
    }

    /// 剩余时间，格式 mm:ss
    pub fn remaining_display(&self) -> String {
        format_mm_ss(self.remaining_seconds)
    }

    /// 整体替换题目相关字段，并清空所有题目作用域的状态
    pub(crate) fn replace_question(&mut self, question_number: u32, total_questions: u32) {
        self.current_question_number = question_number;
        self.total_questions = total_questions;
        self.selected_answer = None;
        self.is_marked = false;
        self.marked_questions.clear();
    }

    pub(crate) fn select_answer(&mut self, option: AnswerOption) {
        self.selected_answer = Some(option);
    }

    pub(crate) fn set_marked(&mut self, marked: bool) {
        self.is_marked = marked;
    }

    /// 倒计时走一秒
    ///
    /// 返回 true 表示本次从 1 变为 0
    pub(crate) fn tick(&mut self) -> bool {
        if self.remaining_seconds == 0 {
            return false;
        }
        self.remaining_seconds -= 1;
        self.remaining_seconds == 0
    }
}
