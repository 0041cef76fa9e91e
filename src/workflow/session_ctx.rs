//! 会话上下文
//!
//! 封装"谁在考哪张卷子"这一信息，会话期间不变

use std::fmt::Display;

use crate::config::Config;
use crate::services::SubmitRetryPolicy;

#[derive(Debug, Clone)]
pub struct SessionCtx {
    /// 试卷ID
    pub test_id: String,

    /// 考生ID（仅用于成绩报告）
    pub user_id: String,

    /// 试卷名称（仅用于显示）
    pub test_name: String,

    /// 考试时长（秒）
    pub duration_seconds: u32,

    /// 起始题号（从1开始）
    pub start_question: u32,

    pub submit_policy: SubmitRetryPolicy,
}

impl SessionCtx {
    pub fn new(test_id: impl Into<String>, duration_seconds: u32) -> Self {
        Self {
            test_id: test_id.into(),
            user_id: String::new(),
            test_name: String::new(),
            duration_seconds,
            start_question: 1,
            submit_policy: SubmitRetryPolicy::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            test_id: config.test_id.clone(),
            user_id: config.user_id.clone(),
            test_name: config.test_name.clone(),
            duration_seconds: config.duration_seconds(),
            start_question: config.start_question,
            submit_policy: config.submit_retry_policy(),
        }
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[试卷 ID#{} 考生#{}]", self.test_id, self.user_id)
    }
}
