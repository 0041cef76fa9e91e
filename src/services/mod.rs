//! 业务能力层
//!
//! 会话控制器依赖的外部协作方，全部以 trait 形式注入：
//! - `QuestionProvider` - 按题号获取题目
//! - `MarkToggleService` - 切换"待复查"标记
//! - `TestSubmissionService` - 交卷并取得成绩
//! - `ResultsPresenter` - 接收最终成绩
//! - `AnswerRecorder` - 可选的作答转发钩子

pub mod results_writer;
pub mod submission;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ApiError;
use crate::models::{AnswerOption, LoadedQuestion, TestReport};

pub use results_writer::ResultsWriter;
pub use submission::{submit_with_policy, SubmitRetryPolicy};

#[async_trait]
pub trait QuestionProvider: Send + Sync {
    async fn fetch_question(
        &self,
        test_id: &str,
        question_number: u32,
    ) -> Result<LoadedQuestion, ApiError>;
}

#[async_trait]
pub trait MarkToggleService: Send + Sync {
    /// 返回服务端切换后的标记状态
    async fn toggle_mark(&self, test_id: &str, question_number: u32) -> Result<bool, ApiError>;
}

#[async_trait]
pub trait TestSubmissionService: Send + Sync {
    /// 返回后端计算的成绩（原样透传）
    async fn submit_test(&self, test_id: &str) -> Result<serde_json::Value, ApiError>;
}

#[async_trait]
pub trait ResultsPresenter: Send + Sync {
    async fn present(&self, report: &TestReport) -> anyhow::Result<()>;
}

/// 一次作答选择
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerSelection {
    pub test_id: String,
    pub question_number: u32,
    pub answer: AnswerOption,
}

/// 作答转发
///
/// 后端暂无保存作答的接口，这里只定义钩子，不提供 HTTP 实现
#[async_trait]
pub trait AnswerRecorder: Send + Sync {
    async fn record(&self, selection: &AnswerSelection) -> Result<(), ApiError>;
}

/// 会话控制器用到的全部服务
#[derive(Clone)]
pub struct SessionServices {
    pub questions: Arc<dyn QuestionProvider>,
    pub marks: Arc<dyn MarkToggleService>,
    pub submission: Arc<dyn TestSubmissionService>,
    pub presenter: Arc<dyn ResultsPresenter>,
    pub answer_recorder: Option<Arc<dyn AnswerRecorder>>,
}

impl SessionServices {
    /// 三个后端能力由同一个客户端提供
    pub fn from_backend<B>(backend: Arc<B>, presenter: Arc<dyn ResultsPresenter>) -> Self
    where
        B: QuestionProvider + MarkToggleService + TestSubmissionService + 'static,
    {
        Self {
            questions: backend.clone(),
            marks: backend.clone(),
            submission: backend,
            presenter,
            answer_recorder: None,
        }
    }

    pub fn with_answer_recorder(mut self, recorder: Arc<dyn AnswerRecorder>) -> Self {
        self.answer_recorder = Some(recorder);
        self
    }
}
