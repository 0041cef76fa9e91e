use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use exam_session::models::LoadedQuestion;
use exam_session::services::{
    MarkToggleService, QuestionProvider, ResultsPresenter, TestSubmissionService,
};
use exam_session::workflow::SubmitPrompt;
use exam_session::{
    spawn_session, AnswerOption, ApiError, Config, ExamApiClient, NavDirection, Question,
    SessionCtx, SessionOutcome, SessionPhase, SessionServices, SessionSnapshot, TestReport,
};
use serde_json::json;
use tokio::sync::watch;
use tokio_test::assert_ok;

/// 内存中的考试后端
struct FakeExamBackend {
    total: u32,
    marked: Mutex<HashSet<u32>>,
    fetch_calls: AtomicU32,
    submit_calls: AtomicU32,
}

impl FakeExamBackend {
    fn new(total: u32) -> Self {
        Self {
            total,
            marked: Mutex::new(HashSet::new()),
            fetch_calls: AtomicU32::new(0),
            submit_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl QuestionProvider for FakeExamBackend {
    async fn fetch_question(
        &self,
        _test_id: &str,
        question_number: u32,
    ) -> Result<LoadedQuestion, ApiError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if question_number > self.total {
            return Err(ApiError::bad_status("/questions", 404));
        }
        Ok(LoadedQuestion {
            question_number,
            total_questions: self.total,
            question: Question::new(format!("Question {}", question_number))
                .with_option(AnswerOption::A, "alpha")
                .with_option(AnswerOption::B, "beta")
                .with_option(AnswerOption::C, "gamma"),
        })
    }
}

#[async_trait]
impl MarkToggleService for FakeExamBackend {
    async fn toggle_mark(&self, _test_id: &str, question_number: u32) -> Result<bool, ApiError> {
        let mut marked = self.marked.lock().unwrap();
        if marked.remove(&question_number) {
            Ok(false)
        } else {
            marked.insert(question_number);
            Ok(true)
        }
    }
}

#[async_trait]
impl TestSubmissionService for FakeExamBackend {
    async fn submit_test(&self, _test_id: &str) -> Result<serde_json::Value, ApiError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({ "score": 2, "out_of": self.total }))
    }
}

#[derive(Default)]
struct CollectingPresenter {
    reports: Mutex<Vec<TestReport>>,
}

#[async_trait]
impl ResultsPresenter for CollectingPresenter {
    async fn present(&self, report: &TestReport) -> anyhow::Result<()> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

fn services(
    backend: &Arc<FakeExamBackend>,
    presenter: &Arc<CollectingPresenter>,
) -> SessionServices {
    SessionServices::from_backend(backend.clone(), presenter.clone())
}

fn ctx(duration_seconds: u32) -> SessionCtx {
    let mut ctx = SessionCtx::new("42", duration_seconds);
    ctx.user_id = "student-1".to_string();
    ctx.test_name = "Physics Midterm".to_string();
    ctx
}

/// 等待满足条件的快照
async fn wait_for(
    rx: &mut watch::Receiver<SessionSnapshot>,
    predicate: impl Fn(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    loop {
        {
            let snapshot = rx.borrow_and_update();
            if predicate(&snapshot) {
                return snapshot.clone();
            }
        }
        rx.changed().await.expect("会话已结束");
    }
}

fn ready_on(question_number: u32) -> impl Fn(&SessionSnapshot) -> bool {
    move |s| s.phase == SessionPhase::Ready && s.state.current_question_number() == question_number
}

#[tokio::test(start_paused = true)]
async fn test_scenario_a_next_loads_following_question_with_answer_cleared() {
    let backend = Arc::new(FakeExamBackend::new(3));
    let presenter = Arc::new(CollectingPresenter::default());
    let (handle, session) = spawn_session(ctx(60), services(&backend, &presenter));
    let mut rx = handle.subscribe();

    let first = wait_for(&mut rx, ready_on(1)).await;
    assert_eq!(first.header_label(), "Physics Midterm – Question 1 of 3");
    assert_eq!(first.state.remaining_seconds(), 60);

    assert_ok!(handle.select_answer(AnswerOption::B));
    let answered = wait_for(&mut rx, |s| s.state.selected_answer().is_some()).await;
    assert_eq!(answered.primary_action(), NavDirection::Next);

    assert_ok!(handle.navigate(NavDirection::Next));
    let second = wait_for(&mut rx, ready_on(2)).await;

    assert_eq!(second.state.selected_answer(), None);
    assert!(!second.state.is_marked());
    assert_eq!(second.question.unwrap().text, "Question 2");

    assert_ok!(handle.abandon());
    assert_eq!(session.await.unwrap(), SessionOutcome::Abandoned);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_b_last_question_routes_to_confirmation() {
    let backend = Arc::new(FakeExamBackend::new(3));
    let presenter = Arc::new(CollectingPresenter::default());
    let mut session_ctx = ctx(60);
    session_ctx.start_question = 3;
    let (handle, session) = spawn_session(session_ctx, services(&backend, &presenter));
    let mut rx = handle.subscribe();

    wait_for(&mut rx, ready_on(3)).await;
    assert_ok!(handle.select_answer(AnswerOption::A));
    assert_ok!(handle.navigate(NavDirection::Next));

    let confirming = wait_for(&mut rx, |s| s.prompt.is_some()).await;
    assert_eq!(confirming.prompt, Some(SubmitPrompt::ConfirmSubmit));
    assert_eq!(confirming.phase, SessionPhase::Ready);
    assert_eq!(confirming.state.current_question_number(), 3);
    // 没有请求第 4 题
    assert_eq!(backend.fetch_calls.load(Ordering::SeqCst), 1);

    assert_ok!(handle.confirm_submit());
    let outcome = session.await.unwrap();

    let report = match outcome {
        SessionOutcome::Submitted(report) => report,
        other => panic!("期望交卷成功, 实际 {:?}", other),
    };
    assert_eq!(report.test_id, "42");
    assert_eq!(report.user_id, "student-1");
    assert_eq!(report.scores, json!({ "score": 2, "out_of": 3 }));
    assert_eq!(presenter.reports.lock().unwrap().as_slice(), &[report]);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_c_countdown_auto_submits_once() {
    let backend = Arc::new(FakeExamBackend::new(3));
    let presenter = Arc::new(CollectingPresenter::default());
    let (handle, session) = spawn_session(ctx(5), services(&backend, &presenter));
    let mut rx = handle.subscribe();

    wait_for(&mut rx, ready_on(1)).await;

    let outcome = session.await.unwrap();

    assert!(matches!(outcome, SessionOutcome::Submitted(_)));
    assert_eq!(backend.submit_calls.load(Ordering::SeqCst), 1);
    assert_eq!(presenter.reports.lock().unwrap().len(), 1);

    let last = handle.snapshot();
    assert_eq!(last.phase, SessionPhase::Submitted);
    assert_eq!(last.state.remaining_seconds(), 0);
    assert!(handle.submit().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_mark_follows_backend_state() {
    let backend = Arc::new(FakeExamBackend::new(3));
    let presenter = Arc::new(CollectingPresenter::default());
    let (handle, session) = spawn_session(ctx(60), services(&backend, &presenter));
    let mut rx = handle.subscribe();

    wait_for(&mut rx, ready_on(1)).await;
    assert_ok!(handle.toggle_mark());
    wait_for(&mut rx, |s| s.state.is_marked()).await;
    assert_ok!(handle.toggle_mark());
    let unmarked = wait_for(&mut rx, |s| !s.state.is_marked()).await;

    assert!(unmarked.state.marked_questions().is_empty());

    assert_ok!(handle.abandon());
    assert_eq!(session.await.unwrap(), SessionOutcome::Abandoned);
}

#[tokio::test(start_paused = true)]
async fn test_previous_on_first_question_keeps_session_ready() {
    let backend = Arc::new(FakeExamBackend::new(3));
    let presenter = Arc::new(CollectingPresenter::default());
    let (handle, session) = spawn_session(ctx(60), services(&backend, &presenter));
    let mut rx = handle.subscribe();

    wait_for(&mut rx, ready_on(1)).await;
    assert_ok!(handle.navigate(NavDirection::Previous));
    assert_ok!(handle.select_answer(AnswerOption::C));
    let after = wait_for(&mut rx, |s| s.state.selected_answer().is_some()).await;

    assert_eq!(after.state.current_question_number(), 1);
    assert_eq!(backend.fetch_calls.load(Ordering::SeqCst), 1);

    assert_ok!(handle.abandon());
    session.await.unwrap();
}

/// 需要真实的考试后端，手动运行：cargo test -- --ignored
#[tokio::test]
#[ignore]
async fn test_live_backend_first_question() {
    exam_session::utils::logging::init(true);

    let config = Config::from_env().expect("配置无效");
    let client = ExamApiClient::new(&config).expect("创建客户端失败");

    let loaded = client
        .fetch_question(&config.test_id, config.start_question)
        .await
        .expect("加载题目失败");

    println!(
        "第 {}/{} 题: {}",
        loaded.question_number, loaded.total_questions, loaded.question.text
    );
    assert!(loaded.total_questions >= loaded.question_number);
}
