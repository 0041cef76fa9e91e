//! 会话控制器 - 流程层
//!
//! 核心职责：持有 `SessionState`，驱动倒计时，处理导航/标记/交卷
//!
//! 所有输入（用户操作、时钟、服务回调）都以 `SessionEvent` 进入同一个事件循环，
//! 网络调用在独立任务中执行，完成后再以事件的形式回到控制器。
//! 因此控制器本身无需加锁，网络请求也不会阻塞倒计时。
//!
//! 状态流转：
//! 1. Loading → Ready / Errored
//! 2. Ready → Loading（导航）/ Submitting（确认交卷）/ TimedOut（时间耗尽）
//! 3. TimedOut → Submitting（自动交卷）
//! 4. Submitting → Submitted（成功）/ 停留 Submitting（失败，等待手动重试）

use std::ops::ControlFlow;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::events::{NavDirection, NavigationOutcome, SessionCommand, SessionEvent};
use super::session_ctx::SessionCtx;
use super::snapshot::{SessionPhase, SessionSnapshot, SubmitPrompt};
use crate::error::{ApiError, SessionError};
use crate::infrastructure::Countdown;
use crate::models::{AnswerOption, LoadedQuestion, Question, SessionState, TestReport};
use crate::services::{submit_with_policy, AnswerSelection, SessionServices};
use crate::utils::logging::truncate_text;

/// 会话结束方式
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Submitted(TestReport),
    Abandoned,
}

/// 会话控制器
///
/// - 唯一修改 `SessionState` 的地方
/// - 通过 watch 通道发布快照，展示层只读
/// - 每次加载都有递增序号，过期的加载结果直接丢弃
pub struct SessionController {
    ctx: SessionCtx,
    services: SessionServices,
    state: SessionState,
    phase: SessionPhase,
    question: Option<Question>,
    prompt: Option<SubmitPrompt>,
    error: Option<String>,
    report: Option<TestReport>,

    events: mpsc::UnboundedSender<SessionEvent>,
    snapshots: watch::Sender<SessionSnapshot>,
    countdown: Option<Countdown>,

    /// 最近一次发起加载的序号
    load_seq: u64,
    /// 当前显示题目对应的加载序号
    displayed_seq: u64,
    /// 进行中的加载目标
    pending_target: Option<u32>,
    /// 最近一次请求的题号，用于重新加载
    last_requested: u32,
    submit_in_flight: bool,
    expired: bool,
}

impl SessionController {
    /// 创建控制器，不启动时钟也不加载题目
    ///
    /// 服务回调和时钟都通过 `events` 发回，调用方负责把接收端的事件交给 `handle`
    pub fn new(
        ctx: SessionCtx,
        services: SessionServices,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let state = SessionState::new(
            ctx.test_id.clone(),
            ctx.start_question,
            ctx.duration_seconds,
        );
        let last_requested = state.current_question_number();
        let initial = SessionSnapshot {
            test_name: ctx.test_name.clone(),
            phase: SessionPhase::Loading,
            state: state.clone(),
            question: None,
            prompt: None,
            error: None,
            report: None,
        };
        let (snapshots, _) = watch::channel(initial);

        Self {
            ctx,
            services,
            state,
            phase: SessionPhase::Loading,
            question: None,
            prompt: None,
            error: None,
            report: None,
            events,
            snapshots,
            countdown: None,
            load_seq: 0,
            displayed_seq: 0,
            pending_target: None,
            last_requested,
            submit_in_flight: false,
            expired: false,
        }
    }

    /// 订阅快照
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            test_name: self.ctx.test_name.clone(),
            phase: self.phase,
            state: self.state.clone(),
            question: self.question.clone(),
            prompt: self.prompt,
            error: self.error.clone(),
            report: self.report.clone(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn prompt(&self) -> Option<SubmitPrompt> {
        self.prompt
    }

    pub fn is_clock_running(&self) -> bool {
        self.countdown
            .as_ref()
            .map(Countdown::is_running)
            .unwrap_or(false)
    }

    /// 启动倒计时并加载起始题目
    pub fn begin(&mut self) {
        info!(
            "{} ⏱ 开始计时: {}",
            self.ctx,
            self.state.remaining_display()
        );

        if self.state.remaining_seconds() == 0 {
            self.expire();
            return;
        }

        let events = self.events.clone();
        self.countdown = Some(Countdown::start_seconds(move || {
            events.send(SessionEvent::Tick).is_ok()
        }));

        self.load_question(self.state.current_question_number());
    }

    /// 处理一个事件
    ///
    /// # 返回
    /// 会话进入终态时返回 `Break`
    pub async fn handle(&mut self, event: SessionEvent) -> ControlFlow<SessionOutcome> {
        match event {
            SessionEvent::Command(command) => return self.apply(command),
            SessionEvent::Tick => self.tick(),
            SessionEvent::AutoSubmit => {
                if self.phase == SessionPhase::TimedOut {
                    info!("{} ⏰ 时间到，自动交卷", self.ctx);
                    self.submit();
                }
            }
            SessionEvent::QuestionLoaded {
                seq,
                target,
                result,
            } => self.on_question_loaded(seq, target, result),
            SessionEvent::MarkToggled {
                load_seq,
                question_number,
                result,
            } => self.on_mark_toggled(load_seq, question_number, result),
            SessionEvent::SubmitFinished { result } => {
                return self.on_submit_finished(result).await;
            }
        }
        ControlFlow::Continue(())
    }

    /// 执行用户操作
    pub fn apply(&mut self, command: SessionCommand) -> ControlFlow<SessionOutcome> {
        debug!("{} 收到操作: {:?}", self.ctx, command);
        match command {
            SessionCommand::SelectAnswer(option) => {
                self.select_answer(option);
            }
            SessionCommand::ToggleMark => {
                self.toggle_mark();
            }
            SessionCommand::Navigate(direction) => {
                self.navigate(direction);
            }
            SessionCommand::ConfirmSubmit => self.confirm_submit(),
            SessionCommand::DismissPrompt => self.dismiss_prompt(),
            SessionCommand::Submit => {
                self.submit();
            }
            SessionCommand::Reload => self.reload(),
            SessionCommand::Abandon => return ControlFlow::Break(self.abandon()),
        }
        ControlFlow::Continue(())
    }

    // ========== 题目加载 ==========

    /// 加载指定题目
    ///
    /// 新的加载会让之前未返回的加载结果失效
    ///
    /// # 返回
    /// 本次加载的序号，会话已不再接受加载时返回 None
    pub fn load_question(&mut self, question_number: u32) -> Option<u64> {
        if self.phase.is_terminal()
            || matches!(self.phase, SessionPhase::Submitting | SessionPhase::TimedOut)
        {
            debug!("{} 当前阶段 {:?} 不加载题目", self.ctx, self.phase);
            return None;
        }

        self.load_seq += 1;
        let seq = self.load_seq;
        self.phase = SessionPhase::Loading;
        self.pending_target = Some(question_number);
        self.last_requested = question_number;
        self.prompt = None;
        self.error = None;

        info!("{} 📥 正在加载第 {} 题...", self.ctx, question_number);

        let provider = self.services.questions.clone();
        let events = self.events.clone();
        let test_id = self.ctx.test_id.clone();
        tokio::spawn(async move {
            let result = provider.fetch_question(&test_id, question_number).await;
            let _ = events.send(SessionEvent::QuestionLoaded {
                seq,
                target: question_number,
                result,
            });
        });

        self.publish();
        Some(seq)
    }

    fn on_question_loaded(
        &mut self,
        seq: u64,
        target: u32,
        result: Result<LoadedQuestion, ApiError>,
    ) {
        if seq != self.load_seq || self.phase != SessionPhase::Loading {
            debug!(
                "{} 丢弃过期的加载结果: 第 {} 题 (序号 {}, 最新 {})",
                self.ctx, target, seq, self.load_seq
            );
            return;
        }
        self.pending_target = None;

        match result {
            Ok(loaded) if loaded.question_number == 0 => {
                let err = SessionError::LoadFailure {
                    question_number: target,
                    source: ApiError::InvalidQuestionNumber {
                        question_number: loaded.question_number,
                        total: loaded.total_questions,
                    },
                };
                warn!("{} ❌ {}", self.ctx, err);
                self.error = Some(err.to_string());
                self.phase = SessionPhase::Errored;
            }
            Ok(loaded) => {
                if loaded.question_number > loaded.total_questions {
                    warn!(
                        "{} ⚠️ 后端返回的题号 {} 超出总题数 {}",
                        self.ctx, loaded.question_number, loaded.total_questions
                    );
                }
                self.state
                    .replace_question(loaded.question_number, loaded.total_questions);
                info!(
                    "{} ✓ 第 {}/{} 题加载完成: {}",
                    self.ctx,
                    self.state.current_question_number(),
                    self.state.total_questions(),
                    truncate_text(&loaded.question.text, 40)
                );
                self.question = Some(loaded.question);
                self.displayed_seq = seq;
                self.phase = SessionPhase::Ready;
            }
            Err(source) => {
                let err = SessionError::LoadFailure {
                    question_number: target,
                    source,
                };
                warn!("{} ❌ {}", self.ctx, err);
                self.error = Some(err.to_string());
                self.phase = SessionPhase::Errored;
            }
        }
        self.publish();
    }

    /// 加载失败后重新请求上一次的题目
    pub fn reload(&mut self) {
        if self.phase != SessionPhase::Errored {
            debug!("{} 只有加载失败后才能重新加载", self.ctx);
            return;
        }
        self.load_question(self.last_requested);
    }

    // ========== 作答与标记 ==========

    /// 选择答案，只修改本地状态
    ///
    /// 配置了 `AnswerRecorder` 时同时转发一次选择事件
    pub fn select_answer(&mut self, option: AnswerOption) -> bool {
        if self.phase != SessionPhase::Ready {
            debug!("{} 当前阶段 {:?} 不能作答", self.ctx, self.phase);
            return false;
        }

        self.state.select_answer(option);
        self.publish();

        if let Some(recorder) = self.services.answer_recorder.clone() {
            let selection = AnswerSelection {
                test_id: self.ctx.test_id.clone(),
                question_number: self.state.current_question_number(),
                answer: option,
            };
            let ctx = self.ctx.to_string();
            tokio::spawn(async move {
                if let Err(e) = recorder.record(&selection).await {
                    warn!("{} ⚠️ 作答转发失败 (第 {} 题): {}", ctx, selection.question_number, e);
                }
            });
        }
        true
    }

    /// 切换当前题目的标记，以服务端返回的状态为准
    pub fn toggle_mark(&mut self) -> bool {
        if self.phase != SessionPhase::Ready {
            debug!("{} 当前阶段 {:?} 不能标记", self.ctx, self.phase);
            return false;
        }

        let question_number = self.state.current_question_number();
        let load_seq = self.displayed_seq;
        let marks = self.services.marks.clone();
        let events = self.events.clone();
        let test_id = self.ctx.test_id.clone();
        tokio::spawn(async move {
            let result = marks.toggle_mark(&test_id, question_number).await;
            let _ = events.send(SessionEvent::MarkToggled {
                load_seq,
                question_number,
                result,
            });
        });
        true
    }

    fn on_mark_toggled(
        &mut self,
        load_seq: u64,
        question_number: u32,
        result: Result<bool, ApiError>,
    ) {
        if self.phase.is_terminal() || load_seq != self.displayed_seq {
            debug!("{} 丢弃过期的标记结果: 第 {} 题", self.ctx, question_number);
            return;
        }

        match result {
            Ok(marked) => {
                self.state.set_marked(marked);
                debug!("{} 第 {} 题标记: {}", self.ctx, question_number, marked);
                self.publish();
            }
            Err(source) => {
                // 标记失败不影响作答，保持原状态
                let err = SessionError::MarkFailure {
                    question_number,
                    source,
                };
                warn!("{} ⚠️ {}", self.ctx, err);
            }
        }
    }

    // ========== 导航 ==========

    /// 导航
    ///
    /// 规则：
    /// - `Submit`，或已在最后一题且不是 `Previous` → 交卷确认
    /// - `Next` / `Skip` → 下一题
    /// - `Previous` → 上一题，已在第一题时不处理
    ///
    /// 加载中再次导航时以进行中的目标题号为基准
    pub fn navigate(&mut self, direction: NavDirection) -> NavigationOutcome {
        if !matches!(self.phase, SessionPhase::Ready | SessionPhase::Loading) {
            debug!("{} 当前阶段 {:?} 不能导航", self.ctx, self.phase);
            return NavigationOutcome::Ignored;
        }

        let base = self
            .pending_target
            .unwrap_or(self.state.current_question_number());
        let on_last = base == self.state.total_questions();

        if direction == NavDirection::Submit || (on_last && direction != NavDirection::Previous) {
            info!("{} 📝 请求交卷确认", self.ctx);
            self.prompt = Some(SubmitPrompt::ConfirmSubmit);
            self.publish();
            return NavigationOutcome::ConfirmSubmission;
        }

        let target = match direction {
            NavDirection::Next | NavDirection::Skip => base + 1,
            NavDirection::Previous if base > 1 => base - 1,
            _ => return NavigationOutcome::Ignored,
        };

        match self.load_question(target) {
            Some(_) => NavigationOutcome::Loading { target },
            None => NavigationOutcome::Ignored,
        }
    }

    // ========== 交卷 ==========

    fn confirm_submit(&mut self) {
        if self.prompt != Some(SubmitPrompt::ConfirmSubmit) {
            debug!("{} 没有待确认的交卷", self.ctx);
            return;
        }
        // 加载中无法交卷，保留提示框，等题目就绪后再确认
        if !self.submit() {
            info!("{} 题目加载中，稍后再确认交卷", self.ctx);
        }
    }

    /// 关闭提示框
    ///
    /// 确认"时间到"时，如果没有正在进行的交卷就重新发起
    fn dismiss_prompt(&mut self) {
        match self.prompt.take() {
            Some(SubmitPrompt::ConfirmSubmit) => {
                info!("{} 继续作答", self.ctx);
                self.publish();
            }
            Some(SubmitPrompt::TimeUp) => {
                if !self.submit() {
                    self.publish();
                }
            }
            None => {}
        }
    }

    /// 交卷
    ///
    /// 可在 Ready / TimedOut / Errored 发起，或在上次交卷失败后手动重试
    ///
    /// # 返回
    /// 是否真正发起了交卷
    pub fn submit(&mut self) -> bool {
        let allowed = match self.phase {
            SessionPhase::Ready | SessionPhase::TimedOut | SessionPhase::Errored => true,
            SessionPhase::Submitting => !self.submit_in_flight,
            SessionPhase::Loading | SessionPhase::Submitted | SessionPhase::Abandoned => false,
        };
        if !allowed {
            debug!(
                "{} 当前阶段 {:?} 不能交卷 (进行中: {})",
                self.ctx, self.phase, self.submit_in_flight
            );
            return false;
        }

        self.phase = SessionPhase::Submitting;
        self.submit_in_flight = true;
        self.pending_target = None;
        self.error = None;
        if self.prompt == Some(SubmitPrompt::ConfirmSubmit) {
            self.prompt = None;
        }

        info!("{} 📤 正在交卷...", self.ctx);

        let submission = self.services.submission.clone();
        let events = self.events.clone();
        let test_id = self.ctx.test_id.clone();
        let policy = self.ctx.submit_policy;
        tokio::spawn(async move {
            let result = submit_with_policy(submission.as_ref(), &test_id, policy).await;
            let _ = events.send(SessionEvent::SubmitFinished { result });
        });

        self.publish();
        true
    }

    async fn on_submit_finished(
        &mut self,
        result: Result<serde_json::Value, SessionError>,
    ) -> ControlFlow<SessionOutcome> {
        self.submit_in_flight = false;
        if self.phase.is_terminal() {
            return ControlFlow::Continue(());
        }

        match result {
            Ok(scores) => {
                self.stop_clock();
                let report = TestReport {
                    test_id: self.ctx.test_id.clone(),
                    user_id: self.ctx.user_id.clone(),
                    test_name: self.ctx.test_name.clone(),
                    scores,
                    submitted_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                };
                self.phase = SessionPhase::Submitted;
                self.prompt = None;
                self.report = Some(report.clone());
                self.publish();
                info!("{} ✓ 交卷成功", self.ctx);

                if let Err(e) = self.services.presenter.present(&report).await {
                    error!("{} ❌ 成绩展示失败: {}", self.ctx, e);
                }
                ControlFlow::Break(SessionOutcome::Submitted(report))
            }
            Err(err) => {
                error!("{} ❌ {}，等待手动重试", self.ctx, err);
                self.error = Some(err.to_string());
                self.publish();
                ControlFlow::Continue(())
            }
        }
    }

    // ========== 倒计时 ==========

    /// 时钟走一秒
    pub fn tick(&mut self) {
        if self.phase.is_terminal() {
            return;
        }
        if self.state.tick() {
            self.expire();
        } else {
            self.publish();
        }
    }

    /// 时间耗尽，只触发一次
    fn expire(&mut self) {
        if self.expired {
            return;
        }
        self.expired = true;
        self.stop_clock();

        if self.phase == SessionPhase::Submitting {
            debug!("{} 时间耗尽时已在交卷", self.ctx);
            self.publish();
            return;
        }

        warn!("{} ⏰ 时间到！", self.ctx);
        self.phase = SessionPhase::TimedOut;
        self.pending_target = None;
        self.prompt = Some(SubmitPrompt::TimeUp);
        self.publish();
        let _ = self.events.send(SessionEvent::AutoSubmit);
    }

    // ========== 生命周期 ==========

    fn abandon(&mut self) -> SessionOutcome {
        info!("{} 放弃本次考试", self.ctx);
        self.stop_clock();
        self.phase = SessionPhase::Abandoned;
        self.prompt = None;
        self.publish();
        SessionOutcome::Abandoned
    }

    fn stop_clock(&mut self) {
        if let Some(mut countdown) = self.countdown.take() {
            countdown.stop();
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}
