//! 终端前端
//!
//! 逐行读取标准输入作为用户操作，订阅会话快照并用日志渲染当前题目

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use crate::clients::ExamApiClient;
use crate::config::Config;
use crate::models::AnswerOption;
use crate::orchestrator::spawn_session;
use crate::services::{ResultsWriter, SessionServices};
use crate::utils::logging::log_startup;
use crate::workflow::{
    NavDirection, SessionCommand, SessionCtx, SessionOutcome, SessionPhase, SessionSnapshot,
    SubmitPrompt,
};

/// 应用主结构
pub struct App {
    config: Config,
    services: SessionServices,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let client = Arc::new(ExamApiClient::new(&config)?);
        let presenter = Arc::new(ResultsWriter::with_path(&config.results_file));
        let services = SessionServices::from_backend(client, presenter);

        Ok(Self { config, services })
    }

    /// 运行一次考试，直到交卷或放弃
    pub async fn run(&self) -> Result<SessionOutcome> {
        print_help();

        let (handle, mut session) =
            spawn_session(SessionCtx::from_config(&self.config), self.services.clone());
        let mut snapshots = handle.subscribe();
        let mut previous: Option<SessionSnapshot> = None;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;
        let mut snapshots_open = true;

        loop {
            tokio::select! {
                outcome = &mut session => {
                    return Ok(outcome?);
                }
                changed = snapshots.changed(), if snapshots_open => {
                    if changed.is_err() {
                        snapshots_open = false;
                        continue;
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    render(previous.as_ref(), &snapshot);
                    previous = Some(snapshot);
                }
                line = lines.next_line(), if stdin_open => {
                    match line? {
                        Some(line) => match parse_command(&line, &handle.snapshot()) {
                            Ok(Some(command)) => {
                                if handle.send(command).is_err() {
                                    warn!("会话已结束，忽略输入");
                                }
                            }
                            Ok(None) => print_help(),
                            Err(msg) => warn!("{}", msg),
                        },
                        None => {
                            info!("标准输入已关闭，等待计时结束");
                            stdin_open = false;
                        }
                    }
                }
            }
        }
    }
}

/// 把一行输入解析为会话操作
///
/// 空行执行主按钮的动作（跳过 / 下一题 / 交卷）
///
/// # 返回
/// - `Ok(Some(_))`: 对应的操作
/// - `Ok(None)`: 显示帮助
/// - `Err(_)`: 无法识别
pub fn parse_command(
    line: &str,
    snapshot: &SessionSnapshot,
) -> Result<Option<SessionCommand>, String> {
    let input = line.trim().to_ascii_lowercase();
    let command = match input.as_str() {
        "" => SessionCommand::Navigate(snapshot.primary_action()),
        "a" | "b" | "c" | "d" => SessionCommand::SelectAnswer(input.parse::<AnswerOption>()?),
        "n" | "next" => SessionCommand::Navigate(NavDirection::Next),
        "p" | "prev" | "previous" => SessionCommand::Navigate(NavDirection::Previous),
        "s" | "skip" => SessionCommand::Navigate(NavDirection::Skip),
        "submit" => SessionCommand::Navigate(NavDirection::Submit),
        "m" | "mark" => SessionCommand::ToggleMark,
        "y" | "yes" | "confirm" => SessionCommand::ConfirmSubmit,
        "x" | "ok" | "continue" => SessionCommand::DismissPrompt,
        "retry" => SessionCommand::Submit,
        "r" | "reload" => SessionCommand::Reload,
        "q" | "quit" => SessionCommand::Abandon,
        "h" | "help" | "?" => return Ok(None),
        other => return Err(format!("无法识别的输入: {}", other)),
    };
    Ok(Some(command))
}

fn print_help() {
    info!("操作: a/b/c/d 选择答案 | 回车 主按钮 | n 下一题 | s 跳过 | p 上一题");
    info!("      m 标记 | submit 交卷 | y 确认交卷 | x 继续/关闭提示 | retry 重新交卷");
    info!("      r 重新加载 | q 放弃考试 | h 帮助");
}

/// 只渲染与上一份快照不同的部分
fn render(previous: Option<&SessionSnapshot>, current: &SessionSnapshot) {
    let prev_phase = previous.map(|p| p.phase);

    if prev_phase != Some(current.phase) {
        match current.phase {
            SessionPhase::Loading => info!("⏳ 加载中..."),
            SessionPhase::Ready => render_question(current),
            SessionPhase::Submitting => info!("📤 交卷中..."),
            SessionPhase::TimedOut => warn!("⏰ 时间到！"),
            SessionPhase::Errored => {}
            SessionPhase::Submitted => info!("✅ 已交卷"),
            SessionPhase::Abandoned => info!("已退出考试"),
        }
    } else if let Some(prev) = previous {
        // 快照可能被合并，Ready 之间也可能换了题
        let question_changed = prev.question != current.question
            || prev.state.current_question_number() != current.state.current_question_number();
        if current.phase == SessionPhase::Ready && question_changed {
            render_question(current);
        }
    }

    if let Some(prev) = previous {
        if prev.phase == current.phase && current.phase == SessionPhase::Ready {
            if prev.state.selected_answer() != current.state.selected_answer() {
                if let Some(answer) = current.state.selected_answer() {
                    info!("已选择: {}", answer);
                }
            }
            if prev.state.is_marked() != current.state.is_marked() {
                info!(
                    "{}",
                    if current.state.is_marked() { "★ 已标记" } else { "☆ 取消标记" }
                );
            }
        }
    }

    if previous.map(|p| p.prompt) != Some(current.prompt) {
        match current.prompt {
            Some(SubmitPrompt::ConfirmSubmit) => {
                info!("确定要交卷吗？输入 y 交卷，x 继续作答");
            }
            Some(SubmitPrompt::TimeUp) => info!("时间到，正在自动交卷（输入 x 确认）"),
            None => {}
        }
    }

    if previous.map(|p| &p.error) != Some(&current.error) {
        if let Some(err) = &current.error {
            error!("❌ {}", err);
            match current.phase {
                SessionPhase::Errored => info!("输入 r 重新加载"),
                SessionPhase::Submitting => info!("输入 retry 重新交卷"),
                _ => {}
            }
        }
    }

    let remaining = current.state.remaining_seconds();
    let remaining_changed = previous
        .map(|p| p.state.remaining_seconds() != remaining)
        .unwrap_or(true);
    if remaining_changed && (remaining % 60 == 0 || remaining <= 10) {
        info!("⏱ Time: {}", current.state.remaining_display());
    }
}

fn render_question(snapshot: &SessionSnapshot) {
    let Some(question) = &snapshot.question else {
        return;
    };
    let state = &snapshot.state;

    info!("\n{}", "─".repeat(60));
    info!(
        "{} {}",
        snapshot.header_label(),
        if state.is_marked() { "★" } else { "☆" }
    );
    info!("{}", "─".repeat(60));
    if let Some(image) = &question.image {
        info!("[图片: {} 字节编码数据]", image.len());
    }
    info!("{}", question.text);
    for option in question.offered_options() {
        let marker = if state.selected_answer() == Some(option) { "●" } else { "○" };
        info!("  {} {}. {}", marker, option, question.option(option).unwrap_or_default());
    }

    let primary = match snapshot.primary_action() {
        NavDirection::Submit => "Submit Test",
        NavDirection::Next => "Next →",
        _ => "Skip",
    };
    if state.can_go_previous() {
        info!("[← Previous]  [{}]   Time: {}", primary, state.remaining_display());
    } else {
        info!("[{}]   Time: {}", primary, state.remaining_display());
    }
}
