/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::TestReport;

/// 初始化全局日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("exam_session={},warn", default_level)));

    // 重复初始化（例如测试中）时忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 考试开始 - {}", config.test_name);
    info!(
        "📋 试卷 ID: {} | 考生: {} | 时长: {} 分钟",
        config.test_id, config.user_id, config.duration_minutes
    );
    info!("🌐 后端地址: {}", config.api_base_url);
    info!("{}", "=".repeat(60));
}

/// 打印最终成绩
pub fn log_final_report(report: &TestReport) {
    info!("\n{}", "=".repeat(60));
    info!("📊 交卷完成 - {}", report.test_name);
    info!("完成时间: {}", report.submitted_at);
    info!("{}", "=".repeat(60));
    info!("考生: {} | 试卷 ID: {}", report.user_id, report.test_id);
    info!("成绩: {}", report.scores);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
