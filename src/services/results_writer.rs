//! 成绩写入服务 - 业务能力层
//!
//! 作为默认的结果展示方：打印成绩并追加写入结果文件

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::ResultsPresenter;
use crate::models::TestReport;
use crate::utils::logging::log_final_report;

/// 成绩写入服务
pub struct ResultsWriter {
    results_file_path: String,
}

impl ResultsWriter {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            results_file_path: path.into(),
        }
    }

    /// 追加一行 JSON 格式的成绩记录
    pub async fn write(&self, report: &TestReport) -> Result<()> {
        debug!(
            "写入成绩: 试卷 {} | 考生 {} -> {}",
            report.test_id, report.user_id, self.results_file_path
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.results_file_path)
            .await
            .with_context(|| format!("无法打开结果文件: {}", self.results_file_path))?;

        let mut line = serde_json::to_string(report)?;
        line.push('\n');
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

#[async_trait]
impl ResultsPresenter for ResultsWriter {
    async fn present(&self, report: &TestReport) -> Result<()> {
        log_final_report(report);
        self.write(report).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_present_appends_json_lines() {
        let path = std::env::temp_dir().join(format!(
            "exam_session_results_{}.txt",
            std::process::id()
        ));
        let _ = tokio::fs::remove_file(&path).await;
        let writer = ResultsWriter::with_path(path.to_string_lossy());

        let report = TestReport {
            test_id: "7".to_string(),
            user_id: "u1".to_string(),
            test_name: "Physics".to_string(),
            scores: json!({ "total": 3 }),
            submitted_at: "2025-01-01 10:00:00".to_string(),
        };
        writer.present(&report).await.unwrap();
        writer.present(&report).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["scores"]["total"], 3);

        let _ = tokio::fs::remove_file(&path).await;
    }
}
