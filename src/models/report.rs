use serde::Serialize;

/// 交卷成功后交给结果展示方的报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestReport {
    pub test_id: String,
    pub user_id: String,
    pub test_name: String,
    /// 后端计算的成绩，结构不透明
    pub scores: serde_json::Value,
    pub submitted_at: String,
}
