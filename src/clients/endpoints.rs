/// 考试后端的接口地址
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    base_url: String,
}

impl ApiEndpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET 单道题目
    pub fn single_question(&self, test_id: &str, question_number: u32) -> String {
        format!(
            "{}/tests/{}/questions/{}",
            self.base_url, test_id, question_number
        )
    }

    /// POST 切换标记
    pub fn toggle_mark(&self, test_id: &str, question_number: u32) -> String {
        format!(
            "{}/tests/{}/questions/{}/mark",
            self.base_url, test_id, question_number
        )
    }

    /// POST 交卷
    pub fn submit_test(&self, test_id: &str) -> String {
        format!("{}/tests/{}/submit", self.base_url, test_id)
    }
}
