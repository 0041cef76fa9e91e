/// 考试后端 API 客户端
///
/// 封装题目获取、标记切换、交卷三个调用，实现对应的服务 trait
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::endpoints::ApiEndpoints;
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::{LoadedQuestion, MarkResponse, QuestionResponse, SubmitResponse};
use crate::services::{MarkToggleService, QuestionProvider, TestSubmissionService};

/// 考试后端客户端
pub struct ExamApiClient {
    client: Client,
    endpoints: ApiEndpoints,
}

impl ExamApiClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Other(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            client,
            endpoints: ApiEndpoints::new(&config.api_base_url),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::request_failed(url, e))?;
        Self::read_json(url, response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| ApiError::request_failed(url, e))?;
        Self::read_json(url, response).await
    }

    /// 检查状态码并解析响应体
    async fn read_json<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::bad_status(url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::request_failed(url, e))?;
        parse_body(url, &body)
    }
}

/// 解析 JSON 响应体
fn parse_body<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::JsonParseFailed {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl QuestionProvider for ExamApiClient {
    async fn fetch_question(
        &self,
        test_id: &str,
        question_number: u32,
    ) -> Result<LoadedQuestion, ApiError> {
        let url = self.endpoints.single_question(test_id, question_number);
        let response: QuestionResponse = self.get_json(&url).await?;
        Ok(response.into_loaded(question_number))
    }
}

#[async_trait]
impl MarkToggleService for ExamApiClient {
    async fn toggle_mark(&self, test_id: &str, question_number: u32) -> Result<bool, ApiError> {
        let url = self.endpoints.toggle_mark(test_id, question_number);
        let response: MarkResponse = self.post_json(&url).await?;
        Ok(response.marked)
    }
}

#[async_trait]
impl TestSubmissionService for ExamApiClient {
    async fn submit_test(&self, test_id: &str) -> Result<serde_json::Value, ApiError> {
        let url = self.endpoints.submit_test(test_id);
        let response: SubmitResponse = self.post_json(&url).await?;
        Ok(response.scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnswerOption;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// 启动只应答一次的本地 HTTP 服务，返回根地址
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut read = 0;
            // 读到请求头结束即可，请求都没有正文
            loop {
                let n = socket.read(&mut buf[read..]).await.unwrap();
                if n == 0 {
                    break;
                }
                read += n;
                if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}", addr)
    }

    fn client_for(base_url: String) -> ExamApiClient {
        let config = Config {
            api_base_url: base_url,
            ..Config::default()
        };
        ExamApiClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_question_success() {
        let base = serve_once(
            "200 OK",
            r#"{"q_num":2,"total":3,"question":{"question":"Capital of France?","option_a":"Paris","option_b":"Rome"}}"#,
        )
        .await;
        let client = client_for(base);

        let loaded = client.fetch_question("7", 2).await.unwrap();

        assert_eq!(loaded.question_number, 2);
        assert_eq!(loaded.total_questions, 3);
        assert_eq!(loaded.question.option(AnswerOption::A), Some("Paris"));
        assert_eq!(loaded.question.image, None);
    }

    #[tokio::test]
    async fn test_non_success_status_is_bad_status() {
        let base = serve_once("500 Internal Server Error", "{}").await;
        let client = client_for(base);

        let err = client.fetch_question("7", 1).await.unwrap_err();

        assert!(matches!(err, ApiError::BadStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_toggle_mark_reads_marked_flag() {
        let base = serve_once("200 OK", r#"{"marked":true}"#).await;
        let client = client_for(base);

        assert!(client.toggle_mark("7", 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_connection_refused_is_request_failed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(format!("http://{}", addr));

        let err = client.submit_test("7").await.unwrap_err();

        assert!(matches!(err, ApiError::RequestFailed { .. }));
    }

    #[test]
    fn test_parse_body_reports_endpoint() {
        let err = parse_body::<MarkResponse>("/mark", "not json").unwrap_err();
        assert!(matches!(err, ApiError::JsonParseFailed { ref endpoint, .. } if endpoint == "/mark"));
    }
}
