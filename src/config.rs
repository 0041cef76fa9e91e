use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::services::SubmitRetryPolicy;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 考试后端根地址
    pub api_base_url: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 会话配置 ---
    pub test_id: String,
    pub user_id: String,
    pub test_name: String,
    /// 考试时长（分钟）
    pub duration_minutes: u32,
    /// 起始题号（从1开始）
    pub start_question: u32,
    // --- 交卷重试策略 ---
    /// 交卷最大尝试次数，1 表示不重试
    pub submit_max_attempts: u32,
    pub submit_initial_backoff_ms: u64,
    pub submit_max_backoff_ms: u64,
    // --- 输出 ---
    /// 成绩结果追加写入的文件
    pub results_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api".to_string(),
            request_timeout_secs: 15,
            test_id: "1".to_string(),
            user_id: "guest".to_string(),
            test_name: "Practice Test".to_string(),
            duration_minutes: 30,
            start_question: 1,
            submit_max_attempts: 1,
            submit_initial_backoff_ms: 500,
            submit_max_backoff_ms: 8_000,
            results_file: "results.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载配置，未设置的项使用默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，再叠加环境变量
    pub async fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::ReadFailed {
                path: path.display().to_string(),
                source,
            })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })?;

        config.with_env_overrides()
    }

    /// 用环境变量覆盖已有配置并校验
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        let config = Self {
            api_base_url: env_string("EXAM_API_BASE_URL").unwrap_or(self.api_base_url),
            request_timeout_secs: env_parse("EXAM_REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.request_timeout_secs),
            test_id: env_string("EXAM_TEST_ID").unwrap_or(self.test_id),
            user_id: env_string("EXAM_USER_ID").unwrap_or(self.user_id),
            test_name: env_string("EXAM_TEST_NAME").unwrap_or(self.test_name),
            duration_minutes: env_parse("EXAM_DURATION_MINUTES", "u32")?
                .unwrap_or(self.duration_minutes),
            start_question: env_parse("EXAM_START_QUESTION", "u32")?
                .unwrap_or(self.start_question),
            submit_max_attempts: env_parse("EXAM_SUBMIT_MAX_ATTEMPTS", "u32")?
                .unwrap_or(self.submit_max_attempts),
            submit_initial_backoff_ms: env_parse("EXAM_SUBMIT_INITIAL_BACKOFF_MS", "u64")?
                .unwrap_or(self.submit_initial_backoff_ms),
            submit_max_backoff_ms: env_parse("EXAM_SUBMIT_MAX_BACKOFF_MS", "u64")?
                .unwrap_or(self.submit_max_backoff_ms),
            results_file: env_string("EXAM_RESULTS_FILE").unwrap_or(self.results_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?
                .unwrap_or(self.verbose_logging),
        };
        config.validate()?;
        Ok(config)
    }

    /// 校验取值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_question < 1 {
            return Err(ConfigError::invalid("start_question", "题号从 1 开始"));
        }
        if self.submit_max_attempts < 1 {
            return Err(ConfigError::invalid("submit_max_attempts", "至少尝试 1 次"));
        }
        if self.test_id.trim().is_empty() {
            return Err(ConfigError::invalid("test_id", "不能为空"));
        }
        Ok(())
    }

    /// 考试总时长（秒）
    pub fn duration_seconds(&self) -> u32 {
        self.duration_minutes.saturating_mul(60)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn submit_retry_policy(&self) -> SubmitRetryPolicy {
        SubmitRetryPolicy {
            max_attempts: self.submit_max_attempts,
            initial_backoff: Duration::from_millis(self.submit_initial_backoff_ms),
            max_backoff: Duration::from_millis(self.submit_max_backoff_ms),
        }
    }
}

fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match env_string(var_name) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}
