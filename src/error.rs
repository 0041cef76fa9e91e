use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 与考试后端交互时的错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 后端返回非成功状态码
    #[error("API返回错误状态 ({endpoint}): status={status}")]
    BadStatus { endpoint: String, status: u16 },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {message}")]
    JsonParseFailed { endpoint: String, message: String },
    /// 后端返回的题号不合法（题号从 1 开始）
    #[error("后端返回的题号无效: {question_number} (共 {total} 题)")]
    InvalidQuestionNumber { question_number: u32, total: u32 },
}

/// 会话控制器对外暴露的失败分类
///
/// - `LoadFailure`: 题目加载失败，会话进入 `Errored`
/// - `MarkFailure`: 标记切换失败，控制器内部吞掉，标记状态不变
/// - `SubmitFailure`: 交卷失败，控制器停留在 `Submitting`，需要外部重新触发
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("题目加载失败 (第 {question_number} 题): {source}")]
    LoadFailure {
        question_number: u32,
        #[source]
        source: ApiError,
    },
    #[error("标记切换失败 (第 {question_number} 题): {source}")]
    MarkFailure {
        question_number: u32,
        #[source]
        source: ApiError,
    },
    #[error("交卷失败 (已尝试 {attempts} 次): {source}")]
    SubmitFailure {
        attempts: u32,
        #[source]
        source: ApiError,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 配置取值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    Invalid { field: String, reason: String },
}

// ========== 便捷构造函数 ==========

impl ApiError {
    /// 创建API请求失败错误
    pub fn request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// 创建状态码错误
    pub fn bad_status(endpoint: impl Into<String>, status: u16) -> Self {
        ApiError::BadStatus {
            endpoint: endpoint.into(),
            status,
        }
    }
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_keeps_api_source() {
        let err = SessionError::LoadFailure {
            question_number: 4,
            source: ApiError::bad_status("/tests/7/questions/4", 500),
        };

        assert!(err.to_string().contains("第 4 题"));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("API返回错误状态 (/tests/7/questions/4): status=500")
        );
    }

    #[test]
    fn test_app_error_from_config_error() {
        let err: AppError = ConfigError::invalid("duration_minutes", "必须大于 0").into();
        assert!(matches!(err, AppError::Config(ConfigError::Invalid { .. })));
    }
}
