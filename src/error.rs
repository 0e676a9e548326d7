use thiserror::Error;

/// 应用程序错误类型
///
/// 每个处理函数都显式返回 `AppResult`，由 `api` 层的边界适配器统一映射：
/// - 回调路径：任何错误都只记录日志，对服务商始终返回确认
/// - 查询路径：按 `ErrorKind` 映射为对应的状态码
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入不合法（例如空文本、无法解析的回调负载），不重试
    #[error("参数校验失败: {0}")]
    Validation(String),

    /// 直接查询时扫描记录不存在
    #[error("扫描记录不存在: {scan_id}")]
    NotFound { scan_id: String },

    /// 数据尚未就绪（例如导出的对比数据还没到达），客户端可轮询重试
    #[error("数据尚未就绪: {0}")]
    Conflict(String),

    /// 服务商接口调用失败
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 服务商接口错误
///
/// `status` 为 `None` 表示连接层面的失败（没有拿到 HTTP 响应）。
#[derive(Debug, Clone, Error)]
#[error("服务商接口调用失败 ({endpoint}): status={status:?}, {message}")]
pub struct ProviderError {
    pub endpoint: String,
    pub status: Option<u16>,
    pub retryable: bool,
    pub message: String,
}

impl ProviderError {
    /// 根据 HTTP 状态码构造，429 和 5xx 视为可重试
    pub fn from_status(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            status: Some(status),
            retryable: status == 429 || (500..600).contains(&status),
            message: message.into(),
        }
    }

    /// 连接失败（超时、DNS、连接被拒绝等），始终可重试
    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            status: None,
            retryable: true,
            message: message.into(),
        }
    }
}

/// 错误分类，供边界适配器使用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Provider,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotFound { .. } => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Provider(_) => ErrorKind::Provider,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// 是否值得重试（仅服务商的 429 / 5xx / 连接失败）
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Provider(e) if e.retryable)
    }
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON解析失败: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建参数校验错误
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// 创建记录不存在错误
    pub fn not_found(scan_id: impl Into<String>) -> Self {
        AppError::NotFound {
            scan_id: scan_id.into(),
        }
    }

    /// 创建数据未就绪错误
    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_status_retryable() {
        assert!(ProviderError::from_status("export", 429, "限流").retryable);
        assert!(ProviderError::from_status("export", 503, "不可用").retryable);
        assert!(!ProviderError::from_status("export", 400, "参数错误").retryable);
        assert!(!ProviderError::from_status("export", 404, "不存在").retryable);
        assert!(ProviderError::connection("export", "连接被拒绝").retryable);
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(AppError::validation("空文本").kind(), ErrorKind::Validation);
        assert_eq!(AppError::not_found("abc").kind(), ErrorKind::NotFound);
        let err: AppError = ProviderError::from_status("submit", 500, "x").into();
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert!(err.is_retryable());
    }
}
