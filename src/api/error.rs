// ==========================================
// POS 后台批量上传 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把导入/仓储错误转换为用户可读消息
// 注意: 行级错误不是 ApiError，它们随 Rejected 响应返回
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 结构性错误（空文件 / 表头不符 / 格式不支持 / 行数超限），整单失败
    #[error("文件结构错误: {0}")]
    InvalidDocument(String),

    // ==========================================
    // 外部服务错误
    // ==========================================
    /// 引用查询或持久化不可用，调用方可稍后重试
    #[error("服务暂不可用，请稍后重试: {0}")]
    ServiceUnavailable(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 调用方是否可以原样重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::ServiceUnavailable(_) | ApiError::DatabaseConnectionError(_)
        )
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        if err.is_structural() {
            return ApiError::InvalidDocument(err.to_string());
        }
        match err {
            ImportError::Transport(msg) => ApiError::ServiceUnavailable(msg),
            ImportError::ConfigReadError { key, message } => {
                ApiError::ConfigError(format!("{}: {}", key, message))
            }
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::Unavailable(msg) => ApiError::ServiceUnavailable(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_import_error_conversion() {
        let api_err: ApiError = ImportError::MissingColumn {
            column: "quantity".to_string(),
            position: 2,
        }
        .into();

        match api_err {
            ApiError::InvalidDocument(msg) => assert!(msg.contains("quantity")),
            other => panic!("Expected InvalidDocument, got {:?}", other),
        }
    }

    #[test]
    fn test_transport_error_is_retryable() {
        let api_err: ApiError = ImportError::Transport("connection refused".to_string()).into();

        assert!(matches!(api_err, ApiError::ServiceUnavailable(_)));
        assert!(api_err.is_retryable());
    }

    #[test]
    fn test_repository_error_conversion() {
        let api_err: ApiError = RepositoryError::NotFound {
            entity: "pos_user".to_string(),
            id: "7".to_string(),
        }
        .into();

        match api_err {
            ApiError::DatabaseError(msg) => assert!(msg.contains("pos_user")),
            other => panic!("Expected DatabaseError, got {:?}", other),
        }
    }
}
