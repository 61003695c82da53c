// ==========================================
// POS 后台批量上传 - 导入模块错误类型
// ==========================================
// 分类: 结构性错误（整单失败，无回执）/ 传输错误（协作方不可用）
// 注意: 行级错误不在此处，行级错误是数据（RowError），随 Rejected 返回
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportErrorCategory {
    Structural, // 结构性：无法解读任何行
    Transport,  // 外部协作方不可用
    Internal,   // 配置/内部错误
}

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 结构性错误 =====
    #[error("文件为空")]
    EmptyDocument,

    #[error("文件格式不支持: {0}（仅支持 .tsv/.txt）")]
    UnsupportedFormat(String),

    #[error("TSV 解析失败: {0}")]
    TsvParseError(String),

    #[error("表头列数不符: 期望 {expected} 列 [{expected_columns}]，实际 {actual} 列")]
    InvalidHeader {
        expected: usize,
        actual: usize,
        expected_columns: String,
    },

    #[error("缺少列: {column}（第 {position} 列）")]
    MissingColumn { column: String, position: usize },

    #[error("数据行过多: 上限 {limit} 行，实际 {actual} 行")]
    TooManyRows { limit: usize, actual: usize },

    // ===== 传输错误 =====
    #[error("外部服务不可用: {0}")]
    Transport(String),

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== 通用错误 =====
    #[error("密码摘要失败: {0}")]
    PasswordHashError(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    pub fn category(&self) -> ImportErrorCategory {
        match self {
            ImportError::EmptyDocument
            | ImportError::UnsupportedFormat(_)
            | ImportError::TsvParseError(_)
            | ImportError::InvalidHeader { .. }
            | ImportError::MissingColumn { .. }
            | ImportError::TooManyRows { .. } => ImportErrorCategory::Structural,
            ImportError::Transport(_) => ImportErrorCategory::Transport,
            ImportError::ConfigReadError { .. }
            | ImportError::PasswordHashError(_)
            | ImportError::InternalError(_)
            | ImportError::Other(_) => ImportErrorCategory::Internal,
        }
    }

    pub fn is_structural(&self) -> bool {
        self.category() == ImportErrorCategory::Structural
    }

    pub fn is_transport(&self) -> bool {
        self.category() == ImportErrorCategory::Transport
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::TsvParseError(err.to_string())
    }
}

// 协作方错误一律视为传输失败（引擎内不重试）
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::Transport(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
