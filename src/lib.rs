// ==========================================
// POS 后台批量上传 - 核心库
// ==========================================
// 职责: TSV 批量上传的解析、校验与整批提交
// 技术栈: Rust + SQLite
// 原则: 要么全部提交，要么一行不提交并返回错误回执
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 上传文档与结果模型
pub mod domain;

// 数据仓储层 - 外部协作方接口与参考实现
pub mod repository;

// 导入层 - 解析/校验/编排
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 上传接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

pub use api::{ApiError, UploadApi, UploadApiResponse};
pub use domain::{
    DocumentKind, ErrorArtifact, IngestionOutcome, IngestionSummary, RawDocument, Role, RowError,
};
pub use importer::{BulkUploadImporter, ImportError, UploadImporterImpl};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "POS 后台批量上传";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
