// ==========================================
// POS 后台批量上传 - 领域模型层
// ==========================================
// 职责: 定义上传文档、校验记录、导入结果等领域类型
// 红线: 不含数据访问逻辑,不含校验逻辑
// ==========================================

pub mod records;
pub mod types;
pub mod upload;

// 重导出核心类型
pub use records::{
    AccountChange, AccountRef, CatalogEntry, CommitBatch, InventoryAdjustment, ResolvedInventory,
    ResolvedProduct, UserAccount, ValidatedRecord,
};
pub use types::{DocumentKind, Role};
pub use upload::{
    CommitReport, ErrorArtifact, IngestionOutcome, IngestionStage, IngestionSummary, LineEnding,
    ParsedRow, RawDocument, RowError, RowErrorCategory, RowViolation, TabularDocument, TSV_CONTENT_TYPE,
};
