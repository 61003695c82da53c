// ==========================================
// POS 后台批量上传 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 定义引擎消费的外部协作方接口 + SQLite 参考实现
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod pos_store_repo_impl;
pub mod reference_lookup_repo;
pub mod upload_commit_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use pos_store_repo_impl::PosStoreRepositoryImpl;
pub use reference_lookup_repo::ReferenceLookup;
pub use upload_commit_repo::UploadCommitRepository;
