// ==========================================
// POS 后台批量上传 - 提交 Repository Trait
// ==========================================
// 职责: 应用校验通过的整批记录（外部协作方能力 b）
// 红线: apply_batch 必须原子: 要么全部落库，要么全部不落库
// ==========================================

use crate::domain::records::{AccountRef, CommitBatch};
use crate::domain::types::Role;
use crate::domain::upload::CommitReport;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// UploadCommitRepository Trait
// ==========================================
// 实现者: PosStoreRepositoryImpl（rusqlite，单事务）
#[async_trait]
pub trait UploadCommitRepository: Send + Sync {
    /// 在单个事务中应用整批记录
    ///
    /// # 返回
    /// - Ok(CommitReport): 新建 / 更新数量
    /// - Err: 任一记录失败则整个事务回滚
    async fn apply_batch(&self, batch: CommitBatch) -> RepositoryResult<CommitReport>;

    /// 新建账号（密码已为摘要）
    async fn insert_account(
        &self,
        email: &str,
        role: Role,
        password_hash: &str,
    ) -> RepositoryResult<AccountRef>;

    /// 仅更新角色（不触碰 id 与密码摘要）
    async fn update_account_role(&self, id: i64, role: Role) -> RepositoryResult<()>;
}
