// ==========================================
// POS 后台批量上传 - 引用查询 Repository Trait
// ==========================================
// 职责: 自然键 → 代理键 的批量查询（外部协作方能力 a）
// 约束: 每次调用是一次往返；要么返回结果集，要么整体失败
// ==========================================

use crate::domain::records::AccountRef;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use std::collections::HashMap;

// ==========================================
// ReferenceLookup Trait
// ==========================================
// 实现者: PosStoreRepositoryImpl（rusqlite）
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// 批量解析商品条码
    ///
    /// # 返回
    /// - HashMap<条码, product_id>: 仅包含存在的条码
    async fn resolve_barcodes(&self, barcodes: &[String]) -> RepositoryResult<HashMap<String, i64>>;

    /// 批量解析客户名称
    ///
    /// # 返回
    /// - HashMap<客户名称, client_id>: 仅包含存在的客户
    async fn resolve_client_names(&self, names: &[String]) -> RepositoryResult<HashMap<String, i64>>;

    /// 批量按邮箱查询账号
    ///
    /// # 返回
    /// - HashMap<邮箱, AccountRef>: 仅包含已存在的账号
    async fn find_accounts_by_email(
        &self,
        emails: &[String],
    ) -> RepositoryResult<HashMap<String, AccountRef>>;

    /// 按邮箱查询单个账号
    async fn find_account_by_email(&self, email: &str) -> RepositoryResult<Option<AccountRef>> {
        let mut found = self.find_accounts_by_email(&[email.to_string()]).await?;
        Ok(found.remove(email))
    }
}
