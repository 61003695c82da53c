// ==========================================
// POS 后台批量上传 - 校验后记录与提交批次
// ==========================================
// 职责: 行校验通过后的强类型记录 + 交给持久化协作方的提交批次
// 红线: 明文密码只存在于 UserAccount，提交批次中只出现摘要
// ==========================================

use crate::domain::types::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 行校验结果（按文档类型区分）
// ==========================================

/// 库存调整（设置在手数量）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryAdjustment {
    pub barcode: String,
    pub quantity: i64,
}

/// 商品目录条目
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub barcode: String,
    pub name: String,
    pub mrp: f64,
    pub client_ref: Option<String>, // 客户名称（仅带客户列的上传契约）
    pub image_url: Option<String>,
}

/// 用户账号（明文密码仅在引擎内部短暂存在）
#[derive(Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub email: String,
    pub role: Role,
    pub raw_password: Option<String>, // 空单元格 → None（已有账号允许为空）
}

impl fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserAccount")
            .field("email", &self.email)
            .field("role", &self.role)
            .field(
                "raw_password",
                &self.raw_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// 通过逐行校验的记录
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedRecord {
    Inventory(InventoryAdjustment),
    Catalog(CatalogEntry),
    User(UserAccount),
}

// ==========================================
// 外部查询结果
// ==========================================

/// 已存在账号的引用（只暴露 id 与角色，不暴露密码摘要）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRef {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

// ==========================================
// 提交批次（ReferencesResolved 且无错误时构造）
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInventory {
    pub product_id: i64,
    pub barcode: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProduct {
    pub barcode: String,
    pub name: String,
    pub mrp: f64,
    pub client_id: Option<i64>,
    pub image_url: Option<String>,
}

/// 账号变更（逐条 upsert：新建或仅更新角色）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountChange {
    Create {
        email: String,
        role: Role,
        password_hash: String,
    },
    UpdateRole {
        id: i64,
        email: String,
        role: Role,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitBatch {
    Inventory(Vec<ResolvedInventory>),
    Products(Vec<ResolvedProduct>),
    Accounts(Vec<AccountChange>),
}

impl CommitBatch {
    pub fn len(&self) -> usize {
        match self {
            CommitBatch::Inventory(v) => v.len(),
            CommitBatch::Products(v) => v.len(),
            CommitBatch::Accounts(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_account_debug_redacts_password() {
        let account = UserAccount {
            email: "e@x.com".to_string(),
            role: Role::Operator,
            raw_password: Some("hunter2".to_string()),
        };
        let rendered = format!("{:?}", account);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
