// ==========================================
// POS 后台批量上传 - 领域类型定义
// ==========================================
// 职责: 文档类型 / 用户角色等封闭枚举
// 约束: 枚举序列化格式统一为全大写（与 DB 存储一致）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// DocumentKind - 上传文档类型
// ==========================================
// 每种类型有固定的列契约，进入导入器时一次性选定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Inventory, // 库存补货/清零
    Product,   // 商品目录批量建档
    User,      // 用户开通/角色调整
}

impl DocumentKind {
    /// 文档类型名（用于错误回执文件名、日志字段）
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Inventory => "inventory",
            DocumentKind::Product => "product",
            DocumentKind::User => "user",
        }
    }

    /// 错误回执文件名: `<kind>_upload_errors.tsv`
    pub fn error_artifact_filename(&self) -> String {
        format!("{}_upload_errors.tsv", self.as_str())
    }

    /// 同批次查重使用的自然键列名
    pub fn natural_key_column(&self) -> &'static str {
        match self {
            DocumentKind::Inventory | DocumentKind::Product => "barcode",
            DocumentKind::User => "email",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inventory" => Ok(DocumentKind::Inventory),
            "product" | "products" => Ok(DocumentKind::Product),
            "user" | "users" => Ok(DocumentKind::User),
            other => Err(format!("未知的文档类型: {}", other)),
        }
    }
}

// ==========================================
// Role - 用户角色
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Supervisor, // 主管（可执行批量上传与报表）
    Operator,   // 操作员
}

impl Role {
    /// 规范形式（全大写，DB 存储值）
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Supervisor => "SUPERVISOR",
            Role::Operator => "OPERATOR",
        }
    }

    /// 大小写不敏感解析，前后空白忽略
    pub fn parse_case_insensitive(value: &str) -> Option<Role> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SUPERVISOR" => Some(Role::Supervisor),
            "OPERATOR" => Some(Role::Operator),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_kind_from_str() {
        assert_eq!("Inventory".parse::<DocumentKind>(), Ok(DocumentKind::Inventory));
        assert_eq!(" products ".parse::<DocumentKind>(), Ok(DocumentKind::Product));
        assert!("orders".parse::<DocumentKind>().is_err());
    }

    #[test]
    fn test_error_artifact_filename() {
        assert_eq!(
            DocumentKind::Inventory.error_artifact_filename(),
            "inventory_upload_errors.tsv"
        );
        assert_eq!(
            DocumentKind::User.error_artifact_filename(),
            "user_upload_errors.tsv"
        );
    }

    #[test]
    fn test_role_parse_case_insensitive() {
        assert_eq!(Role::parse_case_insensitive(" supervisor "), Some(Role::Supervisor));
        assert_eq!(Role::parse_case_insensitive("Operator"), Some(Role::Operator));
        assert_eq!(Role::parse_case_insensitive("admin"), None);
        assert_eq!(Role::Operator.to_string(), "OPERATOR");
    }
}
