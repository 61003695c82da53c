// ==========================================
// POS 后台批量上传 - 导入配置项
// ==========================================
// 职责: 导入引擎可调参数 + 默认值
// 存储: config_kv 表（scope_id='global'，key 前缀 ingest/）
// ==========================================

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 商品上传是否包含客户列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientColumn {
    Absent,   // barcode, name, mrp, imageurl
    Required, // barcode, clientname, name, mrp, imageurl
}

impl FromStr for ClientColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ABSENT" => Ok(ClientColumn::Absent),
            "REQUIRED" => Ok(ClientColumn::Required),
            other => Err(format!("无效的 client_column 取值: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// 单个文档最大数据行数
    pub max_rows: usize,
    /// 允许的文件扩展名（小写，不含点）
    pub allowed_extensions: Vec<String>,
    /// 商品上传客户列
    pub client_column: ClientColumn,
    /// 错误回执中单行错误信息最大长度（字符）
    pub max_error_message_len: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_rows: 5000,
            allowed_extensions: vec!["tsv".to_string(), "txt".to_string()],
            client_column: ClientColumn::Absent,
            max_error_message_len: 1024,
        }
    }
}

/// 配置键
pub mod config_keys {
    pub const MAX_ROWS: &str = "ingest/max_rows";
    pub const ALLOWED_EXTENSIONS: &str = "ingest/allowed_extensions";
    pub const PRODUCT_CLIENT_COLUMN: &str = "ingest/product/client_column";
    pub const MAX_ERROR_MESSAGE_LEN: &str = "ingest/max_error_message_len";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IngestConfig::default();
        assert_eq!(config.max_rows, 5000);
        assert_eq!(config.client_column, ClientColumn::Absent);
        assert!(config.allowed_extensions.contains(&"tsv".to_string()));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: IngestConfig =
            serde_json::from_str(r#"{"max_rows": 10, "client_column": "REQUIRED"}"#).unwrap();
        assert_eq!(config.max_rows, 10);
        assert_eq!(config.client_column, ClientColumn::Required);
        assert_eq!(config.max_error_message_len, 1024);
    }

    #[test]
    fn test_client_column_from_str() {
        assert_eq!("required".parse::<ClientColumn>(), Ok(ClientColumn::Required));
        assert!("maybe".parse::<ClientColumn>().is_err());
    }
}
