// ==========================================
// POS 后台批量上传 - 配置管理器
// ==========================================
// 职责: 从 config_kv 表加载导入配置，缺失项回退默认值
// 存储: config_kv 表 (scope_id + key → value)
// ==========================================

use crate::config::ingest_config::{config_keys, ClientColumn, IngestConfig};
use crate::config::ingest_config_trait::IngestConfigReader;
use crate::db::open_sqlite_connection;
use crate::importer::error::ImportError;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;

        Ok(())
    }

    /// 读取并解析配置值
    fn parse_config<T: FromStr>(
        &self,
        key: &str,
    ) -> Result<Option<T>, Box<dyn Error + Send + Sync>>
    where
        T::Err: std::fmt::Display,
    {
        match self.get_config_value(key)? {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
                Box::new(ImportError::ConfigReadError {
                    key: key.to_string(),
                    message: format!("值 {} 无法解析: {}", raw, e),
                }) as Box<dyn Error + Send + Sync>
            }),
        }
    }

    /// 获取所有 ingest/ 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error + Send + Sync>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' AND key LIKE 'ingest/%' ORDER BY key",
        )?;

        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

#[async_trait]
impl IngestConfigReader for ConfigManager {
    async fn load_ingest_config(&self) -> Result<IngestConfig, Box<dyn Error + Send + Sync>> {
        let mut config = IngestConfig::default();

        if let Some(max_rows) = self.parse_config::<usize>(config_keys::MAX_ROWS)? {
            config.max_rows = max_rows;
        }

        // 逗号分隔，例如 "tsv,txt"
        if let Some(raw) = self.get_config_value(config_keys::ALLOWED_EXTENSIONS)? {
            let extensions: Vec<String> = raw
                .split(',')
                .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect();
            if !extensions.is_empty() {
                config.allowed_extensions = extensions;
            }
        }

        if let Some(client_column) =
            self.parse_config::<ClientColumn>(config_keys::PRODUCT_CLIENT_COLUMN)?
        {
            config.client_column = client_column;
        }

        if let Some(len) = self.parse_config::<usize>(config_keys::MAX_ERROR_MESSAGE_LEN)? {
            config.max_error_message_len = len;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn memory_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn test_load_defaults_when_empty() {
        let manager = memory_manager();
        let config = manager.load_ingest_config().await.unwrap();
        assert_eq!(config, IngestConfig::default());
    }

    #[tokio::test]
    async fn test_load_overrides() {
        let manager = memory_manager();
        manager.set_config_value(config_keys::MAX_ROWS, "20").unwrap();
        manager
            .set_config_value(config_keys::ALLOWED_EXTENSIONS, ".TSV, tab")
            .unwrap();
        manager
            .set_config_value(config_keys::PRODUCT_CLIENT_COLUMN, "required")
            .unwrap();

        let config = manager.load_ingest_config().await.unwrap();
        assert_eq!(config.max_rows, 20);
        assert_eq!(config.allowed_extensions, vec!["tsv", "tab"]);
        assert_eq!(config.client_column, ClientColumn::Required);
    }

    #[tokio::test]
    async fn test_invalid_value_is_error() {
        let manager = memory_manager();
        manager.set_config_value(config_keys::MAX_ROWS, "many").unwrap();

        let result = manager.load_ingest_config().await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains(config_keys::MAX_ROWS));
    }

    #[test]
    fn test_config_snapshot() {
        let manager = memory_manager();
        manager.set_config_value(config_keys::MAX_ROWS, "20").unwrap();
        let snapshot = manager.get_config_snapshot().unwrap();
        assert!(snapshot.contains("ingest/max_rows"));
    }
}
