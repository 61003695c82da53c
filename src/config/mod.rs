// ==========================================
// POS 后台批量上传 - 配置层
// ==========================================
// 职责: 导入配置加载,支持 config_kv 表覆写
// ==========================================

pub mod config_manager;
pub mod ingest_config;
pub mod ingest_config_trait;

// 重导出核心配置类型
pub use config_manager::ConfigManager;
pub use ingest_config::{config_keys, ClientColumn, IngestConfig};
pub use ingest_config_trait::{IngestConfigReader, StaticConfig};
