// ==========================================
// POS 后台批量上传 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::ingest_config::IngestConfig;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// IngestConfigReader Trait
// ==========================================
// 实现者: ConfigManager（config_kv 表）/ StaticConfig（内存）
#[async_trait]
pub trait IngestConfigReader: Send + Sync {
    /// 读取完整导入配置（缺失项使用默认值）
    async fn load_ingest_config(&self) -> Result<IngestConfig, Box<dyn Error + Send + Sync>>;
}

// ==========================================
// StaticConfig - 固定配置
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    config: IngestConfig,
}

impl StaticConfig {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl IngestConfigReader for StaticConfig {
    async fn load_ingest_config(&self) -> Result<IngestConfig, Box<dyn Error + Send + Sync>> {
        Ok(self.config.clone())
    }
}
