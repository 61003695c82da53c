// ==========================================
// POS 后台批量上传 API
// ==========================================
// 职责: 按文档类型暴露上传入口，把导入结果转换为可序列化响应
// 约束: 每次调用独立创建导入器，不跨调用共享状态
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::types::DocumentKind;
use crate::domain::upload::{IngestionOutcome, IngestionSummary, RawDocument, RowError};
use crate::importer::{BulkUploadImporter, UploadImporterImpl};
use crate::repository::PosStoreRepositoryImpl;
use serde::{Deserialize, Serialize};
use tracing::info;

/// 上传API响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadApiResponse {
    /// 全部行已提交
    Applied {
        summary: IngestionSummary,
        /// 新建记录数
        created: usize,
        /// 更新记录数
        updated: usize,
    },
    /// 存在行级错误，未提交任何行
    Rejected {
        summary: IngestionSummary,
        /// 错误回执文件名
        filename: String,
        /// 错误回执内容类型
        content_type: String,
        /// 错误回执内容（原表头 + error 列）
        artifact: Vec<u8>,
        /// 行级错误明细（按行号排序）
        row_errors: Vec<RowError>,
    },
}

impl UploadApiResponse {
    pub fn summary(&self) -> &IngestionSummary {
        match self {
            UploadApiResponse::Applied { summary, .. } => summary,
            UploadApiResponse::Rejected { summary, .. } => summary,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, UploadApiResponse::Applied { .. })
    }
}

impl From<IngestionOutcome> for UploadApiResponse {
    fn from(outcome: IngestionOutcome) -> Self {
        match outcome {
            IngestionOutcome::Applied { summary, commit } => UploadApiResponse::Applied {
                summary,
                created: commit.created,
                updated: commit.updated,
            },
            IngestionOutcome::Rejected {
                summary,
                artifact,
                row_errors,
            } => UploadApiResponse::Rejected {
                summary,
                filename: artifact.filename,
                content_type: artifact.content_type,
                artifact: artifact.bytes,
                row_errors,
            },
        }
    }
}

/// 上传API
pub struct UploadApi {
    db_path: String,
}

impl UploadApi {
    /// 创建新的UploadApi实例
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// 库存批量上传（barcode, quantity）
    pub async fn upload_inventory(
        &self,
        content: Vec<u8>,
        filename: &str,
    ) -> ApiResult<UploadApiResponse> {
        self.upload(DocumentKind::Inventory, content, filename).await
    }

    /// 商品批量上传（barcode, name, mrp, imageurl）
    pub async fn upload_products(
        &self,
        content: Vec<u8>,
        filename: &str,
    ) -> ApiResult<UploadApiResponse> {
        self.upload(DocumentKind::Product, content, filename).await
    }

    /// 用户批量上传（email, role, password）
    pub async fn upload_users(
        &self,
        content: Vec<u8>,
        filename: &str,
    ) -> ApiResult<UploadApiResponse> {
        self.upload(DocumentKind::User, content, filename).await
    }

    /// 按文档类型上传
    ///
    /// # 返回
    /// - Ok(Applied / Rejected): 导入已完成判定
    /// - Err(InvalidDocument): 结构性错误
    /// - Err(ServiceUnavailable): 外部服务不可用
    pub async fn upload(
        &self,
        kind: DocumentKind,
        content: Vec<u8>,
        filename: &str,
    ) -> ApiResult<UploadApiResponse> {
        if filename.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件名不能为空".to_string()));
        }

        let importer = self.create_importer()?;
        let document = RawDocument::tsv(content, filename);
        let outcome = importer.ingest(kind, document).await?;

        info!(
            kind = %kind,
            applied = outcome.is_applied(),
            batch_id = %outcome.summary().batch_id,
            "上传请求处理完成"
        );
        Ok(outcome.into())
    }

    fn create_importer(
        &self,
    ) -> ApiResult<UploadImporterImpl<PosStoreRepositoryImpl, PosStoreRepositoryImpl, ConfigManager>>
    {
        let lookup = PosStoreRepositoryImpl::new(&self.db_path)?;
        let conn = lookup.connection();
        let commit_repo = PosStoreRepositoryImpl::from_connection(conn.clone());
        let config = ConfigManager::from_connection(conn);

        Ok(UploadImporterImpl::new(lookup, commit_repo, config))
    }
}
