// ==========================================
// POS 后台批量上传 - API 层
// ==========================================
// 职责: 提供上传 API 接口,供 CLI 或上层服务调用
// ==========================================

pub mod error;
pub mod upload_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use upload_api::{UploadApi, UploadApiResponse};
