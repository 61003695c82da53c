// ==========================================
// POS 后台批量上传 - 导入层
// ==========================================
// 职责: TSV 上传的解析、校验、查重、引用解析与整批提交
// 支持: 库存 / 商品 / 用户 三种上传契约
// ==========================================

// 模块声明
pub mod conflict_handler;
pub mod data_cleaner;
pub mod error;
pub mod error_artifact;
pub mod file_parser;
pub mod header_checker;
pub mod password_hasher;
pub mod reference_resolver;
pub mod row_validator;
pub mod upload_importer_impl;
pub mod upload_importer_trait;

// 重导出核心类型
pub use conflict_handler::ConflictHandler as ConflictHandlerImpl;
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use error::{ImportError, ImportErrorCategory, ImportResult};
pub use error_artifact::{strip_error_column, ErrorArtifactBuilder, ERROR_COLUMN};
pub use file_parser::{check_extension, TsvParser};
pub use header_checker::check_header;
pub use password_hasher::PasswordHasher;
pub use reference_resolver::{ReferenceResolver, Resolution};
pub use row_validator::{
    row_validator_for, CatalogRowValidator, InventoryRowValidator, UserRowValidator,
    INVENTORY_COLUMNS, PRODUCT_COLUMNS, PRODUCT_WITH_CLIENT_COLUMNS, USER_COLUMNS,
};
pub use upload_importer_impl::UploadImporterImpl;

// 重导出 Trait 接口
pub use upload_importer_trait::{
    BulkUploadImporter, ConflictHandler, DataCleaner, DocumentParser, RowValidator,
};
