// ==========================================
// POS 后台批量上传 - 导入管道 Trait
// ==========================================
// 职责: 定义上传导入各阶段接口（不包含实现）
// 管道: 解析 → 表头校验 → 逐行校验 → 同文件查重 → 引用解析 → 提交/回执
// ==========================================

use crate::domain::records::ValidatedRecord;
use crate::domain::types::DocumentKind;
use crate::domain::upload::{IngestionOutcome, ParsedRow, RawDocument, RowViolation, TabularDocument};
use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// BulkUploadImporter Trait
// ==========================================
// 用途: 批量上传主接口
// 实现者: UploadImporterImpl
#[async_trait]
pub trait BulkUploadImporter: Send + Sync {
    /// 解析 + 校验 + 整批提交
    ///
    /// # 返回
    /// - Ok(Applied): 全部行有效，已一次性提交
    /// - Ok(Rejected): 存在行级错误，未提交任何行，附带错误回执
    /// - Err(结构性错误): 空文件 / 表头不符 / 格式不支持 / 行数超限
    /// - Err(Transport): 外部查询或持久化不可用
    async fn ingest(&self, kind: DocumentKind, document: RawDocument)
        -> ImportResult<IngestionOutcome>;
}

// ==========================================
// DocumentParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: TsvParser
pub trait DocumentParser: Send + Sync {
    /// 解析字节为表头 + 数据行
    ///
    /// # 返回
    /// - Err(EmptyDocument): 无任何非空行
    /// - Err(TsvParseError): 编码错误等
    fn parse(&self, content: &[u8]) -> ImportResult<TabularDocument>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 单元格清洗与基础语法判断
// 实现者: DataCleanerImpl
pub trait DataCleaner: Send + Sync {
    /// TRIM
    fn clean_text(&self, value: &str) -> String;

    /// 空白 → None
    fn normalize_null(&self, value: &str) -> Option<String>;

    /// TRIM + 小写
    fn clean_email(&self, value: &str) -> String;

    /// 整数解析（失败返回 None）
    fn parse_integer(&self, value: &str) -> Option<i64>;

    /// 小数解析，只认 `.` 为小数点，与区域设置无关
    fn parse_decimal(&self, value: &str) -> Option<f64>;

    fn is_valid_email(&self, value: &str) -> bool;

    fn is_valid_url(&self, value: &str) -> bool;
}

// ==========================================
// RowValidator Trait
// ==========================================
// 用途: 逐行类型/业务规则校验（每种文档类型一个实现）
// 实现者: InventoryRowValidator / CatalogRowValidator / UserRowValidator
pub trait RowValidator: Send + Sync {
    /// 该文档类型的列契约（顺序敏感）
    fn columns(&self) -> &[&'static str];

    /// 查重用自然键（TRIM，邮箱小写），与该行其他字段是否有效无关
    ///
    /// # 返回
    /// - None: 键单元格为空白，不参与查重
    fn natural_key(&self, row: &ParsedRow) -> Option<String>;

    /// 校验一行
    ///
    /// # 返回
    /// - Ok(ValidatedRecord): 全部规则通过，字段已规范化
    /// - Err(Vec<RowViolation>): 该行全部失败规则（不在第一条失败处停止）
    fn validate_row(&self, row: &ParsedRow) -> Result<ValidatedRecord, Vec<RowViolation>>;
}

// ==========================================
// ConflictHandler Trait
// ==========================================
// 用途: 同文件内自然键查重
// 实现者: ConflictHandlerImpl
pub trait ConflictHandler: Send + Sync {
    /// 检测同文件内重复自然键
    ///
    /// # 参数
    /// - keys: (行号, 自然键)，按行序排列，包含未通过逐行校验的行
    ///
    /// # 返回
    /// - Vec<(行号, 自然键)>: 首次出现之后的每一次重复
    fn detect_duplicates(&self, keys: &[(usize, &str)]) -> Vec<(usize, String)>;
}
