// ==========================================
// POS 后台批量上传 - 上传文档与结果模型
// ==========================================
// 职责: 原始文档 / 解析行 / 行错误 / 导入结果
// 约束: 每个 ParsedRow 恰好对应一个 ValidatedRecord 或一个 RowError
// 约束: 行顺序即插入顺序，错误回执必须原样保序
// ==========================================

use crate::domain::types::DocumentKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 错误回执的内容类型（与输入的 TSV 格式一致）
pub const TSV_CONTENT_TYPE: &str = "text/tab-separated-values";

// ==========================================
// RawDocument - 原始上传文档
// ==========================================
// 在 API 边界创建，导入期间由编排器持有，结束即丢弃
#[derive(Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub content: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

impl RawDocument {
    pub fn new(
        content: impl Into<Vec<u8>>,
        content_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            content_type: content_type.into(),
            filename: filename.into(),
        }
    }

    /// 以 TSV 内容类型构造（测试与 CLI 常用）
    pub fn tsv(content: impl Into<Vec<u8>>, filename: impl Into<String>) -> Self {
        Self::new(content, TSV_CONTENT_TYPE, filename)
    }
}

// 文档内容可能很大，Debug 只输出元信息
impl fmt::Debug for RawDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawDocument")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.content.len())
            .finish()
    }
}

// ==========================================
// ParsedRow - 解析后的数据行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRow {
    pub line_number: usize,  // 原始文件行号（1 起，表头为第 1 行）
    pub cells: Vec<String>,  // 原始单元格文本（未 trim）
}

impl ParsedRow {
    /// 按列下标取原始单元格（越界视为空）
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }
}

// ==========================================
// TabularDocument - 表头 + 数据行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularDocument {
    pub header: Vec<String>,
    pub rows: Vec<ParsedRow>,
    pub line_ending: LineEnding, // 错误回执沿用
}

/// 行结束符（以首行为准）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// 按首个换行符判定
    pub fn detect(content: &[u8]) -> Self {
        match content.iter().position(|&b| b == b'\n') {
            Some(i) if i > 0 && content[i - 1] == b'\r' => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }

    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
        }
    }
}

// ==========================================
// RowError - 行级错误
// ==========================================

/// 行级错误分类（均可通过修正后重新提交恢复）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowErrorCategory {
    Validation,  // 字段类型/范围/必填
    Consistency, // 同文件内自然键重复
    Reference,   // 引用的自然键不存在（或与已有数据冲突）
}

/// 单条字段级违规
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowViolation {
    pub category: RowErrorCategory,
    pub field: String,
    pub message: String,
}

impl RowViolation {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self {
            category: RowErrorCategory::Validation,
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// DuplicateKeyInFile
    pub fn duplicate_key(field: &str, key: &str) -> Self {
        Self {
            category: RowErrorCategory::Consistency,
            field: field.to_string(),
            message: format!("{} 在文件中重复: {}", field, key),
        }
    }

    /// ReferenceNotFound
    pub fn reference_not_found(field: &str, key: &str) -> Self {
        Self {
            category: RowErrorCategory::Reference,
            field: field.to_string(),
            message: format!("{} 不存在: {}", field, key),
        }
    }

    pub fn reference(field: &str, message: impl Into<String>) -> Self {
        Self {
            category: RowErrorCategory::Reference,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// 一行的全部错误（同一行可同时违反多条规则，全部保留）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub line_number: usize,
    pub violations: Vec<RowViolation>,
}

impl RowError {
    pub fn new(line_number: usize, violations: Vec<RowViolation>) -> Self {
        Self {
            line_number,
            violations,
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.message.as_str())
    }

    pub fn has_category(&self, category: RowErrorCategory) -> bool {
        self.violations.iter().any(|v| v.category == category)
    }
}

// ==========================================
// ErrorArtifact - 错误回执
// ==========================================
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorArtifact {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

impl fmt::Debug for ErrorArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorArtifact")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

// ==========================================
// IngestionStage - 编排器状态机
// ==========================================
// Parsing → HeaderChecked → RowsValidated → ConsistencyChecked
//   → ReferencesResolved → {Committed | Rejected}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngestionStage {
    Parsing,
    HeaderChecked,
    RowsValidated,
    ConsistencyChecked,
    ReferencesResolved,
    Committed,
    Rejected,
}

impl IngestionStage {
    /// 合法的前进转换（Rejected 只能从表头校验之后的阶段进入）
    pub fn can_advance_to(self, next: IngestionStage) -> bool {
        use IngestionStage::*;
        matches!(
            (self, next),
            (Parsing, HeaderChecked)
                | (HeaderChecked, RowsValidated)
                | (RowsValidated, ConsistencyChecked)
                | (ConsistencyChecked, ReferencesResolved)
                | (ReferencesResolved, Committed)
                | (ReferencesResolved, Rejected)
        )
    }
}

impl fmt::Display for IngestionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestionStage::Parsing => "PARSING",
            IngestionStage::HeaderChecked => "HEADER_CHECKED",
            IngestionStage::RowsValidated => "ROWS_VALIDATED",
            IngestionStage::ConsistencyChecked => "CONSISTENCY_CHECKED",
            IngestionStage::ReferencesResolved => "REFERENCES_RESOLVED",
            IngestionStage::Committed => "COMMITTED",
            IngestionStage::Rejected => "REJECTED",
        };
        f.write_str(name)
    }
}

// ==========================================
// IngestionSummary - 导入汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionSummary {
    pub batch_id: String,            // 批次 ID（UUID）
    pub kind: DocumentKind,          // 文档类型
    pub total_rows: usize,           // 数据行数（不含表头）
    pub valid_rows: usize,           // 通过全部校验的行数
    pub failed_rows: usize,          // 至少有一条错误的行数
    pub started_at: DateTime<Utc>,   // 开始时间
    pub elapsed_ms: u64,             // 耗时（毫秒）
}

/// 提交结果（由持久化协作方返回）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitReport {
    pub created: usize,
    pub updated: usize,
}

impl CommitReport {
    pub fn total(&self) -> usize {
        self.created + self.updated
    }
}

// ==========================================
// IngestionOutcome - 导入结果
// ==========================================
// Applied 与 Rejected 互斥；不存在部分提交
#[derive(Debug, Clone, PartialEq)]
pub enum IngestionOutcome {
    Applied {
        summary: IngestionSummary,
        commit: CommitReport,
    },
    Rejected {
        summary: IngestionSummary,
        artifact: ErrorArtifact,
        row_errors: Vec<RowError>,
    },
}

impl IngestionOutcome {
    pub fn summary(&self) -> &IngestionSummary {
        match self {
            IngestionOutcome::Applied { summary, .. } => summary,
            IngestionOutcome::Rejected { summary, .. } => summary,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, IngestionOutcome::Applied { .. })
    }

    /// Applied(count)
    pub fn applied_count(&self) -> Option<usize> {
        match self {
            IngestionOutcome::Applied { commit, .. } => Some(commit.total()),
            IngestionOutcome::Rejected { .. } => None,
        }
    }

    pub fn artifact(&self) -> Option<&ErrorArtifact> {
        match self {
            IngestionOutcome::Applied { .. } => None,
            IngestionOutcome::Rejected { artifact, .. } => Some(artifact),
        }
    }

    pub fn row_errors(&self) -> &[RowError] {
        match self {
            IngestionOutcome::Applied { .. } => &[],
            IngestionOutcome::Rejected { row_errors, .. } => row_errors,
        }
    }
}
