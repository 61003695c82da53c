// ==========================================
// POS 后台批量上传 - TSV 文件解析器
// ==========================================
// 阶段 0: 字节 → 表头 + 数据行
// 约束: 解析阶段不 trim，保留原始文本供错误回执原样回显
// ==========================================

use crate::domain::upload::{LineEnding, ParsedRow, TabularDocument};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::upload_importer_trait::DocumentParser;
use csv::ReaderBuilder;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ==========================================
// TsvParser 实现
// ==========================================
pub struct TsvParser {
    delimiter: u8,
}

impl TsvParser {
    pub fn new() -> Self {
        Self { delimiter: b'\t' }
    }
}

impl Default for TsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for TsvParser {
    fn parse(&self, content: &[u8]) -> ImportResult<TabularDocument> {
        let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
        let line_ending = LineEnding::detect(content);

        // 不启用引号：单元格中的 `"` 属于原始文本
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true) // 允许行长度不一致（由行校验报告）
            .quoting(false)
            .from_reader(content);

        let mut header: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for result in reader.records() {
            let record = result?;
            let cells: Vec<String> = record.iter().map(str::to_string).collect();

            // 跳过完全空白的行
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }

            let line_number = record
                .position()
                .map(|p| p.line() as usize)
                .ok_or_else(|| ImportError::InternalError("无法获取行号".to_string()))?;

            if header.is_none() {
                header = Some(cells);
            } else {
                rows.push(ParsedRow { line_number, cells });
            }
        }

        let header = header.ok_or(ImportError::EmptyDocument)?;
        Ok(TabularDocument {
            header,
            rows,
            line_ending,
        })
    }
}

/// 检查声明的文件扩展名（无扩展名时放行）
pub fn check_extension(filename: &str, allowed: &[String]) -> ImportResult<()> {
    let ext = match Path::new(filename).extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return Ok(()),
    };

    if allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)) {
        Ok(())
    } else {
        Err(ImportError::UnsupportedFormat(ext))
    }
}
