// ==========================================
// POS 后台批量上传 - 错误回执生成
// ==========================================
// 输出: 原表头 + `error` 列；每个原始行原样保留（含无错误行）
// 约束: 行序、单元格文本逐字节不变；错误信息不得破坏 TSV 结构
// ==========================================

use crate::domain::types::DocumentKind;
use crate::domain::upload::{ErrorArtifact, LineEnding, ParsedRow, RowError, TSV_CONTENT_TYPE};
use crate::importer::error::{ImportError, ImportResult};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::collections::HashMap;

/// 回执追加列的列名
pub const ERROR_COLUMN: &str = "error";

/// 同一行多条错误信息的分隔符
const MESSAGE_SEPARATOR: &str = "; ";

pub struct ErrorArtifactBuilder {
    max_message_len: usize,
    line_ending: LineEnding,
}

impl ErrorArtifactBuilder {
    pub fn new(max_message_len: usize) -> Self {
        Self {
            max_message_len,
            line_ending: LineEnding::Lf,
        }
    }

    /// 回执使用与上传文件相同的行结束符
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// 生成错误回执
    ///
    /// # 参数
    /// - kind: 文档类型（决定文件名）
    /// - header: 原始表头单元格
    /// - rows: 原始数据行（原顺序）
    /// - row_errors: 行级错误（按行号关联，未出现的行错误列为空）
    pub fn build(
        &self,
        kind: DocumentKind,
        header: &[String],
        rows: &[ParsedRow],
        row_errors: &[RowError],
    ) -> ImportResult<ErrorArtifact> {
        let errors: HashMap<usize, &RowError> =
            row_errors.iter().map(|e| (e.line_number, e)).collect();

        let mut writer = WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(QuoteStyle::Never)
            .terminator(match self.line_ending {
                LineEnding::Lf => Terminator::Any(b'\n'),
                LineEnding::CrLf => Terminator::CRLF,
            })
            .flexible(true)
            .from_writer(Vec::new());

        let mut header_record: Vec<&str> = header.iter().map(String::as_str).collect();
        header_record.push(ERROR_COLUMN);
        writer
            .write_record(&header_record)
            .map_err(|e| ImportError::InternalError(format!("错误回执写入失败: {}", e)))?;

        for row in rows {
            let message = errors
                .get(&row.line_number)
                .map(|e| self.render_messages(e))
                .unwrap_or_default();

            let mut record: Vec<&str> = row.cells.iter().map(String::as_str).collect();
            record.push(&message);
            writer
                .write_record(&record)
                .map_err(|e| ImportError::InternalError(format!("错误回执写入失败: {}", e)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ImportError::InternalError(format!("错误回执写入失败: {}", e)))?;

        Ok(ErrorArtifact {
            bytes,
            filename: kind.error_artifact_filename(),
            content_type: TSV_CONTENT_TYPE.to_string(),
        })
    }

    /// 拼接一行的全部错误信息，并去除制表符/换行
    fn render_messages(&self, error: &RowError) -> String {
        let joined = error.messages().collect::<Vec<_>>().join(MESSAGE_SEPARATOR);
        let sanitized: String = joined
            .chars()
            .map(|c| match c {
                '\t' | '\n' | '\r' => ' ',
                other => other,
            })
            .collect();

        if sanitized.chars().count() > self.max_message_len {
            sanitized.chars().take(self.max_message_len).collect()
        } else {
            sanitized
        }
    }
}

/// 去掉回执最后的 `error` 列，还原为可重新提交的文档（保留行结束符）
pub fn strip_error_column(artifact: &[u8]) -> Vec<u8> {
    let line_ending = LineEnding::detect(artifact);
    let mut out = Vec::with_capacity(artifact.len());
    for line in artifact.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        let end = line
            .iter()
            .rposition(|&b| b == b'\t')
            .unwrap_or(line.len());
        out.extend_from_slice(&line[..end]);
        out.extend_from_slice(line_ending.as_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::upload::RowViolation;

    fn row(line_number: usize, cells: &[&str]) -> ParsedRow {
        ParsedRow {
            line_number,
            cells: cells.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn header(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_artifact_echoes_rows_verbatim() {
        let rows = vec![
            row(2, &[" B001 ", "5"]),
            row(3, &["B002", "-1"]),
            row(4, &["\"B003\"", "7"]),
        ];
        let errors = vec![RowError::new(
            3,
            vec![RowViolation::validation("quantity", "quantity 不能为负数")],
        )];

        let artifact = ErrorArtifactBuilder::new(1024)
            .build(
                DocumentKind::Inventory,
                &header(&["barcode", "quantity"]),
                &rows,
                &errors,
            )
            .unwrap();

        let text = String::from_utf8(artifact.bytes).unwrap();
        assert_eq!(
            text,
            "barcode\tquantity\terror\n B001 \t5\t\nB002\t-1\tquantity 不能为负数\n\"B003\"\t7\t\n"
        );
        assert_eq!(artifact.filename, "inventory_upload_errors.tsv");
        assert_eq!(artifact.content_type, TSV_CONTENT_TYPE);
    }

    #[test]
    fn test_messages_joined_and_sanitized() {
        let rows = vec![row(2, &["", "x"])];
        let errors = vec![RowError::new(
            2,
            vec![
                RowViolation::validation("barcode", "barcode 不能为空"),
                RowViolation::validation("quantity", "bad\tvalue\nhere"),
            ],
        )];

        let artifact = ErrorArtifactBuilder::new(1024)
            .build(
                DocumentKind::Inventory,
                &header(&["barcode", "quantity"]),
                &rows,
                &errors,
            )
            .unwrap();

        let text = String::from_utf8(artifact.bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "\tx\tbarcode 不能为空; bad value here");
    }

    #[test]
    fn test_message_truncated() {
        let rows = vec![row(2, &["B001", "x"])];
        let errors = vec![RowError::new(
            2,
            vec![RowViolation::validation("quantity", "abcdefghij")],
        )];

        let artifact = ErrorArtifactBuilder::new(4)
            .build(
                DocumentKind::Inventory,
                &header(&["barcode", "quantity"]),
                &rows,
                &errors,
            )
            .unwrap();

        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.ends_with("B001\tx\tabcd\n"));
    }

    #[test]
    fn test_strip_error_column() {
        let artifact = b"barcode\tquantity\terror\nB001\t5\t\nB002\t-1\tbad\n";
        assert_eq!(
            strip_error_column(artifact),
            b"barcode\tquantity\nB001\t5\nB002\t-1\n".to_vec()
        );
    }

    #[test]
    fn test_crlf_line_ending_preserved() {
        let rows = vec![row(2, &["B001", "5"]), row(3, &["B002", "-1"])];
        let errors = vec![RowError::new(
            3,
            vec![RowViolation::validation("quantity", "quantity 不能为负数")],
        )];

        let artifact = ErrorArtifactBuilder::new(1024)
            .with_line_ending(LineEnding::CrLf)
            .build(
                DocumentKind::Inventory,
                &header(&["barcode", "quantity"]),
                &rows,
                &errors,
            )
            .unwrap();

        assert_eq!(
            artifact.bytes,
            "barcode\tquantity\terror\r\nB001\t5\t\r\nB002\t-1\tquantity 不能为负数\r\n"
                .as_bytes()
                .to_vec()
        );
        assert_eq!(
            strip_error_column(&artifact.bytes),
            b"barcode\tquantity\r\nB001\t5\r\nB002\t-1\r\n".to_vec()
        );
    }
}
