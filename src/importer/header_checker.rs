// ==========================================
// POS 后台批量上传 - 表头契约校验
// ==========================================
// 规则: 列数、列名、顺序必须与契约完全一致（大小写敏感）
// 表头不符即整单失败，不进入逐行校验
// ==========================================

use crate::importer::error::{ImportError, ImportResult};

/// 校验表头
///
/// # 返回
/// - Err(InvalidHeader): 列数不符
/// - Err(MissingColumn): 第一个未出现在期望位置的列（位置 1 起）
pub fn check_header(header: &[String], expected: &[&str]) -> ImportResult<()> {
    if header.len() != expected.len() {
        return Err(ImportError::InvalidHeader {
            expected: expected.len(),
            actual: header.len(),
            expected_columns: expected.join(", "),
        });
    }

    for (idx, (actual, wanted)) in header.iter().zip(expected.iter()).enumerate() {
        if actual != wanted {
            return Err(ImportError::MissingColumn {
                column: wanted.to_string(),
                position: idx + 1,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_header_matches() {
        assert!(check_header(&header(&["barcode", "quantity"]), &["barcode", "quantity"]).is_ok());
    }

    #[test]
    fn test_header_count_mismatch() {
        let result = check_header(&header(&["barcode"]), &["barcode", "quantity"]);
        assert!(matches!(
            result,
            Err(ImportError::InvalidHeader { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_header_name_mismatch() {
        let result = check_header(&header(&["barcode", "qty"]), &["barcode", "quantity"]);
        match result {
            Err(ImportError::MissingColumn { column, position }) => {
                assert_eq!(column, "quantity");
                assert_eq!(position, 2);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_header_case_and_order_sensitive() {
        assert!(check_header(&header(&["Barcode", "quantity"]), &["barcode", "quantity"]).is_err());
        assert!(check_header(&header(&["quantity", "barcode"]), &["barcode", "quantity"]).is_err());
        // 未 trim 的表头同样不符
        assert!(check_header(&header(&["barcode ", "quantity"]), &["barcode", "quantity"]).is_err());
    }
}
