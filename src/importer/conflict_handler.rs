// ==========================================
// POS 后台批量上传 - 同文件查重实现
// ==========================================
// 职责: 检测同一次提交内重复的自然键（条码 / 邮箱）
// 规则: 首次出现不受影响，之后每一次出现都记为重复
// ==========================================

use crate::importer::upload_importer_trait::ConflictHandler as ConflictHandlerTrait;
use std::collections::HashSet;

pub struct ConflictHandler;

impl ConflictHandlerTrait for ConflictHandler {
    /// 检测同文件内重复自然键
    ///
    /// # 返回
    /// - Vec<(行号, 自然键)>: 重复记录列表（不包括第一次出现）
    fn detect_duplicates(&self, keys: &[(usize, &str)]) -> Vec<(usize, String)> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut duplicates = Vec::new();

        for &(line_number, key) in keys {
            if !seen.insert(key) {
                duplicates.push((line_number, key.to_string()));
            }
        }

        duplicates
    }
}
