// ==========================================
// POS 后台批量上传 - 导入编排器实现
// ==========================================
// 职责: 串联各阶段，产出 Applied / Rejected / 结构性或传输错误
// 流程: 格式检查 → 解析 → 表头校验 → 行数上限 → 逐行校验 → 同文件查重 → 引用解析 → 提交/回执
// 红线: 存在任何行级错误时不提交任何行；提交只调用一次
// ==========================================

use crate::config::IngestConfigReader;
use crate::domain::records::ValidatedRecord;
use crate::domain::types::DocumentKind;
use crate::domain::upload::{
    CommitReport, IngestionOutcome, IngestionStage, IngestionSummary, RawDocument, RowError,
    RowViolation,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::error_artifact::ErrorArtifactBuilder;
use crate::importer::file_parser::{check_extension, TsvParser};
use crate::importer::header_checker::check_header;
use crate::importer::password_hasher::PasswordHasher;
use crate::importer::reference_resolver::ReferenceResolver;
use crate::importer::row_validator::row_validator_for;
use crate::importer::conflict_handler::ConflictHandler as ConflictHandlerImpl;
use crate::importer::upload_importer_trait::{BulkUploadImporter, ConflictHandler, DocumentParser};
use crate::repository::{ReferenceLookup, UploadCommitRepository};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// UploadImporterImpl - 批量上传编排器
// ==========================================
pub struct UploadImporterImpl<L, R, C>
where
    L: ReferenceLookup,
    R: UploadCommitRepository,
    C: IngestConfigReader,
{
    // 外部协作方
    lookup: L,
    commit_repo: R,

    // 配置读取器
    config: C,

    // 导入组件
    parser: Box<dyn DocumentParser>,
    conflict_handler: Box<dyn ConflictHandler>,
    resolver: ReferenceResolver,
}

impl<L, R, C> UploadImporterImpl<L, R, C>
where
    L: ReferenceLookup,
    R: UploadCommitRepository,
    C: IngestConfigReader,
{
    /// 使用默认组件创建编排器（TSV 解析、字面查重、Argon2 密码摘要）
    pub fn new(lookup: L, commit_repo: R, config: C) -> Self {
        Self::with_components(
            lookup,
            commit_repo,
            config,
            Box::new(TsvParser::new()),
            Box::new(ConflictHandlerImpl),
            PasswordHasher::new(),
        )
    }

    /// 创建编排器并指定各阶段组件
    ///
    /// # 参数
    /// - lookup: 引用查询协作方
    /// - commit_repo: 提交协作方
    /// - config: 配置读取器
    /// - parser: 文件解析器
    /// - conflict_handler: 同文件查重
    /// - hasher: 新账号密码摘要
    pub fn with_components(
        lookup: L,
        commit_repo: R,
        config: C,
        parser: Box<dyn DocumentParser>,
        conflict_handler: Box<dyn ConflictHandler>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            lookup,
            commit_repo,
            config,
            parser,
            conflict_handler,
            resolver: ReferenceResolver::new(hasher),
        }
    }
}

/// 推进状态机
fn advance(stage: &mut IngestionStage, next: IngestionStage, batch_id: &str) {
    debug_assert!(
        stage.can_advance_to(next),
        "非法阶段转换: {} → {}",
        stage,
        next
    );
    debug!(batch_id = %batch_id, from = %stage, to = %next, "阶段转换");
    *stage = next;
}

/// 合并行级违规（同一行多条规则全部保留，按行号排序）
fn record_violations(
    errors: &mut BTreeMap<usize, Vec<RowViolation>>,
    line_number: usize,
    violations: impl IntoIterator<Item = RowViolation>,
) {
    errors.entry(line_number).or_default().extend(violations);
}

#[async_trait]
impl<L, R, C> BulkUploadImporter for UploadImporterImpl<L, R, C>
where
    L: ReferenceLookup,
    R: UploadCommitRepository,
    C: IngestConfigReader,
{
    #[instrument(skip(self, document), fields(
        kind = %kind,
        filename = %document.filename,
        batch_id = tracing::field::Empty
    ))]
    async fn ingest(
        &self,
        kind: DocumentKind,
        document: RawDocument,
    ) -> ImportResult<IngestionOutcome> {
        let start_time = Instant::now();
        let started_at = Utc::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(batch_id = %batch_id, size = document.content.len(), "开始批量上传导入");

        let config = self
            .config
            .load_ingest_config()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: "ingest/*".to_string(),
                message: e.to_string(),
            })?;

        // === 阶段 0: 格式检查 + 解析 ===
        let mut stage = IngestionStage::Parsing;
        check_extension(&document.filename, &config.allowed_extensions)?;
        let tabular = self.parser.parse(&document.content).map_err(|e| {
            warn!(batch_id = %batch_id, error = %e, "文件解析失败");
            e
        })?;
        drop(document);

        // === 阶段 1: 表头校验（失败即整单失败） ===
        let validator = row_validator_for(kind, &config);
        check_header(&tabular.header, validator.columns()).map_err(|e| {
            warn!(batch_id = %batch_id, error = %e, "表头校验失败");
            e
        })?;

        let total_rows = tabular.rows.len();
        if total_rows > config.max_rows {
            warn!(batch_id = %batch_id, total_rows, limit = config.max_rows, "数据行超出上限");
            return Err(ImportError::TooManyRows {
                limit: config.max_rows,
                actual: total_rows,
            });
        }
        advance(&mut stage, IngestionStage::HeaderChecked, &batch_id);

        // === 阶段 2: 逐行校验 ===
        let mut errors: BTreeMap<usize, Vec<RowViolation>> = BTreeMap::new();
        let mut survivors: Vec<(usize, ValidatedRecord)> = Vec::with_capacity(total_rows);
        for row in &tabular.rows {
            match validator.validate_row(row) {
                Ok(record) => survivors.push((row.line_number, record)),
                Err(violations) => {
                    debug!(row_number = row.line_number, count = violations.len(), "行校验失败");
                    record_violations(&mut errors, row.line_number, violations);
                }
            }
        }
        advance(&mut stage, IngestionStage::RowsValidated, &batch_id);
        info!(
            batch_id = %batch_id,
            total_rows,
            passed = survivors.len(),
            failed = errors.len(),
            "逐行校验完成"
        );

        // === 阶段 3: 同文件查重（覆盖全部数据行，与其他字段是否有效无关） ===
        let duplicates = {
            let owned: Vec<(usize, String)> = tabular
                .rows
                .iter()
                .filter_map(|row| validator.natural_key(row).map(|key| (row.line_number, key)))
                .collect();
            let keys: Vec<(usize, &str)> =
                owned.iter().map(|(line, key)| (*line, key.as_str())).collect();
            self.conflict_handler.detect_duplicates(&keys)
        };
        let key_column = kind.natural_key_column();
        let mut duplicate_lines = HashSet::new();
        for (line, key) in &duplicates {
            record_violations(&mut errors, *line, [RowViolation::duplicate_key(key_column, key)]);
            duplicate_lines.insert(*line);
        }
        survivors.retain(|(line, _)| !duplicate_lines.contains(line));
        advance(&mut stage, IngestionStage::ConsistencyChecked, &batch_id);
        if !duplicates.is_empty() {
            warn!(batch_id = %batch_id, duplicates = duplicates.len(), "发现文件内重复键");
        }

        // === 阶段 4: 引用解析（每类键一次批量查询） ===
        let resolution = self
            .resolver
            .resolve(&self.lookup, kind, &survivors)
            .await
            .map_err(|e| {
                warn!(batch_id = %batch_id, error = %e, "引用解析失败");
                e
            })?;
        for (line, violation) in resolution.violations {
            record_violations(&mut errors, line, [violation]);
        }
        advance(&mut stage, IngestionStage::ReferencesResolved, &batch_id);

        let failed_rows = errors.len();
        let mut summary = IngestionSummary {
            batch_id: batch_id.clone(),
            kind,
            total_rows,
            valid_rows: total_rows - failed_rows,
            failed_rows,
            started_at,
            elapsed_ms: 0,
        };

        // === 阶段 5a: 存在行级错误 → 生成回执，不提交 ===
        if failed_rows > 0 {
            let row_errors: Vec<RowError> = errors
                .into_iter()
                .map(|(line, violations)| RowError::new(line, violations))
                .collect();
            let artifact = ErrorArtifactBuilder::new(config.max_error_message_len)
                .with_line_ending(tabular.line_ending)
                .build(kind, &tabular.header, &tabular.rows, &row_errors)?;
            advance(&mut stage, IngestionStage::Rejected, &batch_id);

            summary.elapsed_ms = start_time.elapsed().as_millis() as u64;
            warn!(
                batch_id = %batch_id,
                failed_rows,
                valid_rows = summary.valid_rows,
                elapsed_ms = summary.elapsed_ms,
                "导入被拒绝，未提交任何行"
            );
            return Ok(IngestionOutcome::Rejected {
                summary,
                artifact,
                row_errors,
            });
        }

        // === 阶段 5b: 全部有效 → 一次性提交 ===
        let commit = if resolution.batch.is_empty() {
            debug!(batch_id = %batch_id, "无数据行，跳过提交");
            CommitReport::default()
        } else {
            self.commit_repo
                .apply_batch(resolution.batch)
                .await
                .map_err(|e| {
                    warn!(batch_id = %batch_id, error = %e, "整批提交失败");
                    ImportError::from(e)
                })?
        };
        advance(&mut stage, IngestionStage::Committed, &batch_id);

        summary.elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            batch_id = %batch_id,
            created = commit.created,
            updated = commit.updated,
            elapsed_ms = summary.elapsed_ms,
            "导入完成"
        );

        Ok(IngestionOutcome::Applied { summary, commit })
    }
}
