// ==========================================
// POS 后台批量上传 - SQLite 参考持久化实现
// ==========================================
// 职责: 实现引用查询与整批提交（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 约束: apply_batch 在单个事务中执行，失败即回滚
// ==========================================

use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::records::{
    AccountChange, AccountRef, CommitBatch, ResolvedInventory, ResolvedProduct,
};
use crate::domain::types::Role;
use crate::domain::upload::CommitReport;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::reference_lookup_repo::ReferenceLookup;
use crate::repository::upload_commit_repo::UploadCommitRepository;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// IN (...) 单条语句的最大参数个数
const IN_CLAUSE_CHUNK: usize = 500;

fn parse_role(raw: &str) -> RepositoryResult<Role> {
    Role::parse_case_insensitive(raw)
        .ok_or_else(|| RepositoryError::InternalError(format!("无法识别的角色: {}", raw)))
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

// ==========================================
// PosStoreRepositoryImpl
// ==========================================
pub struct PosStoreRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl PosStoreRepositoryImpl {
    /// 创建新的 Repository 实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（共享连接，调用方负责建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按 IN 子句分块查询 (key, id)
    fn query_key_ids(
        conn: &Connection,
        sql_prefix: &str,
        keys: &[String],
    ) -> RepositoryResult<HashMap<String, i64>> {
        let mut found = HashMap::new();
        for chunk in keys.chunks(IN_CLAUSE_CHUNK) {
            let sql = format!("{} ({})", sql_prefix, placeholders(chunk.len()));
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (key, id) = row?;
                found.insert(key, id);
            }
        }
        Ok(found)
    }

    // ===== 基础数据维护（目录/客户由其他服务负责，这里供初始化与测试使用）=====

    pub fn insert_client(&self, name: &str) -> RepositoryResult<i64> {
        let conn = self.lock()?;
        conn.execute("INSERT INTO client (name) VALUES (?1)", params![name])?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_product(
        &self,
        barcode: &str,
        name: &str,
        mrp: f64,
        client_id: Option<i64>,
    ) -> RepositoryResult<i64> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO product (barcode, client_id, name, mrp, image_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?5)",
            params![barcode, client_id, name, mrp, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 查询条码对应的在手库存（无库存记录返回 None）
    pub fn inventory_quantity(&self, barcode: &str) -> RepositoryResult<Option<i64>> {
        let conn = self.lock()?;
        let quantity = conn
            .query_row(
                "SELECT i.quantity FROM inventory i JOIN product p ON p.id = i.product_id
                 WHERE p.barcode = ?1",
                params![barcode],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(quantity)
    }

    /// 查询账号密码摘要（用于校验“仅更新角色”不触碰密码）
    pub fn account_password_hash(&self, email: &str) -> RepositoryResult<Option<String>> {
        let conn = self.lock()?;
        let hash = conn
            .query_row(
                "SELECT password_hash FROM pos_user WHERE email = ?1",
                params![email],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(hash)
    }

    pub fn count_products(&self) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM product", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn count_accounts(&self) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM pos_user", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ===== 事务内写入 =====

    fn apply_inventory_tx(
        tx: &Transaction,
        records: &[ResolvedInventory],
        now: &str,
    ) -> RepositoryResult<CommitReport> {
        let mut exists_stmt = tx.prepare("SELECT 1 FROM inventory WHERE product_id = ?1")?;
        let mut upsert_stmt = tx.prepare(
            r#"
            INSERT INTO inventory (product_id, quantity, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(product_id) DO UPDATE SET
                quantity = excluded.quantity,
                updated_at = excluded.updated_at
            "#,
        )?;

        let mut report = CommitReport::default();
        for record in records {
            let exists = exists_stmt
                .query_row(params![record.product_id], |_| Ok(()))
                .optional()?
                .is_some();
            upsert_stmt.execute(params![record.product_id, record.quantity, now])?;
            if exists {
                report.updated += 1;
            } else {
                report.created += 1;
            }
        }
        Ok(report)
    }

    fn apply_products_tx(
        tx: &Transaction,
        records: &[ResolvedProduct],
        now: &str,
    ) -> RepositoryResult<CommitReport> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO product (barcode, client_id, name, mrp, image_url, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )?;

        let mut report = CommitReport::default();
        for record in records {
            stmt.execute(params![
                record.barcode,
                record.client_id,
                record.name,
                record.mrp,
                record.image_url,
                now,
            ])?;
            report.created += 1;
        }
        Ok(report)
    }

    fn apply_accounts_tx(
        tx: &Transaction,
        changes: &[AccountChange],
        now: &str,
    ) -> RepositoryResult<CommitReport> {
        let mut insert_stmt = tx.prepare(
            r#"
            INSERT INTO pos_user (email, role, password_hash, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
        )?;
        let mut update_stmt =
            tx.prepare("UPDATE pos_user SET role = ?1, updated_at = ?2 WHERE id = ?3")?;

        let mut report = CommitReport::default();
        for change in changes {
            match change {
                AccountChange::Create {
                    email,
                    role,
                    password_hash,
                } => {
                    insert_stmt.execute(params![email, role.as_str(), password_hash, now])?;
                    report.created += 1;
                }
                AccountChange::UpdateRole { id, email, role } => {
                    let affected = update_stmt.execute(params![role.as_str(), now, id])?;
                    if affected == 0 {
                        return Err(RepositoryError::NotFound {
                            entity: "pos_user".to_string(),
                            id: format!("{} ({})", id, email),
                        });
                    }
                    report.updated += 1;
                }
            }
        }
        Ok(report)
    }
}

#[async_trait]
impl ReferenceLookup for PosStoreRepositoryImpl {
    async fn resolve_barcodes(&self, barcodes: &[String]) -> RepositoryResult<HashMap<String, i64>> {
        let conn = self.lock()?;
        Self::query_key_ids(&conn, "SELECT barcode, id FROM product WHERE barcode IN", barcodes)
    }

    async fn resolve_client_names(&self, names: &[String]) -> RepositoryResult<HashMap<String, i64>> {
        let conn = self.lock()?;
        Self::query_key_ids(&conn, "SELECT name, id FROM client WHERE name IN", names)
    }

    async fn find_accounts_by_email(
        &self,
        emails: &[String],
    ) -> RepositoryResult<HashMap<String, AccountRef>> {
        let conn = self.lock()?;
        let mut found = HashMap::new();
        for chunk in emails.chunks(IN_CLAUSE_CHUNK) {
            let sql = format!(
                "SELECT id, email, role FROM pos_user WHERE email IN ({})",
                placeholders(chunk.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;
            for row in rows {
                let (id, email, role) = row?;
                let role = parse_role(&role)?;
                found.insert(email.clone(), AccountRef { id, email, role });
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl UploadCommitRepository for PosStoreRepositoryImpl {
    async fn apply_batch(&self, batch: CommitBatch) -> RepositoryResult<CommitReport> {
        let conn = self.lock()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        // 出错时 tx 被丢弃即回滚
        let report = match &batch {
            CommitBatch::Inventory(records) => Self::apply_inventory_tx(&tx, records, &now)?,
            CommitBatch::Products(records) => Self::apply_products_tx(&tx, records, &now)?,
            CommitBatch::Accounts(changes) => Self::apply_accounts_tx(&tx, changes, &now)?,
        };

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(report)
    }

    async fn insert_account(
        &self,
        email: &str,
        role: Role,
        password_hash: &str,
    ) -> RepositoryResult<AccountRef> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO pos_user (email, role, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![email, role.as_str(), password_hash, now],
        )?;
        Ok(AccountRef {
            id: conn.last_insert_rowid(),
            email: email.to_string(),
            role,
        })
    }

    async fn update_account_role(&self, id: i64, role: Role) -> RepositoryResult<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let affected = conn.execute(
            "UPDATE pos_user SET role = ?1, updated_at = ?2 WHERE id = ?3",
            params![role.as_str(), now, id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "pos_user".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
