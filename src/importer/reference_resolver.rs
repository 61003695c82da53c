// ==========================================
// POS 后台批量上传 - 引用解析
// ==========================================
// 职责: 收集存活记录引用的全部自然键，每类键一次批量查询
// 输出: 可提交的批次 + 引用失败的行级违规
// 约束: 查询次数与行数无关（O(键类型数)）
// ==========================================

use crate::domain::records::{
    AccountChange, CommitBatch, ResolvedInventory, ResolvedProduct, ValidatedRecord,
};
use crate::domain::types::DocumentKind;
use crate::domain::upload::RowViolation;
use crate::importer::error::ImportResult;
use crate::importer::password_hasher::PasswordHasher;
use crate::repository::reference_lookup_repo::ReferenceLookup;
use std::collections::HashSet;
use tracing::debug;

/// 引用解析结果
#[derive(Debug)]
pub struct Resolution {
    pub batch: CommitBatch,
    pub violations: Vec<(usize, RowViolation)>, // (行号, 违规)，按行序
}

/// 去重并保持首次出现顺序
fn distinct_keys<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.filter(|k| seen.insert(*k))
        .map(str::to_string)
        .collect()
}

pub struct ReferenceResolver {
    hasher: PasswordHasher,
}

impl ReferenceResolver {
    pub fn new(hasher: PasswordHasher) -> Self {
        Self { hasher }
    }

    /// 解析引用并构造提交批次
    ///
    /// # 参数
    /// - lookup: 外部查询协作方
    /// - kind: 文档类型
    /// - records: (行号, 校验后记录)，按行序
    ///
    /// # 返回
    /// - Err(Transport): 协作方不可用（整单传输失败）
    pub async fn resolve<L>(
        &self,
        lookup: &L,
        kind: DocumentKind,
        records: &[(usize, ValidatedRecord)],
    ) -> ImportResult<Resolution>
    where
        L: ReferenceLookup + ?Sized,
    {
        match kind {
            DocumentKind::Inventory => self.resolve_inventory(lookup, records).await,
            DocumentKind::Product => self.resolve_products(lookup, records).await,
            DocumentKind::User => self.resolve_accounts(lookup, records).await,
        }
    }

    async fn resolve_inventory<L>(
        &self,
        lookup: &L,
        records: &[(usize, ValidatedRecord)],
    ) -> ImportResult<Resolution>
    where
        L: ReferenceLookup + ?Sized,
    {
        let adjustments: Vec<_> = records
            .iter()
            .filter_map(|(line, r)| match r {
                ValidatedRecord::Inventory(a) => Some((*line, a)),
                _ => None,
            })
            .collect();

        let barcodes = distinct_keys(adjustments.iter().map(|(_, a)| a.barcode.as_str()));
        let product_ids = if barcodes.is_empty() {
            Default::default()
        } else {
            lookup.resolve_barcodes(&barcodes).await?
        };
        debug!(keys = barcodes.len(), found = product_ids.len(), "条码解析完成");

        let mut resolved = Vec::with_capacity(adjustments.len());
        let mut violations = Vec::new();
        for (line, adjustment) in adjustments {
            match product_ids.get(&adjustment.barcode) {
                Some(&product_id) => resolved.push(ResolvedInventory {
                    product_id,
                    barcode: adjustment.barcode.clone(),
                    quantity: adjustment.quantity,
                }),
                None => violations.push((
                    line,
                    RowViolation::reference_not_found("barcode", &adjustment.barcode),
                )),
            }
        }

        Ok(Resolution {
            batch: CommitBatch::Inventory(resolved),
            violations,
        })
    }

    async fn resolve_products<L>(
        &self,
        lookup: &L,
        records: &[(usize, ValidatedRecord)],
    ) -> ImportResult<Resolution>
    where
        L: ReferenceLookup + ?Sized,
    {
        let entries: Vec<_> = records
            .iter()
            .filter_map(|(line, r)| match r {
                ValidatedRecord::Catalog(e) => Some((*line, e)),
                _ => None,
            })
            .collect();

        // 已存在的条码不允许再次创建
        let barcodes = distinct_keys(entries.iter().map(|(_, e)| e.barcode.as_str()));
        let existing = if barcodes.is_empty() {
            Default::default()
        } else {
            lookup.resolve_barcodes(&barcodes).await?
        };

        let client_names = distinct_keys(entries.iter().filter_map(|(_, e)| e.client_ref.as_deref()));
        let client_ids = if client_names.is_empty() {
            Default::default()
        } else {
            lookup.resolve_client_names(&client_names).await?
        };
        debug!(
            barcodes = barcodes.len(),
            existing = existing.len(),
            clients = client_names.len(),
            "商品引用解析完成"
        );

        let mut resolved = Vec::with_capacity(entries.len());
        let mut violations = Vec::new();
        for (line, entry) in entries {
            let mut ok = true;
            if existing.contains_key(&entry.barcode) {
                violations.push((
                    line,
                    RowViolation::reference("barcode", format!("barcode 已存在: {}", entry.barcode)),
                ));
                ok = false;
            }

            let client_id = match &entry.client_ref {
                Some(name) => match client_ids.get(name) {
                    Some(&id) => Some(id),
                    None => {
                        violations.push((line, RowViolation::reference_not_found("clientname", name)));
                        ok = false;
                        None
                    }
                },
                None => None,
            };

            if ok {
                resolved.push(ResolvedProduct {
                    barcode: entry.barcode.clone(),
                    name: entry.name.clone(),
                    mrp: entry.mrp,
                    client_id,
                    image_url: entry.image_url.clone(),
                });
            }
        }

        Ok(Resolution {
            batch: CommitBatch::Products(resolved),
            violations,
        })
    }

    async fn resolve_accounts<L>(
        &self,
        lookup: &L,
        records: &[(usize, ValidatedRecord)],
    ) -> ImportResult<Resolution>
    where
        L: ReferenceLookup + ?Sized,
    {
        let accounts: Vec<_> = records
            .iter()
            .filter_map(|(line, r)| match r {
                ValidatedRecord::User(u) => Some((*line, u)),
                _ => None,
            })
            .collect();

        let emails = distinct_keys(accounts.iter().map(|(_, u)| u.email.as_str()));
        let existing = if emails.is_empty() {
            Default::default()
        } else {
            lookup.find_accounts_by_email(&emails).await?
        };
        debug!(keys = emails.len(), existing = existing.len(), "账号查询完成");

        let mut changes = Vec::with_capacity(accounts.len());
        let mut violations = Vec::new();
        for (line, account) in accounts {
            match (existing.get(&account.email), &account.raw_password) {
                // 已有账号: 只更新角色，上传的密码被忽略
                (Some(found), _) => changes.push(AccountChange::UpdateRole {
                    id: found.id,
                    email: account.email.clone(),
                    role: account.role,
                }),
                (None, Some(password)) => changes.push(AccountChange::Create {
                    email: account.email.clone(),
                    role: account.role,
                    password_hash: self.hasher.hash(password)?,
                }),
                (None, None) => violations.push((
                    line,
                    RowViolation::validation("password", "新账号 password 不能为空"),
                )),
            }
        }

        Ok(Resolution {
            batch: CommitBatch::Accounts(changes),
            violations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::{AccountRef, CatalogEntry, InventoryAdjustment, UserAccount};
    use crate::domain::types::Role;
    use crate::domain::upload::RowErrorCategory;
    use crate::importer::error::ImportError;
    use crate::repository::error::{RepositoryError, RepositoryResult};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeLookup {
        barcodes: HashMap<String, i64>,
        clients: HashMap<String, i64>,
        accounts: HashMap<String, AccountRef>,
        calls: AtomicUsize,
        unavailable: bool,
    }

    impl FakeLookup {
        fn call(&self) -> RepositoryResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.unavailable {
                return Err(RepositoryError::Unavailable("down".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ReferenceLookup for FakeLookup {
        async fn resolve_barcodes(&self, keys: &[String]) -> RepositoryResult<HashMap<String, i64>> {
            self.call()?;
            Ok(keys
                .iter()
                .filter_map(|k| self.barcodes.get(k).map(|id| (k.clone(), *id)))
                .collect())
        }

        async fn resolve_client_names(&self, keys: &[String]) -> RepositoryResult<HashMap<String, i64>> {
            self.call()?;
            Ok(keys
                .iter()
                .filter_map(|k| self.clients.get(k).map(|id| (k.clone(), *id)))
                .collect())
        }

        async fn find_accounts_by_email(
            &self,
            keys: &[String],
        ) -> RepositoryResult<HashMap<String, AccountRef>> {
            self.call()?;
            Ok(keys
                .iter()
                .filter_map(|k| self.accounts.get(k).map(|a| (k.clone(), a.clone())))
                .collect())
        }
    }

    fn inventory(line: usize, barcode: &str, quantity: i64) -> (usize, ValidatedRecord) {
        (
            line,
            ValidatedRecord::Inventory(InventoryAdjustment {
                barcode: barcode.to_string(),
                quantity,
            }),
        )
    }

    #[tokio::test]
    async fn test_inventory_missing_barcode() {
        let mut lookup = FakeLookup::default();
        lookup.barcodes.insert("B001".to_string(), 10);
        let resolver = ReferenceResolver::new(PasswordHasher::new());

        let records = vec![inventory(2, "B001", 5), inventory(3, "B404", 1), inventory(4, "B001", 2)];
        let resolution = resolver
            .resolve(&lookup, DocumentKind::Inventory, &records)
            .await
            .unwrap();

        assert_eq!(resolution.batch.len(), 2);
        assert_eq!(resolution.violations.len(), 1);
        assert_eq!(resolution.violations[0].0, 3);
        assert_eq!(resolution.violations[0].1.category, RowErrorCategory::Reference);
        assert!(resolution.violations[0].1.message.contains("B404"));
        // 一类键只查询一次
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_records_no_lookup() {
        let lookup = FakeLookup::default();
        let resolver = ReferenceResolver::new(PasswordHasher::new());

        let resolution = resolver
            .resolve(&lookup, DocumentKind::Inventory, &[])
            .await
            .unwrap();

        assert!(resolution.batch.is_empty());
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_products_existing_barcode_and_missing_client() {
        let mut lookup = FakeLookup::default();
        lookup.barcodes.insert("OLD".to_string(), 1);
        lookup.clients.insert("Acme".to_string(), 7);
        let resolver = ReferenceResolver::new(PasswordHasher::new());

        let entry = |barcode: &str, client: &str| CatalogEntry {
            barcode: barcode.to_string(),
            name: "n".to_string(),
            mrp: 1.0,
            client_ref: Some(client.to_string()),
            image_url: None,
        };
        let records = vec![
            (2, ValidatedRecord::Catalog(entry("NEW1", "Acme"))),
            (3, ValidatedRecord::Catalog(entry("OLD", "Nobody"))),
        ];

        let resolution = resolver
            .resolve(&lookup, DocumentKind::Product, &records)
            .await
            .unwrap();

        match &resolution.batch {
            CommitBatch::Products(products) => {
                assert_eq!(products.len(), 1);
                assert_eq!(products[0].client_id, Some(7));
            }
            other => panic!("unexpected batch: {:?}", other),
        }
        // 第 3 行两条违规都保留
        assert_eq!(resolution.violations.len(), 2);
        assert!(resolution.violations.iter().all(|(line, _)| *line == 3));
    }

    #[tokio::test]
    async fn test_accounts_upsert_and_password_required() {
        let mut lookup = FakeLookup::default();
        lookup.accounts.insert(
            "old@x.com".to_string(),
            AccountRef {
                id: 5,
                email: "old@x.com".to_string(),
                role: Role::Operator,
            },
        );
        let resolver = ReferenceResolver::new(PasswordHasher::new());

        let user = |email: &str, password: Option<&str>| UserAccount {
            email: email.to_string(),
            role: Role::Supervisor,
            raw_password: password.map(str::to_string),
        };
        let records = vec![
            (2, ValidatedRecord::User(user("old@x.com", None))),
            (3, ValidatedRecord::User(user("new@x.com", Some("pw")))),
            (4, ValidatedRecord::User(user("nopw@x.com", None))),
        ];

        let resolution = resolver
            .resolve(&lookup, DocumentKind::User, &records)
            .await
            .unwrap();

        match &resolution.batch {
            CommitBatch::Accounts(changes) => {
                assert_eq!(changes.len(), 2);
                assert!(matches!(changes[0], AccountChange::UpdateRole { id: 5, .. }));
                match &changes[1] {
                    AccountChange::Create { password_hash, .. } => {
                        assert!(PasswordHasher::new().verify("pw", password_hash));
                    }
                    other => panic!("unexpected change: {:?}", other),
                }
            }
            other => panic!("unexpected batch: {:?}", other),
        }
        assert_eq!(resolution.violations.len(), 1);
        assert_eq!(resolution.violations[0].0, 4);
    }

    #[tokio::test]
    async fn test_lookup_unavailable_propagates() {
        let lookup = FakeLookup {
            unavailable: true,
            ..Default::default()
        };
        let resolver = ReferenceResolver::new(PasswordHasher::new());

        let result = resolver
            .resolve(&lookup, DocumentKind::Inventory, &[inventory(2, "B001", 1)])
            .await;

        assert!(matches!(result, Err(ImportError::Transport(_))));
    }
}
