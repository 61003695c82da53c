// ==========================================
// POS 后台批量上传 - 逐行校验器
// ==========================================
// 规则: 一行内所有适用规则全部执行，失败信息全部收集
// 规则: 通过的行输出已规范化的 ValidatedRecord（TRIM / 邮箱小写）
// ==========================================

use crate::config::{ClientColumn, IngestConfig};
use crate::domain::records::{CatalogEntry, InventoryAdjustment, UserAccount, ValidatedRecord};
use crate::domain::types::{DocumentKind, Role};
use crate::domain::upload::{ParsedRow, RowViolation};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::upload_importer_trait::{DataCleaner as _, RowValidator};

pub const INVENTORY_COLUMNS: [&str; 2] = ["barcode", "quantity"];
pub const PRODUCT_COLUMNS: [&str; 4] = ["barcode", "name", "mrp", "imageurl"];
pub const PRODUCT_WITH_CLIENT_COLUMNS: [&str; 5] =
    ["barcode", "clientname", "name", "mrp", "imageurl"];
pub const USER_COLUMNS: [&str; 3] = ["email", "role", "password"];

/// 按文档类型选定校验器（导入入口处一次性选择）
pub fn row_validator_for(kind: DocumentKind, config: &IngestConfig) -> Box<dyn RowValidator> {
    match kind {
        DocumentKind::Inventory => Box::new(InventoryRowValidator::new()),
        DocumentKind::Product => Box::new(CatalogRowValidator::new(config.client_column)),
        DocumentKind::User => Box::new(UserRowValidator::new()),
    }
}

/// 行内单元格数量与契约不一致
fn check_cell_count(row: &ParsedRow, columns: &[&str], violations: &mut Vec<RowViolation>) {
    if row.cells.len() != columns.len() {
        violations.push(RowViolation::validation(
            "*",
            format!(
                "列数不符: 期望 {} 列，实际 {} 列",
                columns.len(),
                row.cells.len()
            ),
        ));
    }
}

/// 条码类自然键: TRIM 后非空
fn text_key(cleaner: &DataCleaner, row: &ParsedRow, index: usize) -> Option<String> {
    let key = cleaner.clean_text(row.cell(index));
    (!key.is_empty()).then_some(key)
}

/// 必填文本字段
fn required_text(
    cleaner: &DataCleaner,
    row: &ParsedRow,
    index: usize,
    field: &str,
    violations: &mut Vec<RowViolation>,
) -> Option<String> {
    let value = cleaner.normalize_null(row.cell(index));
    if value.is_none() {
        violations.push(RowViolation::validation(field, format!("{} 不能为空", field)));
    }
    value
}

// ==========================================
// 库存上传: barcode, quantity
// ==========================================
pub struct InventoryRowValidator {
    cleaner: DataCleaner,
}

impl InventoryRowValidator {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }
}

impl Default for InventoryRowValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RowValidator for InventoryRowValidator {
    fn columns(&self) -> &[&'static str] {
        &INVENTORY_COLUMNS
    }

    fn natural_key(&self, row: &ParsedRow) -> Option<String> {
        text_key(&self.cleaner, row, 0)
    }

    fn validate_row(&self, row: &ParsedRow) -> Result<ValidatedRecord, Vec<RowViolation>> {
        let mut violations = Vec::new();
        check_cell_count(row, self.columns(), &mut violations);

        let barcode = required_text(&self.cleaner, row, 0, "barcode", &mut violations);

        // quantity: 整数且 >= 0（0 表示清零）
        let quantity = match self.cleaner.normalize_null(row.cell(1)) {
            None => {
                violations.push(RowViolation::validation("quantity", "quantity 不能为空"));
                None
            }
            Some(raw) => match self.cleaner.parse_integer(&raw) {
                None => {
                    violations.push(RowViolation::validation(
                        "quantity",
                        format!("quantity 必须为整数: {}", raw),
                    ));
                    None
                }
                Some(q) if q < 0 => {
                    violations.push(RowViolation::validation(
                        "quantity",
                        format!("quantity 不能为负数: {}", q),
                    ));
                    None
                }
                Some(q) => Some(q),
            },
        };

        match (barcode, quantity) {
            (Some(barcode), Some(quantity)) if violations.is_empty() => {
                Ok(ValidatedRecord::Inventory(InventoryAdjustment { barcode, quantity }))
            }
            _ => Err(violations),
        }
    }
}

// ==========================================
// 商品上传: barcode, [clientname,] name, mrp, imageurl
// ==========================================
pub struct CatalogRowValidator {
    cleaner: DataCleaner,
    client_column: ClientColumn,
}

impl CatalogRowValidator {
    pub fn new(client_column: ClientColumn) -> Self {
        Self {
            cleaner: DataCleaner,
            client_column,
        }
    }

    /// 列下标偏移（带客户列时 name 之后整体后移一列）
    fn index_of(&self, column: &str) -> usize {
        self.columns()
            .iter()
            .position(|c| *c == column)
            .unwrap_or(usize::MAX)
    }
}

impl RowValidator for CatalogRowValidator {
    fn columns(&self) -> &[&'static str] {
        match self.client_column {
            ClientColumn::Absent => &PRODUCT_COLUMNS,
            ClientColumn::Required => &PRODUCT_WITH_CLIENT_COLUMNS,
        }
    }

    fn natural_key(&self, row: &ParsedRow) -> Option<String> {
        text_key(&self.cleaner, row, self.index_of("barcode"))
    }

    fn validate_row(&self, row: &ParsedRow) -> Result<ValidatedRecord, Vec<RowViolation>> {
        let mut violations = Vec::new();
        check_cell_count(row, self.columns(), &mut violations);

        let barcode = required_text(&self.cleaner, row, self.index_of("barcode"), "barcode", &mut violations);

        let client_ref = match self.client_column {
            ClientColumn::Absent => None,
            ClientColumn::Required => required_text(
                &self.cleaner,
                row,
                self.index_of("clientname"),
                "clientname",
                &mut violations,
            ),
        };

        let name = required_text(&self.cleaner, row, self.index_of("name"), "name", &mut violations);

        // mrp: 非负小数
        let mrp = match self.cleaner.normalize_null(row.cell(self.index_of("mrp"))) {
            None => {
                violations.push(RowViolation::validation("mrp", "mrp 不能为空"));
                None
            }
            Some(raw) => match self.cleaner.parse_decimal(&raw) {
                None => {
                    violations.push(RowViolation::validation(
                        "mrp",
                        format!("mrp 必须为数字: {}", raw),
                    ));
                    None
                }
                Some(v) if v < 0.0 => {
                    violations.push(RowViolation::validation(
                        "mrp",
                        format!("mrp 不能为负数: {}", raw),
                    ));
                    None
                }
                Some(v) => Some(v),
            },
        };

        // imageurl: 可空，非空时必须是 URL
        let image_url = self.cleaner.normalize_null(row.cell(self.index_of("imageurl")));
        if let Some(url) = &image_url {
            if !self.cleaner.is_valid_url(url) {
                violations.push(RowViolation::validation(
                    "imageurl",
                    format!("imageurl 不是合法的 URL: {}", url),
                ));
            }
        }

        if !violations.is_empty() {
            return Err(violations);
        }

        match (barcode, name, mrp) {
            (Some(barcode), Some(name), Some(mrp)) => Ok(ValidatedRecord::Catalog(CatalogEntry {
                barcode,
                name,
                mrp,
                client_ref,
                image_url,
            })),
            _ => Err(violations),
        }
    }
}

// ==========================================
// 用户上传: email, role, password
// ==========================================
// password 在此阶段允许为空：已存在账号只更新角色，
// 新账号缺少密码的情况在引用解析阶段判定
pub struct UserRowValidator {
    cleaner: DataCleaner,
}

impl UserRowValidator {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }
}

impl Default for UserRowValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RowValidator for UserRowValidator {
    fn columns(&self) -> &[&'static str] {
        &USER_COLUMNS
    }

    fn natural_key(&self, row: &ParsedRow) -> Option<String> {
        self.cleaner
            .normalize_null(row.cell(0))
            .map(|email| self.cleaner.clean_email(&email))
    }

    fn validate_row(&self, row: &ParsedRow) -> Result<ValidatedRecord, Vec<RowViolation>> {
        let mut violations = Vec::new();
        check_cell_count(row, self.columns(), &mut violations);

        let email = match self.cleaner.normalize_null(row.cell(0)) {
            None => {
                violations.push(RowViolation::validation("email", "email 不能为空"));
                None
            }
            Some(_) => {
                let email = self.cleaner.clean_email(row.cell(0));
                if self.cleaner.is_valid_email(&email) {
                    Some(email)
                } else {
                    violations.push(RowViolation::validation(
                        "email",
                        format!("email 格式不合法: {}", email),
                    ));
                    None
                }
            }
        };

        let role = match self.cleaner.normalize_null(row.cell(1)) {
            None => {
                violations.push(RowViolation::validation("role", "role 不能为空"));
                None
            }
            Some(raw) => {
                let role = Role::parse_case_insensitive(&raw);
                if role.is_none() {
                    violations.push(RowViolation::validation(
                        "role",
                        format!("role 取值不合法: {}（可选 SUPERVISOR / OPERATOR）", raw),
                    ));
                }
                role
            }
        };

        // 密码不做 trim 以外的处理，也不写入任何错误信息
        let raw_password = self.cleaner.normalize_null(row.cell(2));

        match (email, role) {
            (Some(email), Some(role)) if violations.is_empty() => {
                Ok(ValidatedRecord::User(UserAccount {
                    email,
                    role,
                    raw_password,
                }))
            }
            _ => Err(violations),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> ParsedRow {
        ParsedRow {
            line_number: 2,
            cells: cells.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_inventory_valid_row_trimmed() {
        let validator = InventoryRowValidator::new();
        let record = validator.validate_row(&row(&["  B001 ", " 10 "])).unwrap();
        assert_eq!(
            record,
            ValidatedRecord::Inventory(InventoryAdjustment {
                barcode: "B001".to_string(),
                quantity: 10
            })
        );
    }

    #[test]
    fn test_inventory_zero_quantity_allowed() {
        let validator = InventoryRowValidator::new();
        assert!(validator.validate_row(&row(&["B001", "0"])).is_ok());
    }

    #[test]
    fn test_inventory_collects_all_violations() {
        let validator = InventoryRowValidator::new();
        let violations = validator.validate_row(&row(&["  ", "-4"])).unwrap_err();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].field, "barcode");
        assert_eq!(violations[1].field, "quantity");
        assert!(violations[1].message.contains("负数"));
    }

    #[test]
    fn test_inventory_non_integer_quantity() {
        let validator = InventoryRowValidator::new();
        let violations = validator.validate_row(&row(&["B001", "2.5"])).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("整数"));
    }

    #[test]
    fn test_inventory_cell_count_mismatch() {
        let validator = InventoryRowValidator::new();
        let violations = validator.validate_row(&row(&["B001", "1", "extra"])).unwrap_err();
        assert!(violations.iter().any(|v| v.message.contains("列数不符")));
    }

    #[test]
    fn test_catalog_valid_row() {
        let validator = CatalogRowValidator::new(ClientColumn::Absent);
        let record = validator
            .validate_row(&row(&["B001", " Green Tea ", "12.50", ""]))
            .unwrap();
        match record {
            ValidatedRecord::Catalog(entry) => {
                assert_eq!(entry.barcode, "B001");
                assert_eq!(entry.name, "Green Tea");
                assert_eq!(entry.mrp, 12.5);
                assert_eq!(entry.client_ref, None);
                assert_eq!(entry.image_url, None);
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_catalog_multiple_violations() {
        let validator = CatalogRowValidator::new(ClientColumn::Absent);
        let violations = validator
            .validate_row(&row(&["B001", "", "-1", "not a url"]))
            .unwrap_err();
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "mrp", "imageurl"]);
    }

    #[test]
    fn test_catalog_comma_decimal_rejected() {
        let validator = CatalogRowValidator::new(ClientColumn::Absent);
        let violations = validator
            .validate_row(&row(&["B001", "Tea", "12,5", ""]))
            .unwrap_err();
        assert_eq!(violations[0].field, "mrp");
    }

    #[test]
    fn test_catalog_with_client_column() {
        let validator = CatalogRowValidator::new(ClientColumn::Required);
        assert_eq!(validator.columns(), &PRODUCT_WITH_CLIENT_COLUMNS);

        let record = validator
            .validate_row(&row(&["B001", " Acme ", "Tea", "5", "https://x.io/t.png"]))
            .unwrap();
        match record {
            ValidatedRecord::Catalog(entry) => {
                assert_eq!(entry.client_ref.as_deref(), Some("Acme"));
                assert_eq!(entry.image_url.as_deref(), Some("https://x.io/t.png"));
            }
            other => panic!("unexpected record: {:?}", other),
        }

        let violations = validator
            .validate_row(&row(&["B001", "", "Tea", "5", ""]))
            .unwrap_err();
        assert_eq!(violations[0].field, "clientname");
    }

    #[test]
    fn test_user_valid_row_normalized() {
        let validator = UserRowValidator::new();
        let record = validator
            .validate_row(&row(&[" E@X.com ", "supervisor", "secret"]))
            .unwrap();
        match record {
            ValidatedRecord::User(account) => {
                assert_eq!(account.email, "e@x.com");
                assert_eq!(account.role, Role::Supervisor);
                assert_eq!(account.raw_password.as_deref(), Some("secret"));
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_user_blank_password_allowed_at_row_stage() {
        let validator = UserRowValidator::new();
        let record = validator.validate_row(&row(&["e@x.com", "OPERATOR", ""])).unwrap();
        match record {
            ValidatedRecord::User(account) => assert_eq!(account.raw_password, None),
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_user_invalid_email_and_role() {
        let validator = UserRowValidator::new();
        let violations = validator
            .validate_row(&row(&["not-an-email", "admin", "pw"]))
            .unwrap_err();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].field, "email");
        assert_eq!(violations[1].field, "role");
        // 密码不出现在错误信息中
        assert!(violations.iter().all(|v| !v.message.contains("pw")));
    }

    #[test]
    fn test_natural_key_ignores_other_fields() {
        let inventory = InventoryRowValidator::new();
        // 数量非法的行仍然给出查重键
        assert_eq!(inventory.natural_key(&row(&[" B001 ", "-4"])), Some("B001".to_string()));
        assert_eq!(inventory.natural_key(&row(&["  ", "1"])), None);

        let catalog = CatalogRowValidator::new(ClientColumn::Required);
        assert_eq!(
            catalog.natural_key(&row(&["P1", "", "", "x", ""])),
            Some("P1".to_string())
        );

        let users = UserRowValidator::new();
        assert_eq!(
            users.natural_key(&row(&[" E@X.com ", "admin", ""])),
            Some("e@x.com".to_string())
        );
    }

    #[test]
    fn test_row_validator_for_selects_columns() {
        let config = IngestConfig::default();
        assert_eq!(
            row_validator_for(DocumentKind::Inventory, &config).columns(),
            &INVENTORY_COLUMNS
        );
        assert_eq!(
            row_validator_for(DocumentKind::Product, &config).columns(),
            &PRODUCT_COLUMNS
        );
        assert_eq!(
            row_validator_for(DocumentKind::User, &config).columns(),
            &USER_COLUMNS
        );
    }
}
