// ==========================================
// POS 后台批量上传 - 密码摘要
// ==========================================
// 算法: Argon2（PHC 字符串格式，随机盐）
// 红线: 原始密码只在本模块内出现，不进入提交批次与日志
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordVerifier, SaltString},
    Argon2, PasswordHasher as _,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    /// 生成带随机盐的密码摘要
    ///
    /// # 返回
    /// - PHC 字符串（`$argon2id$...`）
    pub fn hash(&self, password: &str) -> ImportResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ImportError::PasswordHashError(e.to_string()))
    }

    /// 校验密码与已存摘要是否匹配（摘要无法解析视为不匹配）
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_format() {
        let hashed = PasswordHasher::new().hash("secret").unwrap();

        assert!(hashed.starts_with("$argon2"));
        assert!(!hashed.contains("secret"));
    }

    #[test]
    fn test_verify() {
        let hasher = PasswordHasher::new();
        let hashed = hasher.hash("secret").unwrap();

        assert!(hasher.verify("secret", &hashed));
        assert!(!hasher.verify("Secret", &hashed));
        assert!(!hasher.verify("secret", "plain-text"));
    }

    #[test]
    fn test_salt_differs_per_call() {
        let hasher = PasswordHasher::new();
        assert_ne!(hasher.hash("secret").unwrap(), hasher.hash("secret").unwrap());
    }
}
