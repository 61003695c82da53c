// ==========================================
// POS 后台批量上传 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 邮箱小写 / 与区域设置无关的数值解析
// ==========================================

use crate::importer::upload_importer_trait::DataCleaner as DataCleanerTrait;
use regex::Regex;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("email regex is valid")
    })
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?i)(https?|ftp)://[^\s/?#.][^\s/?#]*(\.[^\s/?#]+)*(:\d+)?([/?#]\S*)?$")
            .expect("url regex is valid")
    })
}

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    fn normalize_null(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn clean_email(&self, value: &str) -> String {
        value.trim().to_lowercase()
    }

    fn parse_integer(&self, value: &str) -> Option<i64> {
        value.trim().parse::<i64>().ok()
    }

    fn parse_decimal(&self, value: &str) -> Option<f64> {
        let trimmed = value.trim();
        // 只接受 ASCII 数字与小数点，拒绝千分位/逗号小数/科学计数法/inf/NaN
        let valid_chars = trimmed
            .chars()
            .enumerate()
            .all(|(i, c)| c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+')));
        if !valid_chars || !trimmed.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
        trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn is_valid_email(&self, value: &str) -> bool {
        email_regex().is_match(value)
    }

    fn is_valid_url(&self, value: &str) -> bool {
        url_regex().is_match(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_and_null() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.clean_text("  Tea  "), "Tea");
        assert_eq!(cleaner.normalize_null("   "), None);
        assert_eq!(cleaner.normalize_null(" x "), Some("x".to_string()));
    }

    #[test]
    fn test_clean_email() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.clean_email("  E@X.Com "), "e@x.com");
    }

    #[test]
    fn test_parse_integer() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_integer(" 12 "), Some(12));
        assert_eq!(cleaner.parse_integer("-3"), Some(-3));
        assert_eq!(cleaner.parse_integer("1.5"), None);
        assert_eq!(cleaner.parse_integer("abc"), None);
    }

    #[test]
    fn test_parse_decimal_locale_independent() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_decimal("12.50"), Some(12.5));
        assert_eq!(cleaner.parse_decimal(" 7 "), Some(7.0));
        assert_eq!(cleaner.parse_decimal("-1.0"), Some(-1.0));
        assert_eq!(cleaner.parse_decimal("12,50"), None);
        assert_eq!(cleaner.parse_decimal("1e3"), None);
        assert_eq!(cleaner.parse_decimal("inf"), None);
        assert_eq!(cleaner.parse_decimal("NaN"), None);
        assert_eq!(cleaner.parse_decimal("."), None);
    }

    #[test]
    fn test_email_syntax() {
        let cleaner = DataCleaner;
        assert!(cleaner.is_valid_email("e@x.com"));
        assert!(cleaner.is_valid_email("first.last+tag@shop.example.in"));
        assert!(!cleaner.is_valid_email("e@x"));
        assert!(!cleaner.is_valid_email("not-an-email"));
        assert!(!cleaner.is_valid_email("a b@x.com"));
    }

    #[test]
    fn test_url_syntax() {
        let cleaner = DataCleaner;
        assert!(cleaner.is_valid_url("https://cdn.example.com/img/tea.png"));
        assert!(cleaner.is_valid_url("http://localhost:8080/a.jpg"));
        assert!(!cleaner.is_valid_url("cdn.example.com/tea.png"));
        assert!(!cleaner.is_valid_url("https://"));
        assert!(!cleaner.is_valid_url("https://exa mple.com"));
    }
}
