use regex::Regex;
use std::sync::LazyLock;

static DIAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)").expect("dial code pattern is valid"));

/// 從國家選單文字（例如 "🇲🇾 (+60)"）取出區碼
pub fn dial_code(country_code: &str) -> &str {
    DIAL_CODE
        .captures(country_code)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or("")
}

/// 只保留數字，與表單輸入時的過濾一致
pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn format_phone_number(country_code: &str, phone: &str) -> String {
    format!("{}{}", dial_code(country_code), digits_only(phone))
}
