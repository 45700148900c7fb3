//! Identifier number domain logic.
//!
//! Each statement kind prints a different employee identifier: bank account
//! numbers on salary statements, UANs on provident-fund returns and ESI
//! numbers on social-insurance challans. A word on the page is a candidate
//! only when it is exactly one of those numbers, never a substring.

use super::IdentifierMatcher;
use once_cell::sync::Lazy;
use regex::Regex;

/// Bank account numbers: any run of digits.
#[derive(Debug, Clone, Default)]
pub struct BankAccountMatcher;

impl BankAccountMatcher {
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^\d+$").expect("Valid bank account regex"));
        &PATTERN
    }
}

impl IdentifierMatcher for BankAccountMatcher {
    fn pattern(&self) -> &Regex {
        Self::regex()
    }

    fn normalize(&self, cell: &str) -> String {
        // Account numbers are read as text; leading zeros are significant.
        cell.trim().to_string()
    }
}

/// Universal Account Numbers on provident-fund statements (12 to 15 digits).
#[derive(Debug, Clone, Default)]
pub struct UanMatcher;

impl UanMatcher {
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^\d{12,15}$").expect("Valid UAN regex"));
        &PATTERN
    }
}

impl IdentifierMatcher for UanMatcher {
    fn pattern(&self) -> &Regex {
        Self::regex()
    }

    fn normalize(&self, cell: &str) -> String {
        normalize_integer(cell)
    }
}

/// Employee State Insurance numbers (10 to 12 digits).
#[derive(Debug, Clone, Default)]
pub struct EsiNumberMatcher;

impl EsiNumberMatcher {
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^\d{10,12}$").expect("Valid ESI number regex"));
        &PATTERN
    }
}

impl IdentifierMatcher for EsiNumberMatcher {
    fn pattern(&self) -> &Regex {
        Self::regex()
    }

    fn normalize(&self, cell: &str) -> String {
        normalize_integer(cell)
    }
}

/// Coerces a numeric roster cell to its integer spelling.
///
/// Spreadsheets store UANs and ESI numbers as floats, so `"100200300400.0"`
/// and `"1.002003004E11"` both become `"100200300400"`. Empty cells become
/// `"0"`, which no candidate pattern accepts.
pub fn normalize_integer(cell: &str) -> String {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return "0".to_string();
    }
    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return trimmed.to_string();
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => format!("{}", value as i64),
        _ => trimmed.to_string(),
    }
}
