//! Scalar normalizers for single email / phone values.
//!
//! Neither cleaner ever fails: malformed input is replaced by a sentinel so
//! the row survives and the bad value stays visible in the output.

use once_cell::sync::Lazy;
use regex::Regex;

/// Marker written in place of an invalid or missing email.
pub const EMAIL_SENTINEL: &str = "nan";

/// Marker written in place of an invalid or missing phone number.
/// Indistinguishable from a real all-zero number; it always means invalid.
pub const PHONE_SENTINEL: &str = "0000000000";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("static email pattern")
});

// ── Email ───────────────────────────────────────────────────────────────────

/// Trim + lowercase, then validate. Returns [`EMAIL_SENTINEL`] on failure.
pub fn clean_email(email: Option<&str>) -> String {
    let Some(raw) = email else {
        return EMAIL_SENTINEL.to_string();
    };
    let cleaned = raw.trim().to_lowercase();
    if cleaned.is_empty() || !EMAIL_RE.is_match(&cleaned) {
        return EMAIL_SENTINEL.to_string();
    }
    cleaned
}

pub fn email_is_valid(email: &str) -> bool {
    let cleaned = email.trim().to_lowercase();
    !cleaned.is_empty() && EMAIL_RE.is_match(&cleaned)
}

/// Lowercased domain part of a valid email.
pub fn email_domain(email: &str) -> Option<String> {
    if !email_is_valid(email) {
        return None;
    }
    email
        .trim()
        .split_once('@')
        .map(|(_, domain)| domain.to_lowercase())
}

// ── Phone ───────────────────────────────────────────────────────────────────

/// Digits only. Empty for missing or `nan` input.
pub fn extract_digits(phone: &str) -> String {
    if phone.trim().eq_ignore_ascii_case("nan") {
        return String::new();
    }
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// 10 digits, or 11 digits with a leading `1` country code.
pub fn phone_is_valid(phone: &str) -> bool {
    let digits = extract_digits(phone);
    match digits.len() {
        10 => true,
        11 => digits.starts_with('1'),
        _ => false,
    }
}

pub fn strip_leading_zeros(phone: &str) -> String {
    extract_digits(phone).trim_start_matches('0').to_string()
}

pub fn is_negative(phone: &str) -> bool {
    phone.trim().starts_with('-')
}

/// Normalize a phone number to exactly 10 digits, or [`PHONE_SENTINEL`].
///
/// Non-digits (a leading minus sign included) are dropped, then leading
/// zeros. An 11-digit `1…` number loses its country code.
pub fn clean_phone(phone: Option<&str>) -> String {
    let Some(raw) = phone else {
        return PHONE_SENTINEL.to_string();
    };
    if raw.trim().is_empty() || raw.trim().eq_ignore_ascii_case("nan") {
        return PHONE_SENTINEL.to_string();
    }

    let cleaned = strip_leading_zeros(raw);
    if !phone_is_valid(&cleaned) {
        return PHONE_SENTINEL.to_string();
    }
    match cleaned.len() {
        11 => cleaned[1..].to_string(),
        _ => cleaned,
    }
}
