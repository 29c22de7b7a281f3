use regex::Regex;
use std::sync::OnceLock;

use super::ApiError;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid regex"))
}

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;
pub const DEFAULT_PAGE_LIMIT: u64 = 50;
pub const DEFAULT_RECENT_KEYS: u64 = 20;

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }

    if !(3..=32).contains(&trimmed.len()) {
        return Err(ApiError::validation(
            "Username must be between 3 and 32 characters",
        ));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(ApiError::validation(
            "Username can only contain letters, numbers, dots, hyphens, and underscores",
        ));
    }

    Ok(trimmed)
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();
    if trimmed.len() > 254 || !email_regex().is_match(trimmed) {
        return Err(ApiError::validation("Invalid email address"));
    }
    Ok(trimmed)
}

pub fn validate_new_password(password: &str) -> Result<&str, ApiError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(password)
}

/// Login-style credentials only need to be present.
pub fn validate_required<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    if value.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(value)
}

pub fn validate_key_prefix(prefix: Option<&str>) -> Result<Option<&str>, ApiError> {
    let Some(prefix) = prefix.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };

    if prefix.len() > 16 {
        return Err(ApiError::validation(
            "Key prefix must be 16 characters or less",
        ));
    }

    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::validation(
            "Key prefix can only contain letters and numbers",
        ));
    }

    Ok(Some(prefix))
}

pub fn validate_quantity(quantity: u32, max: u32) -> Result<u32, ApiError> {
    if quantity == 0 || quantity > max {
        return Err(ApiError::validation(format!(
            "Quantity must be between 1 and {max}"
        )));
    }
    Ok(quantity)
}

pub fn validate_limit(limit: u64) -> Result<u64, ApiError> {
    const MAX_LIMIT: u64 = 500;
    const MIN_LIMIT: u64 = 1;

    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {limit}. Limit must be between {MIN_LIMIT} and {MAX_LIMIT}"
        )));
    }
    Ok(limit)
}

pub fn validate_page(page: u64) -> Result<u64, ApiError> {
    if page == 0 {
        return Err(ApiError::validation("Page must be 1 or greater"));
    }
    Ok(page)
}
