//! Input rules shared by the services.

use crate::error::AppError;
use bson::oid::ObjectId;

pub const TWEET_MAX_CHARS: usize = 300;

/// Trimmed value, or `None` when absent or blank.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

pub fn required(value: Option<&str>, message: &str) -> Result<String, AppError> {
    non_blank(value).ok_or_else(|| AppError::bad_request(message))
}

pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn comment_content(raw: Option<&str>) -> Result<String, AppError> {
    required(raw, "Content cannot be empty")
}

pub fn tweet_content(raw: Option<&str>) -> Result<String, AppError> {
    let content = required(raw, "Tweet content cannot be empty")?;
    if content.chars().count() > TWEET_MAX_CHARS {
        return Err(AppError::bad_request(format!(
            "Tweet content cannot exceed {} characters",
            TWEET_MAX_CHARS
        )));
    }
    Ok(content)
}

pub fn parse_object_id(raw: &str, label: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim())
        .map_err(|_| AppError::bad_request(format!("Invalid {} id", label)))
}

pub fn parse_optional_id(raw: Option<&str>, label: &str) -> Result<Option<ObjectId>, AppError> {
    match non_blank(raw) {
        Some(raw) => parse_object_id(&raw, label).map(Some),
        None => Ok(None),
    }
}
