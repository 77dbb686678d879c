use crate::error::AppError::{self, Validation};
use crate::models::FeatureStatus;

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 100;

/// Path ids are base-10 positive integers; anything else is a client error,
/// not a lookup miss.
pub fn parse_feature_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| Validation("Invalid feature ID".to_string()))
}

/// Trims the submitted title and enforces the 3..=100 character bounds.
pub fn validate_title(raw: &str) -> Result<String, AppError> {
    let title = raw.trim();
    let chars = title.chars().count();

    if chars < TITLE_MIN_CHARS {
        return Err(Validation(format!(
            "Title must be at least {TITLE_MIN_CHARS} characters"
        )));
    }
    if chars > TITLE_MAX_CHARS {
        return Err(Validation(format!(
            "Title must be at most {TITLE_MAX_CHARS} characters"
        )));
    }

    Ok(title.to_string())
}

pub fn parse_status(raw: &str) -> Result<FeatureStatus, AppError> {
    FeatureStatus::parse(raw).ok_or_else(|| {
        Validation(
            "Invalid status. Must be one of: pending, in-progress, approved, done, canceled"
                .to_string(),
        )
    })
}
