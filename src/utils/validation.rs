//! Input validation utilities
//!
//! Custom validators plugged into `#[validate(custom(...))]` on request DTOs.

use validator::ValidationError;

use crate::{
    constants::{MAX_SOURCE_CODE_SIZE, MIN_SOURCE_CODE_SIZE},
    models::Language,
};

/// Validate programming language against the whitelist
pub fn validate_language(language: &str) -> Result<(), ValidationError> {
    if Language::parse(language).is_some() {
        return Ok(());
    }

    let supported: Vec<&str> = Language::ALL.iter().map(|l| l.as_str()).collect();
    Err(ValidationError::new("unsupported_language").with_message(
        format!(
            "Unsupported language '{}'; expected one of: {}",
            language,
            supported.join(", ")
        )
        .into(),
    ))
}

/// Validate source code size in bytes
pub fn validate_source_code(code: &str) -> Result<(), ValidationError> {
    let size = code.len() as u64;
    if code.trim().is_empty() {
        return Err(ValidationError::new("empty_source").with_message("Source code cannot be empty".into()));
    }
    if size < MIN_SOURCE_CODE_SIZE {
        return Err(ValidationError::new("source_too_short").with_message(
            format!("Source code must be at least {} bytes", MIN_SOURCE_CODE_SIZE).into(),
        ));
    }
    if size > MAX_SOURCE_CODE_SIZE {
        return Err(ValidationError::new("source_too_long").with_message(
            format!("Source code exceeds maximum size of {} bytes", MAX_SOURCE_CODE_SIZE).into(),
        ));
    }
    Ok(())
}
