//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest display name accepted for whitelist entries.
const MAX_DISPLAY_NAME_LENGTH: usize = 16;

/// Validates that a display name is non-blank and at most 16 characters.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("display_name_blank");
        err.message = Some("display name must not be blank".into());
        return Err(err);
    }

    if name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some(
            format!("display name must be at most {MAX_DISPLAY_NAME_LENGTH} characters").into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_reasonable_names() {
        assert!(validate_display_name("Steve").is_ok());
        assert!(validate_display_name("a").is_ok());
        assert!(validate_display_name("exactly16chars__").is_ok());
    }

    #[test]
    fn rejects_blank_names() {
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("   ").is_err());
    }

    #[test]
    fn rejects_overlong_names() {
        assert!(validate_display_name("seventeen-chars__").is_err());
    }
}
