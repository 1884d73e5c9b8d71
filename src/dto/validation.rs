//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a display name contains at least one non-whitespace character.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("display_name_blank");
        err.message = Some("Name must not be empty".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a quiz option list: at least two entries, none of them blank.
pub fn validate_quiz_options(options: &[String]) -> Result<(), ValidationError> {
    if options.len() < 2 {
        let mut err = ValidationError::new("options_too_few");
        err.message =
            Some(format!("A quiz needs at least 2 options (got {})", options.len()).into());
        return Err(err);
    }

    if options.iter().any(|option| option.trim().is_empty()) {
        let mut err = ValidationError::new("option_blank");
        err.message = Some("Quiz options must not be empty".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_display_name() {
        assert!(validate_display_name("Team 1").is_ok());
        assert!(validate_display_name("  padded  ").is_ok());
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("   ").is_err());
    }

    #[test]
    fn test_validate_quiz_options_count() {
        assert!(validate_quiz_options(&["a".into(), "b".into()]).is_ok());
        assert!(validate_quiz_options(&["a".into()]).is_err());
        assert!(validate_quiz_options(&[]).is_err());
    }

    #[test]
    fn test_validate_quiz_options_blank_entry() {
        assert!(validate_quiz_options(&["a".into(), " ".into()]).is_err());
        assert!(validate_quiz_options(&["a".into(), "".into(), "c".into()]).is_err());
    }
}
