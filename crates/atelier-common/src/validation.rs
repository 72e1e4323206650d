//! Input validation utilities.
//!
//! Centralized validation helpers used across API routes.

use validator::{Validate, ValidationError};

use crate::error::AtelierError;

/// Validate a request body, returning an AtelierError::Validation on failure.
pub fn validate_request<T: Validate>(body: &T) -> Result<(), AtelierError> {
    body.validate().map_err(|e| AtelierError::Validation {
        message: format_validation_errors(e),
    })
}

/// Format validation errors into a human-readable string.
fn format_validation_errors(errors: validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for '{field}'"))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate a skill list: at most 20 entries, each non-empty and at most
/// 50 characters.
pub fn validate_skills(skills: &Vec<String>) -> Result<(), ValidationError> {
    if skills.len() > 20 {
        return Err(ValidationError::new("too_many_skills")
            .with_message("At most 20 skills allowed".into()));
    }
    for skill in skills {
        if skill.trim().is_empty() {
            return Err(ValidationError::new("empty_skill")
                .with_message("Skills cannot be empty".into()));
        }
        if skill.chars().count() > 50 {
            return Err(ValidationError::new("skill_too_long")
                .with_message("Skills must be at most 50 characters".into()));
        }
    }
    Ok(())
}

/// Validate an ordered studio-preference list: non-empty (the first entry is
/// the primary preference), entries non-blank.
pub fn validate_studio_preferences(prefs: &Vec<String>) -> Result<(), ValidationError> {
    if prefs.is_empty() {
        return Err(ValidationError::new("no_studio_preference")
            .with_message("At least one studio preference is required".into()));
    }
    if prefs.iter().any(|p| p.trim().is_empty()) {
        return Err(ValidationError::new("blank_studio_preference")
            .with_message("Studio preferences cannot be blank".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skills_limits() {
        assert!(validate_skills(&vec!["rust".into()]).is_ok());
        assert!(validate_skills(&vec!["x".repeat(51)]).is_err());
        assert!(validate_skills(&vec![" ".into()]).is_err());
        assert!(validate_skills(&(0..21).map(|i| format!("s{i}")).collect()).is_err());
    }

    #[test]
    fn studio_preferences_require_a_primary() {
        assert!(validate_studio_preferences(&vec![]).is_err());
        assert!(validate_studio_preferences(&vec!["Interaction".into()]).is_ok());
    }
}
