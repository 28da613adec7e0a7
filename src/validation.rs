/*!
 * Form validation for student and comment input.
 *
 * Checks run before anything reaches the repository, so a rejected form
 * never touches the store. Each check collects every failing field instead
 * of stopping at the first one.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::database::models::{Gpa, StudentRecord};
use crate::errors::{FieldError, ValidationError};

/// Loose address shape: something@something.tld, no whitespace
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

fn finish(errors: Vec<FieldError>) -> Result<(), ValidationError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Invalid(errors))
    }
}

/// Validate a student form
pub fn validate_student(record: &StudentRecord) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    if record.first_name.trim().is_empty() {
        errors.push(FieldError::new("first_name", "is required"));
    }
    if record.last_name.trim().is_empty() {
        errors.push(FieldError::new("last_name", "is required"));
    }
    if record.gpa < Gpa::ZERO || record.gpa > Gpa::MAX {
        errors.push(FieldError::new(
            "gpa",
            format!("must be between {} and {}", Gpa::ZERO, Gpa::MAX),
        ));
    }

    finish(errors)
}

/// Validate comment text
pub fn validate_comment(text: &str) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    if text.trim().is_empty() {
        errors.push(FieldError::new("text", "is required"));
    }

    finish(errors)
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_PATTERN.is_match(email.trim()) {
        Ok(())
    } else {
        finish(vec![FieldError::new("email", "is not a valid address")])
    }
}
