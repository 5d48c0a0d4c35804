use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Treats absent and blank strings alike.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// For secrets, which are taken verbatim: only absent and empty strings are missing.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Parses a path identifier; malformed ids are reported like missing ones.
pub(crate) fn parse_id(raw: &str, not_found: &'static str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound(not_found))
}

/// Collects field errors and turns them into a single `AppError::Validation`.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn required(&mut self, field: &'static str, value: &str, message: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(field, message);
        }
        self
    }

    pub fn max_chars(
        &mut self,
        field: &'static str,
        value: &str,
        max: usize,
        message: &str,
    ) -> &mut Self {
        if value.chars().count() > max {
            self.push(field, message);
        }
        self
    }

    pub fn min_chars(
        &mut self,
        field: &'static str,
        value: &str,
        min: usize,
        message: &str,
    ) -> &mut Self {
        if value.chars().count() < min {
            self.push(field, message);
        }
        self
    }

    pub fn email(&mut self, field: &'static str, value: &str) -> &mut Self {
        if !value.is_empty() && !is_valid_email(value) {
            self.push(field, "Please enter a valid email");
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let errors = std::mem::take(&mut self.errors);
        let message = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Err(AppError::Validation { message, errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("alice@example.com"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("alice example.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn collects_every_offending_field() {
        let err = Validator::new()
            .required("name", "  ", "Name is required")
            .max_chars("bio", &"x".repeat(301), 300, "Bio cannot exceed 300 characters")
            .email("email", "nope")
            .finish()
            .unwrap_err();
        match err {
            AppError::Validation { errors, message } => {
                let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["name", "bio", "email"]);
                assert!(message.starts_with("Name is required"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blank_is_missing_for_text_but_not_for_secrets() {
        let blank = Some("   ".to_string());
        assert_eq!(present(&blank), None);
        assert_eq!(non_empty(&blank), Some("   "));
        assert_eq!(non_empty(&Some(String::new())), None);
        assert_eq!(non_empty(&None), None);
    }

    #[test]
    fn malformed_id_is_not_found() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "Post not found").unwrap(), id);
        assert!(matches!(
            parse_id("507f1f77bcf86cd799439011", "Post not found"),
            Err(AppError::NotFound("Post not found"))
        ));
    }

    #[test]
    fn counts_characters_not_bytes() {
        let sixty_cyrillic = "ж".repeat(60);
        assert!(Validator::new()
            .max_chars("name", &sixty_cyrillic, 60, "too long")
            .finish()
            .is_ok());
    }
}
