//! Declarative profile validation with structured errors and warnings.
//!
//! The conditional-required rule (a reference field is mandatory exactly
//! when its paired toggle is on) is evaluated here generically. Hook code
//! never re-checks it.

use serde::{Deserialize, Serialize};

use crate::entity::ImportProfile;

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field-path-like location, e.g. `"email_group"`.
    pub path: String,
    pub message: String,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the notification settings of an [`ImportProfile`].
pub fn validate_profile(profile: &ImportProfile) -> ValidationResult {
    let mut result = ValidationResult::new();

    if profile.send_email_group && profile.email_group.is_none() {
        result.error(
            "email_group",
            "'Send Email Group' requires an email group",
        );
    }
    if profile.send_email_template && profile.email_template.is_none() {
        result.error(
            "email_template",
            "'Send Email Template' requires an email template",
        );
    }

    if !profile.send_email_group && profile.email_group.is_some() {
        result.warn(
            "email_group",
            "Email group is set but 'Send Email Group' is off; it has no effect",
        );
    }
    if !profile.send_email_template && profile.email_template.is_some() {
        result.warn(
            "email_template",
            "Email template is set but 'Send Email Template' is off; it has no effect",
        );
    }

    if profile.model.name.is_empty() {
        result.error("model", "Profile has no target model");
    }

    result
}
