//! Shared error type for the mail subsystem.

use uuid::Uuid;

/// Errors that can occur while rendering, storing, or delivering mail.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Mail not found: {0}")]
    MailNotFound(Uuid),
}
