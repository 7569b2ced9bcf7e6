use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

// ── Outbound mail settings ────────────────────────────────────

/// Process-wide outbound mail settings.
///
/// Resolved once at startup and handed to the hook by value; the hook never
/// reads the environment itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailSettings {
    /// "From" address stamped on system-generated mail.
    pub from: String,
    pub smtp: SmtpSettings,
}

/// SMTP relay coordinates. Credentials are resolved by the transport from
/// `SMTP_USERNAME` / `SMTP_PASSWORD` at connection time, not stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpSettings {
    pub host: String,
    /// Optional port; the transport defaults to 587 when unset.
    pub port: Option<u16>,
    /// STARTTLS toggle; `None` means on. Port 465 always uses implicit TLS.
    pub tls: Option<bool>,
}

impl MailSettings {
    /// Build settings from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            from: env_or("EMAIL_FROM", "noreply@localhost"),
            smtp: SmtpSettings {
                host: env_or("SMTP_HOST", "localhost"),
                port: env_opt("SMTP_PORT").and_then(|v| v.parse().ok()),
                tls: env_opt("SMTP_TLS").and_then(|v| v.parse().ok()),
            },
        }
    }
}
