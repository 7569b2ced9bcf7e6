//! Electronic-mail subsystem surface for post-import notifications.
//!
//! This crate provides:
//! - Mailboxes and the configuration singleton with creation-mailbox routing
//! - `MailTemplate` with minijinja rendering of per-record messages
//! - `ElectronicMail` entities behind the `MailStore` seam
//! - `MailTransport` trait with an SMTP implementation via `lettre`
//! - Per-template activity log with bulk registration

pub mod activity;
pub mod error;
pub mod mailbox;
pub mod message;
pub mod template;
pub mod transport;

pub use activity::{Activity, ActivityLog};
pub use error::MailError;
pub use mailbox::{Mailbox, MailboxConfig, MailboxId};
pub use message::{ElectronicMail, InMemoryMailStore, MailId, MailStore, OutboundMessage};
pub use template::{MailTemplate, RenderContext, RenderedMail, TemplateRegistry, TemplateRenderer};
pub use transport::{MailTransport, SmtpMailer};
