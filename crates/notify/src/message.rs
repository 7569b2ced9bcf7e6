//! Electronic-mail entities and the mail store seam.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MailError;
use crate::mailbox::MailboxId;
use crate::template::RenderedMail;

pub type MailId = Uuid;

/// A transport payload: one message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl OutboundMessage {
    /// Comma-joined To header value.
    pub fn to_header(&self) -> String {
        self.to.join(",")
    }
}

/// A persisted mail entity with a mailbox lifecycle
/// (created → optionally queued → sent, or reverted to draft on failure).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectronicMail {
    pub id: MailId,
    pub mailbox: MailboxId,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl ElectronicMail {
    /// Build a mail entity from rendered template output.
    pub fn from_rendered(rendered: &RenderedMail, from: impl Into<String>, mailbox: MailboxId) -> Self {
        Self {
            id: Uuid::new_v4(),
            mailbox,
            from: from.into(),
            to: vec![rendered.to.clone()],
            subject: rendered.subject.clone(),
            body: rendered.body.clone(),
            created_at: Utc::now(),
        }
    }

    /// Human-readable name used in log lines.
    pub fn display_name(&self) -> &str {
        &self.subject
    }

    pub fn as_outbound(&self) -> OutboundMessage {
        OutboundMessage {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: self.subject.clone(),
            body: self.body.clone(),
        }
    }
}

// ── Store seam ──────────────────────────────────────────────────────

/// Persistence for mail entities, owned by the host storage layer.
#[async_trait::async_trait]
pub trait MailStore: Send + Sync {
    /// Persist a new mail entity in its creation mailbox.
    async fn create(&self, mail: ElectronicMail) -> Result<MailId, MailError>;

    /// Move an existing mail to another mailbox and persist the change.
    async fn move_to_mailbox(&self, id: MailId, mailbox: MailboxId) -> Result<(), MailError>;

    async fn get(&self, id: MailId) -> Option<ElectronicMail>;

    /// All mail currently in `mailbox`, in no particular order.
    async fn in_mailbox(&self, mailbox: MailboxId) -> Vec<ElectronicMail>;
}

/// In-memory mail store for embedding and tests.
#[derive(Default)]
pub struct InMemoryMailStore {
    mails: RwLock<HashMap<MailId, ElectronicMail>>,
}

impl InMemoryMailStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.mails.read().expect("mail store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl MailStore for InMemoryMailStore {
    async fn create(&self, mail: ElectronicMail) -> Result<MailId, MailError> {
        let id = mail.id;
        let mut guard = self.mails.write().expect("mail store lock poisoned");
        guard.insert(id, mail);
        Ok(id)
    }

    async fn move_to_mailbox(&self, id: MailId, mailbox: MailboxId) -> Result<(), MailError> {
        let mut guard = self.mails.write().expect("mail store lock poisoned");
        let mail = guard.get_mut(&id).ok_or(MailError::MailNotFound(id))?;
        mail.mailbox = mailbox;
        Ok(())
    }

    async fn get(&self, id: MailId) -> Option<ElectronicMail> {
        let guard = self.mails.read().expect("mail store lock poisoned");
        guard.get(&id).cloned()
    }

    async fn in_mailbox(&self, mailbox: MailboxId) -> Vec<ElectronicMail> {
        let guard = self.mails.read().expect("mail store lock poisoned");
        guard
            .values()
            .filter(|m| m.mailbox == mailbox)
            .cloned()
            .collect()
    }
}
