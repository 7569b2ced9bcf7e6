//! Mailboxes and the subsystem configuration singleton.
//!
//! A mailbox is a named folder state for mail entities (draft, outbox,
//! sent, ...). The configuration supplies the process-wide defaults and the
//! routing policy that picks the creation mailbox for new template mail.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::template::MailTemplate;

pub type MailboxId = Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mailbox {
    pub id: MailboxId,
    pub name: String,
}

impl Mailbox {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// Mail-subsystem configuration: the default draft/outbox/sent mailboxes.
///
/// Read-only from the hook's point of view; constructed once and shared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxConfig {
    pub draft: MailboxId,
    pub outbox: MailboxId,
    pub sent: MailboxId,
    /// When on, every new template mail is created in the default outbox,
    /// ignoring the queue/template-based selection below. Off by default;
    /// see DESIGN.md for why this exists at all.
    #[serde(default)]
    pub route_all_to_outbox: bool,
}

impl MailboxConfig {
    pub fn new(draft: MailboxId, outbox: MailboxId, sent: MailboxId) -> Self {
        Self {
            draft,
            outbox,
            sent,
            route_all_to_outbox: false,
        }
    }

    /// Pick the mailbox newly created mail for `template` lands in.
    ///
    /// Queued templates go to the template's outbox override or the default
    /// outbox; immediate templates go to the template's configured mailbox
    /// or the default sent mailbox.
    pub fn creation_mailbox(&self, template: &MailTemplate) -> MailboxId {
        if self.route_all_to_outbox {
            return self.outbox;
        }
        if template.queue {
            template.mailbox_outbox.unwrap_or(self.outbox)
        } else {
            template.mailbox.unwrap_or(self.sent)
        }
    }
}
