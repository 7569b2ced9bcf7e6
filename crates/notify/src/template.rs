//! Mail templates and minijinja rendering.
//!
//! Template strings are stored on the template entity (not pre-registered
//! files), so a fresh [`minijinja::Environment`] is created per render call.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use importmail_core::entity::{ModelRef, TemplateId};

use crate::error::MailError;
use crate::mailbox::MailboxId;

/// A renderable mail template bound to a target model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailTemplate {
    pub id: TemplateId,
    pub name: String,
    /// Model whose records this template renders against.
    pub model: ModelRef,
    /// Recipient template, rendered per record (e.g. `"{{ record.email }}"`).
    pub to: String,
    pub subject: String,
    pub body: String,
    /// When true, created mail is left for an external dispatch process
    /// instead of being sent immediately.
    #[serde(default)]
    pub queue: bool,
    /// Creation mailbox for immediate (non-queued) mail.
    #[serde(default)]
    pub mailbox: Option<MailboxId>,
    /// Creation mailbox for queued mail.
    #[serde(default)]
    pub mailbox_outbox: Option<MailboxId>,
}

impl MailTemplate {
    pub fn new(
        name: impl Into<String>,
        model: ModelRef,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            model,
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            queue: false,
            mailbox: None,
            mailbox_outbox: None,
        }
    }

    pub fn queued(mut self) -> Self {
        self.queue = true;
        self
    }
}

/// In-memory template lookup keyed by id.
#[derive(Default)]
pub struct TemplateRegistry {
    templates: RwLock<HashMap<TemplateId, MailTemplate>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, template: MailTemplate) -> TemplateId {
        let id = template.id;
        let mut guard = self.templates.write().expect("template lock poisoned");
        guard.insert(id, template);
        id
    }

    pub fn get(&self, id: TemplateId) -> Option<MailTemplate> {
        let guard = self.templates.read().expect("template lock poisoned");
        guard.get(&id).cloned()
    }
}

// ── Rendering ───────────────────────────────────────────────────────

/// Context data available to template strings.
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext {
    /// The resolved domain record as a flat JSON object.
    pub record: serde_json::Value,
    /// The profile's target model.
    pub model: ModelRef,
    /// Render timestamp in ISO 8601 format.
    pub now: String,
}

/// Rendered message payload: recipient, subject, and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Renders mail templates using minijinja.
#[derive(Debug, Default)]
pub struct TemplateRenderer {
    _private: (),
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Render recipient, subject, and body of `template` against `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::Template`] if any of the three template strings
    /// is invalid or fails to evaluate.
    pub fn render(
        &self,
        template: &MailTemplate,
        ctx: &RenderContext,
    ) -> Result<RenderedMail, MailError> {
        let env = minijinja::Environment::new();
        let render_one = |tpl: &str| {
            env.render_str(tpl, ctx)
                .map_err(|e| MailError::Template(e.to_string()))
        };
        Ok(RenderedMail {
            to: render_one(&template.to)?,
            subject: render_one(&template.subject)?,
            body: render_one(&template.body)?,
        })
    }

    /// Check a template string for syntax errors without evaluating it.
    pub fn validate(&self, template_str: &str) -> Result<(), MailError> {
        let env = minijinja::Environment::new();
        env.template_from_str(template_str)
            .map_err(|e| MailError::Template(e.to_string()))?;
        Ok(())
    }
}
