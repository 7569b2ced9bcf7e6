//! The mail notification hook.
//!
//! Runs after a completed CSV import. Two independent flows, each gated by
//! a profile toggle: a plain-text broadcast to the members of a user group,
//! and a templated message per imported record. Search, rendering, storage,
//! and delivery are delegated to their seams; the hook only sequences them
//! and then hands off to the next handler in the chain.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use importmail_core::config::MailSettings;
use importmail_core::directory::UserDirectory;
use importmail_core::entity::{ImportProfile, RecordId, RecordResolver};
use importmail_core::CoreError;
use importmail_notify::{
    Activity, ActivityLog, ElectronicMail, MailError, MailStore, MailTransport, MailboxConfig,
    OutboundMessage, RenderContext, TemplateRegistry, TemplateRenderer,
};
use importmail_notify::message::MailId;

use crate::chain::{Next, PostImportHook};
use crate::error::HookError;

/// Subject of the group notification, naming the target model.
fn group_subject(profile: &ImportProfile) -> String {
    format!("CSV import {} successful", profile.model.label)
}

/// Body of the group notification: the imported identifiers as a
/// comma-separated list.
fn group_body(records: &[RecordId]) -> String {
    let ids = records
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("CSV import records: {ids}")
}

/// Post-import notification extension.
pub struct SendMailHook {
    settings: MailSettings,
    mailboxes: MailboxConfig,
    directory: Arc<dyn UserDirectory>,
    resolver: Arc<dyn RecordResolver>,
    templates: Arc<TemplateRegistry>,
    renderer: TemplateRenderer,
    store: Arc<dyn MailStore>,
    transport: Arc<dyn MailTransport>,
    activities: Arc<ActivityLog>,
}

impl SendMailHook {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: MailSettings,
        mailboxes: MailboxConfig,
        directory: Arc<dyn UserDirectory>,
        resolver: Arc<dyn RecordResolver>,
        templates: Arc<TemplateRegistry>,
        store: Arc<dyn MailStore>,
        transport: Arc<dyn MailTransport>,
        activities: Arc<ActivityLog>,
    ) -> Self {
        Self {
            settings,
            mailboxes,
            directory,
            resolver,
            templates,
            renderer: TemplateRenderer::new(),
            store,
            transport,
            activities,
        }
    }

    /// Flow 1: one plain-text message to every qualifying group member.
    ///
    /// Zero qualifying members is a silent no-op. A delivery failure
    /// propagates; this flow has no fallback state.
    async fn notify_group(
        &self,
        profile: &ImportProfile,
        records: &[RecordId],
    ) -> Result<(), HookError> {
        let group = profile.email_group.ok_or_else(|| {
            CoreError::Config("'Send Email Group' is on but no email group is set".to_string())
        })?;

        let recipients = self.directory.mail_recipients(group).await;
        if recipients.is_empty() {
            tracing::debug!(
                profile = %profile.name,
                %group,
                "no qualifying recipients, skipping group notification"
            );
            return Ok(());
        }

        let message = OutboundMessage {
            from: self.settings.from.clone(),
            to: recipients.into_iter().map(|u| u.email).collect(),
            subject: group_subject(profile),
            body: group_body(records),
        };

        self.transport.send(&message).await?;
        tracing::info!(
            profile = %profile.name,
            recipients = message.to.len(),
            "sent import notification to group"
        );
        Ok(())
    }

    /// Flow 2: render the profile's template once per imported record,
    /// register activities in bulk, then send immediately unless the
    /// template defers to a queue.
    async fn notify_per_record(
        &self,
        profile: &ImportProfile,
        records: &[RecordId],
    ) -> Result<(), HookError> {
        let template_id = profile.email_template.ok_or_else(|| {
            CoreError::Config("'Send Email Template' is on but no template is set".to_string())
        })?;
        let template = self
            .templates
            .get(template_id)
            .ok_or_else(|| MailError::Config(format!("unknown mail template: {template_id}")))?;

        let mailbox = self.mailboxes.creation_mailbox(&template);

        // Duplicated record ids render twice on purpose; only the created
        // mail set is distinct.
        let mut created: HashSet<MailId> = HashSet::new();
        let mut activities = Vec::with_capacity(records.len());
        for &record in records {
            let resolved = self.resolver.resolve(&profile.model, record).await?;
            let ctx = RenderContext {
                record: resolved,
                model: profile.model.clone(),
                now: Utc::now().to_rfc3339(),
            };
            let rendered = self.renderer.render(&template, &ctx)?;
            let mail = ElectronicMail::from_rendered(&rendered, &self.settings.from, mailbox);
            let id = self.store.create(mail).await?;
            created.insert(id);
            activities.push(Activity::new(record, template.id, id));
        }

        if !activities.is_empty() {
            self.activities.add_activities(activities);
        }

        if !template.queue {
            for id in created {
                self.send_or_draft(id).await?;
            }
        }
        Ok(())
    }

    /// Send one created mail. A transport failure demotes the mail to the
    /// draft mailbox instead of propagating.
    async fn send_or_draft(&self, id: MailId) -> Result<(), HookError> {
        let mail = self
            .store
            .get(id)
            .await
            .ok_or(MailError::MailNotFound(id))?;

        match self.transport.send(&mail.as_outbound()).await {
            Ok(()) => {
                tracing::info!(mail = %mail.display_name(), "sent import notification email");
            }
            Err(e) => {
                tracing::warn!(
                    mail = %mail.display_name(),
                    error = %e,
                    "send failed, moving mail to draft"
                );
                self.store.move_to_mailbox(id, self.mailboxes.draft).await?;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PostImportHook for SendMailHook {
    async fn post_import(
        &self,
        profile: &ImportProfile,
        records: &[RecordId],
        next: Next<'_>,
    ) -> Result<(), HookError> {
        if profile.send_email_group {
            self.notify_group(profile, records).await?;
        }
        if profile.send_email_template && profile.email_template.is_some() {
            self.notify_per_record(profile, records).await?;
        }
        next.run(profile, records).await
    }

    fn name(&self) -> &str {
        "send-mail"
    }
}
