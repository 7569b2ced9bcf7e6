//! End-to-end scenarios for the post-import notification hook, driven
//! through the hook chain with in-memory seams and a recording transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use importmail_core::config::{MailSettings, SmtpSettings};
use importmail_core::directory::{Group, InMemoryDirectory, User, UserDirectory};
use importmail_core::entity::{ImportArchive, ImportProfile, InMemoryRecords, ModelRef, RecordId};
use importmail_hook::{HookChain, HookError, Next, PostImportHook, SendMailHook};
use importmail_notify::{
    ActivityLog, InMemoryMailStore, MailError, MailStore, MailTemplate, MailTransport, Mailbox,
    MailboxConfig, OutboundMessage, TemplateRegistry,
};

// ── Test doubles and fixtures ───────────────────────────────────────

/// Transport that records every message and can be switched to fail.
struct RecordingTransport {
    sent: Mutex<Vec<OutboundMessage>>,
    fail: AtomicBool,
}

impl RecordingTransport {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    fn failing() -> Self {
        let transport = Self::new();
        transport.fail.store(true, Ordering::SeqCst);
        transport
    }

    fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<(), MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Smtp("simulated transport failure".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Everything a scenario needs, wired together around one profile.
struct World {
    profile: ImportProfile,
    mailboxes: MailboxConfig,
    directory: Arc<InMemoryDirectory>,
    records: Arc<InMemoryRecords>,
    templates: Arc<TemplateRegistry>,
    store: Arc<InMemoryMailStore>,
    transport: Arc<RecordingTransport>,
    activities: Arc<ActivityLog>,
    chain: HookChain,
}

fn model() -> ModelRef {
    ModelRef::new("party.party", "Party")
}

fn settings() -> MailSettings {
    MailSettings {
        from: "imports@example.com".to_string(),
        smtp: SmtpSettings {
            host: "localhost".to_string(),
            port: None,
            tls: None,
        },
    }
}

fn build_world(transport: RecordingTransport) -> World {
    let profile = ImportProfile::new("parties", model());
    let mailboxes = MailboxConfig::new(
        Mailbox::new("Draft").id,
        Mailbox::new("Outbox").id,
        Mailbox::new("Sent").id,
    );
    let directory = Arc::new(InMemoryDirectory::new());
    let records = Arc::new(InMemoryRecords::new());
    let templates = Arc::new(TemplateRegistry::new());
    let store = Arc::new(InMemoryMailStore::new());
    let transport = Arc::new(transport);
    let activities = Arc::new(ActivityLog::new());

    let hook = SendMailHook::new(
        settings(),
        mailboxes.clone(),
        directory.clone() as Arc<dyn UserDirectory>,
        records.clone(),
        templates.clone(),
        store.clone(),
        transport.clone(),
        activities.clone(),
    );
    let mut chain = HookChain::new();
    chain.register(Arc::new(hook));

    World {
        profile,
        mailboxes,
        directory,
        records,
        templates,
        store,
        transport,
        activities,
        chain,
    }
}

fn world() -> World {
    build_world(RecordingTransport::new())
}

/// Add a group with the given members; `(login, email, active)`.
fn add_group(world: &World, members: &[(&str, &str, bool)]) -> Group {
    let group = Group::new("import watchers");
    for (login, email, active) in members {
        let mut user = User::new(*login, *email).in_group(group.id);
        if !active {
            user = user.inactive();
        }
        world.directory.add_user(user);
    }
    group
}

/// Register a welcome template and seed one record per id.
fn add_template(world: &World, queue: bool, record_ids: &[RecordId]) -> MailTemplate {
    let mut template = MailTemplate::new(
        "welcome",
        model(),
        "{{ record.email }}",
        "Welcome {{ record.name }}",
        "Your {{ model.label }} record was imported.",
    );
    if queue {
        template = template.queued();
    }
    let template = world.templates.get(world.templates.insert(template)).unwrap();

    for id in record_ids {
        world.records.insert(
            &model(),
            *id,
            serde_json::json!({
                "name": format!("Party {id}"),
                "email": format!("party{id}@example.com"),
            }),
        );
    }
    template
}

// ── Flow 1: group notification ──────────────────────────────────────

#[tokio::test]
async fn disabled_group_flow_sends_nothing() {
    let mut w = world();
    let group = add_group(&w, &[("alice", "alice@x", true)]);
    // Reference set but toggle off: still nothing.
    w.profile.email_group = Some(group.id);

    w.chain.run(&w.profile, &[101]).await.unwrap();
    assert!(w.transport.sent().is_empty());
}

#[tokio::test]
async fn group_without_qualifying_users_is_a_silent_noop() {
    let mut w = world();
    let group = add_group(&w, &[("bob", "bob@x", false), ("carol", "", true)]);
    w.profile.send_email_group = true;
    w.profile.email_group = Some(group.id);

    w.chain.run(&w.profile, &[101]).await.unwrap();
    assert!(w.transport.sent().is_empty());
}

#[tokio::test]
async fn group_email_reaches_every_qualifying_member() {
    let mut w = world();
    let group = add_group(
        &w,
        &[
            ("alice", "alice@x", true),
            ("bob", "bob@x", true),
            ("carol", "carol@x", true),
        ],
    );
    w.profile.send_email_group = true;
    w.profile.email_group = Some(group.id);

    w.chain.run(&w.profile, &[101, 102, 103]).await.unwrap();

    let sent = w.transport.sent();
    assert_eq!(sent.len(), 1);
    let message = &sent[0];
    assert_eq!(message.from, "imports@example.com");
    assert_eq!(message.to.len(), 3);
    assert!(message.to.contains(&"alice@x".to_string()));
    assert!(message.to.contains(&"bob@x".to_string()));
    assert!(message.to.contains(&"carol@x".to_string()));
    assert_eq!(message.subject, "CSV import Party successful");
    assert_eq!(message.body, "CSV import records: 101, 102, 103");
}

#[tokio::test]
async fn inactive_members_are_left_out() {
    let mut w = world();
    let group = add_group(&w, &[("alice", "alice@x", true), ("bob", "bob@x", false)]);
    w.profile.send_email_group = true;
    w.profile.email_group = Some(group.id);

    w.chain.run(&w.profile, &[7]).await.unwrap();

    let sent = w.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["alice@x".to_string()]);
}

#[tokio::test]
async fn group_transport_failure_propagates() {
    let mut w = build_world(RecordingTransport::failing());
    let group = add_group(&w, &[("alice", "alice@x", true)]);
    w.profile.send_email_group = true;
    w.profile.email_group = Some(group.id);

    let err = w.chain.run(&w.profile, &[1]).await.unwrap_err();
    assert!(matches!(err, HookError::Mail(MailError::Smtp(_))));
}

#[tokio::test]
async fn group_toggle_without_reference_is_a_config_error() {
    let mut w = world();
    w.profile.send_email_group = true;

    let err = w.chain.run(&w.profile, &[1]).await.unwrap_err();
    assert!(matches!(err, HookError::Core(_)));
}

// ── Flow 2: templated per-record notification ───────────────────────

#[tokio::test]
async fn disabled_template_flow_creates_nothing() {
    let mut w = world();
    let template = add_template(&w, false, &[101]);
    // Template configured but toggle off.
    w.profile.email_template = Some(template.id);

    w.chain.run(&w.profile, &[101]).await.unwrap();

    assert!(w.store.is_empty());
    assert_eq!(w.activities.count(template.id), 0);
    assert!(w.transport.sent().is_empty());
}

#[tokio::test]
async fn immediate_template_sends_one_mail_per_record() {
    let mut w = world();
    let template = add_template(&w, false, &[101, 102]);
    w.profile.send_email_template = true;
    w.profile.email_template = Some(template.id);

    w.chain.run(&w.profile, &[101, 102]).await.unwrap();

    // One activity per record, matching input order.
    let activities = w.activities.for_template(template.id);
    assert_eq!(activities.len(), 2);
    assert_eq!(activities[0].record, 101);
    assert_eq!(activities[1].record, 102);

    // Non-queued templates create in the default sent mailbox; a
    // successful send leaves them there.
    let in_sent = w.store.in_mailbox(w.mailboxes.sent).await;
    assert_eq!(in_sent.len(), 2);
    assert_eq!(w.transport.sent().len(), 2);

    // Each activity points at a real stored mail for its record.
    for activity in &activities {
        let mail = w.store.get(activity.mail).await.unwrap();
        assert_eq!(
            mail.to,
            vec![format!("party{}@example.com", activity.record)]
        );
    }
}

#[tokio::test]
async fn queued_template_defers_delivery() {
    let mut w = world();
    let template = add_template(&w, true, &[101, 102]);
    w.profile.send_email_template = true;
    w.profile.email_template = Some(template.id);

    w.chain.run(&w.profile, &[101, 102]).await.unwrap();

    // No send attempt; mail stays in its creation mailbox (the outbox).
    assert!(w.transport.sent().is_empty());
    assert_eq!(w.store.in_mailbox(w.mailboxes.outbox).await.len(), 2);
    assert_eq!(w.activities.count(template.id), 2);
}

#[tokio::test]
async fn failed_send_degrades_mail_to_draft() {
    let mut w = build_world(RecordingTransport::failing());
    let template = add_template(&w, false, &[101]);
    w.profile.send_email_template = true;
    w.profile.email_template = Some(template.id);

    // The per-record flow swallows transport failures into a state change.
    w.chain.run(&w.profile, &[101]).await.unwrap();

    assert_eq!(w.store.in_mailbox(w.mailboxes.draft).await.len(), 1);
    assert!(w.store.in_mailbox(w.mailboxes.sent).await.is_empty());
    // The activity was still registered before the send attempt.
    assert_eq!(w.activities.count(template.id), 1);
}

#[tokio::test]
async fn empty_import_renders_nothing() {
    let mut w = world();
    let template = add_template(&w, false, &[]);
    w.profile.send_email_template = true;
    w.profile.email_template = Some(template.id);

    w.chain.run(&w.profile, &[]).await.unwrap();

    assert!(w.store.is_empty());
    assert_eq!(w.activities.count(template.id), 0);
    assert!(w.transport.sent().is_empty());
}

#[tokio::test]
async fn unresolvable_record_propagates() {
    let mut w = world();
    let template = add_template(&w, false, &[101]);
    w.profile.send_email_template = true;
    w.profile.email_template = Some(template.id);

    // 999 was never imported into the resolver.
    let err = w.chain.run(&w.profile, &[101, 999]).await.unwrap_err();
    assert!(matches!(err, HookError::Core(_)));
}

#[tokio::test]
async fn rerunning_the_hook_creates_independent_mail() {
    let mut w = world();
    let template = add_template(&w, false, &[101, 102]);
    w.profile.send_email_template = true;
    w.profile.email_template = Some(template.id);

    // Two independent archives of the same profile and records.
    let first = ImportArchive::new(w.profile.id, vec![101, 102]);
    let second = ImportArchive::new(w.profile.id, vec![101, 102]);
    assert_ne!(first.id, second.id);

    w.chain.run(&w.profile, &first.records).await.unwrap();
    w.chain.run(&w.profile, &second.records).await.unwrap();

    // No dedup across invocations.
    assert_eq!(w.store.len(), 4);
    assert_eq!(w.activities.count(template.id), 4);
    assert_eq!(w.transport.sent().len(), 4);
}

// ── Both flows and chain composition ────────────────────────────────

#[tokio::test]
async fn both_flows_run_on_one_import() {
    let mut w = world();
    let group = add_group(&w, &[("alice", "alice@x", true)]);
    let template = add_template(&w, false, &[101, 102]);
    w.profile.send_email_group = true;
    w.profile.email_group = Some(group.id);
    w.profile.send_email_template = true;
    w.profile.email_template = Some(template.id);

    w.chain.run(&w.profile, &[101, 102]).await.unwrap();

    // One group broadcast plus one templated mail per record.
    let sent = w.transport.sent();
    assert_eq!(sent.len(), 3);
    let broadcasts: Vec<_> = sent.iter().filter(|m| m.to == vec!["alice@x"]).collect();
    assert_eq!(broadcasts.len(), 1);
}

struct TailHook {
    ran: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl PostImportHook for TailHook {
    async fn post_import(
        &self,
        profile: &ImportProfile,
        records: &[RecordId],
        next: Next<'_>,
    ) -> Result<(), HookError> {
        self.ran.store(true, Ordering::SeqCst);
        next.run(profile, records).await
    }

    fn name(&self) -> &str {
        "tail"
    }
}

#[tokio::test]
async fn later_hooks_still_run_after_notifications() {
    let mut w = world();
    let template = add_template(&w, false, &[101]);
    w.profile.send_email_template = true;
    w.profile.email_template = Some(template.id);

    let ran = Arc::new(AtomicBool::new(false));
    w.chain.register(Arc::new(TailHook { ran: ran.clone() }));

    w.chain.run(&w.profile, &[101]).await.unwrap();
    assert!(ran.load(Ordering::SeqCst));
    assert_eq!(w.transport.sent().len(), 1);
}
