//! Import-side entities and the record-resolution seam.
//!
//! The profile and archive are owned by the host import pipeline; this
//! module only adds the notification settings to the profile and consumes
//! the archive's record list. Concrete domain records stay behind the
//! [`RecordResolver`] trait and surface as JSON objects for rendering.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

pub type ProfileId = Uuid;
pub type ArchiveId = Uuid;
pub type GroupId = Uuid;
pub type TemplateId = Uuid;

/// Identifier of one record written by an import run.
pub type RecordId = i64;

/// Reference to a host model: storage name plus human-readable label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef {
    /// Storage name, e.g. `"party.party"`.
    pub name: String,
    /// Display label, e.g. `"Party"`.
    pub label: String,
}

impl ModelRef {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

/// Configuration for one CSV import definition, extended with the
/// notification settings this module adds.
///
/// A reference field is mandatory exactly when its paired toggle is true;
/// that rule lives in [`crate::validation`], never in hook logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportProfile {
    pub id: ProfileId,
    pub name: String,
    /// Target model the import writes records into.
    pub model: ModelRef,
    #[serde(default)]
    pub send_email_group: bool,
    #[serde(default)]
    pub email_group: Option<GroupId>,
    #[serde(default)]
    pub send_email_template: bool,
    #[serde(default)]
    pub email_template: Option<TemplateId>,
}

impl ImportProfile {
    /// New profile with both notification flows disabled.
    pub fn new(name: impl Into<String>, model: ModelRef) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            model,
            send_email_group: false,
            email_group: None,
            send_email_template: false,
            email_template: None,
        }
    }
}

/// Record of one completed import run: the profile used and the ordered
/// identifiers of the records it created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportArchive {
    pub id: ArchiveId,
    pub profile: ProfileId,
    pub records: Vec<RecordId>,
    pub created_at: DateTime<Utc>,
}

impl ImportArchive {
    pub fn new(profile: ProfileId, records: Vec<RecordId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            profile,
            records,
            created_at: Utc::now(),
        }
    }
}

// ── Record resolution seam ──────────────────────────────────────────

/// Resolves an imported record identifier against its model.
///
/// Owned by the host storage layer; a missing record is a
/// [`CoreError::RecordNotFound`], surfaced to the caller unhandled.
#[async_trait::async_trait]
pub trait RecordResolver: Send + Sync {
    /// Load the record as a flat JSON object for template rendering.
    async fn resolve(&self, model: &ModelRef, id: RecordId) -> Result<serde_json::Value, CoreError>;
}

/// In-memory resolver keyed by `(model name, record id)`.
#[derive(Default)]
pub struct InMemoryRecords {
    records: RwLock<HashMap<(String, RecordId), serde_json::Value>>,
}

impl InMemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, model: &ModelRef, id: RecordId, record: serde_json::Value) {
        let mut guard = self.records.write().expect("records lock poisoned");
        guard.insert((model.name.clone(), id), record);
    }
}

#[async_trait::async_trait]
impl RecordResolver for InMemoryRecords {
    async fn resolve(&self, model: &ModelRef, id: RecordId) -> Result<serde_json::Value, CoreError> {
        let guard = self.records.read().expect("records lock poisoned");
        guard
            .get(&(model.name.clone(), id))
            .cloned()
            .ok_or_else(|| CoreError::RecordNotFound {
                model: model.name.clone(),
                id,
            })
    }
}
