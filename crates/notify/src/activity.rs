//! Per-template activity log.
//!
//! Each entry links one imported record, the template used, and the
//! resulting mail entity. Entries are registered in bulk at the end of a
//! render pass and kept per template. Uses `std::sync::RwLock` so it can be
//! read from sync contexts as well.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use importmail_core::entity::{RecordId, TemplateId};

use crate::message::MailId;

/// Audit entry for one rendered record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub record: RecordId,
    pub template: TemplateId,
    pub mail: MailId,
    pub at: DateTime<Utc>,
}

impl Activity {
    pub fn new(record: RecordId, template: TemplateId, mail: MailId) -> Self {
        Self {
            record,
            template,
            mail,
            at: Utc::now(),
        }
    }
}

/// In-memory per-template activity log.
#[derive(Default)]
pub struct ActivityLog {
    entries: RwLock<HashMap<TemplateId, Vec<Activity>>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a batch of activities, preserving input order per template.
    pub fn add_activities(&self, activities: Vec<Activity>) {
        if activities.is_empty() {
            return;
        }
        let mut guard = self.entries.write().expect("activity lock poisoned");
        for activity in activities {
            guard.entry(activity.template).or_default().push(activity);
        }
    }

    /// Entries for a template, newest-first, capped at `limit` when given.
    pub fn query(&self, template: TemplateId, limit: Option<usize>) -> Vec<Activity> {
        let guard = self.entries.read().expect("activity lock poisoned");
        let Some(entries) = guard.get(&template) else {
            return Vec::new();
        };
        entries
            .iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// Entries for a template in registration order.
    pub fn for_template(&self, template: TemplateId) -> Vec<Activity> {
        let guard = self.entries.read().expect("activity lock poisoned");
        guard.get(&template).cloned().unwrap_or_default()
    }

    pub fn count(&self, template: TemplateId) -> usize {
        let guard = self.entries.read().expect("activity lock poisoned");
        guard.get(&template).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn bulk_add_preserves_order() {
        let log = ActivityLog::new();
        let template = Uuid::new_v4();
        log.add_activities(vec![
            Activity::new(101, template, Uuid::new_v4()),
            Activity::new(102, template, Uuid::new_v4()),
            Activity::new(101, template, Uuid::new_v4()),
        ]);

        let entries = log.for_template(template);
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries.iter().map(|a| a.record).collect::<Vec<_>>(),
            vec![101, 102, 101]
        );
    }

    #[test]
    fn empty_batch_registers_nothing() {
        let log = ActivityLog::new();
        log.add_activities(Vec::new());
        assert_eq!(log.count(Uuid::new_v4()), 0);
    }

    #[test]
    fn query_is_newest_first_with_limit() {
        let log = ActivityLog::new();
        let template = Uuid::new_v4();
        log.add_activities(
            (1..=5)
                .map(|i| Activity::new(i, template, Uuid::new_v4()))
                .collect(),
        );

        let entries = log.query(template, Some(2));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].record, 5);
        assert_eq!(entries[1].record, 4);
    }

    #[test]
    fn templates_are_isolated() {
        let log = ActivityLog::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        log.add_activities(vec![Activity::new(1, a, Uuid::new_v4())]);
        log.add_activities(vec![Activity::new(2, b, Uuid::new_v4())]);

        assert_eq!(log.count(a), 1);
        assert_eq!(log.count(b), 1);
        assert_eq!(log.for_template(a)[0].record, 1);
    }

    #[test]
    fn query_unknown_template_is_empty() {
        let log = ActivityLog::new();
        assert!(log.query(Uuid::new_v4(), None).is_empty());
    }
}
