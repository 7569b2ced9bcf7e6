//! Ordered chain of post-import handlers.
//!
//! The host import pipeline drives the chain once per completed run.
//! Independently registered hooks compose in registration order; each hook
//! is required to invoke `next` so later registrations still run. The base
//! behavior past the last hook is a no-op.

use std::sync::Arc;

use importmail_core::entity::{ImportProfile, RecordId};

use crate::error::HookError;

/// One post-import extension.
#[async_trait::async_trait]
pub trait PostImportHook: Send + Sync {
    /// Perform this hook's side effects, then call `next.run` with the same
    /// arguments to preserve the extension-chain contract.
    async fn post_import(
        &self,
        profile: &ImportProfile,
        records: &[RecordId],
        next: Next<'_>,
    ) -> Result<(), HookError>;

    /// Human-readable name for chain tracing.
    fn name(&self) -> &str;
}

/// Handle to the hooks registered after the current one.
pub struct Next<'a> {
    hooks: &'a [Arc<dyn PostImportHook>],
}

impl Next<'_> {
    /// Run the remainder of the chain.
    pub async fn run(self, profile: &ImportProfile, records: &[RecordId]) -> Result<(), HookError> {
        match self.hooks.split_first() {
            Some((head, tail)) => {
                tracing::debug!(hook = head.name(), "running post-import hook");
                head.post_import(profile, records, Next { hooks: tail }).await
            }
            None => Ok(()),
        }
    }
}

/// Ordered registry of post-import hooks.
#[derive(Default)]
pub struct HookChain {
    hooks: Vec<Arc<dyn PostImportHook>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook to the end of the chain.
    pub fn register(&mut self, hook: Arc<dyn PostImportHook>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Drive the whole chain for one completed import.
    pub async fn run(&self, profile: &ImportProfile, records: &[RecordId]) -> Result<(), HookError> {
        Next { hooks: &self.hooks }.run(profile, records).await
    }
}
