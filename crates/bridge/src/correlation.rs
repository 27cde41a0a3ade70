use crate::Command;
use std::collections::HashMap;

/// The commands still waiting for a response, keyed by command id.
///
/// Entries never expire. A command whose handler never completes stays
/// pending until its session ends.
#[derive(Debug, Default)]
pub struct CorrelationTracker {
    pending: HashMap<String, Command>,
}

impl CorrelationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a command unless it opted out of a response.
    ///
    /// Reusing the id of a command that is still in flight replaces the
    /// earlier entry, so only one response will be correlated for that id.
    pub fn register(&mut self, command: &Command) {
        if !command.requires_response() {
            return;
        }
        if self
            .pending
            .insert(command.id.clone(), command.clone())
            .is_some()
        {
            log::warn!(
                "Command id {} reused while still pending, replacing earlier entry",
                command.id
            );
        }
    }

    /// Stops tracking a command, returning it if it was pending.
    pub fn resolve(&mut self, id: &str) -> Option<Command> {
        self.pending.remove(id)
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
