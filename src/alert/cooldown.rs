use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::alert::engine::{AlertDecision, AlertPolicy};
use crate::metrics::Assessment;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CooldownEntry {
    pub last_alert_at: Option<DateTime<Utc>>,
}

/// Last-dispatch timestamps per entity, for the lifetime of the process.
#[derive(Debug, Default)]
pub struct CooldownStore {
    entries: Mutex<HashMap<String, CooldownEntry>>,
}

impl CooldownStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the policy for one entity and, on `Dispatch`, record `now` before
    /// releasing the lock. The timestamp is committed before any delivery is
    /// attempted, so a failed send still starts the cooldown.
    pub fn evaluate(
        &self,
        policy: &AlertPolicy,
        assessment: &Assessment,
        now: DateTime<Utc>,
    ) -> AlertDecision {
        let mut guard = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let entry = guard
            .entry(assessment.reading.entity_id.clone())
            .or_default();
        let decision = policy.evaluate(assessment, entry.last_alert_at, now);
        if matches!(decision, AlertDecision::Dispatch { .. }) {
            entry.last_alert_at = Some(now);
        }
        decision
    }

    pub fn get(&self, entity_id: &str) -> Option<CooldownEntry> {
        let guard = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.get(entity_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
