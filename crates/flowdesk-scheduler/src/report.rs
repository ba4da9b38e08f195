//! Failure reporting — where rule and task failures end up.
//!
//! The scheduler and the rule engine never propagate failures upward; they
//! hand them to an `ErrorReporter` that was passed in at construction.
//! `FailureLog` keeps a bounded in-memory history (ring buffer, last 100).

use std::any::Any;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use flowdesk_core::{EntityKind, FlowdeskError};
use serde::Serialize;

/// Where a failure happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum FailureOrigin {
    /// A scheduled task returned an error or panicked.
    Task { id: String, name: String },
    /// A rule predicate panicked.
    RuleCondition {
        rule: String,
        entity_kind: EntityKind,
        entity_id: String,
    },
    /// A rule action returned an error or panicked.
    RuleAction {
        rule: String,
        entity_kind: EntityKind,
        entity_id: String,
    },
}

impl std::fmt::Display for FailureOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureOrigin::Task { id, name } => write!(f, "task '{name}' ({id})"),
            FailureOrigin::RuleCondition {
                rule,
                entity_kind,
                entity_id,
            } => write!(f, "condition of rule '{rule}' on {entity_kind} {entity_id}"),
            FailureOrigin::RuleAction {
                rule,
                entity_kind,
                entity_id,
            } => write!(f, "action of rule '{rule}' on {entity_kind} {entity_id}"),
        }
    }
}

/// One recorded failure. `kind` is the `FlowdeskError::kind` label.
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub origin: FailureOrigin,
    pub kind: &'static str,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl FailureReport {
    pub fn new(origin: FailureOrigin, error: &FlowdeskError, at: DateTime<Utc>) -> Self {
        Self {
            origin,
            kind: error.kind(),
            message: error.to_string(),
            at,
        }
    }
}

/// Receives failures from the scheduler and the rule engine.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, report: FailureReport);
}

/// Logs every failure as a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, report: FailureReport) {
        tracing::warn!("⚠️ {} [{}]: {}", report.origin, report.kind, report.message);
    }
}

/// Logs failures and keeps the most recent ones in memory.
pub struct FailureLog {
    entries: Mutex<VecDeque<FailureReport>>,
    capacity: usize,
    enabled: AtomicBool,
}

impl FailureLog {
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            enabled: AtomicBool::new(true),
        }
    }

    /// Stop recording (and logging) until re-enabled.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Recorded failures, oldest first.
    pub fn recent(&self) -> Vec<FailureReport> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Default for FailureLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl ErrorReporter for FailureLog {
    fn report(&self, report: FailureReport) {
        if !self.is_enabled() {
            return;
        }
        TracingReporter.report(report.clone());
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(report);
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
