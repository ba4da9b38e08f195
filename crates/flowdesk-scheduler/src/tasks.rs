//! Task model — identifiers and runtime statistics for scheduled jobs.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Opaque handle returned by `Scheduler::register`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(uuid::Uuid);

impl TaskId {
    pub(crate) fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0.simple())
    }
}

/// Counters kept per task while its loop runs.
#[derive(Debug, Clone, Default)]
pub(crate) struct TaskStats {
    pub last_run: Option<DateTime<Utc>>,
    pub run_count: u64,
    pub failure_count: u64,
    pub skipped_ticks: u64,
    pub running: bool,
    pub last_error: Option<String>,
}

/// Point-in-time view of a registered task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSnapshot {
    pub id: String,
    pub name: String,
    pub interval: Duration,
    pub registered_at: DateTime<Utc>,
    /// Completion time of the last successful run.
    pub last_run: Option<DateTime<Utc>>,
    /// Runs that completed, successful or not.
    pub run_count: u64,
    pub failure_count: u64,
    /// Ticks dropped because the previous run was still in progress.
    pub skipped_ticks: u64,
    pub running: bool,
    pub last_error: Option<String>,
}

impl TaskSnapshot {
    pub(crate) fn new(
        id: TaskId,
        name: &str,
        interval: Duration,
        registered_at: DateTime<Utc>,
        stats: &TaskStats,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            interval,
            registered_at,
            last_run: stats.last_run,
            run_count: stats.run_count,
            failure_count: stats.failure_count,
            skipped_ticks: stats.skipped_ticks,
            running: stats.running,
            last_error: stats.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_display() {
        let id = TaskId::generate();
        let text = id.to_string();
        assert!(text.starts_with("task-"));
        assert_eq!(text.len(), "task-".len() + 32);
        assert_ne!(id, TaskId::generate());
    }

    #[test]
    fn test_snapshot_copies_stats() {
        let stats = TaskStats {
            run_count: 4,
            failure_count: 1,
            last_error: Some("boom".into()),
            ..TaskStats::default()
        };
        let snap = TaskSnapshot::new(
            TaskId::generate(),
            "lead-poll",
            Duration::from_secs(300),
            Utc::now(),
            &stats,
        );
        assert_eq!(snap.name, "lead-poll");
        assert_eq!(snap.run_count, 4);
        assert_eq!(snap.failure_count, 1);
        assert_eq!(snap.last_error.as_deref(), Some("boom"));
        assert!(snap.last_run.is_none());
    }
}
