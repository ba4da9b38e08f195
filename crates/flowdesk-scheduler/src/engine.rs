//! Scheduler Engine — runs registered jobs at fixed intervals.
//!
//! Each task gets its own tokio loop. Ticks are aligned to the registration
//! instant (`registered + k * interval`), the first run happens one interval
//! after registration, and a task never overlaps with itself: ticks that come
//! due while a run is still in progress are skipped, not queued.
//! Dropping the `Scheduler` stops every loop after its current run.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use flowdesk_core::{Clock, FlowdeskError, Result};
use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::report::{ErrorReporter, FailureOrigin, FailureReport, panic_message};
use crate::tasks::{TaskId, TaskSnapshot, TaskStats};

struct TaskEntry {
    name: String,
    interval: Duration,
    registered_at: DateTime<Utc>,
    stats: Arc<Mutex<TaskStats>>,
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl TaskEntry {
    fn snapshot(&self, id: TaskId) -> TaskSnapshot {
        let stats = lock(&self.stats);
        TaskSnapshot::new(id, &self.name, self.interval, self.registered_at, &stats)
    }
}

/// The scheduler — a registry of independent interval loops.
pub struct Scheduler {
    tasks: Mutex<HashMap<TaskId, TaskEntry>>,
    reporter: Arc<dyn ErrorReporter>,
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    pub fn new(reporter: Arc<dyn ErrorReporter>, clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            reporter,
            clock,
        }
    }

    /// Register `task` to run every `interval`, starting one interval from now.
    ///
    /// Must be called from inside a tokio runtime. A zero interval is rejected.
    pub fn register<F, Fut>(
        &self,
        name: impl Into<String>,
        interval: Duration,
        task: F,
    ) -> Result<TaskId>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let name = name.into();
        if interval.is_zero() {
            return Err(FlowdeskError::Configuration(format!(
                "task '{name}': interval must be greater than zero"
            )));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            FlowdeskError::Configuration(format!(
                "task '{name}': register must be called inside a tokio runtime"
            ))
        })?;
        let first_tick = Instant::now().checked_add(interval).ok_or_else(|| {
            FlowdeskError::Configuration(format!("task '{name}': interval {interval:?} is too large"))
        })?;

        let mut tasks = lock(&self.tasks);
        let mut id = TaskId::generate();
        while tasks.contains_key(&id) {
            id = TaskId::generate();
        }

        let stats = Arc::new(Mutex::new(TaskStats::default()));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let runner = TaskRunner {
            id,
            name: name.clone(),
            interval,
            task,
            stats: stats.clone(),
            reporter: self.reporter.clone(),
            clock: self.clock.clone(),
        };
        let handle = runtime.spawn(runner.run(first_tick, cancel_rx));

        tasks.insert(
            id,
            TaskEntry {
                name: name.clone(),
                interval,
                registered_at: self.clock.now(),
                stats,
                cancel_tx,
                handle,
            },
        );
        tracing::info!("📅 Task registered: '{name}' every {interval:?} ({id})");
        Ok(id)
    }

    /// Stop future runs of a task. A run already in progress completes.
    /// Returns false if the id is unknown or was already cancelled.
    pub fn cancel(&self, id: TaskId) -> bool {
        let Some(entry) = lock(&self.tasks).remove(&id) else {
            return false;
        };
        let _ = entry.cancel_tx.send(true);
        tracing::info!("🛑 Task cancelled: '{}' ({id})", entry.name);
        true
    }

    /// Snapshots of all registered tasks, ordered by name.
    pub fn tasks(&self) -> Vec<TaskSnapshot> {
        let tasks = lock(&self.tasks);
        let mut list: Vec<_> = tasks.iter().map(|(id, e)| e.snapshot(*id)).collect();
        list.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        list
    }

    pub fn task(&self, id: TaskId) -> Option<TaskSnapshot> {
        lock(&self.tasks).get(&id).map(|e| e.snapshot(id))
    }

    pub fn len(&self) -> usize {
        lock(&self.tasks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cancel every task and wait for in-flight runs to finish.
    pub async fn shutdown(&self) {
        let entries: Vec<(TaskId, TaskEntry)> = lock(&self.tasks).drain().collect();
        if entries.is_empty() {
            return;
        }
        for (_, entry) in &entries {
            let _ = entry.cancel_tx.send(true);
        }
        let count = entries.len();
        for (id, entry) in entries {
            if let Err(e) = entry.handle.await {
                tracing::warn!("⚠️ Task loop '{}' ({id}) ended abnormally: {e}", entry.name);
            }
        }
        tracing::info!("⏹️ Scheduler stopped ({count} task(s))");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything one task loop needs, moved into its tokio task.
struct TaskRunner<F> {
    id: TaskId,
    name: String,
    interval: Duration,
    task: F,
    stats: Arc<Mutex<TaskStats>>,
    reporter: Arc<dyn ErrorReporter>,
    clock: Arc<dyn Clock>,
}

impl<F, Fut> TaskRunner<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn run(self, mut next: Instant, mut cancel_rx: watch::Receiver<bool>) {
        loop {
            if *cancel_rx.borrow() {
                break;
            }
            tokio::select! {
                biased;
                changed = cancel_rx.changed() => {
                    // Sender gone means the scheduler was dropped.
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = tokio::time::sleep_until(next) => {}
            }

            self.fire().await;

            let now = Instant::now();
            let mut skipped = 0;
            loop {
                let Some(following) = next.checked_add(self.interval) else {
                    tracing::warn!(
                        "⚠️ Task '{}' has no representable next tick, stopping",
                        self.name
                    );
                    return;
                };
                next = following;
                if next > now {
                    break;
                }
                skipped += 1;
            }
            if skipped > 0 {
                lock(&self.stats).skipped_ticks += skipped;
                tracing::debug!(
                    "⏭️ Task '{}' overran its interval, skipped {skipped} tick(s)",
                    self.name
                );
            }
        }
        tracing::debug!("Task loop '{}' ({}) exited", self.name, self.id);
    }

    async fn fire(&self) {
        lock(&self.stats).running = true;
        tracing::debug!("🔔 Task triggered: '{}'", self.name);

        let outcome = AssertUnwindSafe(async { (self.task)().await })
            .catch_unwind()
            .await;

        let finished = self.clock.now();
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(payload) => Some(FlowdeskError::Task(panic_message(payload.as_ref()))),
        };

        {
            let mut stats = lock(&self.stats);
            stats.running = false;
            stats.run_count += 1;
            match &failure {
                None => stats.last_run = Some(finished),
                Some(e) => {
                    stats.failure_count += 1;
                    stats.last_error = Some(e.to_string());
                }
            }
        }

        if let Some(e) = failure {
            self.reporter.report(FailureReport::new(
                FailureOrigin::Task {
                    id: self.id.to_string(),
                    name: self.name.clone(),
                },
                &e,
                finished,
            ));
        }
    }
}
