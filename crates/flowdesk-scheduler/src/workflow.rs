//! Workflow Engine — evaluates a rule set against entity snapshots.
//!
//! ## Flow
//! ```text
//! entity
//!   → for each rule, in declaration order:
//!       → condition(&entity)        panic  → reported, next rule
//!       → action(entity.clone())    error / panic → reported, next rule
//! ```
//!
//! A failing rule never stops its siblings; nothing is propagated to the caller.

use std::ops::AddAssign;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use flowdesk_core::{Clock, Entity, FlowdeskError};
use futures::FutureExt;
use serde::Serialize;

use crate::report::{ErrorReporter, FailureOrigin, FailureReport, panic_message};
use crate::rules::RuleSet;

/// Counts from one or more `process` calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    /// Entities processed.
    pub entities: usize,
    /// Rule conditions evaluated (including ones that panicked).
    pub evaluated: usize,
    pub matched: usize,
    /// Actions that returned Ok.
    pub succeeded: usize,
    /// Conditions or actions that failed.
    pub failed: usize,
}

impl AddAssign for ProcessSummary {
    fn add_assign(&mut self, other: Self) {
        self.entities += other.entities;
        self.evaluated += other.evaluated;
        self.matched += other.matched;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }
}

impl std::fmt::Display for ProcessSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} entities, {} matched, {} ok, {} failed",
            self.entities, self.matched, self.succeeded, self.failed
        )
    }
}

/// Rule engine — runs rule sets and reports per-rule failures.
#[derive(Clone)]
pub struct RuleEngine {
    reporter: Arc<dyn ErrorReporter>,
    clock: Arc<dyn Clock>,
}

impl RuleEngine {
    pub fn new(reporter: Arc<dyn ErrorReporter>, clock: Arc<dyn Clock>) -> Self {
        Self { reporter, clock }
    }

    /// Evaluate every rule against one entity.
    pub async fn process<T: Entity>(&self, rules: &RuleSet<T>, entity: &T) -> ProcessSummary {
        let mut summary = ProcessSummary {
            entities: 1,
            ..ProcessSummary::default()
        };

        for rule in rules.iter() {
            summary.evaluated += 1;

            let matched = match catch_unwind(AssertUnwindSafe(|| rule.matches(entity))) {
                Ok(matched) => matched,
                Err(payload) => {
                    summary.failed += 1;
                    self.report(
                        FailureOrigin::RuleCondition {
                            rule: rule.name().to_string(),
                            entity_kind: T::KIND,
                            entity_id: entity.entity_id().to_string(),
                        },
                        FlowdeskError::RuleCondition {
                            rule: rule.name().to_string(),
                            message: panic_message(payload.as_ref()),
                        },
                    );
                    continue;
                }
            };
            if !matched {
                continue;
            }

            summary.matched += 1;
            tracing::debug!(
                "🎯 Rule '{}' matched {} {}",
                rule.name(),
                T::KIND,
                entity.entity_id()
            );

            let outcome = AssertUnwindSafe(async { rule.execute(entity.clone()).await })
                .catch_unwind()
                .await;
            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(payload) => Some(panic_message(payload.as_ref())),
            };
            match failure {
                None => summary.succeeded += 1,
                Some(message) => {
                    summary.failed += 1;
                    self.report(
                        FailureOrigin::RuleAction {
                            rule: rule.name().to_string(),
                            entity_kind: T::KIND,
                            entity_id: entity.entity_id().to_string(),
                        },
                        FlowdeskError::RuleAction {
                            rule: rule.name().to_string(),
                            message,
                        },
                    );
                }
            }
        }

        summary
    }

    /// Process a snapshot, one entity at a time.
    pub async fn process_all<T: Entity>(&self, rules: &RuleSet<T>, entities: &[T]) -> ProcessSummary {
        let mut total = ProcessSummary::default();
        for entity in entities {
            total += self.process(rules, entity).await;
        }
        total
    }

    fn report(&self, origin: FailureOrigin, error: FlowdeskError) {
        self.reporter
            .report(FailureReport::new(origin, &error, self.clock.now()));
    }
}
