//! # FlowDesk Scheduler
//!
//! Interval scheduler, rule engine and webhook dispatch — the automation core
//! of FlowDesk.
//!
//! ## Architecture
//! ```text
//! Scheduler (one tokio timer per task)
//!   ├── "lead-poll"     every 5min  → LeadSource snapshot
//!   └── "shipment-poll" every 10min → ShipmentSource snapshot
//!         └── RuleEngine.process(rules, entity) for each entity
//!               ├── condition(entity)  (panics are contained per rule)
//!               └── action(entity)     → WebhookDispatcher → HTTP POST
//!
//! Failures at the rule and task boundary → ErrorReporter (logged, never escalated)
//! ```

pub mod dispatch;
pub mod engine;
pub mod pipeline;
pub mod report;
pub mod retry;
pub mod rules;
pub mod tasks;
pub mod workflow;

pub use dispatch::{LogSink, WebhookDispatcher, WebhookEvent, WebhookPayload, WebhookSink};
pub use engine::Scheduler;
pub use pipeline::{AutomationPipeline, LEAD_POLL_TASK, PipelineHandle, SHIPMENT_POLL_TASK};
pub use report::{ErrorReporter, FailureLog, FailureOrigin, FailureReport, TracingReporter};
pub use retry::RetryPolicy;
pub use rules::{Rule, RuleSet, lead_rules, shipment_rules};
pub use tasks::{TaskId, TaskSnapshot};
pub use workflow::{ProcessSummary, RuleEngine};
