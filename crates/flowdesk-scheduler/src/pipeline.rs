//! Automation pipeline — wires sources, rules, engine and scheduler together.
//!
//! Two polling tasks are registered: "lead-poll" and "shipment-poll". Each
//! pulls one snapshot and runs every entity through its rule set.

use std::sync::Arc;
use std::time::Duration;

use flowdesk_core::config::AutomationConfig;
use flowdesk_core::traits::{LeadSource, ShipmentSource};
use flowdesk_core::{Clock, Lead, Result, Shipment};

use crate::dispatch::WebhookSink;
use crate::engine::Scheduler;
use crate::report::ErrorReporter;
use crate::rules::{RuleSet, lead_rules, shipment_rules};
use crate::tasks::TaskId;
use crate::workflow::{ProcessSummary, RuleEngine};

pub const LEAD_POLL_TASK: &str = "lead-poll";
pub const SHIPMENT_POLL_TASK: &str = "shipment-poll";

/// The composition root for lead and shipment automation.
pub struct AutomationPipeline {
    leads: Arc<dyn LeadSource>,
    shipments: Arc<dyn ShipmentSource>,
    lead_rules: RuleSet<Lead>,
    shipment_rules: RuleSet<Shipment>,
    engine: RuleEngine,
}

impl AutomationPipeline {
    /// Build the pipeline with the built-in lead and shipment rules.
    pub fn new(
        leads: Arc<dyn LeadSource>,
        shipments: Arc<dyn ShipmentSource>,
        sink: Arc<dyn WebhookSink>,
        reporter: Arc<dyn ErrorReporter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            leads,
            shipments,
            lead_rules: lead_rules(sink.clone(), clock.clone()),
            shipment_rules: shipment_rules(sink, clock.clone()),
            engine: RuleEngine::new(reporter, clock),
        }
    }

    /// Replace the rule sets.
    pub fn with_rules(mut self, lead_rules: RuleSet<Lead>, shipment_rules: RuleSet<Shipment>) -> Self {
        self.lead_rules = lead_rules;
        self.shipment_rules = shipment_rules;
        self
    }

    pub fn lead_rules(&self) -> &RuleSet<Lead> {
        &self.lead_rules
    }

    pub fn shipment_rules(&self) -> &RuleSet<Shipment> {
        &self.shipment_rules
    }

    /// Pull one lead snapshot and process every lead.
    pub async fn run_lead_cycle(&self) -> Result<ProcessSummary> {
        let page = self.leads.lead_snapshot().await?;
        let summary = self.engine.process_all(&self.lead_rules, &page.leads).await;
        tracing::info!(
            "📇 Lead cycle ({}): {summary} ({} total in source)",
            self.leads.name(),
            page.total
        );
        Ok(summary)
    }

    /// Pull one shipment snapshot and process every shipment.
    pub async fn run_shipment_cycle(&self) -> Result<ProcessSummary> {
        let page = self.shipments.shipment_snapshot().await?;
        let summary = self
            .engine
            .process_all(&self.shipment_rules, &page.shipments)
            .await;
        tracing::info!(
            "📦 Shipment cycle ({}): {summary} ({} total in source)",
            self.shipments.name(),
            page.total
        );
        Ok(summary)
    }

    /// Run both cycles once, leads first. Both run even if the first fails.
    pub async fn run_once(&self) -> Result<ProcessSummary> {
        let leads = self.run_lead_cycle().await;
        let shipments = self.run_shipment_cycle().await;
        let mut total = leads?;
        total += shipments?;
        Ok(total)
    }

    /// Register both polling tasks on `scheduler`.
    pub fn start(
        self: &Arc<Self>,
        scheduler: &Scheduler,
        config: &AutomationConfig,
    ) -> Result<PipelineHandle> {
        let pipeline = self.clone();
        let lead_task = scheduler.register(
            LEAD_POLL_TASK,
            Duration::from_secs(config.lead_poll_secs),
            move || {
                let pipeline = pipeline.clone();
                async move { pipeline.run_lead_cycle().await.map(|_| ()) }
            },
        )?;

        let pipeline = self.clone();
        let shipment_task = scheduler.register(
            SHIPMENT_POLL_TASK,
            Duration::from_secs(config.shipment_poll_secs),
            move || {
                let pipeline = pipeline.clone();
                async move { pipeline.run_shipment_cycle().await.map(|_| ()) }
            },
        );
        let shipment_task = match shipment_task {
            Ok(id) => id,
            Err(e) => {
                scheduler.cancel(lead_task);
                return Err(e);
            }
        };

        tracing::info!(
            "🚀 Automation started: leads every {}s, shipments every {}s",
            config.lead_poll_secs,
            config.shipment_poll_secs
        );
        Ok(PipelineHandle {
            lead_task,
            shipment_task,
        })
    }
}

/// Ids of the two polling tasks registered by `AutomationPipeline::start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineHandle {
    pub lead_task: TaskId,
    pub shipment_task: TaskId,
}

impl PipelineHandle {
    /// Cancel both polling tasks.
    pub fn stop(&self, scheduler: &Scheduler) {
        scheduler.cancel(self.lead_task);
        scheduler.cancel(self.shipment_task);
        tracing::info!("⏹️ Automation stopped");
    }
}
