//! Rules — named (predicate, action) pairs over one entity type.
//!
//! A `RuleSet<T>` is ordered and immutable once built; the engine evaluates it
//! in declaration order. The built-in lead and shipment policies live at the
//! bottom of this file.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use flowdesk_core::{Clock, Entity, Lead, LeadStatus, Result, Shipment, ShipmentStatus};

use crate::dispatch::{WebhookPayload, WebhookSink};

pub const NEW_LEAD_NOTIFICATION: &str = "New Lead Notification";
pub const HIGH_VALUE_LEAD_ALERT: &str = "High-Value Lead Alert";
pub const DELAYED_SHIPMENT_ALERT: &str = "Delayed Shipment Alert";
pub const DELIVERY_CONFIRMATION: &str = "Delivery Confirmation";

type Condition<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;
type Action<T> = Box<dyn Fn(T) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// A named predicate bound to an asynchronous action.
pub struct Rule<T> {
    name: String,
    condition: Condition<T>,
    action: Action<T>,
}

impl<T: Entity> Rule<T> {
    pub fn new<C, A, Fut>(name: impl Into<String>, condition: C, action: A) -> Self
    where
        C: Fn(&T) -> bool + Send + Sync + 'static,
        A: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            condition: Box::new(condition),
            action: Box::new(move |entity| action(entity).boxed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate the predicate.
    pub fn matches(&self, entity: &T) -> bool {
        (self.condition)(entity)
    }

    /// Run the action on an owned copy of the entity.
    pub fn execute(&self, entity: T) -> BoxFuture<'static, Result<()>> {
        (self.action)(entity)
    }
}

impl<T> std::fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Ordered, immutable list of rules for one entity type.
#[derive(Debug)]
pub struct RuleSet<T> {
    rules: Vec<Rule<T>>,
}

impl<T: Entity> RuleSet<T> {
    pub fn new(rules: Vec<Rule<T>>) -> Self {
        Self { rules }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule<T>> {
        self.rules.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ─── Built-in policy ──────────────────────────────────────

/// Lead rules. Both may fire for the same lead; the duplicate `new_lead`
/// dispatch is kept on purpose until product decides otherwise.
pub fn lead_rules(sink: Arc<dyn WebhookSink>, clock: Arc<dyn Clock>) -> RuleSet<Lead> {
    let new_sink = sink.clone();
    let new_clock = clock.clone();

    RuleSet::new(vec![
        Rule::new(
            NEW_LEAD_NOTIFICATION,
            |lead: &Lead| lead.status == LeadStatus::New,
            move |lead: Lead| notify_new_lead(new_sink.clone(), lead, new_clock.now()),
        ),
        Rule::new(
            HIGH_VALUE_LEAD_ALERT,
            |lead: &Lead| lead.email.ends_with(".com") && lead.first_name.chars().count() > 3,
            move |lead: Lead| notify_new_lead(sink.clone(), lead, clock.now()),
        ),
    ])
}

/// Shipment rules. A delivered shipment is never reported as delayed.
pub fn shipment_rules(sink: Arc<dyn WebhookSink>, clock: Arc<dyn Clock>) -> RuleSet<Shipment> {
    let overdue_clock = clock.clone();
    let delay_sink = sink.clone();
    let delay_clock = clock.clone();

    RuleSet::new(vec![
        Rule::new(
            DELAYED_SHIPMENT_ALERT,
            move |shipment: &Shipment| shipment.is_overdue(overdue_clock.now()),
            move |shipment: Shipment| {
                let sink = delay_sink.clone();
                let at = delay_clock.now();
                async move { sink.dispatch(WebhookPayload::shipment_delay(&shipment, at)).await }
            },
        ),
        Rule::new(
            DELIVERY_CONFIRMATION,
            |shipment: &Shipment| shipment.status == ShipmentStatus::Delivered,
            move |shipment: Shipment| {
                let sink = sink.clone();
                let at = clock.now();
                async move {
                    sink.dispatch(WebhookPayload::shipment_delivered(&shipment, at))
                        .await
                }
            },
        ),
    ])
}

async fn notify_new_lead(sink: Arc<dyn WebhookSink>, lead: Lead, at: DateTime<Utc>) -> Result<()> {
    sink.dispatch(WebhookPayload::new_lead(&lead, at)).await
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use chrono::Duration;
    use flowdesk_core::FixedClock;

    fn fixtures() -> (Arc<RecordingSink>, Arc<FixedClock>) {
        (Arc::new(RecordingSink::default()), Arc::new(FixedClock::new(now())))
    }

    #[test]
    fn test_declaration_order() {
        let (sink, clock) = fixtures();
        assert_eq!(
            lead_rules(sink.clone(), clock.clone()).names(),
            vec![NEW_LEAD_NOTIFICATION, HIGH_VALUE_LEAD_ALERT]
        );
        assert_eq!(
            shipment_rules(sink, clock).names(),
            vec![DELAYED_SHIPMENT_ALERT, DELIVERY_CONFIRMATION]
        );
    }

    fn matched<'a>(rules: &'a RuleSet<Lead>, lead: &Lead) -> Vec<&'a str> {
        rules.iter().filter(|r| r.matches(lead)).map(|r| r.name()).collect()
    }

    #[test]
    fn test_lead_predicates() {
        let (sink, clock) = fixtures();
        let rules = lead_rules(sink, clock);

        assert_eq!(
            matched(&rules, &lead("Anna", "anna@b.com", LeadStatus::New)),
            vec![NEW_LEAD_NOTIFICATION, HIGH_VALUE_LEAD_ALERT]
        );
        // First name of exactly three characters does not pass the length check.
        assert_eq!(
            matched(&rules, &lead("Ann", "a@b.com", LeadStatus::New)),
            vec![NEW_LEAD_NOTIFICATION]
        );
        assert!(
            matched(&rules, &lead("Sarah", "sjohnson@globallogistics.net", LeadStatus::Contacted))
                .is_empty()
        );
        assert_eq!(
            matched(
                &rules,
                &lead("Michael", "michael.chen@pacificfreight.com", LeadStatus::Qualified)
            ),
            vec![HIGH_VALUE_LEAD_ALERT]
        );
    }

    #[test]
    fn test_shipment_predicates_follow_clock() {
        let (sink, clock) = fixtures();
        let rules = shipment_rules(sink, clock.clone());
        let delay = rules.iter().next().unwrap();

        let s = shipment(ShipmentStatus::InTransit, Some(now() + Duration::hours(2)));
        assert!(!delay.matches(&s));

        clock.advance(Duration::hours(3));
        assert!(delay.matches(&s));
    }

    #[tokio::test]
    async fn test_actions_dispatch_payloads() {
        let (sink, clock) = fixtures();
        let rules = shipment_rules(sink.clone(), clock);
        let s = shipment(ShipmentStatus::Delivered, Some(now() - Duration::days(1)));
        for rule in rules.iter() {
            if rule.matches(&s) {
                rule.execute(s.clone()).await.unwrap();
            }
        }
        assert_eq!(sink.events(), vec!["shipment_delivered"]);
        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent[0], WebhookPayload::shipment_delivered(&s, now()));
    }

    #[tokio::test]
    async fn test_lead_actions_send_new_lead_payload() {
        let (sink, clock) = fixtures();
        let rules = lead_rules(sink.clone(), clock);
        let anna = lead("Anna", "anna@b.com", LeadStatus::New);
        for rule in rules.iter() {
            rule.execute(anna.clone()).await.unwrap();
        }
        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|p| *p == WebhookPayload::new_lead(&anna, now())));
    }
}
