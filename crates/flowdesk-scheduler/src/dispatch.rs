//! Webhook dispatch — sends automation events to the configured sink URL.
//!
//! Every event kind goes to the same URL as `{"event": ..., "data": {...}}`.
//! Only the HTTP status is observed; the response body is never read.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowdesk_core::config::WebhookConfig;
use flowdesk_core::{FlowdeskError, Lead, Result, Shipment};
use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Header carrying a per-dispatch key, stable across retries.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Event kinds a webhook can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEvent {
    NewLead,
    ShipmentDelay,
    ShipmentDelivered,
}

impl WebhookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::NewLead => "new_lead",
            WebhookEvent::ShipmentDelay => "shipment_delay",
            WebhookEvent::ShipmentDelivered => "shipment_delivered",
        }
    }
}

impl std::fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLeadData {
    pub lead_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentDelayData {
    pub shipment_id: String,
    pub tracking_number: String,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_delivery: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentDeliveredData {
    pub shipment_id: String,
    pub tracking_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub delivery_time: DateTime<Utc>,
}

/// The JSON body of one dispatch. The schema is fixed per event kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum WebhookPayload {
    NewLead(NewLeadData),
    ShipmentDelay(ShipmentDelayData),
    ShipmentDelivered(ShipmentDeliveredData),
}

impl WebhookPayload {
    pub fn new_lead(lead: &Lead, at: DateTime<Utc>) -> Self {
        Self::NewLead(NewLeadData {
            lead_id: lead.id.clone(),
            name: lead.full_name(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            timestamp: at,
        })
    }

    pub fn shipment_delay(shipment: &Shipment, at: DateTime<Utc>) -> Self {
        Self::ShipmentDelay(ShipmentDelayData {
            shipment_id: shipment.id.clone(),
            tracking_number: shipment.tracking_number.clone(),
            customer_name: shipment.customer_name.clone(),
            customer_email: shipment.customer_email.clone(),
            expected_delivery: shipment.expected_delivery,
            timestamp: at,
        })
    }

    pub fn shipment_delivered(shipment: &Shipment, at: DateTime<Utc>) -> Self {
        Self::ShipmentDelivered(ShipmentDeliveredData {
            shipment_id: shipment.id.clone(),
            tracking_number: shipment.tracking_number.clone(),
            customer_name: shipment.customer_name.clone(),
            customer_email: shipment.customer_email.clone(),
            delivery_time: at,
        })
    }

    pub fn event(&self) -> WebhookEvent {
        match self {
            WebhookPayload::NewLead(_) => WebhookEvent::NewLead,
            WebhookPayload::ShipmentDelay(_) => WebhookEvent::ShipmentDelay,
            WebhookPayload::ShipmentDelivered(_) => WebhookEvent::ShipmentDelivered,
        }
    }

    /// Id of the entity the payload was built from.
    pub fn subject_id(&self) -> &str {
        match self {
            WebhookPayload::NewLead(d) => &d.lead_id,
            WebhookPayload::ShipmentDelay(d) => &d.shipment_id,
            WebhookPayload::ShipmentDelivered(d) => &d.shipment_id,
        }
    }
}

/// Anything that accepts webhook payloads. Rule actions only see this trait.
#[async_trait]
pub trait WebhookSink: Send + Sync {
    async fn dispatch(&self, payload: WebhookPayload) -> Result<()>;
}

/// Logs payloads instead of sending them (`--dry-run`).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl WebhookSink for LogSink {
    async fn dispatch(&self, payload: WebhookPayload) -> Result<()> {
        let body = serde_json::to_string(&payload)?;
        tracing::info!("📝 [dry-run] webhook '{}': {body}", payload.event());
        Ok(())
    }
}

/// Outcome of a single POST.
enum AttemptError {
    /// Network failure, timeout, 408, 429 or 5xx.
    Retryable(String),
    /// Any other non-2xx status.
    Fatal(String),
}

/// HTTP webhook dispatcher — POSTs payloads to one sink URL.
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
    url: String,
    retry: RetryPolicy,
}

impl WebhookDispatcher {
    /// Create a dispatcher for `url`. An empty URL is a configuration error.
    pub fn new(url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(FlowdeskError::Configuration(
                "webhook URL is empty (set webhook.url or FLOWDESK_WEBHOOK_URL)".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("FlowDesk/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| FlowdeskError::Configuration(format!("HTTP client error: {e}")))?;
        Ok(Self {
            client,
            url: url.to_string(),
            retry,
        })
    }

    pub fn from_config(config: &WebhookConfig) -> Result<Self> {
        Self::new(
            &config.url,
            Duration::from_secs(config.timeout_secs),
            RetryPolicy::from_config(config),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    async fn post_once(
        &self,
        payload: &WebhookPayload,
        key: &str,
    ) -> std::result::Result<(), AttemptError> {
        let resp = self
            .client
            .post(&self.url)
            .header(IDEMPOTENCY_HEADER, key)
            .json(payload)
            .send()
            .await
            .map_err(|e| AttemptError::Retryable(format!("POST {} failed: {e}", self.url)))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let msg = format!("Webhook error {status} from {}", self.url);
        if status.is_server_error()
            || status == reqwest::StatusCode::REQUEST_TIMEOUT
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            Err(AttemptError::Retryable(msg))
        } else {
            Err(AttemptError::Fatal(msg))
        }
    }
}

#[async_trait]
impl WebhookSink for WebhookDispatcher {
    async fn dispatch(&self, payload: WebhookPayload) -> Result<()> {
        let key = uuid::Uuid::new_v4().to_string();
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.post_once(&payload, &key).await {
                Ok(()) => {
                    tracing::info!(
                        "✅ Webhook '{}' sent for {} (attempt {attempts})",
                        payload.event(),
                        payload.subject_id()
                    );
                    return Ok(());
                }
                Err(AttemptError::Retryable(msg)) if self.retry.should_retry(attempts) => {
                    let delay = self.retry.backoff(attempts - 1);
                    tracing::debug!(
                        "🔁 Webhook '{}' attempt {attempts} failed, retrying in {:?}: {msg}",
                        payload.event(),
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(AttemptError::Retryable(msg)) | Err(AttemptError::Fatal(msg)) => {
                    return Err(FlowdeskError::Dispatch(format!(
                        "{} after {attempts} attempt(s): {msg}",
                        payload.event()
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use flowdesk_core::{LeadStatus, ShipmentStatus};
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 10, 30, 0).unwrap()
    }

    fn lead() -> Lead {
        Lead {
            id: "lead-1".into(),
            first_name: "James".into(),
            last_name: "Wilson".into(),
            email: "james.wilson@techinnovate.com".into(),
            phone: "+1-202-555-0134".into(),
            status: LeadStatus::New,
            created_at: at(),
            updated_at: at(),
        }
    }

    fn shipment() -> Shipment {
        Shipment {
            id: "shipment-4".into(),
            customer_name: "Sophia Patel".into(),
            customer_email: "sophia.patel@nakatomi.co.jp".into(),
            origin: "Tokyo, Japan".into(),
            destination: "Los Angeles, CA".into(),
            status: ShipmentStatus::Delayed,
            carrier: "DHL".into(),
            tracking_number: "DHL3901746582".into(),
            created_at: at(),
            expected_delivery: Some(at() - chrono::Duration::hours(1)),
        }
    }

    fn dispatcher(url: &str, retry: RetryPolicy) -> WebhookDispatcher {
        WebhookDispatcher::new(url, Duration::from_secs(5), retry).unwrap()
    }

    #[test]
    fn test_new_lead_schema() {
        let value = serde_json::to_value(WebhookPayload::new_lead(&lead(), at())).unwrap();
        assert_eq!(value["event"], "new_lead");
        assert_eq!(value["data"]["leadId"], "lead-1");
        assert_eq!(value["data"]["name"], "James Wilson");
        assert_eq!(value["data"]["email"], "james.wilson@techinnovate.com");
        assert_eq!(value["data"]["phone"], "+1-202-555-0134");
        assert_eq!(value["data"]["timestamp"], "2026-05-04T10:30:00Z");
    }

    #[test]
    fn test_shipment_schemas() {
        let delay = serde_json::to_value(WebhookPayload::shipment_delay(&shipment(), at())).unwrap();
        assert_eq!(delay["event"], "shipment_delay");
        assert_eq!(delay["data"]["trackingNumber"], "DHL3901746582");
        assert_eq!(delay["data"]["expectedDelivery"], "2026-05-04T09:30:00Z");
        assert!(delay["data"].get("deliveryTime").is_none());

        let delivered =
            serde_json::to_value(WebhookPayload::shipment_delivered(&shipment(), at())).unwrap();
        assert_eq!(delivered["event"], "shipment_delivered");
        assert_eq!(delivered["data"]["customerEmail"], "sophia.patel@nakatomi.co.jp");
        assert_eq!(delivered["data"]["deliveryTime"], "2026-05-04T10:30:00Z");
        assert!(delivered["data"].get("timestamp").is_none());
    }

    #[test]
    fn test_empty_url_is_configuration_error() {
        let err = WebhookDispatcher::new("  ", Duration::from_secs(1), RetryPolicy::none())
            .unwrap_err();
        assert!(matches!(err, FlowdeskError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_dispatch_posts_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hooks/crm"))
            .and(header_exists(IDEMPOTENCY_HEADER))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let hook = dispatcher(&format!("{}/hooks/crm", server.uri()), RetryPolicy::none());
        hook.dispatch(WebhookPayload::new_lead(&lead(), at()))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("authorization").is_none());
        let body: WebhookPayload = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body, WebhookPayload::new_lead(&lead(), at()));
    }

    #[tokio::test]
    async fn test_non_2xx_is_dispatch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let hook = dispatcher(&server.uri(), RetryPolicy::none());
        let err = hook
            .dispatch(WebhookPayload::shipment_delivered(&shipment(), at()))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowdeskError::Dispatch(_)));
        assert!(err.to_string().contains("400"));
    }

    #[tokio::test]
    async fn test_single_attempt_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let hook = dispatcher(&server.uri(), RetryPolicy::default());
        assert!(
            hook.dispatch(WebhookPayload::new_lead(&lead(), at()))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_retries_server_errors_with_same_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let retry = RetryPolicy::exponential(3, Duration::from_millis(5), Duration::from_millis(20));
        let hook = dispatcher(&server.uri(), retry);
        hook.dispatch(WebhookPayload::shipment_delay(&shipment(), at()))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
        let keys: Vec<_> = requests
            .iter()
            .map(|r| r.headers.get(IDEMPOTENCY_HEADER).unwrap().to_str().unwrap().to_string())
            .collect();
        assert!(keys.iter().all(|k| k == &keys[0]));
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422))
            .expect(1)
            .mount(&server)
            .await;

        let retry = RetryPolicy::exponential(4, Duration::from_millis(1), Duration::from_millis(2));
        let hook = dispatcher(&server.uri(), retry);
        assert!(
            hook.dispatch(WebhookPayload::new_lead(&lead(), at()))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_log_sink_accepts_everything() {
        assert!(LogSink.dispatch(WebhookPayload::new_lead(&lead(), at())).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_sink() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let hook = dispatcher("http://127.0.0.1:9/hook", RetryPolicy::none());
        let err = hook
            .dispatch(WebhookPayload::new_lead(&lead(), at()))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowdeskError::Dispatch(_)));
    }
}
