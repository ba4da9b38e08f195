//! Mock carrier — in-memory shipments with synthetic tracking history.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use flowdesk_core::traits::ShipmentSource;
use flowdesk_core::{Clock, Result, Shipment, ShipmentPage, ShipmentStatus};
use serde::Serialize;

const DEFAULT_SNAPSHOT_LIMIT: usize = 20;

/// One step in a shipment's tracking history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub status: String,
    pub location: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

impl TrackingEvent {
    fn new(status: &str, location: &str, timestamp: DateTime<Utc>, description: &str) -> Self {
        Self {
            status: status.to_string(),
            location: location.to_string(),
            timestamp,
            description: description.to_string(),
        }
    }
}

/// (customer, email, origin, destination, status, carrier, tracking no,
/// created days ago, expected delivery in days relative to now)
type ShipmentSeed = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    ShipmentStatus,
    &'static str,
    &'static str,
    i64,
    i64,
);

const SEED_SHIPMENTS: &[ShipmentSeed] = &[
    ("John Peterson (Acme Corporation)", "john.peterson@acmecorp.com", "San Francisco, CA", "Boston, MA", ShipmentStatus::InTransit, "FedEx", "FDX029384561", 3, 2),
    ("Maria Rodriguez (Globex Industries)", "maria.rodriguez@globexinc.com", "New York, NY", "Chicago, IL", ShipmentStatus::Delivered, "UPS", "UPS6748921307", 8, -1),
    ("Alexander Wong (Umbrella Corporation)", "alexander.wong@umbrellacorp.com", "Vancouver, BC", "Toronto, ON", ShipmentStatus::Processing, "USPS", "USPS8267391054", 1, 5),
    ("Sophia Patel (Nakatomi Trading)", "sophia.patel@nakatomi.co.jp", "Tokyo, Japan", "Los Angeles, CA", ShipmentStatus::Delayed, "DHL", "DHL3901746582", 5, 3),
    ("Andre Dupont (Weyland Corporation)", "andre.dupont@weylandcorp.com", "Paris, France", "London, UK", ShipmentStatus::InTransit, "FedEx", "FDX192837465", 4, 1),
    ("Olivia Smith (Soylent Incorporated)", "olivia.smith@soylentinc.com", "Chicago, IL", "Denver, CO", ShipmentStatus::Delivered, "UPS", "UPS1234567890", 10, -3),
    ("Raj Patel (Masrani Global)", "raj.patel@masranigroup.com", "Mumbai, India", "San Francisco, CA", ShipmentStatus::Processing, "DHL", "DHL9876543210", 2, 6),
    ("Emma Larsson (Tyrell Inc.)", "emma.larsson@tyrellinc.se", "Stockholm, Sweden", "Berlin, Germany", ShipmentStatus::InTransit, "FedEx", "FDX5647382910", 5, 2),
    ("Carlos Mendoza (Virtucon Industries)", "carlos.mendoza@virtucon.mx", "Mexico City, Mexico", "Miami, FL", ShipmentStatus::Delayed, "USPS", "USPS1029384756", 7, 2),
    ("Amara Okafor (Waystar Royco)", "amara.okafor@waystar.ng", "Lagos, Nigeria", "London, UK", ShipmentStatus::Delivered, "DHL", "DHL4958372610", 12, -4),
];

fn seed_shipments(now: DateTime<Utc>) -> Vec<Shipment> {
    SEED_SHIPMENTS
        .iter()
        .enumerate()
        .map(
            |(i, &(customer, email, origin, destination, status, carrier, tracking, created, eta))| {
                Shipment {
                    id: format!("shipment-{}", i + 1),
                    customer_name: customer.to_string(),
                    customer_email: email.to_string(),
                    origin: origin.to_string(),
                    destination: destination.to_string(),
                    status,
                    carrier: carrier.to_string(),
                    tracking_number: tracking.to_string(),
                    created_at: now - Duration::days(created),
                    expected_delivery: Some(now + Duration::days(eta)),
                }
            },
        )
        .collect()
}

/// Hub for shipments coming from abroad.
fn international_hub(origin: &str) -> Option<&'static str> {
    if origin.contains("Tokyo") || origin.contains("Mumbai") {
        Some("Dubai, UAE")
    } else if origin.contains("Paris") || origin.contains("Stockholm") {
        Some("Frankfurt, Germany")
    } else if origin.contains("Lagos") {
        Some("Addis Ababa, Ethiopia")
    } else {
        None
    }
}

fn domestic_hub(origin: &str) -> &'static str {
    if origin.contains("San Francisco") {
        "Chicago, IL"
    } else if origin.contains("New York") {
        "Columbus, OH"
    } else {
        "Memphis, TN"
    }
}

fn delay_reason(origin: &str) -> &'static str {
    if origin.contains("Tokyo") || origin.contains("Mumbai") {
        "Customs clearance delay."
    } else if origin.contains("Paris") || origin.contains("Stockholm") {
        "Operational delay due to weather conditions."
    } else if origin.contains("Lagos") {
        "Processing delay at transit facility."
    } else {
        "Clearance delay - Additional information required."
    }
}

/// Synthetic tracking history for a shipment, as of `now`.
pub fn tracking_history(shipment: &Shipment, now: DateTime<Utc>) -> Vec<TrackingEvent> {
    let created = shipment.created_at;
    let hub = international_hub(&shipment.origin)
        .unwrap_or_else(|| domestic_hub(&shipment.origin));
    let mut history = vec![TrackingEvent::new(
        "Order Processed",
        &shipment.origin,
        created,
        "Your order has been processed and is ready for shipment.",
    )];
    if shipment.status == ShipmentStatus::Processing {
        return history;
    }

    history.push(TrackingEvent::new(
        "Picked Up",
        &shipment.origin,
        created + Duration::hours(24),
        &format!("Package picked up by {} courier.", shipment.carrier),
    ));

    match shipment.status {
        ShipmentStatus::InTransit => {
            history.push(TrackingEvent::new(
                "In Transit",
                hub,
                now - Duration::hours(24),
                "Package is in transit to the destination.",
            ));
        }
        ShipmentStatus::Delayed => {
            // Held shipments are always routed via Memphis unless international.
            let hub = international_hub(&shipment.origin).unwrap_or("Memphis, TN");
            history.push(TrackingEvent::new(
                "In Transit",
                hub,
                created + Duration::hours(48),
                "Package is in transit to the destination.",
            ));
            history.push(TrackingEvent::new(
                "Delayed",
                hub,
                created + Duration::hours(72),
                delay_reason(&shipment.origin),
            ));
        }
        ShipmentStatus::Delivered => {
            let delivered = shipment.expected_delivery.unwrap_or(now);
            history.push(TrackingEvent::new(
                "In Transit",
                hub,
                created + Duration::hours(48),
                "Package is in transit to the destination.",
            ));
            history.push(TrackingEvent::new(
                "Out for Delivery",
                &shipment.destination,
                delivered - Duration::hours(12),
                "Package is out for delivery.",
            ));
            history.push(TrackingEvent::new(
                "Delivered",
                &shipment.destination,
                delivered,
                "Package has been delivered. Signed by: J. Smith",
            ));
        }
        ShipmentStatus::Processing => {}
    }
    history
}

/// In-memory carrier. Tracking histories are fixed at construction.
pub struct MockCarrier {
    shipments: Vec<Shipment>,
    tracking: HashMap<String, Vec<TrackingEvent>>,
    snapshot_limit: usize,
}

impl MockCarrier {
    /// A carrier holding the ten demo shipments.
    pub fn seeded(clock: &dyn Clock) -> Self {
        let now = clock.now();
        Self::with_shipments(seed_shipments(now), now)
    }

    pub fn with_shipments(shipments: Vec<Shipment>, now: DateTime<Utc>) -> Self {
        let tracking = shipments
            .iter()
            .map(|s| (s.id.clone(), tracking_history(s, now)))
            .collect();
        Self {
            shipments,
            tracking,
            snapshot_limit: DEFAULT_SNAPSHOT_LIMIT,
        }
    }

    /// How many shipments one snapshot returns.
    pub fn with_snapshot_limit(mut self, limit: usize) -> Self {
        self.snapshot_limit = limit;
        self
    }

    /// One page of shipments (1-based) plus the total count.
    pub fn page(&self, page: usize, page_size: usize) -> ShipmentPage {
        ShipmentPage {
            shipments: crate::paginate(&self.shipments, page, page_size),
            total: self.shipments.len(),
        }
    }

    /// Tracking history, oldest first. Unknown ids have no history.
    pub fn tracking(&self, shipment_id: &str) -> Vec<TrackingEvent> {
        self.tracking.get(shipment_id).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.shipments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shipments.is_empty()
    }
}

#[async_trait]
impl ShipmentSource for MockCarrier {
    fn name(&self) -> &str {
        "mock-carrier"
    }

    async fn shipment_snapshot(&self) -> Result<ShipmentPage> {
        Ok(self.page(1, self.snapshot_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use flowdesk_core::FixedClock;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 20, 9, 0, 0).unwrap()
    }

    fn carrier() -> MockCarrier {
        MockCarrier::seeded(&FixedClock::new(now()))
    }

    fn statuses(events: &[TrackingEvent]) -> Vec<&str> {
        events.iter().map(|e| e.status.as_str()).collect()
    }

    #[test]
    fn test_seed_data() {
        let carrier = carrier();
        assert_eq!(carrier.len(), 10);

        let page = carrier.page(1, 20);
        assert_eq!(page.total, 10);
        let second = &page.shipments[1];
        assert_eq!(second.id, "shipment-2");
        assert_eq!(second.status, ShipmentStatus::Delivered);
        assert_eq!(second.expected_delivery, Some(now() - Duration::days(1)));

        // Only delivered shipments are past their expected date in the demo set.
        assert!(page.shipments.iter().all(|s| !s.is_overdue(now())));
    }

    #[test]
    fn test_paging() {
        let carrier = carrier();
        let page = carrier.page(2, 4);
        let ids: Vec<_> = page.shipments.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["shipment-5", "shipment-6", "shipment-7", "shipment-8"]);
        assert!(carrier.page(4, 4).shipments.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_respects_limit() {
        let carrier = carrier().with_snapshot_limit(3);
        let snap = carrier.shipment_snapshot().await.unwrap();
        assert_eq!(snap.shipments.len(), 3);
        assert_eq!(snap.total, 10);
    }

    #[test]
    fn test_tracking_by_status() {
        let carrier = carrier();

        let processing = carrier.tracking("shipment-3");
        assert_eq!(statuses(&processing), vec!["Order Processed"]);

        let in_transit = carrier.tracking("shipment-1");
        assert_eq!(statuses(&in_transit), vec!["Order Processed", "Picked Up", "In Transit"]);
        assert_eq!(in_transit[2].location, "Chicago, IL");
        assert_eq!(in_transit[2].timestamp, now() - Duration::hours(24));
        assert_eq!(in_transit[1].description, "Package picked up by FedEx courier.");

        let delayed = carrier.tracking("shipment-4");
        assert_eq!(
            statuses(&delayed),
            vec!["Order Processed", "Picked Up", "In Transit", "Delayed"]
        );
        assert_eq!(delayed[3].location, "Dubai, UAE");
        assert_eq!(delayed[3].description, "Customs clearance delay.");

        let delivered = carrier.tracking("shipment-10");
        assert_eq!(
            statuses(&delivered),
            vec!["Order Processed", "Picked Up", "In Transit", "Out for Delivery", "Delivered"]
        );
        assert_eq!(delivered[2].location, "Addis Ababa, Ethiopia");
        assert_eq!(delivered[4].timestamp, now() - Duration::days(4));
        assert_eq!(delivered[3].timestamp, now() - Duration::days(4) - Duration::hours(12));

        assert!(carrier.tracking("shipment-404").is_empty());
    }

    #[test]
    fn test_delayed_us_origin_routes_through_memphis() {
        let carrier = carrier();
        let delayed = carrier.tracking("shipment-9");
        assert_eq!(delayed[2].location, "Memphis, TN");
        assert_eq!(
            delayed[3].description,
            "Clearance delay - Additional information required."
        );
    }

    #[test]
    fn test_tracking_event_json() {
        let event = &carrier().tracking("shipment-3")[0];
        let value = serde_json::to_value(event).unwrap();
        assert_eq!(value["status"], "Order Processed");
        assert_eq!(value["location"], "Vancouver, BC");
    }
}
