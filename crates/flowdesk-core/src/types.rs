//! Domain snapshots — leads and shipments as read from the external sources.
//!
//! These are read-only inputs to the rule engine. Field names serialize in
//! camelCase to match the CRM / carrier APIs they are mapped from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed set of entity kinds the pipeline evaluates rules over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Lead,
    Shipment,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Lead => write!(f, "lead"),
            EntityKind::Shipment => write!(f, "shipment"),
        }
    }
}

/// Something a rule set can be evaluated against.
pub trait Entity: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Stable identifier, used in logs and failure reports.
    fn entity_id(&self) -> &str;
}

// ─── Leads ────────────────────────────────────────────────

/// Lead lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Lost,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Lost => "lost",
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A CRM lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// "First Last", as shown to the webhook receiver.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Entity for Lead {
    const KIND: EntityKind = EntityKind::Lead;

    fn entity_id(&self) -> &str {
        &self.id
    }
}

/// Input for creating a lead. Missing fields default to empty / `New`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub status: Option<LeadStatus>,
}

/// One snapshot of leads plus the total known to the source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadPage {
    pub leads: Vec<Lead>,
    pub total: usize,
}

// ─── Shipments ────────────────────────────────────────────

/// Shipment status as reported by the carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Processing,
    InTransit,
    Delivered,
    Delayed,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Processing => "processing",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Delayed => "delayed",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A carrier shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub origin: String,
    pub destination: String,
    pub status: ShipmentStatus,
    pub carrier: String,
    pub tracking_number: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_delivery: Option<DateTime<Utc>>,
}

impl Shipment {
    /// Past its expected delivery and not yet delivered, as of `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.expected_delivery {
            Some(expected) => self.status != ShipmentStatus::Delivered && expected < now,
            None => false,
        }
    }
}

impl Entity for Shipment {
    const KIND: EntityKind = EntityKind::Shipment;

    fn entity_id(&self) -> &str {
        &self.id
    }
}

/// One snapshot of shipments plus the total known to the source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipmentPage {
    pub shipments: Vec<Shipment>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn shipment(status: ShipmentStatus, expected: Option<DateTime<Utc>>) -> Shipment {
        Shipment {
            id: "shipment-1".into(),
            customer_name: "Ada".into(),
            customer_email: "ada@example.com".into(),
            origin: "Oslo".into(),
            destination: "Bergen".into(),
            status,
            carrier: "DHL".into(),
            tracking_number: "DHL1".into(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            expected_delivery: expected,
        }
    }

    #[test]
    fn test_is_overdue() {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
        let past = Some(now - Duration::hours(1));
        let future = Some(now + Duration::hours(1));

        assert!(shipment(ShipmentStatus::InTransit, past).is_overdue(now));
        assert!(shipment(ShipmentStatus::Delayed, past).is_overdue(now));
        assert!(!shipment(ShipmentStatus::Delivered, past).is_overdue(now));
        assert!(!shipment(ShipmentStatus::InTransit, future).is_overdue(now));
        assert!(!shipment(ShipmentStatus::InTransit, None).is_overdue(now));
        // Strictly before now.
        assert!(!shipment(ShipmentStatus::InTransit, Some(now)).is_overdue(now));
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&ShipmentStatus::InTransit).unwrap();
        assert_eq!(json, "\"in_transit\"");
        let status: LeadStatus = serde_json::from_str("\"qualified\"").unwrap();
        assert_eq!(status, LeadStatus::Qualified);
    }

    #[test]
    fn test_lead_camel_case_fields() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let lead = Lead {
            id: "lead-1".into(),
            first_name: "Anna".into(),
            last_name: "Berg".into(),
            email: "anna@berg.com".into(),
            phone: "+47".into(),
            status: LeadStatus::New,
            created_at: at,
            updated_at: at,
        };
        let value = serde_json::to_value(&lead).unwrap();
        assert_eq!(value["firstName"], "Anna");
        assert_eq!(value["status"], "new");
        assert_eq!(lead.full_name(), "Anna Berg");
        assert_eq!(Lead::KIND, EntityKind::Lead);
    }
}
