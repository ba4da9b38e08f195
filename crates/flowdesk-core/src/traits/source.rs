//! Snapshot sources — the pull side of the pipeline.
//!
//! A source returns a full, already-materialized read of the current
//! entities. The automation core never pages or filters on its own.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{LeadPage, ShipmentPage};

/// Pulls the current set of leads (e.g. from a CRM).
#[async_trait]
pub trait LeadSource: Send + Sync {
    /// Source name, for logs.
    fn name(&self) -> &str;

    async fn lead_snapshot(&self) -> Result<LeadPage>;
}

/// Pulls the current set of shipments (e.g. from a carrier API).
#[async_trait]
pub trait ShipmentSource: Send + Sync {
    /// Source name, for logs.
    fn name(&self) -> &str;

    async fn shipment_snapshot(&self) -> Result<ShipmentPage>;
}
