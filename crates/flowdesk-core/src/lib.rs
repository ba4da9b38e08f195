//! # FlowDesk Core
//!
//! Shared building blocks for the automation pipeline: domain snapshots
//! (leads, shipments), configuration, the error type, the clock, and the
//! collaborator traits the pipeline pulls entities through.

pub mod clock;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::FlowdeskConfig;
pub use error::{FlowdeskError, Result};
pub use types::{
    Entity, EntityKind, Lead, LeadPage, LeadStatus, NewLead, Shipment, ShipmentPage,
    ShipmentStatus,
};
