//! Collaborator traits the automation core consumes.

pub mod source;

pub use source::{LeadSource, ShipmentSource};
