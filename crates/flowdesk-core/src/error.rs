//! Error types for FlowDesk.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlowdeskError>;

#[derive(Debug, Error)]
pub enum FlowdeskError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Rule '{rule}' condition failed: {message}")]
    RuleCondition { rule: String, message: String },

    #[error("Rule '{rule}' action failed: {message}")]
    RuleAction { rule: String, message: String },

    #[error("Webhook dispatch failed: {0}")]
    Dispatch(String),

    #[error("Snapshot source error: {0}")]
    Source(String),

    #[error("Scheduled task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FlowdeskError {
    /// Short machine-friendly label, used in failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::RuleCondition { .. } => "rule_condition",
            Self::RuleAction { .. } => "rule_action",
            Self::Dispatch(_) => "dispatch",
            Self::Source(_) => "source",
            Self::Task(_) => "task",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_rule_name() {
        let err = FlowdeskError::RuleAction {
            rule: "Delivery Confirmation".into(),
            message: "HTTP 502".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Delivery Confirmation"));
        assert!(msg.contains("HTTP 502"));
        assert_eq!(err.kind(), "rule_action");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: FlowdeskError = io.into();
        assert_eq!(err.kind(), "io");
    }
}
