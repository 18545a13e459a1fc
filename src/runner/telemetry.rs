//! Run-level tracking events.
//!
//! The sequencer reports three transitions per flow: an attempt at the start
//! of every `run`, an error when the run halts, and a success once the last
//! step completes. Events are fire-and-forget; a sink can never fail a run.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Action name shared by every launch event.
pub const LAUNCH_ACTION: &str = "launch";

/// Which run-level transition an event reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingKind {
    /// A `run` started.
    Attempt,
    /// Every step completed.
    Success,
    /// The run halted on a failed step.
    Error { message: String },
}

impl TrackingKind {
    /// Event label.
    pub fn label(&self) -> &'static str {
        match self {
            TrackingKind::Attempt => "attempt",
            TrackingKind::Success => "success",
            TrackingKind::Error { .. } => "error",
        }
    }
}

/// Flow-specific fields attached to every event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingContext {
    /// Event category, e.g. `token` or `nft`.
    pub category: String,
    /// Extra properties, e.g. `chainId`.
    pub data: Map<String, Value>,
}

impl TrackingContext {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            data: Map::new(),
        }
    }

    /// Attach a property.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Build the event for a transition.
    pub fn event(&self, kind: &TrackingKind) -> TrackingEvent {
        let mut data = self.data.clone();
        if let TrackingKind::Error { message } = kind {
            data.insert("errorMessage".to_string(), Value::from(message.as_str()));
        }
        TrackingEvent {
            category: self.category.clone(),
            action: LAUNCH_ACTION.to_string(),
            label: kind.label().to_string(),
            data,
            timestamp: Utc::now(),
        }
    }
}

/// A single tracking notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingEvent {
    pub category: String,
    pub action: String,
    pub label: String,
    #[serde(flatten)]
    pub data: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl TrackingEvent {
    /// `category.action.label`, e.g. `nft.launch.success`.
    pub fn key(&self) -> String {
        format!("{}.{}.{}", self.category, self.action, self.label)
    }
}

/// Receives tracking events.
pub trait TrackingSink: Send + Sync {
    fn track(&self, event: TrackingEvent);
}

/// Logs events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TrackingSink for TracingSink {
    fn track(&self, event: TrackingEvent) {
        let data = serde_json::to_string(&event.data).unwrap_or_default();
        debug!(event = %event.key(), %data, "tracking");
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl TrackingSink for NoopSink {
    fn track(&self, _event: TrackingEvent) {}
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<TrackingEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events seen so far.
    pub fn events(&self) -> Vec<TrackingEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Keys of the events seen so far.
    pub fn keys(&self) -> Vec<String> {
        self.events().iter().map(TrackingEvent::key).collect()
    }
}

impl TrackingSink for CollectingSink {
    fn track(&self, event: TrackingEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_key_joins_fields() {
        let ctx = TrackingContext::new("token");
        assert_eq!(ctx.event(&TrackingKind::Attempt).key(), "token.launch.attempt");
        assert_eq!(ctx.event(&TrackingKind::Success).key(), "token.launch.success");
    }

    #[test]
    fn error_event_carries_message() {
        let ctx = TrackingContext::new("nft").with("chainId", 137);
        let event = ctx.event(&TrackingKind::Error {
            message: "Unknown error".into(),
        });
        assert_eq!(event.label, "error");
        assert_eq!(event.data["errorMessage"], "Unknown error");
        assert_eq!(event.data["chainId"], 137);
    }

    #[test]
    fn serializes_data_inline() {
        let ctx = TrackingContext::new("nft").with("ercType", "erc721");
        let json = serde_json::to_value(ctx.event(&TrackingKind::Attempt)).unwrap();
        assert_eq!(json["category"], "nft");
        assert_eq!(json["action"], "launch");
        assert_eq!(json["ercType"], "erc721");
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn collecting_sink_keeps_order() {
        let sink = CollectingSink::new();
        let ctx = TrackingContext::new("token");
        sink.track(ctx.event(&TrackingKind::Attempt));
        sink.track(ctx.event(&TrackingKind::Success));
        assert_eq!(
            sink.keys(),
            vec!["token.launch.attempt", "token.launch.success"]
        );
    }
}
