//! Per-step status tracking.

use serde::Serialize;

use super::descriptor::{StepDescriptor, StepId};

/// Status of a step in a run.
///
/// Transitions are `Idle -> Pending -> Completed` or
/// `Idle -> Pending -> Error`. A retry moves an `Error` step back to
/// `Pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "message", rename_all = "lowercase")]
pub enum StepStatus {
    /// Step has not been attempted in this pass.
    Idle,

    /// Step's action is executing.
    Pending,

    /// Step's action succeeded.
    Completed,

    /// Step's action failed with a display-ready message.
    Error(String),
}

impl StepStatus {
    /// Check if this is a terminal state (no further automatic action).
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Error(_))
    }

    /// Check if this is the `Error` state.
    pub fn is_error(&self) -> bool {
        matches!(self, StepStatus::Error(_))
    }

    /// The attached error message, if any.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            StepStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Short lowercase name, matching the serialized tag.
    pub fn name(&self) -> &'static str {
        match self {
            StepStatus::Idle => "idle",
            StepStatus::Pending => "pending",
            StepStatus::Completed => "completed",
            StepStatus::Error(_) => "error",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Error(message) => write!(f, "error: {}", message),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Mutable status record for one step of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepState {
    /// Id of the descriptor this state tracks.
    pub id: StepId,

    /// Display label, copied from the descriptor.
    pub label: String,

    /// Current status.
    pub status: StepStatus,

    /// Progress text, e.g. "Processing batch 2 of 3".
    pub description: Option<String>,

    /// Batches confirmed so far for a batched step.
    ///
    /// Survives retries of this step and is cleared only when the whole run
    /// completes or the run is reset.
    pub batches_processed: usize,
}

impl StepState {
    /// Create an idle state for a descriptor.
    pub fn idle(descriptor: &StepDescriptor) -> Self {
        Self {
            id: descriptor.id.clone(),
            label: descriptor.label.clone(),
            status: StepStatus::Idle,
            description: descriptor.description.clone(),
            batches_processed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!StepStatus::Idle.is_terminal());
        assert!(!StepStatus::Pending.is_terminal());
        assert!(StepStatus::Completed.is_terminal());
        assert!(StepStatus::Error("boom".into()).is_terminal());
    }

    #[test]
    fn error_message_only_for_error() {
        assert_eq!(
            StepStatus::Error("nonce too low".into()).error_message(),
            Some("nonce too low")
        );
        assert_eq!(StepStatus::Completed.error_message(), None);
    }

    #[test]
    fn display_includes_error_message() {
        assert_eq!(StepStatus::Pending.to_string(), "pending");
        assert_eq!(
            StepStatus::Error("reverted".into()).to_string(),
            "error: reverted"
        );
    }

    #[test]
    fn serializes_as_tagged_variant() {
        let json = serde_json::to_value(StepStatus::Error("oops".into())).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "oops");

        let json = serde_json::to_value(StepStatus::Idle).unwrap();
        assert_eq!(json["type"], "idle");
    }

    #[test]
    fn idle_state_copies_descriptor_fields() {
        let descriptor = StepDescriptor::from_fn("mint-nfts", "Mint NFTs", |_| async { Ok(()) })
            .with_description("Uploading metadata");
        let state = StepState::idle(&descriptor);
        assert_eq!(state.id.as_str(), "mint-nfts");
        assert_eq!(state.label, "Mint NFTs");
        assert_eq!(state.status, StepStatus::Idle);
        assert_eq!(state.description.as_deref(), Some("Uploading metadata"));
        assert_eq!(state.batches_processed, 0);
    }
}
