//! Error types for launchpad operations.
//!
//! This module defines [`LaunchError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Step actions fail with `anyhow::Error`; the sequencer records the
//!   translated message on the step and surfaces [`LaunchError::StepFailed`]
//! - Use `LaunchError` for engine and plan errors that need distinct handling
//! - Use `anyhow::Error` (via `LaunchError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for launchpad operations.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// A step's action failed; the run halted at this step.
    #[error("Step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },

    /// Another `run` or `retry` is already executing against this run.
    #[error("A run is already in progress")]
    RunInProgress,

    /// The run was discarded by its owner; no further writes are accepted.
    #[error("Run was discarded")]
    RunDiscarded,

    /// `run` was asked to start past the end of the step list.
    #[error("Start index {index} is out of range for a run of {len} steps")]
    InvalidStartIndex { index: usize, len: usize },

    /// Launch plan file not found.
    #[error("Launch plan not found: {path}")]
    PlanNotFound { path: PathBuf },

    /// Failed to parse a launch plan.
    #[error("Failed to parse launch plan at {path}: {message}")]
    PlanParseError { path: PathBuf, message: String },

    /// Launch plan is structurally valid YAML but unusable.
    #[error("Invalid launch plan: {message}")]
    PlanValidationError { message: String },

    /// Interpolated variable has no value.
    #[error("Unknown variable '{name}' in: {input}")]
    UnknownVariable { name: String, input: String },

    /// A prompt needed an answer but no terminal is attached.
    #[error("Cannot prompt for '{key}' in non-interactive mode (no default value)")]
    PromptUnavailable { key: String },

    /// Shell command failed.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// Shell command exceeded its time limit.
    #[error("Command timed out after {seconds}s: {command}")]
    CommandTimeout { command: String, seconds: u64 },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for launchpad operations.
pub type Result<T> = std::result::Result<T, LaunchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_failed_displays_step_and_message() {
        let err = LaunchError::StepFailed {
            step: "deploy-contract".into(),
            message: "insufficient funds".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("deploy-contract"));
        assert!(msg.contains("insufficient funds"));
    }

    #[test]
    fn invalid_start_index_displays_bounds() {
        let err = LaunchError::InvalidStartIndex { index: 5, len: 3 };
        let msg = err.to_string();
        assert!(msg.contains('5'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn plan_not_found_displays_path() {
        let err = LaunchError::PlanNotFound {
            path: PathBuf::from("/plans/launch.yml"),
        };
        assert!(err.to_string().contains("/plans/launch.yml"));
    }

    #[test]
    fn plan_parse_error_displays_path_and_message() {
        let err = LaunchError::PlanParseError {
            path: PathBuf::from("/launch.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/launch.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn unknown_variable_displays_name() {
        let err = LaunchError::UnknownVariable {
            name: "contract_address".into(),
            input: "mint ${contract_address}".into(),
        };
        assert!(err.to_string().contains("contract_address"));
    }

    #[test]
    fn command_failed_displays_command_and_code() {
        let err = LaunchError::CommandFailed {
            command: "./deploy.sh".into(),
            code: Some(2),
        };
        let msg = err.to_string();
        assert!(msg.contains("./deploy.sh"));
        assert!(msg.contains('2'));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: LaunchError = io_err.into();
        assert!(matches!(err, LaunchError::Io(_)));
    }

    #[test]
    fn anyhow_error_converts_transparently() {
        let err: LaunchError = anyhow::anyhow!("rpc timed out").into();
        assert_eq!(err.to_string(), "rpc timed out");
    }
}
