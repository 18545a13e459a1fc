//! Interactive recovery for step failures.
//!
//! When a step fails during `launchpad run`, the user chooses whether to
//! retry the failed step or abort the launch.

use crate::error::Result;
use crate::ui::{Prompt, PromptOption, PromptType, UserInterface};

/// Recovery action chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Resume the run at the failed step.
    Retry,
    /// Stop the launch.
    Abort,
}

/// Prompt key for the recovery menu.
pub const RECOVERY_PROMPT_KEY: &str = "recovery";

/// Prompt key for the pre-launch confirmation.
pub const CONFIRM_PROMPT_KEY: &str = "confirm_launch";

/// Prompt the user for a recovery action after a step failure.
///
/// Unrecognized answers are treated as a retry.
pub fn prompt_recovery(ui: &mut dyn UserInterface, step_label: &str) -> Result<RecoveryAction> {
    let prompt = Prompt {
        key: RECOVERY_PROMPT_KEY.to_string(),
        question: format!("'{}' failed. How do you want to proceed?", step_label),
        prompt_type: PromptType::Select {
            options: vec![
                PromptOption::new("Retry", "retry"),
                PromptOption::new("Abort", "abort"),
            ],
        },
        default: Some("retry".to_string()),
    };

    let answer = ui.prompt(&prompt)?;
    match answer.as_string().as_str() {
        "abort" => Ok(RecoveryAction::Abort),
        _ => Ok(RecoveryAction::Retry),
    }
}

/// Ask the user to confirm before the first step runs.
pub fn confirm_launch(ui: &mut dyn UserInterface, summary: &str) -> Result<bool> {
    let prompt = Prompt {
        key: CONFIRM_PROMPT_KEY.to_string(),
        question: format!("Launch {}?", summary),
        prompt_type: PromptType::Confirm,
        default: Some("yes".to_string()),
    };

    let answer = ui.prompt(&prompt)?;
    Ok(answer.as_bool().unwrap_or(true))
}
