//! Non-interactive UI for CI/headless environments.

use std::collections::HashMap;

use crate::error::{LaunchError, Result};

use super::{OutputMode, Prompt, PromptResult, PromptType, SpinnerHandle, UserInterface};

/// Prefix of environment variables that answer prompts.
pub const PROMPT_ENV_PREFIX: &str = "LAUNCHPAD_PROMPT_";

/// UI implementation for non-interactive mode.
///
/// Prompts are answered from `LAUNCHPAD_PROMPT_<KEY>` environment variables,
/// then from the prompt's default.
pub struct NonInteractiveUI {
    mode: OutputMode,
    env_overrides: HashMap<String, String>,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        let env_overrides = std::env::vars()
            .filter(|(k, _)| k.starts_with(PROMPT_ENV_PREFIX))
            .collect();

        Self {
            mode,
            env_overrides,
        }
    }

    /// Create with explicit overrides (for testing).
    pub fn with_overrides(mode: OutputMode, overrides: HashMap<String, String>) -> Self {
        Self {
            mode,
            env_overrides: overrides,
        }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("⚠ {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        let env_key = format!("{}{}", PROMPT_ENV_PREFIX, prompt.key.to_uppercase());
        let answer = self
            .env_overrides
            .get(&env_key)
            .or(prompt.default.as_ref())
            .cloned()
            .ok_or_else(|| LaunchError::PromptUnavailable {
                key: prompt.key.clone(),
            })?;

        if matches!(prompt.prompt_type, PromptType::Confirm) {
            let value = PromptResult::String(answer.clone()).as_bool().unwrap_or(false);
            return Ok(PromptResult::Bool(value));
        }
        Ok(PromptResult::String(answer))
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            println!("  {}", message);
        }
        Box::new(LineSpinner { mode: self.mode })
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("\n{}\n", title);
        }
    }

    fn show_hint(&mut self, hint: &str) {
        if self.mode.shows_details() {
            println!("  {}", hint);
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner stand-in that prints one line per state change.
struct LineSpinner {
    mode: OutputMode,
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, msg: &str) {
        if self.mode.shows_details() {
            println!("    {}", msg);
        }
    }

    fn finish_success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::PromptOption;

    fn recovery_prompt(default: Option<&str>) -> Prompt {
        Prompt {
            key: "recovery".to_string(),
            question: "How do you want to proceed?".to_string(),
            prompt_type: PromptType::Select {
                options: vec![
                    PromptOption::new("Retry", "retry"),
                    PromptOption::new("Abort", "abort"),
                ],
            },
            default: default.map(String::from),
        }
    }

    #[test]
    fn env_override_wins() {
        let mut overrides = HashMap::new();
        overrides.insert("LAUNCHPAD_PROMPT_RECOVERY".to_string(), "abort".to_string());
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, overrides);
        let answer = ui.prompt(&recovery_prompt(Some("retry"))).unwrap();
        assert_eq!(answer.as_string(), "abort");
    }

    #[test]
    fn falls_back_to_default() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, HashMap::new());
        let answer = ui.prompt(&recovery_prompt(Some("retry"))).unwrap();
        assert_eq!(answer.as_string(), "retry");
    }

    #[test]
    fn no_default_is_an_error() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, HashMap::new());
        let err = ui.prompt(&recovery_prompt(None)).unwrap_err();
        assert!(matches!(err, LaunchError::PromptUnavailable { ref key } if key == "recovery"));
    }

    #[test]
    fn confirm_reads_yes_no() {
        let mut overrides = HashMap::new();
        overrides.insert("LAUNCHPAD_PROMPT_CONFIRM_LAUNCH".to_string(), "yes".to_string());
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, overrides);
        let prompt = Prompt {
            key: "confirm_launch".to_string(),
            question: "Launch?".to_string(),
            prompt_type: PromptType::Confirm,
            default: Some("false".to_string()),
        };
        assert_eq!(ui.prompt(&prompt).unwrap(), PromptResult::Bool(true));
    }

    #[test]
    fn is_never_interactive() {
        let ui = NonInteractiveUI::with_overrides(OutputMode::Normal, HashMap::new());
        assert!(!ui.is_interactive());
    }
}
