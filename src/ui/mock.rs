//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion. It can be configured with
//! pre-determined prompt responses.
//!
//! # Example
//!
//! ```
//! use launchpad::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.set_prompt_response("recovery", "retry");
//!
//! ui.message("Deploying");
//! ui.success("Done!");
//!
//! assert!(ui.has_message("Deploying"));
//! assert!(ui.has_success("Done!"));
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::error::{LaunchError, Result};

use super::{OutputMode, Prompt, PromptResult, PromptType, SpinnerHandle, UserInterface};

/// Mock UI implementation for testing.
///
/// Captures all UI interactions and allows pre-configured prompt responses.
/// Supports both single responses (via `set_prompt_response`) and queued
/// responses (via `queue_prompt_responses`) for keys asked multiple times.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    hints: Vec<String>,
    spinners: Vec<String>,
    spinner_events: Rc<RefCell<Vec<String>>>,
    prompt_responses: HashMap<String, String>,
    prompt_queues: HashMap<String, VecDeque<String>>,
    prompts_shown: Vec<String>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Set a response for a prompt key.
    pub fn set_prompt_response(&mut self, key: &str, response: &str) {
        self.prompt_responses
            .insert(key.to_string(), response.to_string());
    }

    /// Queue multiple responses for the same prompt key.
    ///
    /// Responses are returned in order. After the queue is exhausted,
    /// falls back to `set_prompt_response` or the prompt default.
    pub fn queue_prompt_responses(&mut self, key: &str, responses: Vec<&str>) {
        let queue = responses.into_iter().map(|s| s.to_string()).collect();
        self.prompt_queues.insert(key.to_string(), queue);
    }

    /// Set whether this mock behaves as interactive.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    /// Messages of every spinner started.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// Spinner updates as `message: ..`, `success: ..` or `error: ..`.
    pub fn spinner_events(&self) -> Vec<String> {
        self.spinner_events.borrow().clone()
    }

    /// Keys of every prompt shown.
    pub fn prompts_shown(&self) -> &[String] {
        &self.prompts_shown
    }

    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }

    pub fn has_hint(&self, msg: &str) -> bool {
        self.hints.iter().any(|m| m.contains(msg))
    }

    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        self.prompts_shown.push(prompt.key.clone());

        let queued = self
            .prompt_queues
            .get_mut(&prompt.key)
            .and_then(VecDeque::pop_front);
        let answer = queued
            .or_else(|| self.prompt_responses.get(&prompt.key).cloned())
            .or_else(|| prompt.default.clone())
            .ok_or_else(|| LaunchError::PromptUnavailable {
                key: prompt.key.clone(),
            })?;

        if matches!(prompt.prompt_type, PromptType::Confirm) {
            let value = PromptResult::String(answer).as_bool().unwrap_or(false);
            return Ok(PromptResult::Bool(value));
        }
        Ok(PromptResult::String(answer))
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner {
            events: Rc::clone(&self.spinner_events),
        })
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn show_hint(&mut self, hint: &str) {
        self.hints.push(hint.to_string());
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Mock spinner that reports into its [`MockUI`].
#[derive(Debug)]
pub struct MockSpinner {
    events: Rc<RefCell<Vec<String>>>,
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, msg: &str) {
        self.events.borrow_mut().push(format!("message: {}", msg));
    }

    fn finish_success(&mut self, msg: &str) {
        self.events.borrow_mut().push(format!("success: {}", msg));
    }

    fn finish_error(&mut self, msg: &str) {
        self.events.borrow_mut().push(format!("error: {}", msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::PromptOption;

    fn select(key: &str) -> Prompt {
        Prompt {
            key: key.to_string(),
            question: "?".to_string(),
            prompt_type: PromptType::Select {
                options: vec![PromptOption::new("Retry", "retry")],
            },
            default: None,
        }
    }

    #[test]
    fn captures_output() {
        let mut ui = MockUI::new();
        ui.message("one");
        ui.warning("two");
        ui.error("three");
        ui.show_hint("four");
        assert!(ui.has_message("one"));
        assert!(ui.has_warning("two"));
        assert!(ui.has_error("three"));
        assert!(ui.has_hint("four"));
    }

    #[test]
    fn queued_responses_come_first() {
        let mut ui = MockUI::new();
        ui.set_prompt_response("recovery", "abort");
        ui.queue_prompt_responses("recovery", vec!["retry"]);
        assert_eq!(ui.prompt(&select("recovery")).unwrap().as_string(), "retry");
        assert_eq!(ui.prompt(&select("recovery")).unwrap().as_string(), "abort");
        assert_eq!(ui.prompts_shown(), &["recovery", "recovery"]);
    }

    #[test]
    fn unanswered_prompt_errors() {
        let mut ui = MockUI::new();
        assert!(ui.prompt(&select("recovery")).is_err());
    }

    #[test]
    fn spinner_events_are_recorded() {
        let mut ui = MockUI::new();
        let mut spinner = ui.start_spinner("Deploy contract");
        spinner.set_message("waiting");
        spinner.finish_success("Deploy contract");
        assert_eq!(ui.spinners(), &["Deploy contract"]);
        assert_eq!(
            ui.spinner_events(),
            vec!["message: waiting", "success: Deploy contract"]
        );
    }
}
