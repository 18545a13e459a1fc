//! Rendering of step states.
//!
//! [`render_steps`] draws a whole run as a list; [`StatusPrinter`] follows a
//! live run and prints each transition once, driving a spinner for the
//! pending step.

use crate::steps::{StepState, StepStatus};

use super::icons::StatusKind;
use super::theme::LaunchTheme;
use super::{SpinnerHandle, UserInterface};

/// Label of the retry affordance shown under a failed step.
pub const RETRY_LABEL: &str = "Retry";

/// Render every step as one or more lines.
///
/// Pending and failed steps show their description. A failed step also shows
/// its message and the retry affordance.
pub fn render_steps(steps: &[StepState], theme: &LaunchTheme) -> Vec<String> {
    let mut lines = Vec::new();
    for step in steps {
        let kind = StatusKind::from(&step.status);
        lines.push(kind.format(theme, &step.label));

        if matches!(step.status, StepStatus::Pending | StepStatus::Error(_)) {
            if let Some(description) = &step.description {
                lines.push(format!("    {}", theme.dim.apply_to(description)));
            }
        }

        if let StepStatus::Error(message) = &step.status {
            lines.push(format!("    {}", theme.error.apply_to(message)));
            lines.push(format!("    {}", theme.hint.apply_to(format!("↻ {}", RETRY_LABEL))));
        }
    }
    lines
}

/// Prints step transitions as a run progresses.
///
/// Feed it successive snapshots; only steps whose state changed since the
/// previous snapshot produce output.
#[derive(Default)]
pub struct StatusPrinter {
    previous: Vec<StepState>,
    active: Option<(usize, Box<dyn SpinnerHandle>)>,
}

impl StatusPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the changes between the last snapshot and `steps`.
    pub fn update(&mut self, ui: &mut dyn UserInterface, steps: &[StepState]) {
        for (index, step) in steps.iter().enumerate() {
            if self.previous.get(index) == Some(step) {
                continue;
            }
            self.render_change(ui, index, step);
        }
        self.previous = steps.to_vec();
    }

    fn render_change(&mut self, ui: &mut dyn UserInterface, index: usize, step: &StepState) {
        match &step.status {
            StepStatus::Idle => {}
            StepStatus::Pending => {
                let message = spinner_message(step);
                if let Some((active, spinner)) = &mut self.active {
                    if *active == index {
                        spinner.set_message(&message);
                        return;
                    }
                }
                self.active = Some((index, ui.start_spinner(&message)));
            }
            StepStatus::Completed => match self.take_spinner(index) {
                Some(mut spinner) => spinner.finish_success(&step.label),
                None => ui.success(&step.label),
            },
            StepStatus::Error(message) => {
                match self.take_spinner(index) {
                    Some(mut spinner) => spinner.finish_error(&step.label),
                    None => ui.error(&step.label),
                }
                ui.error(message);
            }
        }
    }

    fn take_spinner(&mut self, index: usize) -> Option<Box<dyn SpinnerHandle>> {
        match &self.active {
            Some((active, _)) if *active == index => self.active.take().map(|(_, s)| s),
            _ => None,
        }
    }
}

fn spinner_message(step: &StepState) -> String {
    match &step.description {
        Some(description) => format!("{} · {}", step.label, description),
        None => step.label.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::StepId;
    use crate::ui::MockUI;

    fn state(id: &str, label: &str, status: StepStatus) -> StepState {
        StepState {
            id: StepId::new(id),
            label: label.to_string(),
            status,
            description: None,
            batches_processed: 0,
        }
    }

    #[test]
    fn renders_each_status() {
        let mut claim = state(
            "set-claim-conditions",
            "Set claim conditions",
            StepStatus::Error("Execution reverted: !Qty".into()),
        );
        claim.description = Some("Processing batch 2 of 3".into());
        let steps = vec![
            state("deploy-contract", "Deploy contract", StepStatus::Completed),
            state("mint-nfts", "Mint NFTs", StepStatus::Completed),
            claim,
        ];

        let lines = render_steps(&steps, &LaunchTheme::plain()).join("\n");
        insta::assert_snapshot!(lines, @r"
        ✓ Deploy contract
        ✓ Mint NFTs
        ✗ Set claim conditions
            Processing batch 2 of 3
            Execution reverted: !Qty
            ↻ Retry
        ");
    }

    #[test]
    fn description_hidden_when_idle_or_completed() {
        let mut idle = state("mint-tokens", "Mint tokens", StepStatus::Idle);
        idle.description = Some("waiting".into());
        let mut pending = state("deploy-contract", "Deploy contract", StepStatus::Pending);
        pending.description = Some("Confirm in wallet".into());

        let lines = render_steps(&[pending, idle], &LaunchTheme::plain());
        assert_eq!(
            lines,
            vec![
                "◆ Deploy contract",
                "    Confirm in wallet",
                "○ Mint tokens"
            ]
        );
    }

    #[test]
    fn printer_drives_spinner_through_success() {
        let mut ui = MockUI::new();
        let mut printer = StatusPrinter::new();

        let mut steps = vec![state("deploy-contract", "Deploy contract", StepStatus::Idle)];
        printer.update(&mut ui, &steps);
        assert!(ui.spinners().is_empty());

        steps[0].status = StepStatus::Pending;
        printer.update(&mut ui, &steps);
        steps[0].status = StepStatus::Completed;
        printer.update(&mut ui, &steps);

        assert_eq!(ui.spinners(), &["Deploy contract"]);
        assert_eq!(ui.spinner_events(), vec!["success: Deploy contract"]);
    }

    #[test]
    fn printer_updates_description_in_place() {
        let mut ui = MockUI::new();
        let mut printer = StatusPrinter::new();

        let mut steps = vec![state("set-claim-conditions", "Set claim conditions", StepStatus::Pending)];
        printer.update(&mut ui, &steps);
        steps[0].description = Some("Processing batch 2 of 3".into());
        printer.update(&mut ui, &steps);

        assert_eq!(ui.spinners().len(), 1);
        assert_eq!(
            ui.spinner_events(),
            vec!["message: Set claim conditions · Processing batch 2 of 3"]
        );
    }

    #[test]
    fn printer_reports_error_message() {
        let mut ui = MockUI::new();
        let mut printer = StatusPrinter::new();

        let mut steps = vec![state("mint-tokens", "Mint tokens", StepStatus::Pending)];
        printer.update(&mut ui, &steps);
        steps[0].status = StepStatus::Error("insufficient funds".into());
        printer.update(&mut ui, &steps);

        assert_eq!(ui.spinner_events(), vec!["error: Mint tokens"]);
        assert!(ui.has_error("insufficient funds"));
    }

    #[test]
    fn unchanged_snapshot_prints_nothing() {
        let mut ui = MockUI::new();
        let mut printer = StatusPrinter::new();
        let steps = vec![state("deploy-contract", "Deploy contract", StepStatus::Completed)];
        printer.update(&mut ui, &steps);
        printer.update(&mut ui, &steps);
        assert_eq!(ui.successes(), &["Deploy contract"]);
    }
}
