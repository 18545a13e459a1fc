//! Run command implementation.
//!
//! The `launchpad run` command loads a launch plan, composes its flow and
//! drives it to completion, offering a retry whenever a step fails.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::args::RunArgs;
use crate::config::{load_plan, LaunchPlan};
use crate::error::{LaunchError, Result};
use crate::launch::{flow_from_plan, CommandFunctions, LaunchFlow};
use crate::runner::{
    confirm_launch, prompt_recovery, NoopSink, RecoveryAction, Run, Sequencer, TracingSink,
    TrackingSink,
};
use crate::shell::{CommandOptions, OutputCallback, OutputLine};
use crate::ui::{render_steps, LaunchTheme, StatusPrinter, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// The run command implementation.
pub struct RunCommand {
    args: RunArgs,
    colors: bool,
}

impl RunCommand {
    pub fn new(args: RunArgs) -> Self {
        Self {
            args,
            colors: false,
        }
    }

    /// Enable colored step rendering.
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    fn functions(&self, plan: &LaunchPlan, verbose: bool) -> CommandFunctions {
        let options = CommandOptions {
            cwd: plan_dir(&self.args.plan),
            env: plan.settings.env.clone(),
            timeout: plan.settings.timeout,
        };

        let functions =
            CommandFunctions::new(plan.commands.clone(), options).dry_run(self.args.dry_run);
        if self.args.dry_run || verbose {
            functions.with_output(print_output())
        } else {
            functions
        }
    }

    fn sequencer(&self, plan: &LaunchPlan, flow: &LaunchFlow) -> Sequencer {
        let tracker: Arc<dyn TrackingSink> = if plan.settings.tracking {
            Arc::new(TracingSink)
        } else {
            Arc::new(NoopSink)
        };

        Sequencer::new()
            .with_tracker(tracker)
            .with_tracking_context(flow.tracking.clone())
            .on_complete(|| debug!("Launch sequence complete"))
    }

    /// Decide what to do after the step at `index` failed.
    fn recover(
        &self,
        ui: &mut dyn UserInterface,
        run: &Run,
        index: usize,
        retries_left: &mut u32,
    ) -> Result<RecoveryAction> {
        let label = run
            .descriptor(index)
            .map(|descriptor| descriptor.label.clone())
            .unwrap_or_default();

        if ui.is_interactive() && !self.args.non_interactive {
            return prompt_recovery(ui, &label);
        }

        if *retries_left == 0 {
            return Ok(RecoveryAction::Abort);
        }
        *retries_left -= 1;
        ui.warning(&format!(
            "Retrying '{}' ({} {} left)",
            label,
            retries_left,
            if *retries_left == 1 { "retry" } else { "retries" }
        ));
        Ok(RecoveryAction::Retry)
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let plan = match load_plan(&self.args.plan) {
            Ok(plan) => plan,
            Err(
                e @ (LaunchError::PlanNotFound { .. }
                | LaunchError::PlanParseError { .. }
                | LaunchError::PlanValidationError { .. }),
            ) => {
                ui.error(&e.to_string());
                return Ok(CommandResult::failure(1));
            }
            Err(e) => return Err(e),
        };

        let verbose = ui.output_mode().shows_command_output();
        let functions = Arc::new(self.functions(&plan, verbose));
        let flow = flow_from_plan(&plan, functions)?;
        let summary = launch_summary(&plan, &flow);

        ui.show_header(&format!("Launching {}", summary));
        if self.args.dry_run {
            ui.show_hint("Dry run: commands are printed, not executed");
        }

        let ask = ui.is_interactive() && !self.args.non_interactive;
        if ask && !self.args.yes && !self.args.dry_run && !confirm_launch(ui, &summary)? {
            ui.warning("Launch cancelled");
            return Ok(CommandResult::failure(1));
        }

        let sequencer = self.sequencer(&plan, &flow);
        let run = sequencer.initialize(flow.plan.clone());
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let mut printer = StatusPrinter::new();
        let mut retries_left = self.args.max_retries;
        let mut start = 0;

        loop {
            let outcome = runtime.block_on(drive(&sequencer, &run, start, ui, &mut printer));
            match outcome {
                Ok(()) => break,
                Err(LaunchError::StepFailed { step, .. }) => {
                    let Some(index) = run.failed_step() else {
                        return Err(LaunchError::StepFailed {
                            step,
                            message: "failed step state was lost".to_string(),
                        });
                    };

                    match self.recover(ui, &run, index, &mut retries_left)? {
                        RecoveryAction::Retry => {
                            info!("Retrying from step '{}'", step);
                            start = index;
                        }
                        RecoveryAction::Abort => {
                            if ui.output_mode().shows_details() {
                                let theme = LaunchTheme::for_colors(self.colors);
                                for line in render_steps(&run.steps(), &theme) {
                                    ui.message(&line);
                                }
                            }
                            ui.error("Launch halted");
                            return Ok(CommandResult::failure(1));
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(link) = flow.contract_link(&plan.team, &plan.project) {
            ui.message(&format!("Contract: {}", link));
        }
        ui.success("Launch complete");
        Ok(CommandResult::success())
    }
}

/// Execute from `start`, rendering each step transition as it lands.
async fn drive(
    sequencer: &Sequencer,
    run: &Run,
    start: usize,
    ui: &mut dyn UserInterface,
    printer: &mut StatusPrinter,
) -> Result<()> {
    let mut updates = run.subscribe();
    let execution = sequencer.run(run, start);
    tokio::pin!(execution);

    loop {
        tokio::select! {
            result = &mut execution => {
                printer.update(ui, &run.steps());
                return result;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    let result = (&mut execution).await;
                    printer.update(ui, &run.steps());
                    return result;
                }
                let steps = updates.borrow_and_update().steps.clone();
                printer.update(ui, &steps);
            }
        }
    }
}

fn launch_summary(plan: &LaunchPlan, flow: &LaunchFlow) -> String {
    let name = match (&plan.token, &plan.collection) {
        (Some(token), _) if flow.variant.is_none() => token.symbol.clone(),
        (_, Some(collection)) => collection.symbol.clone(),
        _ => String::new(),
    };
    match flow.variant {
        Some(variant) => format!("{} collection {} ({})", plan.kind.as_str(), name, variant),
        None => format!("{} {}", plan.kind.as_str(), name),
    }
}

fn plan_dir(plan: &Path) -> Option<std::path::PathBuf> {
    plan.parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

fn print_output() -> OutputCallback {
    Arc::new(|line| match line {
        OutputLine::Stdout(text) => println!("    {}", text),
        OutputLine::Stderr(text) => eprintln!("    {}", text),
    })
}
