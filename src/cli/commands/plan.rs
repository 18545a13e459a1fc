//! Plan command implementation.
//!
//! The `launchpad plan` command shows the composed step list of a launch
//! plan without running anything.

use std::sync::Arc;

use crate::cli::args::PlanArgs;
use crate::config::load_plan;
use crate::error::{LaunchError, Result};
use crate::launch::{flow_from_plan, CommandFunctions};
use crate::runner::Run;
use crate::shell::CommandOptions;
use crate::ui::{render_steps, LaunchTheme, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// The plan command implementation.
pub struct PlanCommand {
    args: PlanArgs,
    colors: bool,
}

impl PlanCommand {
    pub fn new(args: PlanArgs) -> Self {
        Self {
            args,
            colors: false,
        }
    }

    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }
}

impl Command for PlanCommand {
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

        let functions = Arc::new(
            CommandFunctions::new(plan.commands.clone(), CommandOptions::default()).dry_run(true),
        );
        let flow = flow_from_plan(&plan, functions)?;
        let theme = LaunchTheme::for_colors(self.colors);

        ui.show_header(&format!("{} launch plan", plan.kind.as_str()));
        if let Some(variant) = flow.variant {
            ui.message(&theme.format_field("Contract", variant.as_str()));
        }
        if let Some(batches) = flow.claim_batches {
            ui.message(&theme.format_field(
                "Claim condition batches",
                &format!(
                    "{} ({} items, {} per batch)",
                    batches.batch_count(),
                    batches.total_items(),
                    batches.batch_size()
                ),
            ));
        }
        ui.message(&theme.format_field("Tracking", &plan.settings.tracking.to_string()));

        let run = Run::new(flow.plan);
        for line in render_steps(&run.steps(), &theme) {
            ui.message(&line);
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn nft_plan(items: usize, supply: u64) -> String {
        let nfts: String = (0..items)
            .map(|i| format!("  - {{ name: \"#{}\", supply: {} }}\n", i, supply))
            .collect();
        format!(
            r#"
kind: nft
collection: {{ name: Genesis, symbol: GEN, chain: "8453" }}
nfts:
{}commands:
  deploy_contract: "echo 0xabc"
  mint: "true"
  set_claim_conditions: "true"
"#,
            nfts
        )
    }

    fn execute(body: &str) -> (CommandResult, MockUI) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("launch.yml");
        fs::write(&path, body).unwrap();

        let mut ui = MockUI::new();
        let result = PlanCommand::new(PlanArgs { plan: path })
            .execute(&mut ui)
            .unwrap();
        (result, ui)
    }

    #[test]
    fn lists_steps_and_variant() {
        let (result, ui) = execute(&nft_plan(2, 1));

        assert!(result.success);
        assert!(ui.has_message("Contract: erc721"));
        assert!(ui.has_message("Deploy contract"));
        assert!(ui.has_message("Mint NFTs"));
        assert!(ui.has_message("Set claim conditions"));
        assert!(!ui.has_message("Claim condition batches"));
    }

    #[test]
    fn shows_batches_for_multi_edition_collections() {
        let (_, ui) = execute(&nft_plan(120, 3));

        assert!(ui.has_message("Contract: erc1155"));
        assert!(ui.has_message("Claim condition batches: 3 (120 items, 50 per batch)"));
    }

    #[test]
    fn invalid_plan_fails() {
        let (result, ui) = execute("kind: nft");
        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("Invalid launch plan"));
    }
}
