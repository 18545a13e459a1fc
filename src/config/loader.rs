//! Launch plan loading and validation.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::schema::{LaunchKind, LaunchPlan};
use crate::error::{LaunchError, Result};

/// Environment variable that overrides `settings.batch_size`.
pub const BATCH_SIZE_ENV: &str = "LAUNCHPAD_BATCH_SIZE";

/// Load, apply environment overrides to, and validate a launch plan.
///
/// # Errors
///
/// Returns `PlanNotFound` if the file doesn't exist.
/// Returns `PlanParseError` if the YAML is invalid.
/// Returns `PlanValidationError` if required sections or commands are missing.
pub fn load_plan(path: &Path) -> Result<LaunchPlan> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LaunchError::PlanNotFound {
                path: path.to_path_buf(),
            }
        } else {
            LaunchError::Io(e)
        }
    })?;

    let mut plan = parse_plan(&content, path)?;
    apply_batch_size_override(&mut plan, std::env::var(BATCH_SIZE_ENV).ok().as_deref())?;
    validate_plan(&plan)?;

    debug!(
        "Loaded {} plan from {} (batch size {})",
        plan.kind.as_str(),
        path.display(),
        plan.settings.batch_size
    );
    Ok(plan)
}

/// Parse launch plan YAML.
pub fn parse_plan(content: &str, source_path: &Path) -> Result<LaunchPlan> {
    serde_yaml::from_str(content).map_err(|e| LaunchError::PlanParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Replace the plan's batch size with `raw`, when set.
pub fn apply_batch_size_override(plan: &mut LaunchPlan, raw: Option<&str>) -> Result<()> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(());
    };

    let size = raw
        .parse::<usize>()
        .map_err(|_| LaunchError::PlanValidationError {
            message: format!("{} must be a positive integer, got '{}'", BATCH_SIZE_ENV, raw),
        })?;
    plan.settings.batch_size = size;
    Ok(())
}

/// Check that the plan has everything its flow needs.
pub fn validate_plan(plan: &LaunchPlan) -> Result<()> {
    let mut problems = Vec::new();

    if plan.settings.batch_size == 0 {
        problems.push("settings.batch_size must be at least 1".to_string());
    }

    let commands = &plan.commands;
    let require = |name: &str, command: &Option<String>| {
        if command.as_deref().map_or(true, |c| c.trim().is_empty()) {
            Some(format!("commands.{} is required", name))
        } else {
            None
        }
    };

    match plan.kind {
        LaunchKind::Token => {
            problems.extend(require("deploy_contract", &commands.deploy_contract));
            problems.extend(require("set_claim_conditions", &commands.set_claim_conditions));
            problems.extend(require("mint", &commands.mint));
            match &plan.token {
                Some(token) if token.wants_airdrop() => {
                    problems.extend(require("airdrop", &commands.airdrop))
                }
                Some(_) => {}
                None => problems.push("token section is required for kind: token".to_string()),
            }
        }
        LaunchKind::Nft => {
            problems.extend(require("deploy_contract", &commands.deploy_contract));
            problems.extend(require("mint", &commands.mint));
            problems.extend(require("set_claim_conditions", &commands.set_claim_conditions));
            if plan.collection.is_none() {
                problems.push("collection section is required for kind: nft".to_string());
            }
            if plan.nfts.is_empty() {
                problems.push("nfts must list at least one item".to_string());
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(LaunchError::PlanValidationError {
            message: problems.join("; "),
        })
    }
}
