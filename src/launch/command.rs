//! Launch functions backed by shell commands.
//!
//! Each launch operation runs the matching template from the plan's
//! [`CommandSet`]. Templates are interpolated with the launch variables
//! (`chain`, `contract_address`, `batch_start`, ...), and the same variables
//! are exported to the command as `LAUNCHPAD_<NAME>`.

use std::collections::HashMap;

use anyhow::Context as _;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::{resolve_string, CommandSet, InterpolationContext};
use crate::error::LaunchError;
use crate::shell::{
    execute, execute_streaming, CommandOptions, CommandResult, OutputCallback, OutputLine,
};
use crate::steps::Batch;

use super::classify::ContractVariant;
use super::nft::{NftCollectionValues, NftLaunchFunctions};
use super::token::{TokenLaunchFunctions, TokenLaunchValues};
use super::DeployedContract;

/// Address reported by deploys in dry-run mode.
pub const DRY_RUN_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Runs launch operations as shell commands.
#[derive(Clone)]
pub struct CommandFunctions {
    commands: CommandSet,
    options: CommandOptions,
    base: InterpolationContext,
    dry_run: bool,
    echo: Option<OutputCallback>,
}

impl CommandFunctions {
    /// Commands resolved against the process environment.
    pub fn new(commands: CommandSet, options: CommandOptions) -> Self {
        Self {
            commands,
            options,
            base: InterpolationContext::from_process_env(),
            dry_run: false,
            echo: None,
        }
    }

    /// Replace the base interpolation context.
    pub fn with_context(mut self, base: InterpolationContext) -> Self {
        self.base = base;
        self
    }

    /// Print commands instead of running them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Stream command output (and dry-run echoes) to `callback`.
    pub fn with_output(mut self, callback: OutputCallback) -> Self {
        self.echo = Some(callback);
        self
    }

    /// Interpolate `template` with `vars` layered over the base context.
    pub fn render(&self, template: &str, vars: &[(&str, String)]) -> crate::error::Result<String> {
        let mut ctx = self.base.clone();
        for (name, value) in vars {
            ctx.set(*name, value);
        }
        resolve_string(template, &ctx)
    }

    async fn run_operation(
        &self,
        operation: &str,
        template: Option<&str>,
        vars: Vec<(&str, String)>,
    ) -> anyhow::Result<CommandResult> {
        let template = template
            .ok_or_else(|| anyhow::anyhow!("No command configured for {}", operation))?;
        let command = self.render(template, &vars)?;

        if self.dry_run {
            info!("[dry-run] {}: {}", operation, command);
            if let Some(echo) = &self.echo {
                echo(OutputLine::Stdout(format!("$ {}", command)));
            }
            return Ok(CommandResult {
                exit_code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
                duration: Default::default(),
                success: true,
            });
        }

        let mut options = self.options.clone();
        options.env.extend(exported_env(&vars));

        debug!("Running {}: {}", operation, command);
        let result = match &self.echo {
            Some(echo) => execute_streaming(&command, &options, echo.clone()).await?,
            None => execute(&command, &options).await?,
        };

        if result.success {
            return Ok(result);
        }

        let failure = anyhow::Error::new(LaunchError::CommandFailed {
            command: command.clone(),
            code: result.exit_code,
        });
        match last_stderr_line(&result) {
            Some(line) => Err(failure.context(line.to_string())),
            None => Err(failure),
        }
    }

    async fn deploy(&self, vars: Vec<(&str, String)>) -> anyhow::Result<String> {
        let result = self
            .run_operation("deploy_contract", self.commands.deploy_contract.as_deref(), vars)
            .await?;

        if self.dry_run {
            return Ok(DRY_RUN_ADDRESS.to_string());
        }

        result
            .last_line()
            .map(str::to_string)
            .context("Deploy command printed no contract address")
    }
}

impl std::fmt::Debug for CommandFunctions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandFunctions")
            .field("commands", &self.commands)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

fn exported_env(vars: &[(&str, String)]) -> HashMap<String, String> {
    vars.iter()
        .map(|(name, value)| (format!("LAUNCHPAD_{}", name.to_uppercase()), value.clone()))
        .collect()
}

fn last_stderr_line(result: &CommandResult) -> Option<&str> {
    result
        .stderr
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| !line.is_empty())
}

fn token_vars(values: &TokenLaunchValues) -> Vec<(&'static str, String)> {
    vec![
        ("chain", values.chain.clone()),
        ("name", values.name.clone()),
        ("symbol", values.symbol.clone()),
        ("supply", values.supply.clone()),
        ("airdrop_count", values.airdrop_addresses.len().to_string()),
    ]
}

fn nft_vars(variant: ContractVariant, values: &NftCollectionValues) -> Vec<(&'static str, String)> {
    vec![
        ("chain", values.collection.chain.clone()),
        ("name", values.collection.name.clone()),
        ("symbol", values.collection.symbol.clone()),
        ("variant", variant.to_string()),
        ("item_count", values.nfts.len().to_string()),
    ]
}

fn with_contract(
    mut vars: Vec<(&'static str, String)>,
    contract: &DeployedContract,
) -> Vec<(&'static str, String)> {
    vars.push(("contract_address", contract.address.clone()));
    vars
}

#[async_trait]
impl TokenLaunchFunctions for CommandFunctions {
    async fn deploy_contract(&self, values: &TokenLaunchValues) -> anyhow::Result<String> {
        self.deploy(token_vars(values)).await
    }

    async fn set_claim_conditions(
        &self,
        values: &TokenLaunchValues,
        contract: &DeployedContract,
    ) -> anyhow::Result<()> {
        self.run_operation(
            "set_claim_conditions",
            self.commands.set_claim_conditions.as_deref(),
            with_contract(token_vars(values), contract),
        )
        .await
        .map(drop)
    }

    async fn mint_tokens(
        &self,
        values: &TokenLaunchValues,
        contract: &DeployedContract,
    ) -> anyhow::Result<()> {
        self.run_operation(
            "mint",
            self.commands.mint.as_deref(),
            with_contract(token_vars(values), contract),
        )
        .await
        .map(drop)
    }

    async fn airdrop_tokens(
        &self,
        values: &TokenLaunchValues,
        contract: &DeployedContract,
    ) -> anyhow::Result<()> {
        self.run_operation(
            "airdrop",
            self.commands.airdrop.as_deref(),
            with_contract(token_vars(values), contract),
        )
        .await
        .map(drop)
    }
}

#[async_trait]
impl NftLaunchFunctions for CommandFunctions {
    async fn deploy_contract(
        &self,
        variant: ContractVariant,
        values: &NftCollectionValues,
    ) -> anyhow::Result<String> {
        self.deploy(nft_vars(variant, values)).await
    }

    async fn lazy_mint_nfts(
        &self,
        variant: ContractVariant,
        values: &NftCollectionValues,
        contract: &DeployedContract,
    ) -> anyhow::Result<()> {
        self.run_operation(
            "mint",
            self.commands.mint.as_deref(),
            with_contract(nft_vars(variant, values), contract),
        )
        .await
        .map(drop)
    }

    async fn set_claim_conditions(
        &self,
        variant: ContractVariant,
        values: &NftCollectionValues,
        contract: &DeployedContract,
        batch: Option<Batch>,
    ) -> anyhow::Result<()> {
        let (start, count) = match batch {
            Some(batch) => (batch.start_index, batch.count),
            None => (0, values.nfts.len()),
        };
        let mut vars = with_contract(nft_vars(variant, values), contract);
        vars.push(("batch_start", start.to_string()));
        vars.push(("batch_count", count.to_string()));

        self.run_operation(
            "set_claim_conditions",
            self.commands.set_claim_conditions.as_deref(),
            vars,
        )
        .await
        .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::classify::NftItem;
    use crate::launch::nft::{CollectionInfo, SalesSettings};
    use std::sync::{Arc, Mutex};

    fn token() -> TokenLaunchValues {
        TokenLaunchValues {
            name: "Acme".into(),
            symbol: "ACME".into(),
            chain: "137".into(),
            description: None,
            supply: "1000".into(),
            sale_enabled: false,
            airdrop_enabled: false,
            airdrop_addresses: Vec::new(),
        }
    }

    fn collection(items: usize) -> NftCollectionValues {
        NftCollectionValues {
            collection: CollectionInfo {
                name: "Genesis".into(),
                symbol: "GEN".into(),
                chain: "8453".into(),
                description: None,
            },
            nfts: (0..items).map(|i| NftItem::new(format!("#{}", i))).collect(),
            sales: SalesSettings::default(),
        }
    }

    fn functions(commands: CommandSet) -> CommandFunctions {
        CommandFunctions::new(commands, CommandOptions::default())
            .with_context(InterpolationContext::new())
    }

    #[tokio::test]
    async fn deploy_returns_last_stdout_line() {
        let fns = functions(CommandSet {
            deploy_contract: Some("echo deploying ${name}; echo 0xabc".into()),
            ..Default::default()
        });
        let address = TokenLaunchFunctions::deploy_contract(&fns, &token())
            .await
            .unwrap();
        assert_eq!(address, "0xabc");
    }

    #[tokio::test]
    async fn deploy_without_output_fails() {
        let fns = functions(CommandSet {
            deploy_contract: Some("true".into()),
            ..Default::default()
        });
        let err = TokenLaunchFunctions::deploy_contract(&fns, &token())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no contract address"));
    }

    #[tokio::test]
    async fn variables_are_exported_to_env() {
        let fns = functions(CommandSet {
            deploy_contract: Some("echo $LAUNCHPAD_CHAIN-$LAUNCHPAD_SYMBOL".into()),
            ..Default::default()
        });
        let address = TokenLaunchFunctions::deploy_contract(&fns, &token())
            .await
            .unwrap();
        assert_eq!(address, "137-ACME");
    }

    #[tokio::test]
    async fn failure_carries_command_error_and_stderr() {
        let fns = functions(CommandSet {
            mint: Some("echo 'insufficient funds for gas' >&2; exit 1".into()),
            ..Default::default()
        });
        let err = fns
            .mint_tokens(&token(), &DeployedContract::new("137", "0xabc"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "insufficient funds for gas");
        let command_error = err.downcast_ref::<LaunchError>().unwrap();
        assert!(matches!(command_error, LaunchError::CommandFailed { code: Some(1), .. }));
    }

    #[tokio::test]
    async fn missing_command_is_an_error() {
        let fns = functions(CommandSet::default());
        let err = fns
            .airdrop_tokens(&token(), &DeployedContract::new("137", "0xabc"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No command configured for airdrop"));
    }

    #[tokio::test]
    async fn unknown_variable_fails_before_running() {
        let fns = functions(CommandSet {
            mint: Some("touch should-not-exist; echo ${missing}".into()),
            ..Default::default()
        });
        let err = fns
            .mint_tokens(&token(), &DeployedContract::new("137", "0xabc"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LaunchError>(),
            Some(LaunchError::UnknownVariable { .. })
        ));
    }

    #[tokio::test]
    async fn claim_conditions_receive_batch_bounds() {
        let fns = functions(CommandSet {
            set_claim_conditions: Some(
                "test ${batch_start} = 50 && test ${batch_count} = 20 && test ${variant} = erc721"
                    .into(),
            ),
            ..Default::default()
        });
        let batch = Batch {
            index: 1,
            start_index: 50,
            count: 20,
            total_batches: 2,
        };
        NftLaunchFunctions::set_claim_conditions(
            &fns,
            ContractVariant::Erc721,
            &collection(70),
            &DeployedContract::new("8453", "0xabc"),
            Some(batch),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn unbatched_claim_conditions_cover_all_items() {
        let fns = functions(CommandSet {
            set_claim_conditions: Some("test ${batch_start} = 0 && test ${batch_count} = 3".into()),
            ..Default::default()
        });
        NftLaunchFunctions::set_claim_conditions(
            &fns,
            ContractVariant::Erc721,
            &collection(3),
            &DeployedContract::new("8453", "0xabc"),
            None,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn dry_run_echoes_instead_of_running() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let fns = functions(CommandSet {
            deploy_contract: Some("exit 1 # ${symbol}".into()),
            ..Default::default()
        })
        .dry_run(true)
        .with_output(Arc::new(move |line| sink.lock().unwrap().push(line)));

        let address = NftLaunchFunctions::deploy_contract(
            &fns,
            ContractVariant::Erc721,
            &collection(1),
        )
        .await
        .unwrap();

        assert_eq!(address, DRY_RUN_ADDRESS);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![OutputLine::Stdout("$ exit 1 # GEN".to_string())]
        );
    }
}
