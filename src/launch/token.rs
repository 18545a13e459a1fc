//! Token launch flow.
//!
//! Steps, in order: deploy the contract, set claim conditions, mint the
//! owner's supply, and (only when enabled with at least one recipient)
//! airdrop tokens.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::runner::TrackingContext;
use crate::steps::{Action, StepContext, StepDescriptor, StepPlan};

use super::step_ids::{AIRDROP_TOKENS, DEPLOY_CONTRACT, MINT_TOKENS, SET_CLAIM_CONDITIONS};
use super::{chain_id_value, DeployedContract, LaunchArtifacts, LaunchFlow};

/// One airdrop recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirdropRecipient {
    pub address: String,
    pub quantity: String,
}

/// Everything the token launch needs from the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLaunchValues {
    pub name: String,
    pub symbol: String,

    /// Chain id.
    pub chain: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Total supply as a decimal string.
    pub supply: String,

    #[serde(default)]
    pub sale_enabled: bool,

    #[serde(default)]
    pub airdrop_enabled: bool,

    #[serde(default)]
    pub airdrop_addresses: Vec<AirdropRecipient>,
}

impl TokenLaunchValues {
    /// Whether the airdrop step belongs in the plan.
    pub fn wants_airdrop(&self) -> bool {
        self.airdrop_enabled && !self.airdrop_addresses.is_empty()
    }
}

/// The blockchain operations behind a token launch.
#[async_trait]
pub trait TokenLaunchFunctions: Send + Sync {
    /// Deploy the token contract and return its address.
    async fn deploy_contract(&self, values: &TokenLaunchValues) -> anyhow::Result<String>;

    async fn set_claim_conditions(
        &self,
        values: &TokenLaunchValues,
        contract: &DeployedContract,
    ) -> anyhow::Result<()>;

    async fn mint_tokens(
        &self,
        values: &TokenLaunchValues,
        contract: &DeployedContract,
    ) -> anyhow::Result<()>;

    async fn airdrop_tokens(
        &self,
        values: &TokenLaunchValues,
        contract: &DeployedContract,
    ) -> anyhow::Result<()>;
}

/// Builds the token launch plan.
pub struct TokenLaunch {
    values: Arc<TokenLaunchValues>,
    functions: Arc<dyn TokenLaunchFunctions>,
}

impl TokenLaunch {
    pub fn new(values: TokenLaunchValues, functions: Arc<dyn TokenLaunchFunctions>) -> Self {
        Self {
            values: Arc::new(values),
            functions,
        }
    }

    /// Tracking category and properties for this launch.
    pub fn tracking(&self) -> TrackingContext {
        TrackingContext::new("token")
            .with("chainId", chain_id_value(&self.values.chain))
            .with("airdropEnabled", self.values.airdrop_enabled)
            .with("saleEnabled", self.values.sale_enabled)
    }

    /// Compose the final step list.
    pub fn build(self) -> LaunchFlow {
        let artifacts = LaunchArtifacts::new();
        let step = |kind: TokenStep, id: &str, label: &str| {
            StepDescriptor::new(
                id,
                label,
                Arc::new(TokenStepAction {
                    kind,
                    values: Arc::clone(&self.values),
                    functions: Arc::clone(&self.functions),
                    artifacts: artifacts.clone(),
                }),
            )
        };

        let plan = StepPlan::new()
            .push(step(TokenStep::Deploy, DEPLOY_CONTRACT, "Deploy contract"))
            .push(step(
                TokenStep::ClaimConditions,
                SET_CLAIM_CONDITIONS,
                "Set claim conditions",
            ))
            .push(step(TokenStep::Mint, MINT_TOKENS, "Mint tokens"))
            .push_if(self.values.wants_airdrop(), || {
                step(TokenStep::Airdrop, AIRDROP_TOKENS, "Airdrop tokens")
            });

        LaunchFlow {
            plan,
            tracking: self.tracking(),
            artifacts,
            variant: None,
            claim_batches: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TokenStep {
    Deploy,
    ClaimConditions,
    Mint,
    Airdrop,
}

struct TokenStepAction {
    kind: TokenStep,
    values: Arc<TokenLaunchValues>,
    functions: Arc<dyn TokenLaunchFunctions>,
    artifacts: LaunchArtifacts,
}

#[async_trait]
impl Action for TokenStepAction {
    async fn execute(&self, _ctx: &StepContext) -> anyhow::Result<()> {
        let values = self.values.as_ref();
        let functions = self.functions.as_ref();
        match self.kind {
            TokenStep::Deploy => {
                let address = functions.deploy_contract(values).await?;
                self.artifacts
                    .set_contract(DeployedContract::new(values.chain.clone(), address));
                Ok(())
            }
            TokenStep::ClaimConditions => {
                let contract = self.artifacts.require_contract()?;
                functions.set_claim_conditions(values, &contract).await
            }
            TokenStep::Mint => {
                let contract = self.artifacts.require_contract()?;
                functions.mint_tokens(values, &contract).await
            }
            TokenStep::Airdrop => {
                let contract = self.artifacts.require_contract()?;
                functions.airdrop_tokens(values, &contract).await
            }
        }
    }
}
