//! NFT collection launch flow.
//!
//! Steps, in order: deploy the contract, lazy-mint the NFTs, and set claim
//! conditions. The contract variant is chosen once from the items before
//! the plan is built. For ERC-1155 the claim-conditions step is split into
//! batches over the item list; for ERC-721 it is a single call.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::runner::TrackingContext;
use crate::steps::{
    Action, Batch, BatchAction, BatchPlan, BatchedAction, StepContext, StepDescriptor, StepPlan,
    DEFAULT_BATCH_SIZE,
};

use super::classify::{select_contract_variant, ContractVariant, NftItem};
use super::step_ids::{DEPLOY_CONTRACT, MINT_NFTS, SET_CLAIM_CONDITIONS};
use super::{chain_id_value, DeployedContract, LaunchArtifacts, LaunchFlow};

/// Collection-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub symbol: String,

    /// Chain id.
    pub chain: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Sale and royalty settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_sale_recipient: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub royalty_recipient: Option<String>,

    /// Royalty in basis points.
    #[serde(default)]
    pub royalty_bps: u16,
}

/// Everything the NFT collection launch needs from the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftCollectionValues {
    pub collection: CollectionInfo,

    #[serde(default)]
    pub nfts: Vec<NftItem>,

    #[serde(default)]
    pub sales: SalesSettings,
}

/// The blockchain operations behind an NFT collection launch.
#[async_trait]
pub trait NftLaunchFunctions: Send + Sync {
    /// Deploy the collection contract and return its address.
    async fn deploy_contract(
        &self,
        variant: ContractVariant,
        values: &NftCollectionValues,
    ) -> anyhow::Result<String>;

    async fn lazy_mint_nfts(
        &self,
        variant: ContractVariant,
        values: &NftCollectionValues,
        contract: &DeployedContract,
    ) -> anyhow::Result<()>;

    /// Set claim conditions, for all items (`batch` is `None`) or for one
    /// batch of items.
    async fn set_claim_conditions(
        &self,
        variant: ContractVariant,
        values: &NftCollectionValues,
        contract: &DeployedContract,
        batch: Option<Batch>,
    ) -> anyhow::Result<()>;
}

/// Builds the NFT collection launch plan.
pub struct NftLaunch {
    values: Arc<NftCollectionValues>,
    functions: Arc<dyn NftLaunchFunctions>,
    batch_size: usize,
}

impl NftLaunch {
    pub fn new(values: NftCollectionValues, functions: Arc<dyn NftLaunchFunctions>) -> Self {
        Self {
            values: Arc::new(values),
            functions,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the items-per-call ceiling for batched steps.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// The variant this collection deploys as.
    pub fn variant(&self) -> ContractVariant {
        select_contract_variant(&self.values.nfts)
    }

    /// Tracking category and properties for this launch.
    pub fn tracking(&self) -> TrackingContext {
        TrackingContext::new("nft")
            .with("chainId", chain_id_value(&self.values.collection.chain))
            .with("ercType", self.variant().as_str())
    }

    /// Compose the final step list.
    pub fn build(self) -> LaunchFlow {
        let variant = self.variant();
        let artifacts = LaunchArtifacts::new();
        let plural = self.values.nfts.len() > 1;

        let step_action = |kind: NftStep| -> Arc<dyn Action> {
            Arc::new(NftStepAction {
                kind,
                variant,
                values: Arc::clone(&self.values),
                functions: Arc::clone(&self.functions),
                artifacts: artifacts.clone(),
            })
        };

        let (claim_action, claim_batches): (Arc<dyn Action>, _) = match variant {
            ContractVariant::Erc721 => (step_action(NftStep::ClaimConditions), None),
            ContractVariant::Erc1155 => {
                let batches = BatchPlan::new(self.values.nfts.len(), self.batch_size);
                let inner = Arc::new(ClaimConditionBatches {
                    variant,
                    values: Arc::clone(&self.values),
                    functions: Arc::clone(&self.functions),
                    artifacts: artifacts.clone(),
                });
                let action: Arc<dyn Action> = Arc::new(BatchedAction::new(batches, inner));
                (action, Some(batches))
            }
        };

        let plan = StepPlan::new()
            .push(StepDescriptor::new(
                DEPLOY_CONTRACT,
                "Deploy contract",
                step_action(NftStep::Deploy),
            ))
            .push(StepDescriptor::new(
                MINT_NFTS,
                if plural { "Mint NFTs" } else { "Mint NFT" },
                step_action(NftStep::LazyMint),
            ))
            .push(StepDescriptor::new(
                SET_CLAIM_CONDITIONS,
                if plural {
                    "Set claim conditions"
                } else {
                    "Set claim condition"
                },
                claim_action,
            ));

        LaunchFlow {
            plan,
            tracking: self.tracking(),
            artifacts,
            variant: Some(variant),
            claim_batches,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum NftStep {
    Deploy,
    LazyMint,
    ClaimConditions,
}

struct NftStepAction {
    kind: NftStep,
    variant: ContractVariant,
    values: Arc<NftCollectionValues>,
    functions: Arc<dyn NftLaunchFunctions>,
    artifacts: LaunchArtifacts,
}

#[async_trait]
impl Action for NftStepAction {
    async fn execute(&self, _ctx: &StepContext) -> anyhow::Result<()> {
        let values = self.values.as_ref();
        let functions = self.functions.as_ref();
        match self.kind {
            NftStep::Deploy => {
                let address = functions.deploy_contract(self.variant, values).await?;
                self.artifacts.set_contract(DeployedContract::new(
                    values.collection.chain.clone(),
                    address,
                ));
                Ok(())
            }
            NftStep::LazyMint => {
                let contract = self.artifacts.require_contract()?;
                functions
                    .lazy_mint_nfts(self.variant, values, &contract)
                    .await
            }
            NftStep::ClaimConditions => {
                let contract = self.artifacts.require_contract()?;
                functions
                    .set_claim_conditions(self.variant, values, &contract, None)
                    .await
            }
        }
    }
}

struct ClaimConditionBatches {
    variant: ContractVariant,
    values: Arc<NftCollectionValues>,
    functions: Arc<dyn NftLaunchFunctions>,
    artifacts: LaunchArtifacts,
}

#[async_trait]
impl BatchAction for ClaimConditionBatches {
    async fn execute_batch(&self, batch: Batch) -> anyhow::Result<()> {
        let contract = self.artifacts.require_contract()?;
        self.functions
            .set_claim_conditions(self.variant, &self.values, &contract, Some(batch))
            .await
    }
}
