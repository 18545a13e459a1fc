//! Token and NFT collection launch flows.
//!
//! Each flow turns form values plus a set of launch functions into a
//! [`StepPlan`] ready for the [`Sequencer`](crate::runner::Sequencer). The
//! deploy step stores the new contract in [`LaunchArtifacts`]; later steps
//! read it from there.

pub mod classify;
pub mod command;
pub mod nft;
pub mod token;

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::config::{LaunchKind, LaunchPlan};
use crate::error::{LaunchError, Result};
use crate::runner::TrackingContext;
use crate::steps::{BatchPlan, StepPlan};

pub use classify::{select_contract_variant, ContractVariant, NftItem};
pub use command::CommandFunctions;
pub use nft::{CollectionInfo, NftCollectionValues, NftLaunch, NftLaunchFunctions, SalesSettings};
pub use token::{AirdropRecipient, TokenLaunch, TokenLaunchFunctions, TokenLaunchValues};

/// Step ids shared by the launch flows.
pub mod step_ids {
    pub const DEPLOY_CONTRACT: &str = "deploy-contract";
    pub const SET_CLAIM_CONDITIONS: &str = "set-claim-conditions";
    pub const MINT_TOKENS: &str = "mint-tokens";
    pub const AIRDROP_TOKENS: &str = "airdrop-tokens";
    pub const MINT_NFTS: &str = "mint-nfts";
}

/// Dashboard path of a deployed contract.
pub fn contract_link(team: &str, project: &str, chain: &str, address: &str) -> String {
    format!("/team/{}/{}/contract/{}/{}", team, project, chain, address)
}

/// A contract produced by the deploy step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub chain: String,
    pub address: String,
}

impl DeployedContract {
    pub fn new(chain: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            address: address.into(),
        }
    }

    /// Dashboard path for this contract.
    pub fn link(&self, team: &str, project: &str) -> String {
        contract_link(team, project, &self.chain, &self.address)
    }
}

/// Outputs shared between the steps of one launch.
#[derive(Debug, Clone, Default)]
pub struct LaunchArtifacts {
    contract: Arc<RwLock<Option<DeployedContract>>>,
}

impl LaunchArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the deployed contract, replacing any earlier deployment.
    pub fn set_contract(&self, contract: DeployedContract) {
        *self
            .contract
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(contract);
    }

    /// The deployed contract, if the deploy step has succeeded.
    pub fn contract(&self) -> Option<DeployedContract> {
        self.contract
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The deployed contract, or an error for steps that need it.
    pub fn require_contract(&self) -> anyhow::Result<DeployedContract> {
        self.contract()
            .ok_or_else(|| anyhow::anyhow!("Contract has not been deployed yet"))
    }
}

/// A composed launch, ready to initialize.
#[derive(Debug, Clone)]
pub struct LaunchFlow {
    /// Final ordered steps.
    pub plan: StepPlan,
    /// Category and properties for tracking events.
    pub tracking: TrackingContext,
    /// Contract produced by the deploy step.
    pub artifacts: LaunchArtifacts,
    /// Selected variant (NFT collections only).
    pub variant: Option<ContractVariant>,
    /// Batching of the claim-conditions step, when it is batched.
    pub claim_batches: Option<BatchPlan>,
}

impl LaunchFlow {
    /// Dashboard path of the deployed contract, once deployed.
    pub fn contract_link(&self, team: &str, project: &str) -> Option<String> {
        self.artifacts
            .contract()
            .map(|contract| contract.link(team, project))
    }
}

/// Compose the flow a launch plan describes, backed by `functions`.
pub fn flow_from_plan(plan: &LaunchPlan, functions: Arc<CommandFunctions>) -> Result<LaunchFlow> {
    match plan.kind {
        LaunchKind::Token => {
            let values = plan.token.clone().ok_or_else(|| missing_section("token"))?;
            Ok(TokenLaunch::new(values, functions).build())
        }
        LaunchKind::Nft => {
            let values = plan.nft_values().ok_or_else(|| missing_section("collection"))?;
            Ok(NftLaunch::new(values, functions)
                .with_batch_size(plan.settings.batch_size)
                .build())
        }
    }
}

fn missing_section(section: &str) -> LaunchError {
    LaunchError::PlanValidationError {
        message: format!("{} section is required", section),
    }
}

/// Chain ids are tracked as numbers when they parse as one.
pub(crate) fn chain_id_value(chain: &str) -> Value {
    chain
        .parse::<u64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(chain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_link_format() {
        assert_eq!(
            contract_link("acme", "shop", "137", "0xabc"),
            "/team/acme/shop/contract/137/0xabc"
        );
    }

    #[test]
    fn artifacts_are_shared_between_clones() {
        let artifacts = LaunchArtifacts::new();
        let reader = artifacts.clone();
        assert!(reader.require_contract().is_err());

        artifacts.set_contract(DeployedContract::new("1", "0xdef"));
        assert_eq!(reader.contract().unwrap().address, "0xdef");
        assert_eq!(
            reader.contract().unwrap().link("t", "p"),
            "/team/t/p/contract/1/0xdef"
        );
    }

    #[test]
    fn flow_from_plan_follows_kind() {
        let plan: LaunchPlan = serde_yaml::from_str(
            r#"
kind: nft
settings: { batch_size: 2 }
collection: { name: Genesis, symbol: GEN, chain: "1" }
nfts:
  - { name: a, supply: 5 }
  - { name: b }
  - { name: c }
"#,
        )
        .unwrap();
        let functions = Arc::new(CommandFunctions::new(
            Default::default(),
            Default::default(),
        ));

        let flow = flow_from_plan(&plan, functions).unwrap();
        assert_eq!(flow.variant, Some(ContractVariant::Erc1155));
        assert_eq!(flow.claim_batches.map(|b| b.batch_count()), Some(2));
        assert_eq!(flow.tracking.category, "nft");
    }

    #[test]
    fn flow_from_plan_needs_section() {
        let plan: LaunchPlan = serde_yaml::from_str("kind: token").unwrap();
        let functions = Arc::new(CommandFunctions::new(
            Default::default(),
            Default::default(),
        ));
        assert!(matches!(
            flow_from_plan(&plan, functions),
            Err(LaunchError::PlanValidationError { .. })
        ));
    }

    #[test]
    fn chain_id_prefers_numbers() {
        assert_eq!(chain_id_value("137"), Value::from(137u64));
        assert_eq!(chain_id_value("sepolia"), Value::from("sepolia"));
    }
}
