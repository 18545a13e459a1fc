//! Launch plan schema.
//!
//! These structs map one-to-one onto the YAML launch plan file.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::launch::{
    CollectionInfo, NftCollectionValues, NftItem, SalesSettings, TokenLaunchValues,
};
use crate::steps::DEFAULT_BATCH_SIZE;

/// Root of a launch plan file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchPlan {
    /// Which flow this plan drives.
    pub kind: LaunchKind,

    /// Team slug used in the dashboard link.
    #[serde(default)]
    pub team: String,

    /// Project slug used in the dashboard link.
    #[serde(default)]
    pub project: String,

    #[serde(default)]
    pub settings: PlanSettings,

    /// NFT collection metadata (`kind: nft`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionInfo>,

    /// NFT items (`kind: nft`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nfts: Vec<NftItem>,

    #[serde(default)]
    pub sales: SalesSettings,

    /// Token values (`kind: token`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenLaunchValues>,

    /// Shell command templates bound to each launch operation.
    #[serde(default)]
    pub commands: CommandSet,
}

impl LaunchPlan {
    /// NFT collection values, when the plan has a collection.
    pub fn nft_values(&self) -> Option<NftCollectionValues> {
        self.collection.as_ref().map(|collection| NftCollectionValues {
            collection: collection.clone(),
            nfts: self.nfts.clone(),
            sales: self.sales.clone(),
        })
    }
}

/// Launch flow selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchKind {
    Token,
    Nft,
}

impl LaunchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Nft => "nft",
        }
    }
}

/// Plan-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanSettings {
    /// Items per call for batched steps.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Emit tracking events.
    #[serde(default = "default_true")]
    pub tracking: bool,

    /// Per-command timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Extra environment for every command.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            tracking: true,
            timeout: None,
            env: HashMap::new(),
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_true() -> bool {
    true
}

/// Command templates, one per launch operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_contract: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_claim_conditions: Option<String>,

    /// Token mint or NFT lazy mint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub airdrop: Option<String>,
}
