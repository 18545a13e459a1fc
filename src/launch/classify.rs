//! Contract variant selection for NFT collections.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One NFT of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftItem {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Image path or URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Number of editions.
    #[serde(default = "default_supply")]
    pub supply: u64,

    /// Price per edition as a decimal string.
    #[serde(default = "default_price")]
    pub price_amount: String,

    /// Currency address or symbol.
    #[serde(default = "default_currency")]
    pub price_currency: String,
}

fn default_supply() -> u64 {
    1
}

fn default_price() -> String {
    "0".to_string()
}

fn default_currency() -> String {
    "native".to_string()
}

impl NftItem {
    /// A single-edition item with the default price.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            image: None,
            supply: default_supply(),
            price_amount: default_price(),
            price_currency: default_currency(),
        }
    }

    pub fn with_supply(mut self, supply: u64) -> Self {
        self.supply = supply;
        self
    }

    pub fn with_price(mut self, amount: impl Into<String>, currency: impl Into<String>) -> Self {
        self.price_amount = amount.into();
        self.price_currency = currency.into();
        self
    }
}

/// Token standard a collection is deployed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractVariant {
    /// One-of-one items sharing a single price.
    Erc721,
    /// Multi-edition items or per-item pricing.
    Erc1155,
}

impl ContractVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Erc721 => "erc721",
            Self::Erc1155 => "erc1155",
        }
    }
}

impl fmt::Display for ContractVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the contract variant for a collection.
///
/// ERC-721 when every item has a supply of exactly 1 and the same price
/// amount and currency as the first item; ERC-1155 otherwise. An empty
/// collection selects ERC-721.
pub fn select_contract_variant(items: &[NftItem]) -> ContractVariant {
    let Some(first) = items.first() else {
        return ContractVariant::Erc721;
    };

    let uniform = items.iter().all(|item| {
        item.supply == 1
            && item.price_amount == first.price_amount
            && item.price_currency == first.price_currency
    });

    if uniform {
        ContractVariant::Erc721
    } else {
        ContractVariant::Erc1155
    }
}
