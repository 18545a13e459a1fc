//! Integration tests for the token and NFT collection launch flows.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use launchpad::launch::{
    AirdropRecipient, CollectionInfo, ContractVariant, DeployedContract, NftCollectionValues,
    NftItem, NftLaunch, NftLaunchFunctions, SalesSettings, TokenLaunch, TokenLaunchFunctions,
    TokenLaunchValues,
};
use launchpad::runner::{CollectingSink, Sequencer};
use launchpad::steps::{Batch, StepStatus};

#[derive(Default)]
struct FakeChain {
    calls: Mutex<Vec<String>>,
    fail_batch: Option<usize>,
    failed: AtomicBool,
}

impl FakeChain {
    fn failing_batch(index: usize) -> Self {
        Self {
            fail_batch: Some(index),
            ..Default::default()
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenLaunchFunctions for FakeChain {
    async fn deploy_contract(&self, values: &TokenLaunchValues) -> anyhow::Result<String> {
        self.record(format!("deploy {}", values.symbol));
        Ok("0xtoken".to_string())
    }

    async fn set_claim_conditions(
        &self,
        _values: &TokenLaunchValues,
        contract: &DeployedContract,
    ) -> anyhow::Result<()> {
        self.record(format!("claim {}", contract.address));
        Ok(())
    }

    async fn mint_tokens(
        &self,
        values: &TokenLaunchValues,
        contract: &DeployedContract,
    ) -> anyhow::Result<()> {
        self.record(format!("mint {} on {}", values.supply, contract.address));
        Ok(())
    }

    async fn airdrop_tokens(
        &self,
        values: &TokenLaunchValues,
        _contract: &DeployedContract,
    ) -> anyhow::Result<()> {
        self.record(format!("airdrop {}", values.airdrop_addresses.len()));
        Ok(())
    }
}

#[async_trait]
impl NftLaunchFunctions for FakeChain {
    async fn deploy_contract(
        &self,
        variant: ContractVariant,
        _values: &NftCollectionValues,
    ) -> anyhow::Result<String> {
        self.record(format!("deploy {}", variant));
        Ok("0xnft".to_string())
    }

    async fn lazy_mint_nfts(
        &self,
        _variant: ContractVariant,
        values: &NftCollectionValues,
        _contract: &DeployedContract,
    ) -> anyhow::Result<()> {
        self.record(format!("lazy mint {}", values.nfts.len()));
        Ok(())
    }

    async fn set_claim_conditions(
        &self,
        _variant: ContractVariant,
        _values: &NftCollectionValues,
        _contract: &DeployedContract,
        batch: Option<Batch>,
    ) -> anyhow::Result<()> {
        match batch {
            Some(batch) => {
                self.record(format!("claim {}+{}", batch.start_index, batch.count));
                if self.fail_batch == Some(batch.index) && !self.failed.swap(true, Ordering::SeqCst)
                {
                    return Err(anyhow!("Too Many Requests"));
                }
            }
            None => self.record("claim all".to_string()),
        }
        Ok(())
    }
}

fn token(airdrop: usize) -> TokenLaunchValues {
    TokenLaunchValues {
        name: "Acme".into(),
        symbol: "ACME".into(),
        chain: "137".into(),
        description: Some("Acme governance token".into()),
        supply: "1000000".into(),
        sale_enabled: true,
        airdrop_enabled: airdrop > 0,
        airdrop_addresses: (0..airdrop)
            .map(|i| AirdropRecipient {
                address: format!("0x{:040x}", i + 1),
                quantity: "100".into(),
            })
            .collect(),
    }
}

fn collection(nfts: Vec<NftItem>) -> NftCollectionValues {
    NftCollectionValues {
        collection: CollectionInfo {
            name: "Genesis".into(),
            symbol: "GEN".into(),
            chain: "8453".into(),
            description: None,
        },
        nfts,
        sales: SalesSettings::default(),
    }
}

#[tokio::test]
async fn token_launch_runs_steps_against_deployed_contract() {
    let chain = Arc::new(FakeChain::default());
    let flow = TokenLaunch::new(token(2), chain.clone()).build();
    let sink = Arc::new(CollectingSink::new());
    let sequencer = Sequencer::new()
        .with_tracker(sink.clone())
        .with_tracking_context(flow.tracking.clone());
    let run = sequencer.initialize(flow.plan.clone());

    sequencer.run(&run, 0).await.unwrap();

    assert_eq!(
        chain.calls(),
        vec![
            "deploy ACME",
            "claim 0xtoken",
            "mint 1000000 on 0xtoken",
            "airdrop 2"
        ]
    );
    assert_eq!(
        flow.contract_link("acme", "shop").as_deref(),
        Some("/team/acme/shop/contract/137/0xtoken")
    );
    assert_eq!(sink.keys()[1], "token.launch.success");
    assert_eq!(sink.events()[0].data["airdropEnabled"], true);
}

#[tokio::test]
async fn token_launch_without_airdrop_has_three_steps() {
    let chain = Arc::new(FakeChain::default());
    let flow = TokenLaunch::new(token(0), chain.clone()).build();
    let sequencer = Sequencer::new();
    let run = sequencer.initialize(flow.plan);

    sequencer.run(&run, 0).await.unwrap();

    assert_eq!(run.len(), 3);
    assert!(!chain.calls().iter().any(|c| c.starts_with("airdrop")));
}

#[tokio::test]
async fn erc721_collection_sets_claim_conditions_once() {
    let chain = Arc::new(FakeChain::default());
    let flow = NftLaunch::new(
        collection(vec![NftItem::new("a"), NftItem::new("b")]),
        chain.clone(),
    )
    .build();
    let sequencer = Sequencer::new();
    let run = sequencer.initialize(flow.plan.clone());

    sequencer.run(&run, 0).await.unwrap();

    assert_eq!(
        chain.calls(),
        vec!["deploy erc721", "lazy mint 2", "claim all"]
    );
}

#[tokio::test]
async fn erc1155_collection_batches_and_resumes_claim_conditions() {
    let items = (0..120)
        .map(|i| NftItem::new(format!("Edition {}", i)).with_supply(25))
        .collect();
    let chain = Arc::new(FakeChain::failing_batch(1));
    let flow = NftLaunch::new(collection(items), chain.clone()).build();
    let sequencer = Sequencer::new();
    let run = sequencer.initialize(flow.plan.clone());

    let err = sequencer.run(&run, 0).await.unwrap_err();
    assert!(err.to_string().contains("set-claim-conditions"));

    let failed = run.step(2).unwrap();
    assert_eq!(
        failed.status,
        StepStatus::Error("RPC rate limit reached, wait a moment and retry".into())
    );
    assert_eq!(failed.batches_processed, 1);

    sequencer.retry(&run, "set-claim-conditions").await;

    assert!(run.is_complete());
    assert_eq!(
        chain.calls(),
        vec![
            "deploy erc1155",
            "lazy mint 120",
            "claim 0+50",
            "claim 50+50",
            "claim 50+50",
            "claim 100+20",
        ]
    );
}

#[tokio::test]
async fn batch_size_controls_claim_calls() {
    let items = (0..5)
        .map(|i| NftItem::new(format!("#{}", i)).with_price(format!("0.{}", i + 1), "native"))
        .collect();
    let chain = Arc::new(FakeChain::default());
    let flow = NftLaunch::new(collection(items), chain.clone())
        .with_batch_size(2)
        .build();
    assert_eq!(flow.variant, Some(ContractVariant::Erc1155));

    let sequencer = Sequencer::new();
    let run = sequencer.initialize(flow.plan.clone());
    sequencer.run(&run, 0).await.unwrap();

    let claims: Vec<_> = chain
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("claim"))
        .collect();
    assert_eq!(claims, vec!["claim 0+2", "claim 2+2", "claim 4+1"]);
}
