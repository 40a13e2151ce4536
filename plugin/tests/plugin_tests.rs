//! Facade tests: configuration loading, policy listing and dispatch over
//! the full Fantom catalog, backed by the in-memory chain.

use std::io::Write;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use stake_contracts::{ContractRegistry, Ecosystem, SigningContext};
use stake_nullables::{NullChain, NullClock, NullProvider, NullWallet};
use stake_plugin::{PluginConfig, StakePlugin};
use stake_policies::fantom::fantom_contracts;
use stake_policies::{ChangeQuoteRequest, MetadataCategory, StakePositionRequest};
use stake_types::{NativeAmount, StakeAction, StakeError};

const MASONRY_ID: &str = "tomb_masonry:fantom:TSHARE=fantom:TOMB";
const FTM_TOMB_ID: &str = "tombswap_cemetery_v2:fantom:FTM+fantom:TOMB=fantom:LSHARE";
const NOW: u64 = 1_700_000_000;

fn u(v: u64) -> U256 {
    U256::from(v)
}

struct Fixture {
    chain: NullChain,
    registry: ContractRegistry,
    account: Address,
    wallet: Arc<dyn SigningContext>,
}

impl Fixture {
    fn new() -> Self {
        let chain = NullChain::new();
        chain.set_gas_price(1);
        let account = Address::repeat_byte(0x42);
        Self {
            wallet: NullWallet::shared(account, chain.clone()),
            registry: fantom_contracts().unwrap(),
            chain,
            account,
        }
    }

    fn addr(&self, name: &str) -> Address {
        self.registry.get_contract_info(name).unwrap().address
    }

    fn plugin(&self, disabled: &[String]) -> StakePlugin {
        let eco = Ecosystem::new(
            self.registry.clone(),
            vec![NullProvider::shared("null://fantom", self.chain.clone())],
        );
        StakePlugin::with_ecosystem(eco, disabled, Arc::new(NullClock::new(NOW))).unwrap()
    }

    fn seed_masonry(&self) {
        let masonry = self.addr("TOMB_MASONRY");
        self.chain
            .add_masonry(masonry, self.addr("TSHARE"), self.addr("TOMB"));
        self.chain.add_treasury(self.addr("TOMB_TREASURY"), 21_600);
        self.chain.set_masonry_epoch(masonry, 10, NOW + 600, 6, 3);
        self.chain.set_masonry_stake(masonry, self.account, u(1_000), 2);
        self.chain.set_masonry_earned(masonry, self.account, u(250));
        self.chain.mint(self.addr("TSHARE"), self.account, u(10));
    }

    fn request(&self, action: StakeAction, id: &str, code: &str, amount: u128) -> ChangeQuoteRequest {
        ChangeQuoteRequest {
            action,
            stake_policy_id: id.to_string(),
            currency_code: code.to_string(),
            token_id: None,
            native_amount: NativeAmount::from_u128(amount),
            wallet: self.wallet.clone(),
        }
    }

    fn position(&self, id: &str) -> StakePositionRequest {
        StakePositionRequest {
            stake_policy_id: id.to_string(),
            wallet: self.wallet.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// 1. Configuration
// ---------------------------------------------------------------------------

#[test]
fn plugin_loads_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        r#"
        disabled_policies = ["{MASONRY_ID}"]

        [fantom]
        rpc_urls = ["http://127.0.0.1:1"]
        "#
    )
    .unwrap();

    let config = PluginConfig::from_toml_file(file.path()).unwrap();
    let plugin = StakePlugin::new(&config).unwrap();
    let policies = plugin.get_stake_policies();

    assert_eq!(policies.len(), 31);
    assert!(policies.iter().all(|p| p.stake_policy_id != MASONRY_ID));
    assert!(policies.iter().any(|p| p.stake_policy_id == FTM_TOMB_ID));
}

// ---------------------------------------------------------------------------
// 2. Dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn details_wrap_the_masonry_position() {
    let f = Fixture::new();
    f.seed_masonry();
    let plugin = f.plugin(&[]);

    let details = plugin.fetch_stake_details(f.position(MASONRY_ID)).await.unwrap();
    let position = details.position;

    // The catalog retires new stakes.
    assert!(!position.can_stake);
    assert!(position.can_unstake);
    assert!(position.can_claim);
    assert_eq!(position.staked().next().unwrap().native_amount.raw(), u(1_000));
}

#[tokio::test]
async fn retired_stake_is_unsupported() {
    let f = Fixture::new();
    f.seed_masonry();
    let plugin = f.plugin(&[]);

    let err = plugin
        .fetch_change_quote(f.request(StakeAction::Stake, MASONRY_ID, "TSHARE", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, StakeError::Unsupported(_)), "got {err:?}");
}

#[tokio::test]
async fn claim_records_metadata_for_its_transaction() {
    let f = Fixture::new();
    f.seed_masonry();
    let plugin = f.plugin(&[]);

    let quote = plugin
        .fetch_change_quote(f.request(StakeAction::Claim, MASONRY_ID, "TOMB", 0))
        .await
        .unwrap();
    assert_eq!(quote.allocations[0].native_amount.raw(), u(250));
    quote.approve().await.unwrap();

    let sent = f.chain.sent_transactions();
    assert_eq!(sent.len(), 1);
    let entries = plugin.tx_metadata(&sent[0].hash);
    let category = |code: &str| {
        entries
            .iter()
            .find(|e| e.currency_code == code)
            .map(|e| e.metadata.category)
    };
    assert_eq!(category("FTM"), Some(MetadataCategory::ExpenseFees));
    assert_eq!(category("TOMB"), Some(MetadataCategory::IncomeStaking));
    assert_eq!(f.chain.token_balance(f.addr("TOMB"), f.account), u(250));
}

#[tokio::test]
async fn disabled_policies_are_not_found() {
    let f = Fixture::new();
    f.seed_masonry();
    let plugin = f.plugin(&[MASONRY_ID.to_string()]);

    let err = plugin
        .fetch_stake_details(f.position(MASONRY_ID))
        .await
        .unwrap_err();
    assert!(matches!(err, StakeError::PolicyNotFound(_)), "got {err:?}");

    let err = plugin
        .fetch_change_quote(f.request(StakeAction::Claim, "no_such_policy", "TOMB", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, StakeError::PolicyNotFound(_)), "got {err:?}");
}
