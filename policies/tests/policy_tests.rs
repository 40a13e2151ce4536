//! End-to-end policy tests against the in-memory chain:
//! quote → approve → on-chain state and accounting notes.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use stake_contracts::{token_id, ContractRegistry, Ecosystem, Provider, SigningContext};
use stake_nullables::{FailingProvider, NullChain, NullClock, NullProvider, NullWallet};
use stake_policies::fantom::fantom_contracts;
use stake_policies::{
    CemeteryOptions, CemeteryPolicy, ChangeQuoteRequest, MasonryOptions, MasonryPolicy,
    MetadataCategory, PolicyOptions, PolicyRegistry, StakePolicyInfo, StakePositionRequest,
    TxMetadataCache,
};
use stake_types::{
    AllocationType, AssetRef, NativeAmount, StakeAction, StakeError, StakeProviderInfo, Timestamp,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const GAS_PRICE: u64 = 2;
const NOW: u64 = 1_700_000_000;
const PERIOD: u64 = 6 * 60 * 60;

fn u(v: u64) -> U256 {
    U256::from(v)
}

struct Harness {
    chain: NullChain,
    registry: ContractRegistry,
    eco: Ecosystem,
    metadata: Arc<TxMetadataCache>,
    clock: Arc<NullClock>,
    account: Address,
    wallet: Arc<dyn SigningContext>,
}

impl Harness {
    fn new() -> Self {
        Self::with_providers(|chain| vec![NullProvider::shared("null://primary", chain.clone())])
    }

    fn with_providers(providers: impl FnOnce(&NullChain) -> Vec<Arc<dyn Provider>>) -> Self {
        let chain = NullChain::new();
        chain.set_gas_price(GAS_PRICE);
        let registry = fantom_contracts().unwrap();
        let eco = Ecosystem::new(registry.clone(), providers(&chain));
        let account = Address::repeat_byte(0x11);
        Self {
            wallet: NullWallet::shared(account, chain.clone()),
            chain,
            registry,
            eco,
            metadata: Arc::new(TxMetadataCache::new()),
            clock: Arc::new(NullClock::new(NOW)),
            account,
        }
    }

    fn addr(&self, name: &str) -> Address {
        self.registry.get_contract_info(name).unwrap().address
    }

    fn token(&self, code: &str) -> AssetRef {
        AssetRef::token("fantom", token_id(&self.addr(code)), code)
    }

    fn quote_request(&self, info: &StakePolicyInfo, action: StakeAction, code: &str, amount: u64) -> ChangeQuoteRequest {
        ChangeQuoteRequest {
            action,
            stake_policy_id: info.stake_policy_id.clone(),
            currency_code: code.to_string(),
            token_id: info.find_asset(code).and_then(|a| a.token_id.clone()),
            native_amount: NativeAmount::from_u128(amount.into()),
            wallet: self.wallet.clone(),
        }
    }

    fn position_request(&self, info: &StakePolicyInfo) -> StakePositionRequest {
        StakePositionRequest {
            stake_policy_id: info.stake_policy_id.clone(),
            wallet: self.wallet.clone(),
        }
    }

    // ── cemetery: FTM/TOMB pool 0 at 1 FTM : 2 TOMB ────────────────────

    fn seed_cemetery(&self) {
        let (wftm, tomb, lp) = (self.addr("WFTM"), self.addr("TOMB"), self.addr("TOMBSWAP_FTM_TOMB_LP"));
        let pool = self.addr("CEMETERY_V2_REWARD_POOL");
        self.chain.add_router(self.addr("TOMB_SWAP_ROUTER"), wftm);
        self.chain
            .add_pair(lp, (wftm, u(1_000_000)), (tomb, u(2_000_000)), u(1_000_000));
        self.chain.add_reward_pool(pool, self.addr("LSHARE"));
        self.chain.add_pool(pool, 0, lp);
        self.chain.set_native_balance(self.account, u(1_000_000));
        self.chain.mint(tomb, self.account, u(500_000));
    }

    fn cemetery(&self, actions: PolicyOptions) -> StakePolicyInfo {
        let assets = vec![AssetRef::native("fantom", "FTM"), self.token("TOMB")];
        self.cemetery_over(actions, assets)
    }

    fn cemetery_over(&self, actions: PolicyOptions, stake_assets: Vec<AssetRef>) -> StakePolicyInfo {
        let policy = CemeteryPolicy::new(
            self.eco.clone(),
            CemeteryOptions {
                pool_id: 0,
                lp_token: "TOMBSWAP_FTM_TOMB_LP".into(),
                reward_pool: "CEMETERY_V2_REWARD_POOL".into(),
                router: "TOMB_SWAP_ROUTER".into(),
                token_a: "WFTM".into(),
                token_b: "TOMB".into(),
                actions,
            },
            self.metadata.clone(),
            self.clock.clone(),
        )
        .unwrap();
        StakePolicyInfo::new(
            StakeProviderInfo {
                display_name: "Cemetery V2 (using TombSwap)".into(),
                plugin_id: "fantom".into(),
                stake_provider_id: "tombswap_cemetery_v2".into(),
            },
            "fantom",
            "FTM",
            stake_assets,
            vec![self.token("LSHARE")],
            Arc::new(policy),
        )
        .unwrap()
    }

    // ── masonry: TSHARE → TOMB, epoch 10 ────────────────────────────────

    fn seed_masonry(&self, timer_start: u64) {
        let masonry = self.addr("TOMB_MASONRY");
        self.chain
            .add_masonry(masonry, self.addr("TSHARE"), self.addr("TOMB"));
        self.chain.add_treasury(self.addr("TOMB_TREASURY"), PERIOD);
        self.chain.set_masonry_epoch(masonry, 10, NOW + 3600, 6, 3);
        self.chain
            .set_masonry_stake(masonry, self.account, u(1_000), timer_start);
        self.chain.set_masonry_earned(masonry, self.account, u(500));
        self.chain.mint(self.addr("TSHARE"), self.account, u(2_000));
    }

    fn masonry(&self) -> StakePolicyInfo {
        self.masonry_over(vec![self.token("TSHARE")])
    }

    fn masonry_over(&self, stake_assets: Vec<AssetRef>) -> StakePolicyInfo {
        let policy = MasonryPolicy::new(
            self.eco.clone(),
            MasonryOptions {
                masonry: "TOMB_MASONRY".into(),
                treasury: "TOMB_TREASURY".into(),
                actions: PolicyOptions::default(),
            },
            self.metadata.clone(),
        )
        .unwrap();
        StakePolicyInfo::new(
            StakeProviderInfo {
                display_name: "Tomb Finance Masonry".into(),
                plugin_id: "fantom".into(),
                stake_provider_id: "tomb_masonry".into(),
            },
            "fantom",
            "FTM",
            stake_assets,
            vec![self.token("TOMB")],
            Arc::new(policy),
        )
        .unwrap()
    }
}

fn amounts(quote: &stake_types::ChangeQuote) -> Vec<(AllocationType, String, U256)> {
    quote
        .allocations
        .iter()
        .map(|a| (a.allocation_type, a.currency_code.clone(), a.native_amount.raw()))
        .collect()
}

fn methods(list: &[&str]) -> Vec<String> {
    list.iter().map(|m| m.to_string()).collect()
}

// ---------------------------------------------------------------------------
// 1. Cemetery LP pools
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cemetery_stake_quote_pairs_at_reserve_ratio() {
    let h = Harness::new();
    h.seed_cemetery();
    let info = h.cemetery(PolicyOptions::default());

    let quote = info
        .policy
        .fetch_change_quote(&info, h.quote_request(&info, StakeAction::Stake, "FTM", 100_000))
        .await
        .unwrap();

    let fee = u(GAS_PRICE * (50_000 + 450_000 + 50_000 + 240_000));
    assert_eq!(
        amounts(&quote),
        vec![
            (AllocationType::Stake, "FTM".to_string(), u(100_000)),
            (AllocationType::Stake, "TOMB".to_string(), u(200_000)),
            (AllocationType::Fee, "FTM".to_string(), fee),
        ]
    );
    assert!(h.chain.sent_transactions().is_empty(), "quoting must not broadcast");
}

#[tokio::test]
async fn cemetery_stake_adds_liquidity_and_deposits() {
    let h = Harness::new();
    h.seed_cemetery();
    let info = h.cemetery(PolicyOptions::default());
    let quote = info
        .policy
        .fetch_change_quote(&info, h.quote_request(&info, StakeAction::Stake, "FTM", 100_000))
        .await
        .unwrap();

    quote.approve().await.unwrap();

    assert_eq!(
        h.chain.sent_methods(),
        methods(&["approve", "addLiquidityETH", "approve", "deposit"])
    );
    let pool = h.addr("CEMETERY_V2_REWARD_POOL");
    assert_eq!(h.chain.pool_stake(pool, 0, h.account), u(100_000));
    assert_eq!(h.chain.native_balance(h.account), u(900_000));
    assert_eq!(h.chain.token_balance(h.addr("TOMB"), h.account), u(300_000));
    assert_eq!(h.chain.nonce(h.account), 4);

    let add = &h.chain.sent_transactions()[1];
    let note = h.metadata.get_for(&add.hash, "TOMB").unwrap();
    assert_eq!(note.category, MetadataCategory::TransferStaking);
    assert_eq!(note.notes, "Provide liquidity for FTM - TOMB - LP");
    let deposit = &h.chain.sent_transactions()[3];
    let fee_note = h.metadata.get_for(&deposit.hash, "FTM").unwrap();
    assert_eq!(fee_note.category, MetadataCategory::ExpenseFees);
}

#[tokio::test]
async fn cemetery_second_approve_skips_allowances() {
    let h = Harness::new();
    h.seed_cemetery();
    let info = h.cemetery(PolicyOptions::default());
    let quote = info
        .policy
        .fetch_change_quote(&info, h.quote_request(&info, StakeAction::Stake, "FTM", 100_000))
        .await
        .unwrap();

    quote.approve().await.unwrap();
    quote.approve().await.unwrap();

    let sent = h.chain.sent_methods();
    assert_eq!(sent[4..], methods(&["addLiquidityETH", "deposit"]));
    assert!(h.chain.sent_transactions().iter().all(|t| t.status));
}

#[tokio::test]
async fn cemetery_reentry_reuses_minted_liquidity() {
    let h = Harness::new();
    h.seed_cemetery();
    let info = h.cemetery(PolicyOptions::default());
    let quote = info
        .policy
        .fetch_change_quote(&info, h.quote_request(&info, StakeAction::Stake, "FTM", 100_000))
        .await
        .unwrap();

    h.chain.revert_method("deposit");
    let err = quote.approve().await.unwrap_err();
    assert!(matches!(err, StakeError::Transaction(_)), "got {err:?}");
    let lp = h.addr("TOMBSWAP_FTM_TOMB_LP");
    assert_eq!(h.chain.token_balance(lp, h.account), u(100_000));

    h.chain.clear_reverts();
    quote.approve().await.unwrap();

    let sent = h.chain.sent_methods();
    assert_eq!(sent[4..], methods(&["deposit"]));
    let pool = h.addr("CEMETERY_V2_REWARD_POOL");
    assert_eq!(h.chain.pool_stake(pool, 0, h.account), u(100_000));
    assert_eq!(h.chain.token_balance(lp, h.account), U256::ZERO);
}

#[tokio::test]
async fn cemetery_stake_rejects_short_balance() {
    let h = Harness::new();
    h.seed_cemetery();
    let info = h.cemetery(PolicyOptions::default());

    let err = info
        .policy
        .fetch_change_quote(&info, h.quote_request(&info, StakeAction::Stake, "FTM", 300_000))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, StakeError::InsufficientBalance { currency_code } if currency_code == "TOMB"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn cemetery_unstake_withdraws_and_removes_liquidity() {
    let h = Harness::new();
    h.seed_cemetery();
    let pool = h.addr("CEMETERY_V2_REWARD_POOL");
    h.chain.set_pool_stake(pool, 0, h.account, u(100_000));
    h.chain.set_pending_reward(pool, 0, h.account, u(5_000));
    let info = h.cemetery(PolicyOptions::default());

    let quote = info
        .policy
        .fetch_change_quote(&info, h.quote_request(&info, StakeAction::Unstake, "TOMB", 200_000))
        .await
        .unwrap();
    let fee = u(GAS_PRICE * (240_000 + 50_000 + 500_000));
    assert_eq!(
        amounts(&quote),
        vec![
            (AllocationType::Unstake, "FTM".to_string(), u(100_000)),
            (AllocationType::Unstake, "TOMB".to_string(), u(200_000)),
            (AllocationType::Claim, "LSHARE".to_string(), u(5_000)),
            (AllocationType::Fee, "FTM".to_string(), fee),
        ]
    );

    quote.approve().await.unwrap();

    assert_eq!(
        h.chain.sent_methods(),
        methods(&["withdraw", "approve", "removeLiquidityETH"])
    );
    assert_eq!(h.chain.pool_stake(pool, 0, h.account), U256::ZERO);
    assert_eq!(h.chain.native_balance(h.account), u(1_100_000));
    assert_eq!(h.chain.token_balance(h.addr("TOMB"), h.account), u(700_000));
    assert_eq!(h.chain.token_balance(h.addr("LSHARE"), h.account), u(5_000));

    let withdraw = &h.chain.sent_transactions()[0];
    let reward_note = h.metadata.get_for(&withdraw.hash, "LSHARE").unwrap();
    assert_eq!(reward_note.category, MetadataCategory::IncomeStaking);
}

#[tokio::test]
async fn cemetery_unstake_beyond_stake_is_rejected() {
    let h = Harness::new();
    h.seed_cemetery();
    let pool = h.addr("CEMETERY_V2_REWARD_POOL");
    h.chain.set_pool_stake(pool, 0, h.account, u(10_000));
    let info = h.cemetery(PolicyOptions::default());

    let err = info
        .policy
        .fetch_change_quote(&info, h.quote_request(&info, StakeAction::Unstake, "FTM", 100_000))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, StakeError::InsufficientBalance { currency_code } if currency_code == "FTM"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn cemetery_claim_is_a_zero_withdraw() {
    let h = Harness::new();
    h.seed_cemetery();
    let pool = h.addr("CEMETERY_V2_REWARD_POOL");
    h.chain.set_pool_stake(pool, 0, h.account, u(100_000));
    h.chain.set_pending_reward(pool, 0, h.account, u(7_000));
    let info = h.cemetery(PolicyOptions::default());

    let quote = info
        .policy
        .fetch_change_quote(&info, h.quote_request(&info, StakeAction::Claim, "LSHARE", 0))
        .await
        .unwrap();
    assert_eq!(
        amounts(&quote),
        vec![
            (AllocationType::Claim, "LSHARE".to_string(), u(7_000)),
            (AllocationType::Fee, "FTM".to_string(), u(GAS_PRICE * 240_000)),
        ]
    );

    quote.approve().await.unwrap();
    assert_eq!(h.chain.sent_methods(), methods(&["withdraw"]));
    assert_eq!(h.chain.pool_stake(pool, 0, h.account), u(100_000));
    assert_eq!(h.chain.token_balance(h.addr("LSHARE"), h.account), u(7_000));
}

#[tokio::test]
async fn cemetery_reward_asset_cannot_be_staked_directly() {
    let h = Harness::new();
    h.seed_cemetery();
    let info = h.cemetery(PolicyOptions::default());

    let err = info
        .policy
        .fetch_change_quote(&info, h.quote_request(&info, StakeAction::Stake, "LSHARE", 1_000))
        .await
        .unwrap_err();
    assert!(matches!(err, StakeError::Unsupported(_)), "got {err:?}");
}

#[tokio::test]
async fn cemetery_disabled_stake_is_unsupported() {
    let h = Harness::new();
    h.seed_cemetery();
    let info = h.cemetery(PolicyOptions {
        disable_stake: true,
        ..PolicyOptions::default()
    });

    let err = info
        .policy
        .fetch_change_quote(&info, h.quote_request(&info, StakeAction::Stake, "FTM", 1_000))
        .await
        .unwrap_err();
    assert!(matches!(err, StakeError::Unsupported(_)), "got {err:?}");
}

#[tokio::test]
async fn cemetery_position_reports_underlying_amounts() {
    let h = Harness::new();
    h.seed_cemetery();
    let pool = h.addr("CEMETERY_V2_REWARD_POOL");
    h.chain.set_pool_stake(pool, 0, h.account, u(100_000));
    h.chain.set_pending_reward(pool, 0, h.account, u(7_000));

    let info = h.cemetery(PolicyOptions::default());
    let position = info
        .policy
        .fetch_stake_position(&info, h.position_request(&info))
        .await
        .unwrap();

    let staked: Vec<_> = position
        .staked()
        .map(|a| (a.currency_code.as_str(), a.native_amount.raw()))
        .collect();
    assert_eq!(staked, vec![("FTM", u(100_000)), ("TOMB", u(200_000))]);
    let earned: Vec<_> = position.earned().collect();
    assert_eq!(earned.len(), 1);
    assert_eq!(earned[0].currency_code, "LSHARE");
    assert_eq!(earned[0].native_amount.raw(), u(7_000));
    assert!(position.allocations.iter().all(|a| a.locktime.is_none()));
    assert!(position.can_stake && position.can_unstake && position.can_claim);

    let retired = h.cemetery(PolicyOptions {
        disable_stake: true,
        ..PolicyOptions::default()
    });
    let position = retired
        .policy
        .fetch_stake_position(&retired, h.position_request(&retired))
        .await
        .unwrap();
    assert!(!position.can_stake);
    assert!(position.can_unstake);
}

#[tokio::test]
async fn position_survives_a_failing_endpoint() {
    let h = Harness::with_providers(|chain| {
        vec![
            FailingProvider::shared("null://down", Duration::from_millis(1)),
            NullProvider::shared("null://up", chain.clone()),
        ]
    });
    h.seed_cemetery();
    let info = h.cemetery(PolicyOptions::default());

    let position = info
        .policy
        .fetch_stake_position(&info, h.position_request(&info))
        .await
        .unwrap();
    assert!(!position.can_unstake);
    assert!(position.can_stake);
}

// ---------------------------------------------------------------------------
// 2. Masonry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn masonry_position_without_lockup_can_claim() {
    let h = Harness::new();
    h.seed_masonry(4);
    let info = h.masonry();

    let position = info
        .policy
        .fetch_stake_position(&info, h.position_request(&info))
        .await
        .unwrap();

    assert!(position.can_stake && position.can_unstake && position.can_claim);
    assert!(position.allocations.iter().all(|a| a.locktime.is_none()));
    assert_eq!(position.earned().next().unwrap().native_amount.raw(), u(500));
}

#[tokio::test]
async fn masonry_position_reports_future_unlock_times() {
    let h = Harness::new();
    h.seed_masonry(8);
    let info = h.masonry();

    let position = info
        .policy
        .fetch_stake_position(&info, h.position_request(&info))
        .await
        .unwrap();

    assert!(!position.can_claim);
    assert!(!position.can_unstake);
    let staked = position.staked().next().unwrap();
    assert_eq!(staked.locktime, Some(Timestamp::new(NOW + 3600 + 3 * PERIOD)));
    let earned = position.earned().next().unwrap();
    assert_eq!(earned.locktime, Some(Timestamp::new(NOW + 3600)));

    // Locktimes follow the epoch counter, not the local clock.
    h.clock.set(NOW + 3600);
    let position = info
        .policy
        .fetch_stake_position(&info, h.position_request(&info))
        .await
        .unwrap();
    assert_eq!(
        position.earned().next().unwrap().locktime,
        Some(Timestamp::new(NOW + 3600))
    );
}

#[tokio::test]
async fn masonry_overdue_epoch_point_still_locks() {
    let h = Harness::new();
    h.seed_masonry(4);
    h.chain
        .set_masonry_epoch(h.addr("TOMB_MASONRY"), 10, NOW - 60, 7, 3);
    let info = h.masonry();

    let position = info
        .policy
        .fetch_stake_position(&info, h.position_request(&info))
        .await
        .unwrap();

    let staked = position.staked().next().unwrap();
    assert_eq!(staked.locktime, Some(Timestamp::new(NOW - 60)));
    assert!(!position.can_unstake);
    assert_eq!(position.earned().next().unwrap().locktime, None);
    assert!(position.can_claim);
}

#[tokio::test]
async fn masonry_stake_approves_then_stakes() {
    let h = Harness::new();
    h.seed_masonry(4);
    let info = h.masonry();

    let quote = info
        .policy
        .fetch_change_quote(&info, h.quote_request(&info, StakeAction::Stake, "TSHARE", 400))
        .await
        .unwrap();
    assert_eq!(quote.fee().unwrap().native_amount.raw(), u(GAS_PRICE * 290_000));

    quote.approve().await.unwrap();
    assert_eq!(h.chain.sent_methods(), methods(&["approve", "stake"]));
    assert_eq!(h.chain.masonry_stake(h.addr("TOMB_MASONRY"), h.account), u(1_400));

    let stake = &h.chain.sent_transactions()[1];
    let note = h.metadata.get_for(&stake.hash, "TSHARE").unwrap();
    assert_eq!(note.notes, "Stake funds");
}

#[tokio::test]
async fn masonry_unstake_also_pays_reward() {
    let h = Harness::new();
    h.seed_masonry(4);
    let info = h.masonry();

    let quote = info
        .policy
        .fetch_change_quote(&info, h.quote_request(&info, StakeAction::Unstake, "TSHARE", 1_000))
        .await
        .unwrap();
    assert_eq!(
        amounts(&quote)[..2],
        [
            (AllocationType::Unstake, "TSHARE".to_string(), u(1_000)),
            (AllocationType::Claim, "TOMB".to_string(), u(500)),
        ]
    );

    quote.approve().await.unwrap();
    assert_eq!(h.chain.sent_methods(), methods(&["withdraw"]));
    assert_eq!(h.chain.token_balance(h.addr("TSHARE"), h.account), u(3_000));
    assert_eq!(h.chain.token_balance(h.addr("TOMB"), h.account), u(500));
}

#[tokio::test]
async fn masonry_claim_during_lockup_is_denied() {
    let h = Harness::new();
    h.seed_masonry(8);
    let info = h.masonry();

    let err = info
        .policy
        .fetch_change_quote(&info, h.quote_request(&info, StakeAction::Claim, "TOMB", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, StakeError::PermissionDenied(_)), "got {err:?}");
    assert!(h.chain.sent_transactions().is_empty());
}

#[tokio::test]
async fn masonry_stake_beyond_wallet_is_rejected() {
    let h = Harness::new();
    h.seed_masonry(4);
    let info = h.masonry();

    let err = info
        .policy
        .fetch_change_quote(&info, h.quote_request(&info, StakeAction::Stake, "TSHARE", 5_000))
        .await
        .unwrap_err();
    assert!(
        matches!(&err, StakeError::InsufficientBalance { currency_code } if currency_code == "TSHARE"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn masonry_rejects_multi_asset_policies() {
    let h = Harness::new();
    h.seed_masonry(4);
    let info = h.masonry_over(vec![h.token("TSHARE"), h.token("TOMB")]);
    assert_unsupported(&h, &info, "TSHARE").await;
}

// ---------------------------------------------------------------------------
// 3. Unsupported asset layouts
// ---------------------------------------------------------------------------

async fn assert_unsupported(h: &Harness, info: &StakePolicyInfo, code: &str) {
    let err = info
        .policy
        .fetch_change_quote(info, h.quote_request(info, StakeAction::Stake, code, 1_000))
        .await
        .unwrap_err();
    assert!(matches!(err, StakeError::Unsupported(_)), "quote got {err:?}");

    let err = info
        .policy
        .fetch_stake_position(info, h.position_request(info))
        .await
        .unwrap_err();
    assert!(matches!(err, StakeError::Unsupported(_)), "position got {err:?}");
}

#[tokio::test]
async fn cemetery_rejects_two_native_assets() {
    let h = Harness::new();
    h.seed_cemetery();
    let ftm = AssetRef::native("fantom", "FTM");
    let info = h.cemetery_over(PolicyOptions::default(), vec![ftm.clone(), ftm]);
    assert_unsupported(&h, &info, "FTM").await;
}

#[tokio::test]
async fn cemetery_rejects_three_assets() {
    let h = Harness::new();
    h.seed_cemetery();
    let assets = vec![AssetRef::native("fantom", "FTM"), h.token("TOMB"), h.token("TSHARE")];
    let info = h.cemetery_over(PolicyOptions::default(), assets);
    assert_unsupported(&h, &info, "TOMB").await;
}

// ---------------------------------------------------------------------------
// 4. Registry dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn registry_routes_by_policy_id() {
    let h = Harness::new();
    h.seed_masonry(4);
    h.seed_cemetery();
    let masonry = h.masonry();
    let cemetery = h.cemetery(PolicyOptions::default());
    let registry = PolicyRegistry::new(vec![masonry.clone(), cemetery]).unwrap();

    let position = registry
        .fetch_stake_position(h.position_request(&masonry))
        .await
        .unwrap();
    assert_eq!(position.staked().next().unwrap().currency_code, "TSHARE");

    let mut request = h.quote_request(&masonry, StakeAction::Claim, "TOMB", 0);
    request.stake_policy_id = "tomb_masonry:fantom:BOGUS=fantom:TOMB".into();
    let err = registry.fetch_change_quote(request).await.unwrap_err();
    assert!(matches!(err, StakeError::PolicyNotFound(_)), "got {err:?}");
}
