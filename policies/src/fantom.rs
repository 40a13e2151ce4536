//! The Fantom catalog: contract addresses, RPC endpoints and the policies
//! built on them.

use std::sync::Arc;

use stake_contracts::{
    token_id, AbiKind, ChainEndpoints, ContractError, ContractInfo, ContractRegistry, Ecosystem,
};
use stake_types::{AssetRef, StakeError, StakeProviderInfo};
use stake_utils::Clock;
use tracing::debug;

use crate::cemetery::{CemeteryOptions, CemeteryPolicy};
use crate::masonry::{MasonryOptions, MasonryPolicy};
use crate::metadata::TxMetadataCache;
use crate::policy::{PolicyOptions, StakePolicyInfo};

pub const FANTOM_PLUGIN_ID: &str = "fantom";
pub const FANTOM_CURRENCY_CODE: &str = "FTM";
/// Registry name of the contract standing in for native FTM in LP pairs.
pub const WRAPPED_NATIVE: &str = "WFTM";
pub const PUBLIC_RPC_URL: &str = "https://rpc.ftm.tools";

const CEMETERY_REWARD_POOL: &str = "CEMETERY_V2_REWARD_POOL";
const CEMETERY_ROUTER: &str = "TOMB_SWAP_ROUTER";
const CEMETERY_REWARD: &str = "LSHARE";

const CONTRACTS: &[(&str, &str, AbiKind)] = &[
    ("CEMETERY_V2_REWARD_POOL", "0x1f832dfba15346d25438cf7ac683b013ed03e32f", AbiKind::RewardPool),
    ("SPOOKY_SWAP_ROUTER", "0xf491e7b69e4244ad4002bc14e878a34207e38c29", AbiKind::UniswapV2Router),
    ("TOMB_MASONRY", "0x8764de60236c5843d9faeb1b638fbce962773b67", AbiKind::Masonry),
    ("TOMB_SWAP_ROUTER", "0x6d0176c5ea1e44b08d3dd001b0784ce42f47a3a7", AbiKind::UniswapV2Router),
    ("TOMB_TREASURY", "0xf50c6daaaec271b56fcddfbc38f0b56ca45e6f0d", AbiKind::Treasury),
    ("TSHARE_REWARD_POOL", "0xcc0a87f7e7c693042a9cc703661f5060c80acb43", AbiKind::RewardPool),
    ("AVAX", "0x511d35c52a3c244e7b8bd92c0c297755fbd89212", AbiKind::Erc20),
    ("BNB", "0xd67de0e0a0fd7b15dc8348bb9be742f3c5850454", AbiKind::Erc20),
    ("BTC", "0x321162cd933e2be498cd2267a90534a804051b11", AbiKind::Erc20),
    ("CRV", "0x1e4f97b9f9f913c46f1632781732927b9019c68b", AbiKind::Erc20),
    ("DAI", "0x8d11ec38a3eb5e956b052f67da8bdc9bef8abf3e", AbiKind::Erc20),
    ("ETH", "0x74b23882a30290451a17c44f4f05243b6b58c76d", AbiKind::Erc20),
    ("FUSDT", "0x049d68029688eabf473097a2fc38ef61633a3c7a", AbiKind::Erc20),
    ("L3USD", "0x5f0456f728e2d59028b4f5b8ad8c604100724c6a", AbiKind::Erc20),
    ("LIF3", "0xbf60e7414ef09026733c1e7de72e7393888c64da", AbiKind::Erc20),
    ("LINK", "0xb3654dc3d10ea7645f8319668e8f54d2574fbdc8", AbiKind::Erc20),
    ("LSHARE", "0xcbe0ca46399af916784cadf5bcc3aed2052d6c45", AbiKind::Erc20),
    ("MAI", "0xfb98b335551a418cd0737375a2ea0ded62ea213b", AbiKind::Erc20),
    ("MIM", "0x82f0b8b456c1a451378467398982d4834b6829c1", AbiKind::Erc20),
    ("TBOND", "0x24248cd1747348bdc971a5395f4b3cd7fee94ea0", AbiKind::Erc20),
    ("TOMB", "0x6c021ae822bea943b2e66552bde1d2696a53fbb7", AbiKind::Erc20),
    ("TSHARE", "0x4cdf39285d7ca8eb3f090fda0c069ba5f4145b37", AbiKind::Erc20),
    ("USDC", "0x04068da6c83afcfa0e13ba15a6696662335d5b75", AbiKind::Erc20),
    ("WFTM", "0x21be370d5312f44cb42ce377bc9b8a0cef1a4c83", AbiKind::WrappedNative),
    ("ZOO", "0x09e145a1d53c0045f41aeef25d8ff982ae74dd56", AbiKind::Erc20),
    ("TOMBSWAP_BTC_ETH_LP", "0x3f468804d133894a73b54cfc07d5886e5195255f", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_BTC_TSHARE_LP", "0xa1f4a9ee0d06115376dff357d34c3f5eb4107398", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_CRV_FTM_LP", "0xff17e19feeaf403e8ed9d79a5b78b8f4ded38df3", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_FTM_AVAX_LP", "0xc753d5aa76f90b7057cc2b6766fe67faf68bf6e3", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_FTM_BNB_LP", "0xb5f1b98693c4894880dd90c1d3e7a517b9c16ae3", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_FTM_BTC_LP", "0x5063c79e377332fb98cb6c8db414d752dc7c478e", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_FTM_DAI_LP", "0xb89486a030075b42d589008da7877dd783af968f", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_FTM_ETH_LP", "0x8e49c8fbf6128356019d8a7d34e9b92f03bc2803", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_FTM_LIF3_LP", "0xd62cacdb69000fed31bb348e9c0e073bb8ad7caf", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_FTM_LINK_LP", "0x51e1b9b1ec411a2258f674c26a0a0ac78cd81478", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_FTM_LSHARE_LP", "0x06623fba85e66cb93e7802cdfea8e5f1d70c38a9", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_FTM_MIM_LP", "0xa7c86fc1b87830b8abfa623571405e03560a8326", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_FTM_TOMB_LP", "0xfca12a13ac324c09e9f43b5e5cfc9262f3ab3223", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_FUSDT_FTM_LP", "0x681d32c8b374c2dd83064775dbb48ea97db2c506", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_L3USD_DAI_LP", "0x2701a1d05234ec26d2218935f3b02ea0f7df28aa", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_L3USD_FUSDT_LP", "0x53eb7104180297ee370badd43134d2c48d424434", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_L3USD_USDC_LP", "0x0326d09b5c0c5b041e15f6b4e37749b4249a7579", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_LIF3_LSHARE_LP", "0x82045cbaf366a30f8888628fb94628806c700da2", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_TBOND_TOMB_LP", "0x2b2703716d3234b787c42e89950653688c012dea", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_TOMB_LIF3_LP", "0xcc3d9921302dbbc72171eed1b10fd45f9e83ad8c", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_TOMB_LSHARE_LP", "0x355e1045daaf4877927322803ca0ccc7df3721d5", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_TOMB_USDC_LP", "0xaa9be68d990d5e56870b2e0544f96ffb0b1da8f7", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_TSHARE_ETH_LP", "0xd702d7495b010936ebc53a1efee42d97996ca5ee", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_TSHARE_LSHARE_LP", "0x9fc1cfb778864d319ebe35afd475f869ed8e34a9", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_USDC_FTM_LP", "0x8c853ce1561a2c2cd2e857670e3ccd04ba4cb27b", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_USDC_FUSDT_LP", "0x3486011e2e18ccf4558c4c84d5cbbccfdbf16c03", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_USDC_LIF3_LP", "0x502eeeb06c2e01fd151cfc6624f0b98420bd1291", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_USDC_LSHARE_LP", "0x0621d9c22fad25bf5b88735defb419fa60f118f7", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_USDC_MIM_LP", "0xd840af68b35469ec3478c9b0cbcddc6dc80dd98c", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_USDC_TSHARE_LP", "0xdec1259188e6c5273acd1e84d5b4b58897ca013e", AbiKind::UniswapV2Pair),
    ("TOMBSWAP_ZOO_TOMB_LP", "0x67019e7b4a233cc2e875e5c713042333d879aace", AbiKind::UniswapV2Pair),
    ("TOMB_WFTM_LP", "0x2a651563c9d3af67ae0388a5c8f89b867038089e", AbiKind::UniswapV2Pair),
    ("TSHARE_WFTM_LP", "0x4733bc45ef91cf7ccecaeedb794727075fb209f2", AbiKind::UniswapV2Pair),
];

/// Cemetery V2 pools as (pool id, token A, token B). Each pool's LP token is
/// registered as `TOMBSWAP_{A}_{B}_LP`.
const CEMETERY_POOLS: &[(u64, &str, &str)] = &[
    (0, "FTM", "TOMB"),
    (1, "TOMB", "USDC"),
    (2, "ZOO", "TOMB"),
    (4, "BTC", "TSHARE"),
    (5, "TSHARE", "ETH"),
    (6, "USDC", "TSHARE"),
    (7, "USDC", "FUSDT"),
    (8, "USDC", "MIM"),
    (10, "USDC", "FTM"),
    (11, "FTM", "DAI"),
    (12, "FTM", "ETH"),
    (13, "FUSDT", "FTM"),
    (14, "FTM", "BTC"),
    (15, "FTM", "MIM"),
    (16, "FTM", "BNB"),
    (17, "FTM", "AVAX"),
    (18, "FTM", "LINK"),
    (19, "CRV", "FTM"),
    (20, "BTC", "ETH"),
    (21, "TOMB", "LIF3"),
    (22, "TSHARE", "LSHARE"),
    (23, "USDC", "LIF3"),
    (24, "USDC", "LSHARE"),
    (25, "FTM", "LIF3"),
    (26, "TBOND", "TOMB"),
    (27, "FTM", "LSHARE"),
    (28, "TOMB", "LSHARE"),
    (29, "LIF3", "LSHARE"),
    (33, "L3USD", "USDC"),
    (34, "L3USD", "FUSDT"),
    (35, "L3USD", "DAI"),
];

pub fn fantom_contracts() -> Result<ContractRegistry, ContractError> {
    CONTRACTS
        .iter()
        .map(|(name, address, kind)| ContractInfo::new(name, address, *kind))
        .collect::<Result<Vec<_>, _>>()
        .and_then(ContractRegistry::new)
}

/// The QuickNode endpoint goes first when an API key is configured, ahead of
/// `rpc_urls` and the public fallback.
pub fn fantom_endpoints(rpc_urls: &[String], quiknode_api_key: Option<&str>) -> ChainEndpoints {
    let mut urls = Vec::with_capacity(rpc_urls.len() + 2);
    if let Some(key) = quiknode_api_key.filter(|k| !k.is_empty()) {
        urls.push(format!("https://polished-empty-cloud.fantom.quiknode.pro/{key}/"));
    }
    urls.extend(rpc_urls.iter().cloned());
    if !urls.iter().any(|u| u == PUBLIC_RPC_URL) {
        urls.push(PUBLIC_RPC_URL.to_string());
    }
    ChainEndpoints {
        plugin_id: FANTOM_PLUGIN_ID.to_string(),
        rpc_urls: urls,
    }
}

/// The registry entry a currency code trades as.
fn contract_name(currency_code: &str) -> &str {
    if currency_code == FANTOM_CURRENCY_CODE {
        WRAPPED_NATIVE
    } else {
        currency_code
    }
}

fn fantom_asset(eco: &Ecosystem, currency_code: &str) -> Result<AssetRef, StakeError> {
    if currency_code == FANTOM_CURRENCY_CODE {
        return Ok(AssetRef::native(FANTOM_PLUGIN_ID, FANTOM_CURRENCY_CODE));
    }
    let info = eco.get_contract_info(currency_code)?;
    Ok(AssetRef::token(
        FANTOM_PLUGIN_ID,
        token_id(&info.address),
        currency_code,
    ))
}

fn masonry_provider() -> StakeProviderInfo {
    StakeProviderInfo {
        display_name: "Tomb Finance Masonry".into(),
        plugin_id: FANTOM_PLUGIN_ID.into(),
        stake_provider_id: "tomb_masonry".into(),
    }
}

fn cemetery_provider() -> StakeProviderInfo {
    StakeProviderInfo {
        display_name: "Cemetery V2 (using TombSwap)".into(),
        plugin_id: FANTOM_PLUGIN_ID.into(),
        stake_provider_id: "tombswap_cemetery_v2".into(),
    }
}

/// Every Fantom policy. Staking new funds is switched off across the
/// catalog; unstaking and claiming stay open.
pub fn fantom_policies(
    eco: &Ecosystem,
    metadata: Arc<TxMetadataCache>,
    clock: Arc<dyn Clock>,
) -> Result<Vec<StakePolicyInfo>, StakeError> {
    let retired = PolicyOptions {
        disable_stake: true,
        ..PolicyOptions::default()
    };
    let mut policies = Vec::with_capacity(CEMETERY_POOLS.len() + 1);

    let masonry = MasonryPolicy::new(
        eco.clone(),
        MasonryOptions {
            masonry: "TOMB_MASONRY".into(),
            treasury: "TOMB_TREASURY".into(),
            actions: retired,
        },
        metadata.clone(),
    )?;
    policies.push(StakePolicyInfo::new(
        masonry_provider(),
        FANTOM_PLUGIN_ID,
        FANTOM_CURRENCY_CODE,
        vec![fantom_asset(eco, "TSHARE")?],
        vec![fantom_asset(eco, "TOMB")?],
        Arc::new(masonry),
    )?);

    for &(pool_id, token_a, token_b) in CEMETERY_POOLS {
        let policy = CemeteryPolicy::new(
            eco.clone(),
            CemeteryOptions {
                pool_id,
                lp_token: format!("TOMBSWAP_{token_a}_{token_b}_LP"),
                reward_pool: CEMETERY_REWARD_POOL.into(),
                router: CEMETERY_ROUTER.into(),
                token_a: contract_name(token_a).into(),
                token_b: contract_name(token_b).into(),
                actions: retired,
            },
            metadata.clone(),
            clock.clone(),
        )?;
        policies.push(StakePolicyInfo::new(
            cemetery_provider(),
            FANTOM_PLUGIN_ID,
            FANTOM_CURRENCY_CODE,
            vec![fantom_asset(eco, token_a)?, fantom_asset(eco, token_b)?],
            vec![fantom_asset(eco, CEMETERY_REWARD)?],
            Arc::new(policy),
        )?);
    }
    debug!(count = policies.len(), "fantom stake policies loaded");
    Ok(policies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PolicyRegistry;
    use stake_utils::SystemClock;

    fn catalog() -> Vec<StakePolicyInfo> {
        let eco = Ecosystem::new(fantom_contracts().unwrap(), Vec::new());
        fantom_policies(&eco, Arc::new(TxMetadataCache::new()), Arc::new(SystemClock)).unwrap()
    }

    #[test]
    fn contract_table_has_no_duplicates() {
        let registry = fantom_contracts().unwrap();
        assert_eq!(registry.len(), CONTRACTS.len());
        assert_eq!(
            registry.get_contract_info(WRAPPED_NATIVE).unwrap().abi,
            AbiKind::WrappedNative
        );
    }

    #[test]
    fn every_pool_resolves_its_contracts() {
        let policies = catalog();
        assert_eq!(policies.len(), CEMETERY_POOLS.len() + 1);
        let registry = PolicyRegistry::new(policies).unwrap();
        let ftm_tomb = registry
            .get("tombswap_cemetery_v2:fantom:FTM+fantom:TOMB=fantom:LSHARE")
            .unwrap();
        assert!(ftm_tomb.stake_assets[0].is_native());
        assert_eq!(
            ftm_tomb.stake_assets[1].token_id.as_deref(),
            Some("6c021ae822bea943b2e66552bde1d2696a53fbb7")
        );
        assert!(registry.get("tomb_masonry:fantom:TSHARE=fantom:TOMB").is_ok());
    }

    #[test]
    fn endpoints_put_quiknode_first() {
        let endpoints = fantom_endpoints(&[], Some("abc"));
        assert_eq!(
            endpoints.rpc_urls,
            vec![
                "https://polished-empty-cloud.fantom.quiknode.pro/abc/".to_string(),
                PUBLIC_RPC_URL.to_string()
            ]
        );
        let endpoints = fantom_endpoints(&[PUBLIC_RPC_URL.to_string()], Some(""));
        assert_eq!(endpoints.rpc_urls, vec![PUBLIC_RPC_URL.to_string()]);
    }
}
