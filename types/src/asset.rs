//! Asset identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One fungible asset on one chain.
///
/// `token_id == None` denotes the chain's native asset. For tokens the id is
/// the lower-case contract address without the `0x` prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    pub plugin_id: String,
    pub token_id: Option<String>,
    /// Display code used in metadata and error messages.
    pub currency_code: String,
}

impl AssetRef {
    pub fn native(plugin_id: impl Into<String>, currency_code: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            token_id: None,
            currency_code: currency_code.into(),
        }
    }

    pub fn token(
        plugin_id: impl Into<String>,
        token_id: impl Into<String>,
        currency_code: impl Into<String>,
    ) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            token_id: Some(token_id.into()),
            currency_code: currency_code.into(),
        }
    }

    pub fn is_native(&self) -> bool {
        self.token_id.is_none()
    }

    /// Whether `other` refers to the same on-chain asset (display code ignored).
    pub fn same_asset(&self, plugin_id: &str, token_id: Option<&str>) -> bool {
        self.plugin_id == plugin_id
            && match (self.token_id.as_deref(), token_id) {
                (None, None) => true,
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b.trim_start_matches("0x")),
                _ => false,
            }
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.plugin_id, self.currency_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_asset_ignores_case_and_prefix() {
        let tomb = AssetRef::token("fantom", "6c021ae822bea943b2e66552bde1d2696a53fbb7", "TOMB");
        assert!(tomb.same_asset("fantom", Some("0x6C021Ae822BEa943b2E66552bDe1D2696a53fbB7")));
        assert!(!tomb.same_asset("fantom", None));
        assert!(!tomb.same_asset("ethereum", Some("6c021ae822bea943b2e66552bde1d2696a53fbb7")));
    }

    #[test]
    fn native_matches_only_native() {
        let ftm = AssetRef::native("fantom", "FTM");
        assert!(ftm.is_native());
        assert!(ftm.same_asset("fantom", None));
        assert_eq!(ftm.to_string(), "fantom:FTM");
    }
}
