//! Per-chain configuration: relay endpoint, refund fraction and gas ceiling.
//!
//! The registry is built once at start-up (built-in profiles, optionally
//! extended from a JSON file) and only read afterwards.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use alloy::primitives::{address, Address};
use reqwest::Url;
use serde::Deserialize;

use crate::error::{ConfigError, Result, SafeError};
use crate::gas::RefundFraction;

/// MultiSendCallOnly v1.3.0, deployed at the same address on every supported chain.
pub const DEFAULT_MULTI_SEND: Address = address!("40A2aCCbd92BCA938b02010E17A5b8929b49130D");

const DEFAULT_MAX_GAS_PER_TX: u64 = 10_000_000;
const DEFAULT_REFUND_FRACTION: RefundFraction = RefundFraction { numer: 3, denom: 10 };

/// Everything the pipeline needs to know about one chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainProfile {
    pub chain_id: u64,
    pub name: String,
    /// Safe Transaction Service base URL. `None` means proposals must be
    /// shared out-of-band.
    pub relay_endpoint: Option<Url>,
    pub refund_fraction: RefundFraction,
    pub max_gas_per_tx: u64,
    pub multi_send: Address,
}

/// Profile as written in a JSON override file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChainProfile {
    chain_id: u64,
    name: String,
    relay_endpoint: Option<String>,
    refund_fraction: RawRefundFraction,
    max_gas_per_tx: u64,
    multi_send: Option<Address>,
}

/// `0.3` or `"0.3"` or `"1/3"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRefundFraction {
    Number(f64),
    Text(String),
}

impl TryFrom<RawRefundFraction> for RefundFraction {
    type Error = ConfigError;

    fn try_from(raw: RawRefundFraction) -> Result<Self, ConfigError> {
        match raw {
            RawRefundFraction::Number(fraction) => Self::from_f64(fraction),
            RawRefundFraction::Text(text) => text.parse(),
        }
    }
}

impl TryFrom<RawChainProfile> for ChainProfile {
    type Error = ConfigError;

    fn try_from(raw: RawChainProfile) -> Result<Self, ConfigError> {
        if raw.max_gas_per_tx == 0 {
            return Err(ConfigError::InvalidGasLimit(raw.chain_id));
        }
        let relay_endpoint = raw
            .relay_endpoint
            .map(|url| {
                Url::parse(&url).map_err(|e| ConfigError::InvalidRelayUrl {
                    url: url.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            chain_id: raw.chain_id,
            name: raw.name.to_lowercase(),
            relay_endpoint,
            refund_fraction: raw.refund_fraction.try_into()?,
            max_gas_per_tx: raw.max_gas_per_tx,
            multi_send: raw.multi_send.unwrap_or(DEFAULT_MULTI_SEND),
        })
    }
}

/// Immutable chain id → profile mapping.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    profiles: BTreeMap<u64, ChainProfile>,
}

impl ChainRegistry {
    /// Registry without any profile.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Chains with a Safe Transaction Service.
    pub fn builtin() -> Self {
        let chains: [(u64, &str, &str); 5] = [
            (1, "mainnet", "https://safe-transaction-mainnet.safe.global"),
            (137, "polygon", "https://safe-transaction-polygon.safe.global"),
            (8453, "base", "https://safe-transaction-base.safe.global"),
            (42161, "arbitrum", "https://safe-transaction-arbitrum.safe.global"),
            (11155111, "sepolia", "https://safe-transaction-sepolia.safe.global"),
        ];

        let profiles = chains
            .into_iter()
            .map(|(chain_id, name, relay)| {
                let profile = ChainProfile {
                    chain_id,
                    name: name.to_string(),
                    relay_endpoint: Url::parse(relay).ok(),
                    refund_fraction: DEFAULT_REFUND_FRACTION,
                    max_gas_per_tx: DEFAULT_MAX_GAS_PER_TX,
                    multi_send: DEFAULT_MULTI_SEND,
                };
                (chain_id, profile)
            })
            .collect();

        Self { profiles }
    }

    /// Built-in profiles, with entries from `path` added or replacing them.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut registry = Self::builtin();
        registry.extend_from_json(&content)?;
        Ok(registry)
    }

    /// Add or replace profiles from a JSON array.
    ///
    /// Nothing is inserted unless every entry validates.
    pub fn extend_from_json(&mut self, json: &str) -> Result<(), ConfigError> {
        let raw: Vec<RawChainProfile> = serde_json::from_str(json)?;
        let profiles = raw
            .into_iter()
            .map(ChainProfile::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        for profile in profiles {
            tracing::debug!(
                chain_id = profile.chain_id,
                name = %profile.name,
                "loaded chain profile"
            );
            self.insert(profile);
        }
        Ok(())
    }

    pub fn insert(&mut self, profile: ChainProfile) {
        self.profiles.insert(profile.chain_id, profile);
    }

    pub fn resolve(&self, chain_id: u64) -> Result<&ChainProfile> {
        self.profiles
            .get(&chain_id)
            .ok_or(SafeError::UnsupportedChain(chain_id))
    }

    /// Resolve by chain name (`mainnet`, `ethereum`, `polygon`, `matic`, ...).
    pub fn resolve_name(&self, name: &str) -> Option<&ChainProfile> {
        let name = match name.to_lowercase().as_str() {
            "ethereum" => "mainnet".to_string(),
            "matic" => "polygon".to_string(),
            other => other.to_string(),
        };
        self.profiles.values().find(|p| p.name == name)
    }

    /// Profiles ordered by chain id.
    pub fn profiles(&self) -> impl Iterator<Item = &ChainProfile> {
        self.profiles.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_profiles() {
        let registry = ChainRegistry::builtin();
        let mainnet = registry.resolve(1).unwrap();
        assert_eq!(mainnet.refund_fraction, RefundFraction::new(3, 10).unwrap());
        assert_eq!(mainnet.max_gas_per_tx, 10_000_000);
        assert_eq!(
            mainnet.relay_endpoint.as_ref().map(Url::as_str),
            Some("https://safe-transaction-mainnet.safe.global/")
        );
        assert!(registry.resolve(42161).is_ok());
        assert!(registry.resolve(137).is_ok());
    }

    #[test]
    fn test_unknown_chain_is_unsupported() {
        let err = ChainRegistry::builtin().resolve(9001).unwrap_err();
        assert!(matches!(err, SafeError::UnsupportedChain(9001)));
    }

    #[test]
    fn test_resolve_name_aliases() {
        let registry = ChainRegistry::builtin();
        assert_eq!(registry.resolve_name("Ethereum").unwrap().chain_id, 1);
        assert_eq!(registry.resolve_name("matic").unwrap().chain_id, 137);
        assert_eq!(registry.resolve_name("sepolia").unwrap().chain_id, 11155111);
        assert!(registry.resolve_name("evmos").is_none());
    }

    #[test]
    fn test_profiles_ordered_by_chain_id() {
        let ids: Vec<u64> = ChainRegistry::builtin().profiles().map(|p| p.chain_id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_extend_adds_chain_without_relay() {
        let mut registry = ChainRegistry::builtin();
        registry
            .extend_from_json(
                r#"[{ "chainId": 9001, "name": "EVMOS", "refundFraction": 0.2, "maxGasPerTx": 8000000 }]"#,
            )
            .unwrap();
        let evmos = registry.resolve(9001).unwrap();
        assert_eq!(evmos.name, "evmos");
        assert!(evmos.relay_endpoint.is_none());
        assert_eq!(evmos.refund_fraction, RefundFraction::new(1, 5).unwrap());
        assert_eq!(evmos.multi_send, DEFAULT_MULTI_SEND);
    }

    #[test]
    fn test_extend_rejects_refund_fraction_of_one() {
        let mut registry = ChainRegistry::empty();
        let err = registry
            .extend_from_json(r#"[{ "chainId": 1, "name": "x", "refundFraction": 1.0, "maxGasPerTx": 1 }]"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRefundFraction(_)));
        assert!(registry.resolve(1).is_err());
    }

    #[test]
    fn test_extend_keeps_refund_fraction_exact() {
        let mut registry = ChainRegistry::empty();
        registry
            .extend_from_json(
                r#"[
                    { "chainId": 10, "name": "optimism", "refundFraction": "1/3", "maxGasPerTx": 5000000 },
                    { "chainId": 100, "name": "gnosis", "refundFraction": 0.00004, "maxGasPerTx": 5000000 }
                ]"#,
            )
            .unwrap();

        let optimism = registry.resolve(10).unwrap();
        assert_eq!(optimism.refund_fraction.overestimate(90_000), 135_000);

        let gnosis = registry.resolve(100).unwrap();
        assert_eq!(gnosis.refund_fraction, RefundFraction::new(1, 25_000).unwrap());
        assert_eq!(gnosis.refund_fraction.overestimate(1_000_000), 1_000_040);
    }

    #[test]
    fn test_extend_rejects_malformed_refund_fraction() {
        let mut registry = ChainRegistry::empty();
        let err = registry
            .extend_from_json(r#"[{ "chainId": 1, "name": "x", "refundFraction": "4/3", "maxGasPerTx": 1 }]"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRefundFraction(_)));
    }

    #[test]
    fn test_extend_is_all_or_nothing() {
        let mut registry = ChainRegistry::empty();
        let result = registry.extend_from_json(
            r#"[
                { "chainId": 10, "name": "optimism", "refundFraction": 0.1, "maxGasPerTx": 5 },
                { "chainId": 11, "name": "broken", "refundFraction": 0.1, "maxGasPerTx": 0 }
            ]"#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidGasLimit(11))));
        assert!(registry.resolve(10).is_err());
    }

    #[test]
    fn test_extend_rejects_bad_relay_url() {
        let mut registry = ChainRegistry::empty();
        let err = registry
            .extend_from_json(
                r#"[{ "chainId": 1, "name": "x", "relayEndpoint": "not a url", "refundFraction": 0.1, "maxGasPerTx": 1 }]"#,
            )
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRelayUrl { .. }));
    }

    #[test]
    fn test_from_path_overrides_builtin() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{ "chainId": 1, "name": "mainnet", "relayEndpoint": "http://localhost:8000", "refundFraction": 0.25, "maxGasPerTx": 12000000 }}]"#
        )
        .unwrap();

        let registry = ChainRegistry::from_path(file.path()).unwrap();
        let mainnet = registry.resolve(1).unwrap();
        assert_eq!(mainnet.max_gas_per_tx, 12_000_000);
        assert_eq!(mainnet.refund_fraction, RefundFraction::new(1, 4).unwrap());
        assert!(registry.resolve(137).is_ok());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = ChainRegistry::from_path("/nonexistent/chains.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
