//! Static chain metadata, registry-file loading, and chain selection.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Immutable metadata of a single network as listed in the chain registry file.
///
/// Only the fields the dispatcher needs are kept; every other key of a registry
/// record (`nativeCurrency`, `explorers`, ...) is ignored on deserialisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    /// Numeric EIP-155 chain identifier.
    pub chain_id: u64,
    /// Human readable network name.
    pub name: String,
    /// Candidate RPC endpoint URLs, in preference order.
    #[serde(default)]
    pub rpc: Vec<String>,
}

impl ChainDescriptor {
    /// Creates a descriptor from its parts.
    pub fn new(chain_id: u64, name: impl Into<String>, rpc: Vec<String>) -> Self {
        Self {
            chain_id,
            name: name.into(),
            rpc,
        }
    }

    /// The endpoint used for this chain: always the first candidate.
    #[must_use]
    pub fn primary_rpc(&self) -> Option<&str> {
        self.rpc.first().map(String::as_str)
    }
}

/// Read the chain registry JSON file (an array of chain records).
///
/// # Errors
///
/// Returns [`Error::Config`] if the file cannot be read or is not a valid
/// chain list.
pub fn load_descriptors(path: &Path) -> Result<Vec<ChainDescriptor>, Error> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config_with(
            format!("failed to read chain registry '{}'", path.display()),
            e,
        )
    })?;
    parse_descriptors(&content)
        .map_err(|e| Error::config_with(format!("invalid chain registry '{}'", path.display()), e))
}

/// Parse chain records from a JSON string.
///
/// # Errors
///
/// Returns the `serde_json` error if the input is not an array of chain records.
pub fn parse_descriptors(json: &str) -> Result<Vec<ChainDescriptor>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Select the descriptors whose chain id is in `wanted`, preserving input order.
#[must_use]
pub fn filter(all: &[ChainDescriptor], wanted: &BTreeSet<u64>) -> Vec<ChainDescriptor> {
    all.iter()
        .filter(|chain| wanted.contains(&chain.chain_id))
        .cloned()
        .collect()
}

/// Chain ids in `wanted` that match no descriptor in `all`.
#[must_use]
pub fn unmatched(all: &[ChainDescriptor], wanted: &BTreeSet<u64>) -> Vec<u64> {
    wanted
        .iter()
        .copied()
        .filter(|id| !all.iter().any(|chain| chain.chain_id == *id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(id: u64, name: &str) -> ChainDescriptor {
        ChainDescriptor::new(id, name, vec![format!("https://rpc.{id}.example")])
    }

    #[test]
    fn filter_keeps_only_wanted_in_input_order() {
        let all = vec![chain(1, "Ethereum"), chain(5, "Goerli"), chain(137, "Polygon")];
        let wanted = BTreeSet::from([5, 999]);

        let selected = filter(&all, &wanted);
        assert_eq!(selected, vec![chain(5, "Goerli")]);
        assert_eq!(unmatched(&all, &wanted), vec![999]);
    }

    #[test]
    fn filter_preserves_relative_order() {
        let all = vec![chain(137, "Polygon"), chain(1, "Ethereum"), chain(100, "Gnosis")];
        let wanted = BTreeSet::from([1, 100, 137]);

        let ids: Vec<u64> = filter(&all, &wanted).iter().map(|c| c.chain_id).collect();
        assert_eq!(ids, vec![137, 1, 100]);
        assert!(unmatched(&all, &wanted).is_empty());
    }

    #[test]
    fn filter_with_nothing_wanted_is_empty() {
        let all = vec![chain(1, "Ethereum")];
        assert!(filter(&all, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn parses_registry_records_and_ignores_extra_keys() {
        let json = r#"[
            {
                "name": "Goerli",
                "chain": "ETH",
                "rpc": ["https://goerli.example", "https://backup.example"],
                "nativeCurrency": {"name": "Goerli Ether", "symbol": "ETH", "decimals": 18},
                "chainId": 5,
                "networkId": 5
            },
            {"name": "No RPC", "chainId": 42}
        ]"#;

        let chains = parse_descriptors(json).expect("valid registry");
        assert_eq!(chains.len(), 2);
        assert_eq!(chains[0].chain_id, 5);
        assert_eq!(chains[0].primary_rpc(), Some("https://goerli.example"));
        assert_eq!(chains[1].primary_rpc(), None);
    }

    #[test]
    fn missing_registry_file_is_a_config_error() {
        let err = load_descriptors(Path::new("/nonexistent/chains.json")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
