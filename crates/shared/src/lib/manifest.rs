use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::contracts::ContractId;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read deployment manifest {path:?}: {error:?}")]
    Io { path: PathBuf, error: std::io::Error },

    #[error("Failed to parse deployment manifest {path:?}: {error}")]
    Json { path: PathBuf, error: serde_json::Error },

    #[error("Deployment manifest has no entry {0}")]
    MissingEntry(String),

    #[error("Deployment manifest entry {0} has neither proxy.address nor address")]
    MalformedEntry(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSpec {
    pub genesis_time: u64,
    pub slots_per_epoch: u64,
    pub seconds_per_slot: u64,
    pub deposit_contract: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContractEntry {
    Proxied {
        proxy: AddressRecord,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        implementation: Option<AddressRecord>,
    },
    Direct {
        address: Address,
    },
}

impl ContractEntry {
    /// Address calls should be sent to: the proxy when there is one.
    pub fn callable_address(&self) -> Address {
        match self {
            Self::Proxied { proxy, .. } => proxy.address,
            Self::Direct { address } => *address,
        }
    }

    /// Implementation recorded at deploy time, if the manifest carries it.
    pub fn recorded_implementation(&self) -> Option<Address> {
        match self {
            Self::Proxied { implementation, .. } => implementation.as_ref().map(|record| record.address),
            Self::Direct { .. } => None,
        }
    }
}

/// Output of the deployment tooling: `chainSpec` plus one entry per deployed contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentManifest {
    #[serde(rename = "chainSpec")]
    pub chain_spec: ChainSpec,
    #[serde(flatten)]
    pub entries: BTreeMap<String, serde_json::Value>,
}

impl DeploymentManifest {
    pub fn read(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read(path).map_err(|error| ManifestError::Io {
            path: path.to_owned(),
            error,
        })?;
        Self::from_slice(&content).map_err(|error| ManifestError::Json {
            path: path.to_owned(),
            error,
        })
    }

    pub fn from_slice(content: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(content)
    }

    pub fn entry_by_key(&self, key: &str) -> Result<ContractEntry, ManifestError> {
        let raw = self
            .entries
            .get(key)
            .ok_or_else(|| ManifestError::MissingEntry(key.to_owned()))?;
        serde_json::from_value(raw.clone()).map_err(|_| ManifestError::MalformedEntry(key.to_owned()))
    }

    pub fn entry(&self, contract: ContractId) -> Result<ContractEntry, ManifestError> {
        match contract.manifest_key() {
            Some(key) => self.entry_by_key(key),
            None => Ok(ContractEntry::Direct {
                address: self.chain_spec.deposit_contract,
            }),
        }
    }

    pub fn address_of(&self, contract: ContractId) -> Result<Address, ManifestError> {
        self.entry(contract).map(|entry| entry.callable_address())
    }

    /// Addresses of every protocol contract the manifest knows about, proxies and implementations alike.
    pub fn protocol_addresses(&self) -> Vec<Address> {
        let mut result = vec![self.chain_spec.deposit_contract];
        for key in self.entries.keys() {
            if let Ok(entry) = self.entry_by_key(key) {
                result.push(entry.callable_address());
                result.extend(entry.recorded_implementation());
            }
        }
        result.sort();
        result.dedup();
        result
    }
}
