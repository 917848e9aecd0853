use std::path::Path;

use alloy::primitives::{b256, Address, Bytes, B256};
use catalist_ops_shared::contracts::{ContractId, ProxyKind};
use catalist_ops_shared::output::ScriptOutput;
use catalist_ops_shared::util::decode_hex;
use serde_json::Value;
use thiserror::Error;

use super::prelude::ScriptRuntime;
use super::{address_value, record_tx};
use crate::contracts::{AppProxyUpgradeable, OssifiableProxy, WithdrawalsManagerProxy};
use crate::utils;

/// Aragon app id the kernel registers the node operators registry under.
pub const NOS_APP_ID: B256 = b256!("cefbeb723500e7ffe797c255a6cbd66a0edb055d425ce13238ec14d2c137016a");

pub async fn implementation_of(runtime: &ScriptRuntime, contract: ContractId) -> anyhow::Result<Address> {
    let address = runtime.resolve_optional(contract).await?;
    let implementation = match contract.proxy_kind() {
        ProxyKind::Aragon => {
            let proxy = AppProxyUpgradeable::new(address, runtime.provider());
            runtime.tx.read("implementation", proxy.implementation()).await?
        }
        ProxyKind::Ossifiable => {
            let proxy = OssifiableProxy::new(address, runtime.provider());
            runtime
                .tx
                .read("proxy__getImplementation", proxy.proxy__getImplementation())
                .await?
        }
        ProxyKind::WithdrawalsManager => {
            let proxy = WithdrawalsManagerProxy::new(address, runtime.provider());
            runtime.tx.read("implementation", proxy.implementation()).await?
        }
        ProxyKind::None => address,
    };
    Ok(implementation)
}

pub async fn get_impl(runtime: &ScriptRuntime, contract: ContractId) -> anyhow::Result<ScriptOutput> {
    let implementation = implementation_of(runtime, contract).await?;
    let mut output = ScriptOutput::new();
    output
        .untitled()
        .entry("contract", contract.name())
        .entry("proxy", contract.proxy_kind().to_string())
        .entry("implementation", address_value(implementation));
    Ok(output)
}

pub async fn proxy_info(runtime: &ScriptRuntime) -> anyhow::Result<ScriptOutput> {
    let mut output = ScriptOutput::new();
    for contract in ContractId::ALL {
        match contract.proxy_kind() {
            ProxyKind::Ossifiable => {
                let proxy = OssifiableProxy::new(runtime.resolve_optional(contract).await?, runtime.provider());
                let admin = runtime.tx.read("proxy__getAdmin", proxy.proxy__getAdmin()).await?;
                let implementation = runtime
                    .tx
                    .read("proxy__getImplementation", proxy.proxy__getImplementation())
                    .await?;
                let ossified = runtime
                    .tx
                    .read("proxy__getIsOssified", proxy.proxy__getIsOssified())
                    .await?;
                output
                    .section(format!("{contract} proxy info"))
                    .entry("admin", address_value(admin))
                    .entry("impl", address_value(implementation))
                    .entry("ossified", ossified);
            }
            ProxyKind::WithdrawalsManager => {
                let proxy = WithdrawalsManagerProxy::new(runtime.resolve_optional(contract).await?, runtime.provider());
                let admin = runtime.tx.read("proxy_getAdmin", proxy.proxy_getAdmin()).await?;
                let implementation = runtime.tx.read("implementation", proxy.implementation()).await?;
                output
                    .section(format!("{contract} proxy info"))
                    .entry("admin", address_value(admin))
                    .entry("impl", address_value(implementation));
            }
            ProxyKind::Aragon | ProxyKind::None => {}
        }
    }
    Ok(output)
}

/// Points the kernel's app base for the node operators registry at `new_implementation`.
pub async fn upgrade_nos(
    runtime: &ScriptRuntime,
    new_implementation: Address,
    deployer: Option<Address>,
) -> anyhow::Result<ScriptOutput> {
    let deployer = match deployer.or(runtime.config.deployer) {
        Some(deployer) => deployer,
        None => runtime.signer_address()?,
    };
    let kernel = &runtime.contracts.kernel;
    let namespace = runtime
        .tx
        .read("APP_BASES_NAMESPACE", kernel.APP_BASES_NAMESPACE())
        .await?;
    let app_manager_role = runtime.tx.read("APP_MANAGER_ROLE", kernel.APP_MANAGER_ROLE()).await?;
    let current = runtime.tx.read("getApp", kernel.getApp(namespace, NOS_APP_ID)).await?;

    let mut output = ScriptOutput::new();
    output
        .untitled()
        .entry("deployer", address_value(deployer))
        .entry("current implementation", address_value(current))
        .entry("new implementation", address_value(new_implementation));

    tracing::info!(%deployer, "Granting APP_MANAGER_ROLE");
    let grant_tx = runtime
        .tx
        .send(
            "grantPermission",
            runtime
                .contracts
                .acl
                .grantPermission(deployer, *kernel.address(), app_manager_role),
        )
        .await?;
    record_tx(output.section("Grant APP_MANAGER_ROLE"), grant_tx);

    tracing::info!(%new_implementation, "Setting app base");
    let set_app_tx = runtime
        .tx
        .send("setApp", kernel.setApp(namespace, NOS_APP_ID, new_implementation))
        .await?;
    record_tx(output.section("Set app"), set_app_tx);
    Ok(output)
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact has no bytecode")]
    MissingBytecode,
    #[error("Artifact bytecode is empty")]
    EmptyBytecode,
    #[error("Artifact bytecode is not hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Creation bytecode from a compiled artifact: `"bytecode": "0x.."` or `"bytecode": {"object": "0x.."}`.
pub fn artifact_bytecode(artifact: &Value) -> Result<Bytes, ArtifactError> {
    let raw = match &artifact["bytecode"] {
        Value::String(code) => code.as_str(),
        Value::Object(inner) => inner
            .get("object")
            .and_then(Value::as_str)
            .ok_or(ArtifactError::MissingBytecode)?,
        _ => return Err(ArtifactError::MissingBytecode),
    };
    let bytes = decode_hex(raw)?;
    if bytes.is_empty() {
        return Err(ArtifactError::EmptyBytecode);
    }
    Ok(bytes.into())
}

pub async fn deploy_contract(runtime: &ScriptRuntime, artifact_path: &Path) -> anyhow::Result<ScriptOutput> {
    let deployer = runtime.signer_address()?;
    let artifact = utils::read_untyped_json(artifact_path)?;
    let bytecode = artifact_bytecode(&artifact)?;
    let name = artifact["contractName"].as_str().map(str::to_owned);

    tracing::info!(artifact = ?artifact_path, size = bytecode.len(), "Deploying contract");
    let (address, tx_hash) = runtime.eth_client.deploy(bytecode, runtime.config.gas).await?;

    let mut output = ScriptOutput::new();
    let section = output
        .untitled()
        .entry("contract", name)
        .entry("deployer", address_value(deployer))
        .entry("address", address_value(address));
    record_tx(section, tx_hash);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_bytecode_from_both_artifact_layouts() {
        let hardhat = json!({"contractName": "Foo", "bytecode": "0x6080"});
        let foundry = json!({"bytecode": {"object": "0x6080", "linkReferences": {}}});
        assert_eq!(artifact_bytecode(&hardhat).unwrap(), Bytes::from(vec![0x60, 0x80]));
        assert_eq!(artifact_bytecode(&foundry).unwrap(), Bytes::from(vec![0x60, 0x80]));
    }

    #[test]
    fn rejects_artifacts_without_code() {
        assert!(matches!(
            artifact_bytecode(&json!({"abi": []})),
            Err(ArtifactError::MissingBytecode)
        ));
        assert!(matches!(
            artifact_bytecode(&json!({"bytecode": "0x"})),
            Err(ArtifactError::EmptyBytecode)
        ));
        assert!(matches!(
            artifact_bytecode(&json!({"bytecode": "0xzz"})),
            Err(ArtifactError::InvalidHex(_))
        ));
    }
}
