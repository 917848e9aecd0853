#![allow(dead_code)]
use std::path::PathBuf;
use std::sync::Arc;

use alloy::consensus::Transaction;
use alloy::node_bindings::{Anvil, AnvilInstance};
use alloy::primitives::{bytes, Address, Bytes};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::transports::mock::Asserter;
use anyhow::Context;
use catalist_ops_scripts::env::{self, EnvVarValue};
use catalist_ops_scripts::prometheus_metrics::Metrics;
use catalist_ops_scripts::scripts::prelude::{ConfigOverrides, RuntimeConfig, ScriptRuntime};
use catalist_ops_scripts::tracing as tracing_config;

/// Nothing listens here; building a runtime never dials the endpoint.
pub const UNREACHABLE_RPC: &str = "http://127.0.0.1:1";

/// First account of anvil's default mnemonic.
pub const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const ANVIL_GAS_PRICE: u128 = 20_000_000_000;

pub fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data")
}

pub fn devnet_manifest() -> PathBuf {
    data_dir().join("manifests/deployed-ace_devnet.json")
}

pub fn sample_deposit_data() -> PathBuf {
    data_dir().join("deposit_data/sample.json")
}

pub fn abi_dir() -> PathBuf {
    data_dir().join("abi")
}

pub fn setup_logger() {
    tracing_config::setup_logger(tracing_config::LoggingConfig::default_for_test());
}

pub fn overrides_for(manifest: PathBuf) -> ConfigOverrides {
    ConfigOverrides {
        rpc_url: Some(UNREACHABLE_RPC.to_owned()),
        manifest: Some(manifest),
        abi_dir: Some(abi_dir()),
        gas_limit: None,
        gas_price: None,
    }
}

pub fn offline_runtime(manifest: PathBuf) -> anyhow::Result<ScriptRuntime> {
    let config = RuntimeConfig::load(&overrides_for(manifest))?;
    let metrics = Arc::new(Metrics::new("catalist_test")?);
    Ok(ScriptRuntime::init(config, metrics)?)
}

/// Read-only runtime whose `eth_call`s are answered, in order, by `asserter`.
pub fn mocked_runtime(manifest: PathBuf, asserter: Asserter) -> anyhow::Result<ScriptRuntime> {
    let config = RuntimeConfig::load(&overrides_for(manifest))?;
    let provider = ProviderBuilder::new()
        .disable_recommended_fillers()
        .connect_mocked_client(asserter)
        .erased();
    let metrics = Arc::new(Metrics::new("catalist_test")?);
    Ok(ScriptRuntime::with_provider(config, provider, None, metrics)?)
}

pub struct AnvilEnvironment {
    // Kept alive for the duration of the test.
    pub anvil: AnvilInstance,
    pub runtime: ScriptRuntime,
}

/// Anvil node where every manifest address runs a contract that answers any call with one zero word.
/// Void calls succeed and getters read as zero, so transactions land in order, one per block.
pub async fn anvil_environment() -> anyhow::Result<AnvilEnvironment> {
    let anvil = Anvil::new().try_spawn()?;
    let mut config = RuntimeConfig::load(&ConfigOverrides {
        rpc_url: Some(anvil.endpoint()),
        manifest: Some(devnet_manifest()),
        abi_dir: Some(abi_dir()),
        gas_limit: Some(1_000_000),
        gas_price: Some(ANVIL_GAS_PRICE),
    })?;
    config.private_key = EnvVarValue {
        spec: &env::PRIVATE_KEY,
        value: Some(ANVIL_KEY.to_owned()),
    };
    config.deployer = None;
    let metrics = Arc::new(Metrics::new("catalist_anvil_test")?);
    let runtime = ScriptRuntime::init(config, metrics)?;

    // PUSH1 0x20 PUSH1 0x00 RETURN
    let stub: Bytes = bytes!("60206000f3");
    for address in runtime.manifest.protocol_addresses() {
        runtime
            .provider
            .raw_request::<_, serde_json::Value>("anvil_setCode".into(), (address, stub.clone()))
            .await?;
    }
    Ok(AnvilEnvironment { anvil, runtime })
}

/// `(to, input)` of every transaction mined so far, oldest first.
pub async fn sent_transactions(runtime: &ScriptRuntime) -> anyhow::Result<Vec<(Address, Bytes)>> {
    let latest = runtime.provider.get_block_number().await?;
    let mut sent = vec![];
    for number in 1..=latest {
        let block = runtime
            .provider
            .get_block_by_number(number.into())
            .full()
            .await?
            .with_context(|| format!("block {number} not found"))?;
        for tx in block.transactions.into_transactions() {
            let to = tx.to().context("unexpected contract creation")?;
            sent.push((to, tx.input().clone()));
        }
    }
    Ok(sent)
}
