use alloy::primitives::{Address, U256};
use catalist_ops_shared::output::ScriptOutput;

use super::prelude::ScriptRuntime;
use super::{address_value, record_tx, uint_value};

pub const DEFAULT_STAKING_LIMIT: u64 = 1_000_000_000;

pub async fn set_reward_address(
    runtime: &ScriptRuntime,
    operator_id: u64,
    reward_address: Address,
) -> anyhow::Result<ScriptOutput> {
    let tx_hash = runtime
        .tx
        .send(
            "setNodeOperatorRewardAddress",
            runtime
                .contracts
                .node_operators_registry
                .setNodeOperatorRewardAddress(U256::from(operator_id), reward_address),
        )
        .await?;

    let mut output = ScriptOutput::new();
    let section = output
        .untitled()
        .entry("operator", operator_id)
        .entry("address", address_value(reward_address));
    record_tx(section, tx_hash);
    Ok(output)
}

pub async fn set_staking_limit(runtime: &ScriptRuntime, operator_id: u64, limit: u64) -> anyhow::Result<ScriptOutput> {
    let tx_hash = runtime
        .tx
        .send(
            "setNodeOperatorStakingLimit",
            runtime
                .contracts
                .node_operators_registry
                .setNodeOperatorStakingLimit(U256::from(operator_id), limit),
        )
        .await?;

    let mut output = ScriptOutput::new();
    let section = output.untitled().entry("operator", operator_id).entry("limit", limit);
    record_tx(section, tx_hash);
    Ok(output)
}

pub async fn node_operator_info(runtime: &ScriptRuntime, operator_id: u64) -> anyhow::Result<ScriptOutput> {
    let registry = &runtime.contracts.node_operators_registry;
    let id = U256::from(operator_id);
    let info = runtime
        .tx
        .read("getNodeOperator", registry.getNodeOperator(id, true))
        .await?;
    let penalized = runtime
        .tx
        .read("isOperatorPenalized", registry.isOperatorPenalized(id))
        .await?;

    let mut output = ScriptOutput::new();
    output.untitled().entry("node operator id", operator_id);
    output
        .section("Node operator info")
        .entry("active", info.active)
        .entry("name", info.name)
        .entry("reward address", address_value(info.rewardAddress))
        .entry("total vetted validators", info.totalVettedValidators)
        .entry("total exited validators", info.totalExitedValidators)
        .entry("total added validators", info.totalAddedValidators)
        .entry("total deposited validators", info.totalDepositedValidators)
        .entry("penalized", penalized);
    Ok(output)
}

/// Registers the operator, then makes its reward address an owner so it can manage its own keys.
pub async fn add_operator(runtime: &ScriptRuntime, name: &str, reward_address: Address) -> anyhow::Result<ScriptOutput> {
    let registry = &runtime.contracts.node_operators_registry;
    let add_call = registry.addNodeOperator(name.to_owned(), reward_address);
    let operator_id = runtime.tx.read("addNodeOperator", add_call.clone()).await?;
    let add_tx = runtime.tx.send("addNodeOperator", add_call).await?;
    tracing::info!(%operator_id, name, "Added node operator");

    let owner_tx = runtime
        .tx
        .send("setOwner", registry.setOwner(reward_address, true))
        .await?;

    let mut output = ScriptOutput::new();
    output
        .untitled()
        .entry("name", name)
        .entry("address", address_value(reward_address))
        .entry("operator id", uint_value(operator_id))
        .entry("transaction hash", add_tx.to_string())
        .entry("owner transaction hash", owner_tx.to_string());
    Ok(output)
}
