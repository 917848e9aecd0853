use alloy::primitives::{Address, U256};
use catalist_ops_shared::contracts::ContractId;
use catalist_ops_shared::epochs;
use catalist_ops_shared::output::ScriptOutput;
use serde_json::Value;

use super::prelude::ScriptRuntime;
use super::{address_value, record_tx, uint_value};

pub const DEFAULT_FAST_LANE_LENGTH_SLOTS: u64 = 10;
pub const DEFAULT_QUORUM: u64 = 1;

pub async fn set_frame_config(
    runtime: &ScriptRuntime,
    epochs_per_frame: u64,
    fast_lane_length_slots: u64,
) -> anyhow::Result<ScriptOutput> {
    let mut output = ScriptOutput::new();
    output
        .untitled()
        .entry("epoch per frame", epochs_per_frame)
        .entry("fast lane length slots", fast_lane_length_slots);

    for (id, hash_consensus) in runtime.contracts.hash_consensus() {
        let tx_hash = runtime
            .tx
            .send(
                "setFrameConfig",
                hash_consensus.setFrameConfig(U256::from(epochs_per_frame), U256::from(fast_lane_length_slots)),
            )
            .await?;
        record_tx(output.section(id.name()), tx_hash);
    }
    Ok(output)
}

pub async fn hash_consensus_info(runtime: &ScriptRuntime) -> anyhow::Result<ScriptOutput> {
    let block = runtime.eth_client.get_latest_block().await?;
    let chain_spec = &runtime.manifest.chain_spec;
    let slot = epochs::slot_at(block.timestamp, chain_spec)?;

    let mut output = ScriptOutput::new();
    output
        .untitled()
        .entry("latest block", block.number)
        .entry("current slot", slot)
        .entry("current epoch", epochs::epoch_of_slot(slot, chain_spec)?);
    for (id, hash_consensus) in runtime.contracts.hash_consensus() {
        let frame = runtime.tx.read("getFrameConfig", hash_consensus.getFrameConfig()).await?;
        let chain = runtime.tx.read("getChainConfig", hash_consensus.getChainConfig()).await?;
        let current = runtime.tx.read("getCurrentFrame", hash_consensus.getCurrentFrame()).await?;
        let members = runtime.tx.read("getMembers", hash_consensus.getMembers()).await?;
        let quorum = runtime.tx.read("getQuorum", hash_consensus.getQuorum()).await?;

        let member_rows: Vec<Value> = members
            .addresses
            .iter()
            .zip(members.lastReportedRefSlots.iter())
            .map(|(member, last_ref_slot)| {
                serde_json::json!({
                    "address": member.to_checksum(None),
                    "last reported ref slot": last_ref_slot.to_string(),
                })
            })
            .collect();

        output
            .section(id.name())
            .entry("address", address_value(*hash_consensus.address()))
            .entry("initial epoch", uint_value(frame.initialEpoch))
            .entry("epochs per frame", uint_value(frame.epochsPerFrame))
            .entry("fast lane length slots", uint_value(frame.fastLaneLengthSlots))
            .entry("slots per epoch", uint_value(chain.slotsPerEpoch))
            .entry("seconds per slot", uint_value(chain.secondsPerSlot))
            .entry("genesis time", uint_value(chain.genesisTime))
            .entry("ref slot", uint_value(current.refSlot))
            .entry(
                "report processing deadline slot",
                uint_value(current.reportProcessingDeadlineSlot),
            )
            .entry("quorum", uint_value(quorum))
            .entry("members", Value::Array(member_rows));
    }

    let accounting_oracle = &runtime.contracts.accounting_oracle;
    let consensus = runtime
        .tx
        .read("getConsensusContract", accounting_oracle.getConsensusContract())
        .await?;
    let last_ref_slot = runtime
        .tx
        .read("getLastProcessingRefSlot", accounting_oracle.getLastProcessingRefSlot())
        .await?;
    output
        .section(ContractId::AccountingOracle.name())
        .entry("consensus contract", address_value(consensus))
        .entry("last processing ref slot", uint_value(last_ref_slot));

    let exit_bus = &runtime.contracts.validators_exit_bus_oracle;
    let consensus = runtime
        .tx
        .read("getConsensusContract", exit_bus.getConsensusContract())
        .await?;
    let paused = runtime.tx.read("isPaused", exit_bus.isPaused()).await?;
    output
        .section(ContractId::ValidatorsExitBusOracle.name())
        .entry("consensus contract", address_value(consensus))
        .entry("paused", paused);
    Ok(output)
}

pub async fn add_oracle_member(runtime: &ScriptRuntime, member: Address, quorum: u64) -> anyhow::Result<ScriptOutput> {
    let mut output = ScriptOutput::new();
    output
        .untitled()
        .entry("member", address_value(member))
        .entry("quorum", quorum);

    for (id, hash_consensus) in runtime.contracts.hash_consensus() {
        let tx_hash = runtime
            .tx
            .send("addMember", hash_consensus.addMember(member, U256::from(quorum)))
            .await?;
        record_tx(output.section(id.name()), tx_hash);
    }
    Ok(output)
}

/// Epoch the oracles start counting frames from, derived from the latest block.
pub async fn current_initial_epoch(runtime: &ScriptRuntime) -> anyhow::Result<u64> {
    let block = runtime.eth_client.get_latest_block().await?;
    let epoch = epochs::initial_epoch(block.timestamp, &runtime.manifest.chain_spec)?;
    tracing::info!(block = block.number, timestamp = block.timestamp, epoch, "Computed initial epoch");
    Ok(epoch)
}

pub async fn update_initial_epoch(runtime: &ScriptRuntime) -> anyhow::Result<ScriptOutput> {
    let epoch = current_initial_epoch(runtime).await?;

    let mut output = ScriptOutput::new();
    output.untitled().entry("initial epoch", epoch);
    for (id, hash_consensus) in runtime.contracts.hash_consensus() {
        let tx_hash = runtime
            .tx
            .send("updateInitialEpoch", hash_consensus.updateInitialEpoch(U256::from(epoch)))
            .await?;
        record_tx(output.section(id.name()), tx_hash);
    }
    Ok(output)
}
