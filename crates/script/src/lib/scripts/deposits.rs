use alloy::primitives::{Address, Bytes, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use catalist_ops_shared::deposit_security::{self, AttestMessage, CompactSignature, GuardianSignature};
use catalist_ops_shared::output::ScriptOutput;
use serde_json::Value;

use super::prelude::ScriptRuntime;
use super::staking::clamp_module_id;
use super::{address_value, record_tx, uint_value};
use crate::contracts::DepositSecurityModule;
use crate::eth_client::ProviderFactory;

pub const DEFAULT_GUARDIAN_QUORUM: u64 = 1;

/// Deposit calldata for modules that take none.
const EMPTY_DEPOSIT_CALLDATA: [u8; 1] = [0x00];

pub async fn deposit_state(runtime: &ScriptRuntime, module_id: u64) -> anyhow::Result<ScriptOutput> {
    let dsm = &runtime.contracts.deposit_security_module;
    let router = &runtime.contracts.staking_router;
    let module = U256::from(clamp_module_id(module_id));

    let max_deposits = runtime.tx.read("getMaxDeposits", dsm.getMaxDeposits()).await?;
    let can_deposit = runtime.tx.read("canDeposit", dsm.canDeposit(module)).await?;
    let active = runtime
        .tx
        .read("getStakingModuleIsActive", router.getStakingModuleIsActive(module))
        .await?;
    let quorum = runtime.tx.read("getGuardianQuorum", dsm.getGuardianQuorum()).await?;
    let guardians = runtime.tx.read("getGuardians", dsm.getGuardians()).await?;
    let nonce = runtime
        .tx
        .read("getStakingModuleNonce", router.getStakingModuleNonce(module))
        .await?;
    let block = runtime.eth_client.get_latest_block().await?;
    let deposit_root = runtime
        .tx
        .read("get_deposit_root", runtime.contracts.deposit_contract.get_deposit_root())
        .await?;

    let mut output = ScriptOutput::new();
    output.untitled().entry("staking module id", uint_value(module));
    output
        .section("Deposit security module")
        .entry("max deposits", uint_value(max_deposits))
        .entry("can deposit", can_deposit)
        .entry("staking module is active", active)
        .entry("guardian quorum", uint_value(quorum))
        .entry(
            "guardians",
            Value::Array(guardians.into_iter().map(address_value).collect()),
        );
    output
        .section("Deposit data")
        .entry("staking module nonce", uint_value(nonce))
        .entry("latest block number", block.number)
        .entry("latest block hash", block.hash.to_string())
        .entry("deposit root", deposit_root.to_string());
    Ok(output)
}

pub async fn add_guardian(runtime: &ScriptRuntime, guardian: Address, quorum: u64) -> anyhow::Result<ScriptOutput> {
    let tx_hash = runtime
        .tx
        .send(
            "addGuardian",
            runtime
                .contracts
                .deposit_security_module
                .addGuardian(guardian, U256::from(quorum)),
        )
        .await?;

    let mut output = ScriptOutput::new();
    let section = output
        .untitled()
        .entry("guardian", address_value(guardian))
        .entry("quorum", quorum);
    record_tx(section, tx_hash);
    Ok(output)
}

/// Signs `message` with every guardian key and returns the signatures in the order the module checks them.
pub fn sign_attest_message(
    message: &AttestMessage,
    prefix: alloy::primitives::B256,
    guardians: &[PrivateKeySigner],
) -> anyhow::Result<Vec<GuardianSignature>> {
    let digest = message.hash(prefix);
    let signatures = guardians
        .iter()
        .map(|guardian| {
            let signature = guardian.sign_hash_sync(&digest)?;
            Ok(GuardianSignature {
                guardian: guardian.address(),
                signature: CompactSignature::from(&signature),
            })
        })
        .collect::<Result<Vec<_>, alloy::signers::Error>>()?;
    Ok(deposit_security::sort_by_guardian(signatures)?)
}

/// Guardian keys given on the command line, or the runtime's own signer when none are.
fn guardian_signers(runtime: &ScriptRuntime, guardian_keys: &[String]) -> anyhow::Result<Vec<PrivateKeySigner>> {
    if guardian_keys.is_empty() {
        return Ok(vec![runtime.signer()?.clone()]);
    }
    guardian_keys
        .iter()
        .map(|key| Ok(ProviderFactory::signer(ProviderFactory::decode_key(key)?)))
        .collect()
}

pub async fn deposit_buffered(
    runtime: &ScriptRuntime,
    module_id: u64,
    guardian_keys: &[String],
) -> anyhow::Result<ScriptOutput> {
    let guardians = guardian_signers(runtime, guardian_keys)?;
    let dsm = &runtime.contracts.deposit_security_module;
    let module_id = clamp_module_id(module_id);

    let nonce = runtime
        .tx
        .read(
            "getStakingModuleNonce",
            runtime.contracts.staking_router.getStakingModuleNonce(U256::from(module_id)),
        )
        .await?;
    let nonce: u64 = nonce
        .try_into()
        .map_err(|_e| anyhow::anyhow!("Staking module nonce {nonce} does not fit u64"))?;
    let block = runtime.eth_client.get_latest_block().await?;
    let deposit_root = runtime
        .tx
        .read("get_deposit_root", runtime.contracts.deposit_contract.get_deposit_root())
        .await?;
    let prefix = runtime
        .tx
        .read("ATTEST_MESSAGE_PREFIX", dsm.ATTEST_MESSAGE_PREFIX())
        .await?;

    let message = AttestMessage {
        block_number: block.number,
        block_hash: block.hash,
        deposit_root,
        staking_module_id: module_id,
        nonce,
    };
    let signatures = sign_attest_message(&message, prefix, &guardians)?;
    tracing::info!(?message, guardians = signatures.len(), "Signed attest message");

    let sorted: Vec<DepositSecurityModule::Signature> = signatures
        .iter()
        .map(|sig| DepositSecurityModule::Signature {
            r: sig.signature.r,
            vs: sig.signature.vs,
        })
        .collect();
    let tx_hash = runtime
        .tx
        .send(
            "depositBufferedAce",
            dsm.depositBufferedAce(
                U256::from(message.block_number),
                message.block_hash,
                message.deposit_root,
                U256::from(message.staking_module_id),
                U256::from(message.nonce),
                Bytes::from_static(&EMPTY_DEPOSIT_CALLDATA),
                sorted,
            ),
        )
        .await?;

    let mut output = ScriptOutput::new();
    output
        .section("Attest message")
        .entry("block number", message.block_number)
        .entry("block hash", message.block_hash.to_string())
        .entry("deposit root", message.deposit_root.to_string())
        .entry("staking module id", message.staking_module_id)
        .entry("nonce", message.nonce);
    output.section("Guardians").entry(
        "signers",
        Value::Array(signatures.iter().map(|sig| address_value(sig.guardian)).collect()),
    );
    record_tx(output.section("Deposit"), tx_hash);
    Ok(output)
}
