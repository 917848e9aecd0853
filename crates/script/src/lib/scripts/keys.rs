use std::path::{Path, PathBuf};

use alloy::primitives::U256;
use catalist_ops_shared::keys::{self, DepositDataEntry, PUBKEY_LENGTH, SIGNATURE_LENGTH};
use catalist_ops_shared::output::ScriptOutput;
use catalist_ops_shared::util::usize_to_u64;
use serde_json::Value;

use super::prelude::ScriptRuntime;
use super::record_tx;
use crate::utils;

pub fn read_deposit_data(file: &Path) -> anyhow::Result<Vec<DepositDataEntry>> {
    let entries: Vec<DepositDataEntry> = utils::read_json(file)?;
    tracing::info!(file = ?file, entries = entries.len(), "Read deposit data");
    Ok(entries)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddKeysArgs {
    pub operator_id: u64,
    pub file: PathBuf,
    pub start: usize,
    /// Zero selects every key from `start`.
    pub count: usize,
    /// `None` submits the whole selection in one transaction.
    pub batch_size: Option<usize>,
}

pub async fn add_keys(runtime: &ScriptRuntime, args: &AddKeysArgs) -> anyhow::Result<ScriptOutput> {
    let entries = read_deposit_data(&args.file)?;
    let all_keys = keys::parse_deposit_data(&entries)?;
    let selected = keys::select_range(&all_keys, args.start, args.count)?;
    anyhow::ensure!(!selected.is_empty(), "No signing keys in {:?}", args.file);

    let batch_size = args.batch_size.unwrap_or(selected.len());
    let batches = keys::batches(selected, batch_size)?;

    let mut output = ScriptOutput::new();
    output
        .untitled()
        .entry("operator", args.operator_id)
        .entry("file", args.file.display().to_string())
        .entry("start", args.start)
        .entry("count", selected.len())
        .entry("batches", batches.len());

    let registry = &runtime.contracts.node_operators_registry;
    for (number, batch) in batches.into_iter().enumerate() {
        let offset = args.start + batch.offset;
        tracing::info!(offset, count = batch.count, "Adding signing keys");
        let tx_hash = runtime
            .tx
            .send(
                "addSigningKeys",
                registry.addSigningKeys(
                    U256::from(args.operator_id),
                    U256::from(batch.count),
                    batch.pubkeys,
                    batch.signatures,
                ),
            )
            .await?;
        let section = output
            .section(format!("Batch {}", number + 1))
            .entry("offset", offset)
            .entry("count", batch.count);
        record_tx(section, tx_hash);
    }
    Ok(output)
}

/// Removing shifts later keys down, so every iteration removes at the same index.
pub async fn remove_keys(
    runtime: &ScriptRuntime,
    operator_id: u64,
    index: u64,
    count: u64,
    iterations: u64,
) -> anyhow::Result<ScriptOutput> {
    let mut output = ScriptOutput::new();
    output.untitled().entry("operator", operator_id);

    let registry = &runtime.contracts.node_operators_registry;
    for iteration in 0..iterations {
        let tx_hash = runtime
            .tx
            .send(
                "removeSigningKeys",
                registry.removeSigningKeys(U256::from(operator_id), U256::from(index), U256::from(count)),
            )
            .await?;
        let section = output
            .section(format!("Iteration {}", iteration + 1))
            .entry("index", index)
            .entry("count", count);
        record_tx(section, tx_hash);
    }
    Ok(output)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("End index {end} is before start index {start}")]
pub struct InvertedRange {
    pub start: u64,
    pub end: u64,
}

/// `[start, end)` as the `(offset, limit)` pair `getSigningKeys` takes.
pub fn key_window(start: u64, end: u64) -> Result<(u64, u64), InvertedRange> {
    if end < start {
        return Err(InvertedRange { start, end });
    }
    Ok((start, end - start))
}

pub async fn get_keys(runtime: &ScriptRuntime, operator_id: u64, start: u64, end: u64) -> anyhow::Result<ScriptOutput> {
    let (offset, limit) = key_window(start, end)?;
    let keys = runtime
        .tx
        .read(
            "getSigningKeys",
            runtime.contracts.node_operators_registry.getSigningKeys(
                U256::from(operator_id),
                U256::from(offset),
                U256::from(limit),
            ),
        )
        .await?;

    let pubkeys = keys::split_concatenated(&keys.pubkeys, PUBKEY_LENGTH)?;
    let signatures = keys::split_concatenated(&keys.signatures, SIGNATURE_LENGTH)?;
    anyhow::ensure!(
        pubkeys.len() == signatures.len() && pubkeys.len() == keys.used.len(),
        "Registry returned {} pubkeys, {} signatures and {} used flags",
        pubkeys.len(),
        signatures.len(),
        keys.used.len()
    );

    let mut output = ScriptOutput::new();
    output
        .untitled()
        .entry("operator", operator_id)
        .entry("start", start)
        .entry("end", end)
        .entry("keys", pubkeys.len());
    for (idx, ((pubkey, signature), used)) in pubkeys.iter().zip(&signatures).zip(&keys.used).enumerate() {
        output
            .section(format!("Key {}", offset + usize_to_u64(idx)))
            .entry("pubkey", format!("0x{}", hex::encode(pubkey)))
            .entry("signature", format!("0x{}", hex::encode(signature)))
            .entry("used", *used);
    }
    Ok(output)
}

pub fn split_deposit_data(file: &Path, chunk_size: usize, out_dir: &Path) -> anyhow::Result<ScriptOutput> {
    let entries = read_deposit_data(file)?;
    let chunks = keys::chunk_deposit_data(&entries, chunk_size)?;

    let mut written = vec![];
    for (number, chunk) in &chunks {
        let path = out_dir.join(keys::chunk_file_name(*number));
        utils::write_json(&path, chunk)?;
        tracing::debug!(path = ?path, entries = chunk.len(), "Wrote deposit data chunk");
        written.push(Value::String(path.display().to_string()));
    }

    let mut output = ScriptOutput::new();
    output
        .untitled()
        .entry("file", file.display().to_string())
        .entry("entries", entries.len())
        .entry("chunk size", chunk_size)
        .entry("files", Value::Array(written));
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_window_is_end_exclusive() {
        assert_eq!(key_window(0, 10), Ok((0, 10)));
        assert_eq!(key_window(5, 5), Ok((5, 0)));
        assert_eq!(key_window(6, 5), Err(InvertedRange { start: 6, end: 5 }));
    }
}
