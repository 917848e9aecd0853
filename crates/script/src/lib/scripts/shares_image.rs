use std::path::{Path, PathBuf};

use alloy::primitives::U256;
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use catalist_ops_shared::output::{format_ace, ScriptOutput};
use catalist_ops_shared::shares::{SharesImage, SharesTransfer};
use catalist_ops_shared::util::usize_to_u64;
use chrono::{DateTime, Utc};

use super::address_value;
use super::prelude::ScriptRuntime;
use crate::contracts::Catalist::{TokenRebased, TransferShares};
use crate::utils;

/// Colon-free so the names stay valid on every filesystem.
const SNAPSHOT_FILE_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

pub fn snapshot_file_name(at: DateTime<Utc>) -> String {
    format!("{}.json", at.format(SNAPSHOT_FILE_FORMAT))
}

pub fn decode_transfer(log: &Log) -> anyhow::Result<SharesTransfer> {
    let event = TransferShares::decode_log_data(log.data())?;
    Ok(SharesTransfer {
        from: event.from,
        to: event.to,
        shares_value: event.sharesValue,
    })
}

fn lossy_f64(value: &str) -> f64 {
    value.parse().unwrap_or(f64::NAN)
}

/// Number of oracle reports Catalist has processed so far.
pub async fn rebase_count(runtime: &ScriptRuntime) -> anyhow::Result<u64> {
    let latest = runtime.eth_client.get_latest_block().await?;
    let logs = runtime
        .eth_client
        .get_logs(
            *runtime.contracts.catalist.address(),
            TokenRebased::SIGNATURE_HASH,
            0,
            latest.number,
            None,
        )
        .await?;
    let count = usize_to_u64(logs.len());
    runtime.metrics.snapshot.rebase_count.set(i64::try_from(count).unwrap_or(i64::MAX));
    Ok(count)
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub path: PathBuf,
    pub block_number: u64,
    pub taken_at: DateTime<Utc>,
    pub image: SharesImage,
}

/// Replays every `TransferShares` event up to the latest block and writes the resulting holder image to `out_dir`.
pub async fn take_snapshot(runtime: &ScriptRuntime, out_dir: &Path) -> anyhow::Result<Snapshot> {
    let catalist = &runtime.contracts.catalist;
    let latest = runtime.eth_client.get_latest_block().await?;
    let logs = runtime
        .eth_client
        .get_logs(
            *catalist.address(),
            TransferShares::SIGNATURE_HASH,
            0,
            latest.number,
            None,
        )
        .await?;
    let transfers = logs.iter().map(decode_transfer).collect::<anyhow::Result<Vec<_>>>()?;

    let total_pooled_ace = runtime.tx.read("getTotalPooledAce", catalist.getTotalPooledAce()).await?;
    let total_shares = runtime.tx.read("getTotalShares", catalist.getTotalShares()).await?;
    let excluded = runtime.manifest.protocol_addresses();
    let image = SharesImage::build(transfers, &excluded, total_pooled_ace, total_shares)?;

    let taken_at = Utc::now();
    let path = out_dir.join(snapshot_file_name(taken_at));
    utils::write_json(&path, &image)?;
    tracing::info!(?path, holders = image.holders_count(), block = latest.number, "Saved shares image");

    let metrics = &runtime.metrics.snapshot;
    metrics
        .holders_count
        .set(i64::try_from(image.holders_count()).unwrap_or(i64::MAX));
    metrics.total_pooled_ace.set(lossy_f64(&format_ace(total_pooled_ace)));
    metrics.total_shares.set(lossy_f64(&format_ace(total_shares)));
    metrics.timestamp.set(taken_at.timestamp() as f64);

    Ok(Snapshot {
        path,
        block_number: latest.number,
        taken_at,
        image,
    })
}

pub async fn shares_image(runtime: &ScriptRuntime, out_dir: Option<PathBuf>) -> anyhow::Result<ScriptOutput> {
    let out_dir = out_dir.unwrap_or_else(|| runtime.config.shares_image_dir.clone());
    let snapshot = take_snapshot(runtime, &out_dir).await?;

    let mut output = ScriptOutput::new();
    output
        .section("Shares image")
        .entry("file", snapshot.path.display().to_string())
        .entry("block number", snapshot.block_number)
        .entry("holders", snapshot.image.holders_count())
        .entry("total pooled ACE", format_ace(snapshot.image.total_pooled_ace))
        .entry("total shares", snapshot.image.total_shares.to_string());
    if let Some((account, holder)) = snapshot.image.holders.iter().max_by_key(|(_, holder)| holder.shares) {
        output
            .section("Largest holder")
            .entry("address", address_value(*account))
            .entry("balance", format_ace(holder.balance));
    }
    if snapshot.image.total_shares == U256::ZERO {
        tracing::warn!("Catalist reports zero total shares, every balance is zero");
    }
    Ok(output)
}
