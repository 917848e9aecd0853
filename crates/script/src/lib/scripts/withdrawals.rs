use alloy::primitives::{Address, U256};
use catalist_ops_shared::output::{format_ace, ScriptOutput};
use serde_json::Value;

use super::prelude::ScriptRuntime;
use super::{address_value, uint_value};

pub async fn withdraw_info(runtime: &ScriptRuntime, owner: Address) -> anyhow::Result<ScriptOutput> {
    let queue = &runtime.contracts.withdrawal_queue;
    let mut request_ids: Vec<U256> = runtime
        .tx
        .read("getWithdrawalRequests", queue.getWithdrawalRequests(owner))
        .await?;
    request_ids.sort();
    tracing::info!(%owner, requests = request_ids.len(), "Read withdrawal requests");

    let statuses = if request_ids.is_empty() {
        vec![]
    } else {
        runtime
            .tx
            .read("getWithdrawalStatus", queue.getWithdrawalStatus(request_ids.clone()))
            .await?
    };

    let mut output = ScriptOutput::new();
    output
        .untitled()
        .entry("address", address_value(owner))
        .entry(
            "withdrawal requests",
            Value::Array(request_ids.iter().copied().map(uint_value).collect()),
        );
    for (id, status) in request_ids.iter().zip(statuses) {
        output
            .section(format!("Request {id}"))
            .entry("amount of bACE", format_ace(status.amountOfBACE))
            .entry("amount of shares", uint_value(status.amountOfShares))
            .entry("owner", address_value(status.owner))
            .entry("timestamp", uint_value(status.timestamp))
            .entry("finalized", status.isFinalized)
            .entry("claimed", status.isClaimed);
    }
    Ok(output)
}

pub async fn withdraw_queue_info(runtime: &ScriptRuntime) -> anyhow::Result<ScriptOutput> {
    let queue = &runtime.contracts.withdrawal_queue;
    let last_request_id = runtime.tx.read("getLastRequestId", queue.getLastRequestId()).await?;
    let last_finalized_request_id = runtime
        .tx
        .read("getLastFinalizedRequestId", queue.getLastFinalizedRequestId())
        .await?;
    let unfinalized = runtime.tx.read("unfinalizedBACE", queue.unfinalizedBACE()).await?;

    let mut output = ScriptOutput::new();
    output
        .untitled()
        .entry("last request id", uint_value(last_request_id))
        .entry("last finalized request id", uint_value(last_finalized_request_id))
        .entry("unfinalized bACE", format_ace(unfinalized));
    Ok(output)
}
