use std::path::{Path, PathBuf};

use alloy::dyn_abi::{DynSolValue, EventExt};
use alloy::json_abi::{Event, JsonAbi};
use alloy::primitives::LogData;
use alloy::rpc::types::Log;
use catalist_ops_shared::contracts::ContractId;
use catalist_ops_shared::output::ScriptOutput;
use serde_json::{Map, Value};
use thiserror::Error;

use super::address_value;
use super::prelude::ScriptRuntime;
use crate::utils;

#[derive(Debug, Error)]
pub enum EventsError {
    #[error(transparent)]
    Read(#[from] utils::Error),

    #[error("ABI file {path:?} is neither an ABI array nor an artifact with an `abi` field: {error}")]
    Abi { path: PathBuf, error: serde_json::Error },

    #[error("Event {event} is not declared in the {abi} ABI")]
    UnknownEvent { event: String, abi: String },

    #[error("Failed to decode {event} log: {error}")]
    Decode { event: String, error: alloy::dyn_abi::Error },
}

/// Reads an ABI file, accepting either a bare ABI array or a compiled artifact carrying one.
pub fn load_abi(path: &Path) -> Result<JsonAbi, EventsError> {
    let mut raw = utils::read_untyped_json(path)?;
    if let Some(abi) = raw.get_mut("abi") {
        raw = abi.take();
    }
    serde_json::from_value(raw).map_err(|error| EventsError::Abi {
        path: path.to_owned(),
        error,
    })
}

pub fn find_event<'a>(abi: &'a JsonAbi, event: &str, abi_name: &str) -> Result<&'a Event, EventsError> {
    abi.event(event)
        .and_then(|overloads| overloads.first())
        .ok_or_else(|| EventsError::UnknownEvent {
            event: event.to_owned(),
            abi: abi_name.to_owned(),
        })
}

/// Decodes a log into an object keyed by the event's parameter names.
pub fn decode_event_data(event: &Event, data: &LogData) -> Result<Value, EventsError> {
    let decoded = event.decode_log(data).map_err(|error| EventsError::Decode {
        event: event.name.clone(),
        error,
    })?;

    let mut indexed = decoded.indexed.iter();
    let mut body = decoded.body.iter();
    let mut fields = Map::new();
    for (position, param) in event.inputs.iter().enumerate() {
        let value = if param.indexed { indexed.next() } else { body.next() };
        let name = if param.name.is_empty() {
            position.to_string()
        } else {
            param.name.clone()
        };
        fields.insert(name, value.map(dyn_value_to_json).unwrap_or(Value::Null));
    }
    Ok(Value::Object(fields))
}

fn dyn_value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Address(address) => address_value(*address),
        DynSolValue::Bool(flag) => Value::Bool(*flag),
        DynSolValue::Uint(number, _) => Value::String(number.to_string()),
        DynSolValue::Int(number, _) => Value::String(number.to_string()),
        DynSolValue::FixedBytes(word, size) => Value::String(format!("0x{}", hex::encode(&word[..*size]))),
        DynSolValue::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
        DynSolValue::String(text) => Value::String(text.clone()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(dyn_value_to_json).collect())
        }
        other => Value::String(format!("{other:?}")),
    }
}

fn log_section(output: &mut ScriptOutput, event: &Event, log: &Log) -> Result<(), EventsError> {
    let data = decode_event_data(event, log.data())?;
    output
        .section("decoded event")
        .entry("log index", log.log_index)
        .entry("transaction index", log.transaction_index)
        .entry("block number", log.block_number)
        .entry("transaction hash", log.transaction_hash.map(|hash| hash.to_string()))
        .entry("data", data);
    Ok(())
}

pub async fn event_log(
    runtime: &ScriptRuntime,
    event_name: &str,
    contract: ContractId,
    from_block: u64,
    to_block: Option<u64>,
    chunk_size: Option<u64>,
) -> anyhow::Result<ScriptOutput> {
    let abi_path = runtime.config.abi_dir.join(format!("{}.json", contract.abi_name()));
    let abi = load_abi(&abi_path)?;
    let event = find_event(&abi, event_name, contract.abi_name())?;
    let address = runtime.resolve_optional(contract).await?;
    let to_block = match to_block {
        Some(block) => block,
        None => runtime.eth_client.get_latest_block().await?.number,
    };

    let logs = runtime
        .eth_client
        .get_logs(address, event.selector(), from_block, to_block, chunk_size)
        .await?;

    let mut output = ScriptOutput::new();
    output
        .untitled()
        .entry("event", event.signature())
        .entry("contract", contract.name())
        .entry("address", address_value(address))
        .entry("from block", from_block)
        .entry("to block", to_block)
        .entry("logs", logs.len());
    for log in &logs {
        log_section(&mut output, event, log)?;
    }
    Ok(output)
}
