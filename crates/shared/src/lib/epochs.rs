use crate::manifest::ChainSpec;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EpochError {
    #[error("Timestamp {timestamp} precedes genesis time {genesis_time}")]
    BeforeGenesis { timestamp: u64, genesis_time: u64 },
    #[error("Chain spec has zero-length slots or epochs")]
    ZeroLength,
}

fn elapsed(timestamp: u64, spec: &ChainSpec) -> Result<u64, EpochError> {
    timestamp.checked_sub(spec.genesis_time).ok_or(EpochError::BeforeGenesis {
        timestamp,
        genesis_time: spec.genesis_time,
    })
}

pub fn seconds_per_epoch(spec: &ChainSpec) -> Result<u64, EpochError> {
    match spec.slots_per_epoch.checked_mul(spec.seconds_per_slot) {
        Some(0) | None => Err(EpochError::ZeroLength),
        Some(value) => Ok(value),
    }
}

/// Epoch the hash consensus contracts should start counting frames from.
pub fn initial_epoch(latest_block_timestamp: u64, spec: &ChainSpec) -> Result<u64, EpochError> {
    let per_epoch = seconds_per_epoch(spec)?;
    Ok(elapsed(latest_block_timestamp, spec)? / per_epoch)
}

pub fn slot_at(timestamp: u64, spec: &ChainSpec) -> Result<u64, EpochError> {
    if spec.seconds_per_slot == 0 {
        return Err(EpochError::ZeroLength);
    }
    Ok(elapsed(timestamp, spec)? / spec.seconds_per_slot)
}

pub fn epoch_of_slot(slot: u64, spec: &ChainSpec) -> Result<u64, EpochError> {
    if spec.slots_per_epoch == 0 {
        return Err(EpochError::ZeroLength);
    }
    Ok(slot / spec.slots_per_epoch)
}
