use alloy::primitives::{Address, TxHash, U256};
use catalist_ops_shared::output::Section;
use serde_json::Value;

pub mod deposits;
pub mod events;
pub mod init;
pub mod keys;
pub mod operators;
pub mod oracle;
pub mod prelude;
pub mod proxy;
pub mod shares_image;
pub mod staking;
pub mod withdrawals;

pub(crate) fn address_value(address: Address) -> Value {
    Value::String(address.to_checksum(None))
}

/// Integers are rendered as decimal strings: JSON numbers cannot hold a uint256.
pub(crate) fn uint_value(value: U256) -> Value {
    Value::String(value.to_string())
}

pub(crate) fn record_tx(section: &mut Section, tx_hash: TxHash) -> &mut Section {
    section.entry("transaction hash", tx_hash.to_string())
}
