pub fn usize_to_u64(val: usize) -> u64 {
    let result = val.try_into();
    match result {
        Ok(v) => v,
        // Intentional panic - usize wider than u64 is not a supported target
        Err(error) => panic!("Couldn't convert usize to u64: {:?}", error),
    }
}

/// Parses a hex string with an optional `0x` prefix.
pub fn decode_hex(value: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let trimmed = value.trim();
    hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
}
