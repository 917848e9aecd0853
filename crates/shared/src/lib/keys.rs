use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};

use crate::util::decode_hex;

pub const PUBKEY_LENGTH: usize = 48;
pub const SIGNATURE_LENGTH: usize = 96;
pub const DEFAULT_CHUNK_SIZE: usize = 100;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum KeysError {
    #[error("Key {index}: {field} is not valid hex: {error}")]
    InvalidHex {
        index: usize,
        field: &'static str,
        error: hex::FromHexError,
    },
    #[error("Key {index}: {field} must be {expected} bytes, got {actual}")]
    InvalidLength {
        index: usize,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Start index {start} is past the end of {total} keys")]
    StartOutOfRange { start: usize, total: usize },
    #[error("Requested {count} keys from index {start}, only {available} available")]
    CountOutOfRange {
        start: usize,
        count: usize,
        available: usize,
    },
    #[error("Concatenated length {length} is not a multiple of {width}")]
    UnalignedConcatenation { length: usize, width: usize },
    #[error("Batch and chunk sizes must be positive")]
    ZeroSize,
}

/// One element of a `deposit_data-*.json` file produced by the deposit CLI.
/// Only `pubkey` and `signature` are interpreted, the rest is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositDataEntry {
    pub pubkey: String,
    pub signature: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKey {
    pub pubkey: [u8; PUBKEY_LENGTH],
    pub signature: [u8; SIGNATURE_LENGTH],
}

fn decode_fixed<const N: usize>(index: usize, field: &'static str, value: &str) -> Result<[u8; N], KeysError> {
    let bytes = decode_hex(value).map_err(|error| KeysError::InvalidHex { index, field, error })?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| KeysError::InvalidLength {
        index,
        field,
        expected: N,
        actual,
    })
}

impl SigningKey {
    pub fn parse(index: usize, pubkey: &str, signature: &str) -> Result<Self, KeysError> {
        Ok(Self {
            pubkey: decode_fixed::<PUBKEY_LENGTH>(index, "pubkey", pubkey)?,
            signature: decode_fixed::<SIGNATURE_LENGTH>(index, "signature", signature)?,
        })
    }
}

impl TryFrom<(usize, &DepositDataEntry)> for SigningKey {
    type Error = KeysError;

    fn try_from((index, entry): (usize, &DepositDataEntry)) -> Result<Self, Self::Error> {
        Self::parse(index, &entry.pubkey, &entry.signature)
    }
}

pub fn parse_deposit_data(entries: &[DepositDataEntry]) -> Result<Vec<SigningKey>, KeysError> {
    entries.iter().enumerate().map(SigningKey::try_from).collect()
}

/// Selects `count` keys starting at `start`. A `count` of zero means "everything from `start`".
pub fn select_range<T>(keys: &[T], start: usize, count: usize) -> Result<&[T], KeysError> {
    let total = keys.len();
    if start > total || (start == total && total > 0) {
        return Err(KeysError::StartOutOfRange { start, total });
    }
    let available = total - start;
    if count == 0 {
        return Ok(&keys[start..]);
    }
    if count > available {
        return Err(KeysError::CountOutOfRange {
            start,
            count,
            available,
        });
    }
    Ok(&keys[start..start + count])
}

/// Concatenated calldata for a single `addSigningKeys` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBatch {
    pub offset: usize,
    pub count: usize,
    pub pubkeys: Bytes,
    pub signatures: Bytes,
}

impl KeyBatch {
    pub fn concat(offset: usize, keys: &[SigningKey]) -> Self {
        let mut pubkeys = Vec::with_capacity(keys.len() * PUBKEY_LENGTH);
        let mut signatures = Vec::with_capacity(keys.len() * SIGNATURE_LENGTH);
        for key in keys {
            pubkeys.extend_from_slice(&key.pubkey);
            signatures.extend_from_slice(&key.signature);
        }
        Self {
            offset,
            count: keys.len(),
            pubkeys: pubkeys.into(),
            signatures: signatures.into(),
        }
    }
}

/// Splits keys into consecutive batches of at most `batch_size`, preserving order.
pub fn batches(keys: &[SigningKey], batch_size: usize) -> Result<Vec<KeyBatch>, KeysError> {
    if batch_size == 0 {
        return Err(KeysError::ZeroSize);
    }
    Ok(keys
        .chunks(batch_size)
        .enumerate()
        .map(|(idx, chunk)| KeyBatch::concat(idx * batch_size, chunk))
        .collect())
}

/// Reverses the concatenation done by the registry: `getSigningKeys` returns all keys glued together.
pub fn split_concatenated(bytes: &[u8], width: usize) -> Result<Vec<Vec<u8>>, KeysError> {
    if width == 0 {
        return Err(KeysError::ZeroSize);
    }
    if bytes.len() % width != 0 {
        return Err(KeysError::UnalignedConcatenation {
            length: bytes.len(),
            width,
        });
    }
    Ok(bytes.chunks(width).map(<[u8]>::to_vec).collect())
}

/// Splits a deposit data file into numbered chunks. Numbering starts at 1.
pub fn chunk_deposit_data(
    entries: &[DepositDataEntry],
    chunk_size: usize,
) -> Result<Vec<(usize, Vec<DepositDataEntry>)>, KeysError> {
    if chunk_size == 0 {
        return Err(KeysError::ZeroSize);
    }
    Ok(entries
        .chunks(chunk_size)
        .enumerate()
        .map(|(idx, chunk)| (idx + 1, chunk.to_vec()))
        .collect())
}

pub fn chunk_file_name(number: usize) -> String {
    format!("output_{number}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn key(seed: u8) -> SigningKey {
        SigningKey {
            pubkey: [seed; PUBKEY_LENGTH],
            signature: [seed.wrapping_add(1); SIGNATURE_LENGTH],
        }
    }

    fn entry(seed: u8) -> DepositDataEntry {
        let k = key(seed);
        DepositDataEntry {
            pubkey: hex::encode(k.pubkey),
            signature: hex::encode(k.signature),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn parses_with_and_without_prefix() {
        let k = key(7);
        let bare = SigningKey::parse(0, &hex::encode(k.pubkey), &hex::encode(k.signature)).unwrap();
        let prefixed = SigningKey::parse(
            0,
            &format!("0x{}", hex::encode(k.pubkey)),
            &format!("0x{}", hex::encode(k.signature)),
        )
        .unwrap();
        assert_eq!(bare, k);
        assert_eq!(prefixed, k);
    }

    #[test]
    fn rejects_short_pubkey() {
        let result = SigningKey::parse(3, &hex::encode([1u8; 47]), &hex::encode([1u8; 96]));
        assert_eq!(
            result,
            Err(KeysError::InvalidLength {
                index: 3,
                field: "pubkey",
                expected: 48,
                actual: 47
            })
        );
    }

    #[test]
    fn rejects_non_hex_signature() {
        let result = SigningKey::parse(0, &hex::encode([1u8; 48]), "zz");
        assert!(matches!(result, Err(KeysError::InvalidHex { field: "signature", .. })));
    }

    #[test]
    fn deposit_data_keeps_extra_fields() {
        let raw = format!(
            r#"[{{"pubkey":"{}","signature":"{}","amount":32000000000,"withdrawal_credentials":"01"}}]"#,
            hex::encode([2u8; 48]),
            hex::encode([3u8; 96])
        );
        let entries: Vec<DepositDataEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(entries[0].extra.get("amount"), Some(&serde_json::json!(32000000000u64)));
        let keys = parse_deposit_data(&entries).unwrap();
        assert_eq!(keys[0].pubkey, [2u8; 48]);
    }

    #[test]
    fn select_range_zero_count_means_until_end() {
        let keys = [1, 2, 3, 4, 5];
        assert_eq!(select_range(&keys, 0, 0).unwrap(), &[1, 2, 3, 4, 5]);
        assert_eq!(select_range(&keys, 2, 0).unwrap(), &[3, 4, 5]);
        assert_eq!(select_range(&keys, 1, 2).unwrap(), &[2, 3]);
    }

    #[test]
    fn select_range_rejects_out_of_bounds() {
        let keys = [1, 2, 3];
        assert_eq!(
            select_range(&keys, 3, 0),
            Err(KeysError::StartOutOfRange { start: 3, total: 3 })
        );
        assert_eq!(
            select_range(&keys, 1, 5),
            Err(KeysError::CountOutOfRange {
                start: 1,
                count: 5,
                available: 2
            })
        );
        let empty: [u8; 0] = [];
        assert_eq!(select_range(&empty, 0, 0).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn batch_concatenates_in_order() {
        let keys = vec![key(1), key(2), key(3)];
        let result = batches(&keys, 2).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].count, 2);
        assert_eq!(result[0].offset, 0);
        assert_eq!(&result[0].pubkeys[..48], &[1u8; 48]);
        assert_eq!(&result[0].pubkeys[48..], &[2u8; 48]);
        assert_eq!(result[1].offset, 2);
        assert_eq!(result[1].signatures.len(), 96);
    }

    #[test]
    fn split_rejects_unaligned_input() {
        assert_eq!(
            split_concatenated(&[0u8; 50], PUBKEY_LENGTH),
            Err(KeysError::UnalignedConcatenation { length: 50, width: 48 })
        );
        assert_eq!(split_concatenated(&[], PUBKEY_LENGTH).unwrap().len(), 0);
    }

    #[test]
    fn chunks_are_numbered_from_one() {
        let entries: Vec<_> = (0..250u32).map(|i| entry(i as u8)).collect();
        let chunks = chunk_deposit_data(&entries, DEFAULT_CHUNK_SIZE).unwrap();
        let summary: Vec<_> = chunks.iter().map(|(n, c)| (*n, c.len())).collect();
        assert_eq!(summary, vec![(1, 100), (2, 100), (3, 50)]);
        assert_eq!(chunk_file_name(3), "output_3.json");
    }

    proptest! {
        #[test]
        fn batches_cover_every_key_exactly_once(count in 0usize..40, batch_size in 1usize..10) {
            let keys: Vec<_> = (0..count).map(|i| key(i as u8)).collect();
            let result = batches(&keys, batch_size).unwrap();

            prop_assert!(result.iter().all(|b| b.count <= batch_size && b.count > 0));
            prop_assert_eq!(result.iter().map(|b| b.count).sum::<usize>(), count);

            let pubkeys: Vec<u8> = result.iter().flat_map(|b| b.pubkeys.to_vec()).collect();
            let restored = split_concatenated(&pubkeys, PUBKEY_LENGTH).unwrap();
            let expected: Vec<Vec<u8>> = keys.iter().map(|k| k.pubkey.to_vec()).collect();
            prop_assert_eq!(restored, expected);
        }
    }
}
