mod test_utils;

use catalist_ops_scripts::scripts::keys;
use catalist_ops_scripts::utils;
use catalist_ops_shared::keys::{DepositDataEntry, PUBKEY_LENGTH, SIGNATURE_LENGTH};
use pretty_assertions::assert_eq;

#[test]
fn sample_deposit_data_parses() {
    let entries = keys::read_deposit_data(&test_utils::sample_deposit_data()).unwrap();
    assert_eq!(entries.len(), 5);
    let parsed = catalist_ops_shared::keys::parse_deposit_data(&entries).unwrap();
    assert_eq!(parsed[0].pubkey, [0xa0; PUBKEY_LENGTH]);
    assert_eq!(parsed[4].signature, [0xb4; SIGNATURE_LENGTH]);
}

#[test]
fn split_writes_numbered_chunks_preserving_every_field() {
    let out_dir = tempfile::tempdir().unwrap();
    let output = keys::split_deposit_data(&test_utils::sample_deposit_data(), 2, out_dir.path()).unwrap();
    assert_eq!(output.find("chunk size"), Some(&serde_json::json!(2)));

    let chunks: Vec<Vec<DepositDataEntry>> = (1..=3)
        .map(|number| utils::read_json::<_, Vec<DepositDataEntry>>(out_dir.path().join(format!("output_{number}.json"))).unwrap())
        .collect();
    assert_eq!(chunks.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 2, 1]);
    assert!(!out_dir.path().join("output_4.json").exists());

    let original = keys::read_deposit_data(&test_utils::sample_deposit_data()).unwrap();
    let rejoined: Vec<DepositDataEntry> = chunks.into_iter().flatten().collect();
    assert_eq!(rejoined, original);
    assert_eq!(rejoined[0].extra["network_name"], "ace-devnet");
}

#[test]
fn split_rejects_zero_chunk_size() {
    let out_dir = tempfile::tempdir().unwrap();
    assert!(keys::split_deposit_data(&test_utils::sample_deposit_data(), 0, out_dir.path()).is_err());
}
