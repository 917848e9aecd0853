mod test_utils;

use alloy::primitives::{address, U256};
use alloy::sol_types::SolEvent;
use catalist_ops_scripts::contracts::Catalist::{TokenRebased, TransferShares};
use catalist_ops_scripts::scripts::events;
use catalist_ops_shared::contracts::ContractId;

#[test]
fn bundled_abis_declare_the_traced_events() {
    let abi_dir = test_utils::abi_dir();
    let exit_bus = events::load_abi(&abi_dir.join(format!("{}.json", ContractId::ValidatorsExitBusOracle.abi_name()))).unwrap();
    let event = events::find_event(&exit_bus, "ValidatorExitRequest", "ValidatorsExitBusOracle").unwrap();
    assert_eq!(event.inputs.iter().filter(|input| input.indexed).count(), 3);

    let catalist = events::load_abi(&abi_dir.join("Catalist.json")).unwrap();
    let transfer = events::find_event(&catalist, "TransferShares", "Catalist").unwrap();
    let rebased = events::find_event(&catalist, "TokenRebased", "Catalist").unwrap();
    assert_eq!(transfer.selector(), TransferShares::SIGNATURE_HASH);
    assert_eq!(rebased.selector(), TokenRebased::SIGNATURE_HASH);
}

#[test]
fn decodes_rebase_log_with_bundled_abi() {
    let catalist = events::load_abi(&test_utils::abi_dir().join("Catalist.json")).unwrap();
    let rebased = events::find_event(&catalist, "TokenRebased", "Catalist").unwrap();
    let log = TokenRebased {
        reportTimestamp: U256::from(1_700_086_400u64),
        timeElapsed: U256::from(86_400),
        preTotalShares: U256::from(1_000),
        preTotalAce: U256::from(1_000),
        postTotalShares: U256::from(1_010),
        postTotalAce: U256::from(1_050),
        sharesMintedAsFees: U256::from(10),
    }
    .encode_log_data();

    let decoded = events::decode_event_data(rebased, &log).unwrap();
    assert_eq!(decoded["reportTimestamp"], "1700086400");
    assert_eq!(decoded["postTotalAce"], "1050");
    assert_eq!(decoded["sharesMintedAsFees"], "10");
}

#[test]
fn mismatched_log_fails_to_decode() {
    let catalist = events::load_abi(&test_utils::abi_dir().join("Catalist.json")).unwrap();
    let rebased = events::find_event(&catalist, "TokenRebased", "Catalist").unwrap();
    let log = TransferShares {
        from: address!("00000000000000000000000000000000000000aa"),
        to: address!("00000000000000000000000000000000000000bb"),
        sharesValue: U256::from(1),
    }
    .encode_log_data();
    assert!(matches!(
        events::decode_event_data(rebased, &log),
        Err(events::EventsError::Decode { .. })
    ));
}
