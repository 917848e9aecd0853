mod test_utils;

use alloy::primitives::address;
use catalist_ops_scripts::scripts::prelude;
use catalist_ops_shared::contracts::ContractId;
use catalist_ops_shared::manifest::{DeploymentManifest, ManifestError};
use serde_json::Value;

#[test]
fn devnet_manifest_is_well_formed() {
    let manifest = DeploymentManifest::read(&test_utils::devnet_manifest()).unwrap();
    assert_eq!(manifest.chain_spec.slots_per_epoch, 32);
    assert_eq!(manifest.chain_spec.seconds_per_slot, 12);
    for contract in ContractId::LOADER {
        manifest
            .address_of(contract)
            .unwrap_or_else(|e| panic!("{contract} does not resolve: {e}"));
    }
    assert_eq!(
        manifest.address_of(ContractId::DepositContract).unwrap(),
        address!("4242424242424242424242424242424242424242")
    );
}

#[test]
fn protocol_addresses_skip_non_contract_entries() {
    let manifest = DeploymentManifest::read(&test_utils::devnet_manifest()).unwrap();
    let addresses = manifest.protocol_addresses();
    assert!(addresses.contains(&address!("0000000000000000000000000000000000001001")));
    assert!(addresses.contains(&address!("0000000000000000000000000000000000002001")));
    assert!(addresses.contains(&manifest.chain_spec.deposit_contract));
    // 14 callable addresses, 10 recorded implementations, the deposit contract
    assert_eq!(addresses.len(), 25);
}

#[tokio::test]
async fn loader_builds_every_handle_without_touching_the_network() {
    test_utils::setup_logger();
    let runtime = test_utils::offline_runtime(test_utils::devnet_manifest()).unwrap();

    assert_eq!(
        *runtime.contracts.catalist.address(),
        address!("0000000000000000000000000000000000001001")
    );
    assert_eq!(
        *runtime.contracts.hash_consensus_for_validators_exit_bus_oracle.address(),
        address!("0000000000000000000000000000000000001003")
    );
    assert_eq!(
        runtime.resolve_optional(ContractId::WithdrawalVault).await.unwrap(),
        address!("000000000000000000000000000000000000100d")
    );
}

#[tokio::test]
async fn loader_rejects_manifest_missing_a_contract() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manifest.json");
    let mut raw: Value = serde_json::from_slice(&std::fs::read(test_utils::devnet_manifest()).unwrap()).unwrap();
    raw.as_object_mut().unwrap().remove("stakingRouter");
    std::fs::write(&path, serde_json::to_vec(&raw).unwrap()).unwrap();

    let err = test_utils::offline_runtime(path).err().unwrap();
    let err = err.downcast::<prelude::Error>().unwrap();
    assert!(
        matches!(err, prelude::Error::Manifest(ManifestError::MissingEntry(ref key)) if key == "stakingRouter"),
        "{err}"
    );
}

#[test]
fn loader_reports_unreadable_manifest() {
    let err = test_utils::offline_runtime("/no/such/manifest.json".into()).err().unwrap();
    assert!(err.to_string().contains("/no/such/manifest.json"), "{err}");
}
