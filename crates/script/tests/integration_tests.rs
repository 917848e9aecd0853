mod test_utils;

use alloy::primitives::{address, Address, Bytes, U256};
use alloy::sol_types::SolCall;
use anyhow::Result;
use catalist_ops_scripts::contracts::{
    Catalist, DepositSecurityModule, HashConsensus, Kernel, NodeOperatorsRegistry, StakingRouter,
    ValidatorsExitBusOracle, WithdrawalQueueERC721, ACL,
};
use catalist_ops_scripts::scripts::{self, init::ProtocolInitArgs, keys::AddKeysArgs};
use serde_json::json;

const NODE_OPERATORS_REGISTRY: Address = address!("0000000000000000000000000000000000001007");

fn repeated(byte: u8, len: usize) -> Vec<u8> {
    vec![byte; len]
}

fn selector(input: &Bytes) -> [u8; 4] {
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&input[..4]);
    selector
}

mod keys_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn add_keys_submits_one_transaction_per_batch() -> Result<()> {
        test_utils::setup_logger();
        let env = test_utils::anvil_environment().await?;

        let args = AddKeysArgs {
            operator_id: 4,
            file: test_utils::sample_deposit_data(),
            start: 1,
            count: 0,
            batch_size: Some(2),
        };
        let output = scripts::keys::add_keys(&env.runtime, &args).await?;
        assert_eq!(output.find("count"), Some(&json!(4)));
        assert_eq!(output.find("batches"), Some(&json!(2)));
        let offsets: Vec<_> = output.sections.iter().filter_map(|s| s.get("offset")).cloned().collect();
        assert_eq!(offsets, vec![json!(1), json!(3)]);

        let sent = test_utils::sent_transactions(&env.runtime).await?;
        assert_eq!(sent.len(), 2);
        for ((to, input), first_key) in sent.iter().zip([0xa1u8, 0xa3]) {
            assert_eq!(*to, NODE_OPERATORS_REGISTRY);
            let call = NodeOperatorsRegistry::addSigningKeysCall::abi_decode(input)?;
            assert_eq!(call.nodeOperatorId, U256::from(4));
            assert_eq!(call.keysCount, U256::from(2));

            let mut pubkeys = repeated(first_key, 48);
            pubkeys.extend(repeated(first_key + 1, 48));
            let mut signatures = repeated(first_key + 0x10, 96);
            signatures.extend(repeated(first_key + 0x11, 96));
            assert_eq!(call.publicKeys.to_vec(), pubkeys);
            assert_eq!(call.signatures.to_vec(), signatures);
        }
        Ok(())
    }

    #[tokio::test]
    async fn add_keys_rejects_start_past_the_end_before_sending() -> Result<()> {
        let env = test_utils::anvil_environment().await?;
        let args = AddKeysArgs {
            operator_id: 0,
            file: test_utils::sample_deposit_data(),
            start: 5,
            count: 0,
            batch_size: None,
        };
        assert!(scripts::keys::add_keys(&env.runtime, &args).await.is_err());
        assert!(test_utils::sent_transactions(&env.runtime).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn remove_keys_repeats_at_the_same_index() -> Result<()> {
        let env = test_utils::anvil_environment().await?;

        scripts::keys::remove_keys(&env.runtime, 3, 5, 2, 3).await?;

        let sent = test_utils::sent_transactions(&env.runtime).await?;
        assert_eq!(sent.len(), 3);
        for (to, input) in &sent {
            assert_eq!(*to, NODE_OPERATORS_REGISTRY);
            let call = NodeOperatorsRegistry::removeSigningKeysCall::abi_decode(input)?;
            assert_eq!(call.nodeOperatorId, U256::from(3));
            assert_eq!(call.fromIndex, U256::from(5));
            assert_eq!(call.keysCount, U256::from(2));
        }
        Ok(())
    }
}

mod init_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn protocol_init_runs_the_bootstrap_in_order() -> Result<()> {
        test_utils::setup_logger();
        let env = test_utils::anvil_environment().await?;
        let signer = env.runtime.signer_address()?;
        let oracle_member = address!("00000000000000000000000000000000000000aa");

        let args = ProtocolInitArgs {
            oracle_member,
            guardian: None,
            quorum: 1,
            staking_module_id: 0,
            deployer: None,
        };
        scripts::init::protocol_init(&env.runtime, &args).await?;

        let catalist = address!("0000000000000000000000000000000000001001");
        let accounting_consensus = address!("0000000000000000000000000000000000001002");
        let exit_bus_consensus = address!("0000000000000000000000000000000000001003");
        let router = address!("0000000000000000000000000000000000001004");
        let queue = address!("0000000000000000000000000000000000001006");
        let dsm = address!("0000000000000000000000000000000000001008");
        let exit_bus = address!("000000000000000000000000000000000000100a");
        let expected = vec![
            (catalist, Catalist::resumeCall::SELECTOR),
            (queue, WithdrawalQueueERC721::grantRoleCall::SELECTOR),
            (queue, WithdrawalQueueERC721::resumeCall::SELECTOR),
            (accounting_consensus, HashConsensus::grantRoleCall::SELECTOR),
            (accounting_consensus, HashConsensus::addMemberCall::SELECTOR),
            (accounting_consensus, HashConsensus::updateInitialEpochCall::SELECTOR),
            (exit_bus_consensus, HashConsensus::grantRoleCall::SELECTOR),
            (exit_bus_consensus, HashConsensus::addMemberCall::SELECTOR),
            (exit_bus_consensus, HashConsensus::updateInitialEpochCall::SELECTOR),
            (exit_bus, ValidatorsExitBusOracle::grantRoleCall::SELECTOR),
            (exit_bus, ValidatorsExitBusOracle::resumeCall::SELECTOR),
            (dsm, DepositSecurityModule::addGuardianCall::SELECTOR),
            (router, StakingRouter::grantRoleCall::SELECTOR),
            (router, StakingRouter::resumeStakingModuleCall::SELECTOR),
        ];

        let sent = test_utils::sent_transactions(&env.runtime).await?;
        let actual: Vec<_> = sent.iter().map(|(to, input)| (*to, selector(input))).collect();
        assert_eq!(actual, expected);

        let grant = WithdrawalQueueERC721::grantRoleCall::abi_decode(&sent[1].1)?;
        assert_eq!(grant.account, signer);

        let add_member = HashConsensus::addMemberCall::abi_decode(&sent[4].1)?;
        assert_eq!(add_member.addr, oracle_member);
        assert_eq!(add_member.quorum, U256::from(1));

        let update_epoch = HashConsensus::updateInitialEpochCall::abi_decode(&sent[5].1)?;
        assert!(update_epoch.initialEpoch > U256::ZERO);

        let add_guardian = DepositSecurityModule::addGuardianCall::abi_decode(&sent[11].1)?;
        assert_eq!(add_guardian.addr, oracle_member);

        let resume_module = StakingRouter::resumeStakingModuleCall::abi_decode(&sent[13].1)?;
        assert_eq!(resume_module.stakingModuleId, U256::from(1));
        Ok(())
    }
}

mod proxy_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use catalist_ops_scripts::scripts::proxy::NOS_APP_ID;

    #[tokio::test]
    async fn upgrade_nos_grants_the_role_then_sets_the_app() -> Result<()> {
        let env = test_utils::anvil_environment().await?;
        let deployer = address!("00000000000000000000000000000000000000de");
        let new_implementation = address!("00000000000000000000000000000000000000f7");

        let output = scripts::proxy::upgrade_nos(&env.runtime, new_implementation, Some(deployer)).await?;
        // The stub kernel answers every read with a zero word.
        assert_eq!(
            output.find("current implementation"),
            Some(&json!(Address::ZERO.to_checksum(None)))
        );

        let kernel = address!("000000000000000000000000000000000000100b");
        let acl = address!("000000000000000000000000000000000000100c");
        let sent = test_utils::sent_transactions(&env.runtime).await?;
        assert_eq!(sent.len(), 2);

        assert_eq!(sent[0].0, acl);
        let grant = ACL::grantPermissionCall::abi_decode(&sent[0].1)?;
        assert_eq!(grant.entity, deployer);
        assert_eq!(grant.app, kernel);

        assert_eq!(sent[1].0, kernel);
        let set_app = Kernel::setAppCall::abi_decode(&sent[1].1)?;
        assert_eq!(set_app.appId, NOS_APP_ID);
        assert_eq!(set_app.app, new_implementation);
        Ok(())
    }
}
