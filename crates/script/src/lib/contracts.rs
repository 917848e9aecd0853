#![allow(clippy::too_many_arguments)]
//! ABI bindings for the deployed protocol contracts. Only the methods and events the scripts use are declared.

use alloy::sol;

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface Catalist {
        event TransferShares(address indexed from, address indexed to, uint256 sharesValue);
        event TokenRebased(
            uint256 indexed reportTimestamp,
            uint256 timeElapsed,
            uint256 preTotalShares,
            uint256 preTotalAce,
            uint256 postTotalShares,
            uint256 postTotalAce,
            uint256 sharesMintedAsFees
        );

        function getTotalPooledAce() external view returns (uint256);
        function getTotalShares() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function getBufferedAce() external view returns (uint256);
        function getDepositableAce() external view returns (uint256);
        function getCurrentStakeLimit() external view returns (uint256);
        function isStakingPaused() external view returns (bool);
        function getBeaconStat() external view returns (
            uint256 depositedValidators,
            uint256 beaconValidators,
            uint256 beaconBalance
        );
        function getStakeLimitFullInfo() external view returns (
            bool isStakingPaused,
            bool isStakingLimitSet,
            uint256 currentStakeLimit,
            uint256 maxStakeLimit,
            uint256 maxStakeLimitGrowthBlocks,
            uint256 prevStakeLimit,
            uint256 prevStakeBlockNumber
        );
        function resume() external;
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface StakingRouter {
        struct StakingModule {
            uint24 id;
            address stakingModuleAddress;
            uint16 stakingModuleFee;
            uint16 treasuryFee;
            uint16 targetShare;
            uint8 status;
            string name;
            uint64 lastDepositAt;
            uint256 lastDepositBlock;
            uint256 exitedValidatorsCount;
        }

        struct StakingModuleSummary {
            uint256 totalExitedValidators;
            uint256 totalDepositedValidators;
            uint256 depositableValidatorsCount;
        }

        struct NodeOperatorSummary {
            bool isTargetLimitActive;
            uint256 targetValidatorsCount;
            uint256 stuckValidatorsCount;
            uint256 refundedValidatorsCount;
            uint256 stuckPenaltyEndTimestamp;
            uint256 totalExitedValidators;
            uint256 totalDepositedValidators;
            uint256 depositableValidatorsCount;
        }

        function getStakingModules() external view returns (StakingModule[] memory res);
        function getStakingModuleSummary(uint256 stakingModuleId) external view returns (StakingModuleSummary memory summary);
        function getNodeOperatorSummary(uint256 stakingModuleId, uint256 nodeOperatorId) external view returns (NodeOperatorSummary memory summary);
        function getStakingModuleIsActive(uint256 stakingModuleId) external view returns (bool);
        function getStakingModuleNonce(uint256 stakingModuleId) external view returns (uint256);
        function getStakingModuleMaxDepositsCount(uint256 stakingModuleId, uint256 maxDepositsValue) external view returns (uint256);
        function getDepositsAllocation(uint256 depositsCount) external view returns (uint256 allocated, uint256[] memory allocations);

        function STAKING_MODULE_RESUME_ROLE() external view returns (bytes32);
        function resumeStakingModule(uint256 stakingModuleId) external;
        function grantRole(bytes32 role, address account) external;
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface WithdrawalQueueERC721 {
        struct WithdrawalRequestStatus {
            uint256 amountOfBACE;
            uint256 amountOfShares;
            address owner;
            uint256 timestamp;
            bool isFinalized;
            bool isClaimed;
        }

        function getWithdrawalRequests(address owner) external view returns (uint256[] memory requestsIds);
        function getWithdrawalStatus(uint256[] calldata requestIds) external view returns (WithdrawalRequestStatus[] memory statuses);
        function getLastRequestId() external view returns (uint256);
        function getLastFinalizedRequestId() external view returns (uint256);
        function unfinalizedBACE() external view returns (uint256);

        function RESUME_ROLE() external view returns (bytes32);
        function resume() external;
        function grantRole(bytes32 role, address account) external;
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface HashConsensus {
        function getFrameConfig() external view returns (uint256 initialEpoch, uint256 epochsPerFrame, uint256 fastLaneLengthSlots);
        function getChainConfig() external view returns (uint256 slotsPerEpoch, uint256 secondsPerSlot, uint256 genesisTime);
        function getCurrentFrame() external view returns (uint256 refSlot, uint256 reportProcessingDeadlineSlot);
        function getMembers() external view returns (address[] memory addresses, uint256[] memory lastReportedRefSlots);
        function getQuorum() external view returns (uint256);

        function setFrameConfig(uint256 epochsPerFrame, uint256 fastLaneLengthSlots) external;
        function addMember(address addr, uint256 quorum) external;
        function updateInitialEpoch(uint256 initialEpoch) external;

        function MANAGE_MEMBERS_AND_QUORUM_ROLE() external view returns (bytes32);
        function grantRole(bytes32 role, address account) external;
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface NodeOperatorsRegistry {
        function getNodeOperator(uint256 nodeOperatorId, bool fullInfo) external view returns (
            bool active,
            string memory name,
            address rewardAddress,
            uint64 totalVettedValidators,
            uint64 totalExitedValidators,
            uint64 totalAddedValidators,
            uint64 totalDepositedValidators
        );
        function isOperatorPenalized(uint256 nodeOperatorId) external view returns (bool);
        function getStuckPenaltyDelay() external view returns (uint256);
        function getSigningKeys(uint256 nodeOperatorId, uint256 offset, uint256 limit) external view returns (
            bytes memory pubkeys,
            bytes memory signatures,
            bool[] memory used
        );

        function addNodeOperator(string memory name, address rewardAddress) external returns (uint256 id);
        function setOwner(address owner, bool enabled) external;
        function setNodeOperatorRewardAddress(uint256 nodeOperatorId, address rewardAddress) external;
        function setNodeOperatorStakingLimit(uint256 nodeOperatorId, uint64 vettedSigningKeysCount) external;
        function addSigningKeys(uint256 nodeOperatorId, uint256 keysCount, bytes calldata publicKeys, bytes calldata signatures) external;
        function removeSigningKeys(uint256 nodeOperatorId, uint256 fromIndex, uint256 keysCount) external;
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface DepositSecurityModule {
        struct Signature {
            bytes32 r;
            bytes32 vs;
        }

        function ATTEST_MESSAGE_PREFIX() external view returns (bytes32);
        function getMaxDeposits() external view returns (uint256);
        function canDeposit(uint256 stakingModuleId) external view returns (bool);
        function getGuardianQuorum() external view returns (uint256);
        function getGuardians() external view returns (address[] memory);

        function addGuardian(address addr, uint256 newQuorum) external;
        function depositBufferedAce(
            uint256 blockNumber,
            bytes32 blockHash,
            bytes32 depositRoot,
            uint256 stakingModuleId,
            uint256 nonce,
            bytes calldata depositCalldata,
            Signature[] calldata sortedGuardianSignatures
        ) external;
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface DepositContract {
        function get_deposit_root() external view returns (bytes32);
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface AccountingOracle {
        function getConsensusContract() external view returns (address);
        function getLastProcessingRefSlot() external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface ValidatorsExitBusOracle {
        event ValidatorExitRequest(
            uint256 indexed stakingModuleId,
            uint256 indexed nodeOperatorId,
            uint256 indexed validatorIndex,
            bytes validatorPubkey,
            uint256 timestamp
        );

        function getConsensusContract() external view returns (address);
        function isPaused() external view returns (bool);
        function RESUME_ROLE() external view returns (bytes32);
        function resume() external;
        function grantRole(bytes32 role, address account) external;
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface CatalistLocator {
        function oracleReportComponentsForCatalist() external view returns (
            address accountingOracle,
            address elRewardsVault,
            address oracleReportSanityChecker,
            address burner,
            address withdrawalQueue,
            address withdrawalVault,
            address postTokenRebaseReceiver
        );
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface OracleReportSanityChecker {
        struct LimitsList {
            uint256 churnValidatorsPerDayLimit;
            uint256 oneOffCLBalanceDecreaseBPLimit;
            uint256 annualBalanceIncreaseBPLimit;
            uint256 simulatedShareRateDeviationBPLimit;
            uint256 maxValidatorExitRequestsPerReport;
            uint256 maxAccountingExtraDataListItemsCount;
            uint256 maxNodeOperatorsPerExtraDataItemCount;
            uint256 requestTimestampMargin;
            uint256 maxPositiveTokenRebase;
        }

        function getOracleReportLimits() external view returns (LimitsList memory);
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface OssifiableProxy {
        function proxy__getAdmin() external view returns (address);
        function proxy__getImplementation() external view returns (address);
        function proxy__getIsOssified() external view returns (bool);
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface AppProxyUpgradeable {
        function implementation() external view returns (address);
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface WithdrawalsManagerProxy {
        function implementation() external view returns (address);
        function proxy_getAdmin() external view returns (address);
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface Kernel {
        function APP_BASES_NAMESPACE() external view returns (bytes32);
        function APP_MANAGER_ROLE() external view returns (bytes32);
        function getApp(bytes32 namespace, bytes32 appId) external view returns (address);
        function setApp(bytes32 namespace, bytes32 appId, address app) external;
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface ACL {
        function grantPermission(address entity, address app, bytes32 role) external;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{keccak256, U256};
    use alloy::sol_types::{SolCall, SolEvent};

    #[test]
    fn transfer_shares_topic_matches_signature() {
        assert_eq!(
            Catalist::TransferShares::SIGNATURE_HASH,
            keccak256("TransferShares(address,address,uint256)")
        );
    }

    #[test]
    fn deposit_buffered_selector_covers_signature_struct() {
        assert_eq!(
            DepositSecurityModule::depositBufferedAceCall::SIGNATURE,
            "depositBufferedAce(uint256,bytes32,bytes32,uint256,uint256,bytes,(bytes32,bytes32)[])"
        );
    }

    #[test]
    fn add_signing_keys_encodes_batch() {
        let call = NodeOperatorsRegistry::addSigningKeysCall {
            nodeOperatorId: U256::from(0),
            keysCount: U256::from(1),
            publicKeys: vec![1u8; 48].into(),
            signatures: vec![2u8; 96].into(),
        };
        let encoded = call.abi_encode();
        assert_eq!(&encoded[..4], NodeOperatorsRegistry::addSigningKeysCall::SELECTOR.as_slice());
        let decoded = NodeOperatorsRegistry::addSigningKeysCall::abi_decode(&encoded).unwrap();
        assert_eq!(decoded.publicKeys.len(), 48);
        assert_eq!(decoded.signatures.len(), 96);
    }
}
