use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown contract {name}, expected one of: {known}")]
pub struct UnknownContract {
    pub name: String,
    pub known: String,
}

/// How the deployed contract is fronted, which decides how its implementation address is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ProxyKind {
    /// Aragon `AppProxyUpgradeable`/`KernelProxy`: `implementation()`.
    #[display("aragon")]
    Aragon,
    /// `OssifiableProxy`: `proxy__getImplementation()` and `proxy__getAdmin()`.
    #[display("ossifiable")]
    Ossifiable,
    /// `WithdrawalsManagerProxy`: `implementation()` and `proxy_getAdmin()`.
    #[display("withdrawals-manager")]
    WithdrawalsManager,
    #[display("none")]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContractId {
    DepositContract,
    Catalist,
    HashConsensusForAccountingOracle,
    HashConsensusForValidatorsExitBusOracle,
    StakingRouter,
    AccountingOracle,
    WithdrawalQueueERC721,
    NodeOperatorsRegistry,
    DepositSecurityModule,
    CatalistLocator,
    ValidatorsExitBusOracle,
    AragonKernel,
    AragonAcl,
    OracleReportSanityChecker,
    WithdrawalVault,
    ExecutionLayerRewardsVault,
}

impl ContractId {
    /// Contracts every runtime resolves up front.
    pub const LOADER: [ContractId; 13] = [
        ContractId::DepositContract,
        ContractId::Catalist,
        ContractId::HashConsensusForAccountingOracle,
        ContractId::HashConsensusForValidatorsExitBusOracle,
        ContractId::StakingRouter,
        ContractId::AccountingOracle,
        ContractId::WithdrawalQueueERC721,
        ContractId::NodeOperatorsRegistry,
        ContractId::DepositSecurityModule,
        ContractId::CatalistLocator,
        ContractId::ValidatorsExitBusOracle,
        ContractId::AragonKernel,
        ContractId::AragonAcl,
    ];

    pub const ALL: [ContractId; 16] = [
        ContractId::DepositContract,
        ContractId::Catalist,
        ContractId::HashConsensusForAccountingOracle,
        ContractId::HashConsensusForValidatorsExitBusOracle,
        ContractId::StakingRouter,
        ContractId::AccountingOracle,
        ContractId::WithdrawalQueueERC721,
        ContractId::NodeOperatorsRegistry,
        ContractId::DepositSecurityModule,
        ContractId::CatalistLocator,
        ContractId::ValidatorsExitBusOracle,
        ContractId::AragonKernel,
        ContractId::AragonAcl,
        ContractId::OracleReportSanityChecker,
        ContractId::WithdrawalVault,
        ContractId::ExecutionLayerRewardsVault,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::DepositContract => "DepositContract",
            Self::Catalist => "Catalist",
            Self::HashConsensusForAccountingOracle => "HashConsensusForAccountingOracle",
            Self::HashConsensusForValidatorsExitBusOracle => "HashConsensusForValidatorsExitBusOracle",
            Self::StakingRouter => "StakingRouter",
            Self::AccountingOracle => "AccountingOracle",
            Self::WithdrawalQueueERC721 => "WithdrawalQueueERC721",
            Self::NodeOperatorsRegistry => "NodeOperatorsRegistry",
            Self::DepositSecurityModule => "DepositSecurityModule",
            Self::CatalistLocator => "CatalistLocator",
            Self::ValidatorsExitBusOracle => "ValidatorsExitBusOracle",
            Self::AragonKernel => "AragonKernel",
            Self::AragonAcl => "AragonAcl",
            Self::OracleReportSanityChecker => "OracleReportSanityChecker",
            Self::WithdrawalVault => "WithdrawalVault",
            Self::ExecutionLayerRewardsVault => "ExecutionLayerRewardsVault",
        }
    }

    /// Key of the entry in the deployment manifest. The deposit contract lives in `chainSpec` instead.
    pub fn manifest_key(&self) -> Option<&'static str> {
        let key = match self {
            Self::DepositContract => return None,
            Self::Catalist => "app:catalist",
            Self::HashConsensusForAccountingOracle => "hashConsensusForAccountingOracle",
            Self::HashConsensusForValidatorsExitBusOracle => "hashConsensusForValidatorsExitBusOracle",
            Self::StakingRouter => "stakingRouter",
            Self::AccountingOracle => "accountingOracle",
            Self::WithdrawalQueueERC721 => "withdrawalQueueERC721",
            Self::NodeOperatorsRegistry => "app:node-operators-registry",
            Self::DepositSecurityModule => "depositSecurityModule",
            Self::CatalistLocator => "catalistLocator",
            Self::ValidatorsExitBusOracle => "validatorsExitBusOracle",
            Self::AragonKernel => "aragon-kernel",
            Self::AragonAcl => "aragon-acl",
            Self::OracleReportSanityChecker => "oracleReportSanityChecker",
            Self::WithdrawalVault => "withdrawalVault",
            Self::ExecutionLayerRewardsVault => "executionLayerRewardsVault",
        };
        Some(key)
    }

    /// Name of the ABI file (`<abi_name>.json`) describing the contract's interface.
    pub fn abi_name(&self) -> &'static str {
        match self {
            Self::HashConsensusForAccountingOracle | Self::HashConsensusForValidatorsExitBusOracle => "HashConsensus",
            Self::AragonKernel => "Kernel",
            Self::AragonAcl => "ACL",
            Self::ExecutionLayerRewardsVault => "CatalistExecutionLayerRewardsVault",
            other => other.name(),
        }
    }

    pub fn proxy_kind(&self) -> ProxyKind {
        match self {
            Self::Catalist | Self::NodeOperatorsRegistry | Self::AragonKernel | Self::AragonAcl => ProxyKind::Aragon,
            Self::StakingRouter
            | Self::AccountingOracle
            | Self::WithdrawalQueueERC721
            | Self::CatalistLocator
            | Self::ValidatorsExitBusOracle => ProxyKind::Ossifiable,
            Self::WithdrawalVault => ProxyKind::WithdrawalsManager,
            Self::DepositContract
            | Self::HashConsensusForAccountingOracle
            | Self::HashConsensusForValidatorsExitBusOracle
            | Self::DepositSecurityModule
            | Self::OracleReportSanityChecker
            | Self::ExecutionLayerRewardsVault => ProxyKind::None,
        }
    }

    fn known_names() -> String {
        Self::ALL.iter().map(|id| id.name()).join(", ")
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContractId {
    type Err = UnknownContract;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .find(|id| id.name().eq_ignore_ascii_case(needle))
            .copied()
            .ok_or_else(|| UnknownContract {
                name: needle.to_owned(),
                known: Self::known_names(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_loader_names_case_insensitively() {
        assert_eq!("Catalist".parse::<ContractId>(), Ok(ContractId::Catalist));
        assert_eq!(
            "withdrawalqueueerc721".parse::<ContractId>(),
            Ok(ContractId::WithdrawalQueueERC721)
        );
        assert_eq!(" AragonAcl ".parse::<ContractId>(), Ok(ContractId::AragonAcl));
    }

    #[test]
    fn unknown_name_lists_valid_names() {
        let err = "Lido".parse::<ContractId>().unwrap_err();
        assert_eq!(err.name, "Lido");
        assert!(err.known.contains("StakingRouter"));
        assert!(err.to_string().contains("Unknown contract Lido"));
    }

    #[test]
    fn both_hash_consensus_instances_share_abi() {
        assert_eq!(ContractId::HashConsensusForAccountingOracle.abi_name(), "HashConsensus");
        assert_eq!(ContractId::HashConsensusForValidatorsExitBusOracle.abi_name(), "HashConsensus");
        assert_eq!(ContractId::AragonKernel.abi_name(), "Kernel");
    }

    #[test]
    fn proxy_kinds_follow_deployment_layout() {
        assert_eq!(ContractId::Catalist.proxy_kind(), ProxyKind::Aragon);
        assert_eq!(ContractId::StakingRouter.proxy_kind(), ProxyKind::Ossifiable);
        assert_eq!(ContractId::DepositSecurityModule.proxy_kind(), ProxyKind::None);
        assert_eq!(ContractId::WithdrawalVault.proxy_kind(), ProxyKind::WithdrawalsManager);
        assert_eq!(ProxyKind::Ossifiable.to_string(), "ossifiable");
    }

    #[test]
    fn deposit_contract_has_no_manifest_key() {
        assert_eq!(ContractId::DepositContract.manifest_key(), None);
        assert_eq!(ContractId::Catalist.manifest_key(), Some("app:catalist"));
        assert!(ContractId::LOADER.iter().all(|id| ContractId::ALL.contains(id)));
    }
}
