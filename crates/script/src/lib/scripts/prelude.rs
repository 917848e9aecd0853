use std::path::PathBuf;
use std::sync::Arc;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use catalist_ops_shared::contracts::ContractId;
use catalist_ops_shared::manifest::{DeploymentManifest, ManifestError};
use thiserror::Error;

use crate::contracts::{
    AccountingOracle::{self, AccountingOracleInstance},
    Catalist::{self, CatalistInstance},
    CatalistLocator::{self, CatalistLocatorInstance},
    DepositContract::{self, DepositContractInstance},
    DepositSecurityModule::{self, DepositSecurityModuleInstance},
    HashConsensus::{self, HashConsensusInstance},
    Kernel::{self, KernelInstance},
    NodeOperatorsRegistry::{self, NodeOperatorsRegistryInstance},
    StakingRouter::{self, StakingRouterInstance},
    ValidatorsExitBusOracle::{self, ValidatorsExitBusOracleInstance},
    WithdrawalQueueERC721::{self, WithdrawalQueueERC721Instance},
    ACL::{self, ACLInstance},
};
use crate::env::{self, EnvError, EnvVarValue};
use crate::eth_client::{
    ContractError, DefaultProvider, EthELClient, ExecutionLayerClient, GasSettings, ProviderError, ProviderFactory,
    TxSender,
};
use crate::prometheus_metrics::Metrics;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("Failed to parse {0} as URL")]
    FailedToParseUrl(&'static str),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Failed to create provider: {0}")]
    Provider(#[from] ProviderError),

    #[error("No signer configured, set PRIVATE_KEY to send transactions")]
    ReadOnly,

    #[error("Contract {0} is not in the manifest and the locator does not report it")]
    Unresolved(ContractId),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Values the command line can override. Anything left as `None` comes from the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub rpc_url: Option<String>,
    pub manifest: Option<PathBuf>,
    pub abi_dir: Option<PathBuf>,
    pub gas_limit: Option<u64>,
    pub gas_price: Option<u128>,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub execution_layer_rpc: EnvVarValue<String>,
    pub private_key: EnvVarValue<Option<String>>,
    pub manifest_path: PathBuf,
    pub abi_dir: PathBuf,
    pub gas: GasSettings,
    pub deployer: Option<Address>,
    pub shares_image_dir: PathBuf,
}

impl RuntimeConfig {
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, Error> {
        let execution_layer_rpc = match &overrides.rpc_url {
            Some(url) => EnvVarValue {
                spec: &env::EXECUTION_LAYER_RPC,
                value: url.clone(),
            },
            None => env::EXECUTION_LAYER_RPC.required()?,
        };
        let manifest_path = match &overrides.manifest {
            Some(path) => path.clone(),
            None => env::DEPLOYMENT_MANIFEST.default(PathBuf::from(env::DEFAULT_MANIFEST))?.value,
        };
        let abi_dir = match &overrides.abi_dir {
            Some(path) => path.clone(),
            None => env::ABI_DIR.default(PathBuf::from(env::DEFAULT_ABI_DIR))?.value,
        };
        let gas_limit = match overrides.gas_limit {
            Some(value) => value,
            None => env::GAS_LIMIT.default(env::DEFAULT_GAS_LIMIT)?.value,
        };
        let gas_price = match overrides.gas_price {
            Some(value) => value,
            None => env::GAS_PRICE.default(env::DEFAULT_GAS_PRICE)?.value,
        };

        Ok(Self {
            execution_layer_rpc,
            private_key: env::PRIVATE_KEY.optional()?,
            manifest_path,
            abi_dir,
            gas: GasSettings { gas_limit, gas_price },
            deployer: env::DEPLOYER.optional()?.value,
            shares_image_dir: env::SHARES_IMAGE_DIR
                .default(PathBuf::from(env::DEFAULT_SHARES_IMAGE_DIR))?
                .value,
        })
    }

    pub fn from_env() -> Result<Self, Error> {
        Self::load(&ConfigOverrides::default())
    }

    pub fn endpoint(&self) -> Result<Url, Error> {
        self.execution_layer_rpc
            .value
            .trim()
            .parse()
            .map_err(|_e| Error::FailedToParseUrl(self.execution_layer_rpc.spec.key))
    }
}

/// Typed handles for every contract the loader resolves up front.
pub struct Contracts {
    pub deposit_contract: DepositContractInstance<DefaultProvider>,
    pub catalist: CatalistInstance<DefaultProvider>,
    pub hash_consensus_for_accounting_oracle: HashConsensusInstance<DefaultProvider>,
    pub hash_consensus_for_validators_exit_bus_oracle: HashConsensusInstance<DefaultProvider>,
    pub staking_router: StakingRouterInstance<DefaultProvider>,
    pub accounting_oracle: AccountingOracleInstance<DefaultProvider>,
    pub withdrawal_queue: WithdrawalQueueERC721Instance<DefaultProvider>,
    pub node_operators_registry: NodeOperatorsRegistryInstance<DefaultProvider>,
    pub deposit_security_module: DepositSecurityModuleInstance<DefaultProvider>,
    pub locator: CatalistLocatorInstance<DefaultProvider>,
    pub validators_exit_bus_oracle: ValidatorsExitBusOracleInstance<DefaultProvider>,
    pub kernel: KernelInstance<DefaultProvider>,
    pub acl: ACLInstance<DefaultProvider>,
}

impl Contracts {
    pub fn load(manifest: &DeploymentManifest, provider: &DefaultProvider) -> Result<Self, ManifestError> {
        let address = |id: ContractId| {
            manifest
                .address_of(id)
                .inspect(|address| tracing::debug!(contract = %id, %address, "Resolved contract"))
        };
        Ok(Self {
            deposit_contract: DepositContract::new(address(ContractId::DepositContract)?, provider.clone()),
            catalist: Catalist::new(address(ContractId::Catalist)?, provider.clone()),
            hash_consensus_for_accounting_oracle: HashConsensus::new(
                address(ContractId::HashConsensusForAccountingOracle)?,
                provider.clone(),
            ),
            hash_consensus_for_validators_exit_bus_oracle: HashConsensus::new(
                address(ContractId::HashConsensusForValidatorsExitBusOracle)?,
                provider.clone(),
            ),
            staking_router: StakingRouter::new(address(ContractId::StakingRouter)?, provider.clone()),
            accounting_oracle: AccountingOracle::new(address(ContractId::AccountingOracle)?, provider.clone()),
            withdrawal_queue: WithdrawalQueueERC721::new(
                address(ContractId::WithdrawalQueueERC721)?,
                provider.clone(),
            ),
            node_operators_registry: NodeOperatorsRegistry::new(
                address(ContractId::NodeOperatorsRegistry)?,
                provider.clone(),
            ),
            deposit_security_module: DepositSecurityModule::new(
                address(ContractId::DepositSecurityModule)?,
                provider.clone(),
            ),
            locator: CatalistLocator::new(address(ContractId::CatalistLocator)?, provider.clone()),
            validators_exit_bus_oracle: ValidatorsExitBusOracle::new(
                address(ContractId::ValidatorsExitBusOracle)?,
                provider.clone(),
            ),
            kernel: Kernel::new(address(ContractId::AragonKernel)?, provider.clone()),
            acl: ACL::new(address(ContractId::AragonAcl)?, provider.clone()),
        })
    }

    /// Both hash consensus instances, labelled, in the order scripts report them.
    pub fn hash_consensus(&self) -> [(ContractId, &HashConsensusInstance<DefaultProvider>); 2] {
        [
            (
                ContractId::HashConsensusForAccountingOracle,
                &self.hash_consensus_for_accounting_oracle,
            ),
            (
                ContractId::HashConsensusForValidatorsExitBusOracle,
                &self.hash_consensus_for_validators_exit_bus_oracle,
            ),
        ]
    }
}

pub struct ScriptRuntime {
    pub config: RuntimeConfig,
    pub manifest: DeploymentManifest,
    pub provider: Arc<DefaultProvider>,
    pub signer: Option<PrivateKeySigner>,
    pub contracts: Contracts,
    pub eth_client: EthELClient,
    pub tx: TxSender,
    pub metrics: Arc<Metrics>,
}

impl ScriptRuntime {
    pub fn init(config: RuntimeConfig, metrics: Arc<Metrics>) -> Result<Self, Error> {
        let endpoint = config.endpoint()?;
        let signer = match &config.private_key.value {
            Some(key) => Some(ProviderFactory::signer(ProviderFactory::decode_key(key)?)),
            None => None,
        };
        let provider = match &signer {
            Some(signer) => ProviderFactory::create_provider(signer.clone(), endpoint),
            None => {
                tracing::info!("PRIVATE_KEY not set, running read-only");
                ProviderFactory::create_read_only_provider(endpoint)
            }
        };
        Self::with_provider(config, provider, signer, metrics)
    }

    /// Builds the runtime around an existing provider. `signer` must be the one the provider sends with.
    pub fn with_provider(
        config: RuntimeConfig,
        provider: DefaultProvider,
        signer: Option<PrivateKeySigner>,
        metrics: Arc<Metrics>,
    ) -> Result<Self, Error> {
        let manifest = DeploymentManifest::read(&config.manifest_path)?;
        tracing::info!(manifest = ?config.manifest_path, "Loaded deployment manifest");

        let contracts = Contracts::load(&manifest, &provider)?;
        let provider = Arc::new(provider);
        let eth_client = ExecutionLayerClient::new(
            Arc::clone(&provider),
            Arc::new(metrics.services.eth_client.clone()),
        );
        let tx = TxSender::new(config.gas, Arc::new(metrics.services.contracts.clone()));

        Ok(Self {
            config,
            manifest,
            provider,
            signer,
            contracts,
            eth_client,
            tx,
            metrics,
        })
    }

    pub fn init_from_env(metrics: Arc<Metrics>) -> Result<Self, Error> {
        Self::init(RuntimeConfig::from_env()?, metrics)
    }

    /// Owned handle for contracts built on demand.
    pub fn provider(&self) -> DefaultProvider {
        self.provider.as_ref().clone()
    }

    pub fn signer_address(&self) -> Result<Address, Error> {
        self.signer.as_ref().map(|signer| signer.address()).ok_or(Error::ReadOnly)
    }

    pub fn signer(&self) -> Result<&PrivateKeySigner, Error> {
        self.signer.as_ref().ok_or(Error::ReadOnly)
    }

    pub fn address_of(&self, contract: ContractId) -> Result<Address, Error> {
        Ok(self.manifest.address_of(contract)?)
    }

    /// Manifest first, then the locator for the components it reports.
    pub async fn resolve_optional(&self, contract: ContractId) -> Result<Address, Error> {
        match self.manifest.address_of(contract) {
            Ok(address) => return Ok(address),
            Err(ManifestError::MissingEntry(key)) => {
                tracing::debug!(contract = %contract, key, "Not in manifest, asking the locator")
            }
            Err(other) => return Err(other.into()),
        }

        let components = self
            .tx
            .read(
                "oracleReportComponentsForCatalist",
                self.contracts.locator.oracleReportComponentsForCatalist(),
            )
            .await?;
        match contract {
            ContractId::OracleReportSanityChecker => Ok(components.oracleReportSanityChecker),
            ContractId::WithdrawalVault => Ok(components.withdrawalVault),
            ContractId::ExecutionLayerRewardsVault => Ok(components.elRewardsVault),
            other => Err(Error::Unresolved(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_take_precedence_and_rpc_stays_masked() {
        let overrides = ConfigOverrides {
            rpc_url: Some("http://localhost:8545".to_owned()),
            manifest: Some(PathBuf::from("manifest.json")),
            abi_dir: Some(PathBuf::from("abi")),
            gas_limit: Some(21_000),
            gas_price: Some(7),
        };
        let config = RuntimeConfig::load(&overrides).unwrap();
        assert_eq!(config.manifest_path, PathBuf::from("manifest.json"));
        assert_eq!(config.abi_dir, PathBuf::from("abi"));
        assert_eq!(
            config.gas,
            GasSettings {
                gas_limit: 21_000,
                gas_price: 7
            }
        );
        assert_eq!(config.endpoint().unwrap().as_str(), "http://localhost:8545/");
        assert!(!format!("{config:?}").contains("localhost"));
    }

    #[test]
    fn unparsable_endpoint_names_the_variable() {
        let overrides = ConfigOverrides {
            rpc_url: Some("not a url".to_owned()),
            ..Default::default()
        };
        let config = RuntimeConfig::load(&overrides).unwrap();
        let err = config.endpoint().unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse EXECUTION_LAYER_RPC as URL");
    }
}
