//! Command line surface of the `catalist` binary: global connection flags plus one subcommand per task.

use std::path::PathBuf;

use alloy::primitives::Address;
use catalist_ops_shared::contracts::ContractId;
use catalist_ops_shared::keys::DEFAULT_CHUNK_SIZE;
use catalist_ops_shared::output::ScriptOutput;
use clap::{Parser, Subcommand};

use crate::scripts::prelude::{ConfigOverrides, ScriptRuntime};
use crate::scripts::{
    deposits, events, init, keys, operators, oracle, proxy, shares_image, staking, withdrawals,
};
use crate::tracing::LogFormat;

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value
        .parse()
        .map_err(|_e| format!("Unknown log format {value}, expected plain or json"))
}

#[derive(Parser, Debug)]
#[clap(name = "catalist", author, version, about = "Operations toolkit for the Catalist liquid-staking protocol", long_about = None)]
pub struct Cli {
    /// JSON-RPC endpoint, overrides EXECUTION_LAYER_RPC.
    #[clap(long, global = true)]
    pub rpc_url: Option<String>,
    /// Deployment manifest, overrides DEPLOYMENT_MANIFEST.
    #[clap(long, global = true)]
    pub manifest: Option<PathBuf>,
    /// Directory of ABI files, overrides ABI_DIR.
    #[clap(long, global = true)]
    pub abi_dir: Option<PathBuf>,
    #[clap(long, global = true)]
    pub gas_limit: Option<u64>,
    #[clap(long, global = true)]
    pub gas_price: Option<u128>,
    /// Print the result as JSON instead of console lines.
    #[clap(long, global = true, default_value = "false")]
    pub json: bool,
    #[clap(long, global = true, env = "LOG_FORMAT", default_value = "plain", value_parser = parse_log_format)]
    pub log_format: LogFormat,

    #[clap(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            rpc_url: self.rpc_url.clone(),
            manifest: self.manifest.clone(),
            abi_dir: self.abi_dir.clone(),
            gas_limit: self.gas_limit,
            gas_price: self.gas_price,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Withdrawal requests of an account and their statuses.
    WithdrawInfo {
        #[clap(long)]
        address: Address,
    },
    /// Withdrawal queue counters.
    WithdrawQueueInfo,
    /// Sets the frame config on both hash consensus contracts.
    SetFrameConfig {
        #[clap(long)]
        epoch: u64,
        #[clap(long, default_value_t = oracle::DEFAULT_FAST_LANE_LENGTH_SLOTS)]
        fast_lane: u64,
    },
    HashConsensusInfo,
    AddOracleMember {
        #[clap(long)]
        address: Address,
        #[clap(long, default_value_t = oracle::DEFAULT_QUORUM)]
        quorum: u64,
    },
    /// Recomputes the initial epoch from the latest block and applies it to both oracles.
    UpdateInitialEpoch,
    GetStakingModules,
    GetStakingLimit,
    StakingModuleSummary {
        #[clap(long)]
        module: u64,
    },
    StakingOverview {
        #[clap(long, default_value_t = staking::DEFAULT_STAKING_MODULE_ID)]
        module: u64,
        #[clap(long, default_value_t = staking::DEFAULT_NODE_OPERATOR_ID)]
        operator: u64,
    },
    TotalAce,
    /// bACE balance of an account.
    Balance {
        #[clap(long)]
        address: Address,
    },
    ProtocolStats,
    SetRewardAddress {
        #[clap(long)]
        operator: u64,
        #[clap(long)]
        address: Address,
    },
    SetStakingLimit {
        #[clap(long)]
        operator: u64,
        #[clap(long, default_value_t = operators::DEFAULT_STAKING_LIMIT)]
        limit: u64,
    },
    NodeOperatorInfo {
        #[clap(long)]
        operator: u64,
    },
    AddOperator {
        #[clap(long)]
        name: String,
        #[clap(long)]
        address: Address,
    },
    /// Submits signing keys from a deposit data file.
    AddKeys {
        #[clap(long)]
        operator: u64,
        #[clap(long)]
        file: PathBuf,
        #[clap(long, default_value_t = 0)]
        start: usize,
        /// Zero takes every key from `--start`.
        #[clap(long, default_value_t = 0)]
        count: usize,
        #[clap(long)]
        batch_size: Option<usize>,
    },
    RemoveKeys {
        #[clap(long)]
        operator: u64,
        #[clap(long)]
        index: u64,
        #[clap(long)]
        count: u64,
        #[clap(long = "iter", default_value_t = 1)]
        iterations: u64,
    },
    /// Signing keys in `[start, end)`.
    GetKeys {
        #[clap(long)]
        operator: u64,
        #[clap(long)]
        start: u64,
        #[clap(long)]
        end: u64,
    },
    /// Splits a deposit data file into numbered chunk files. Needs no RPC endpoint.
    SplitDepositData {
        #[clap(long)]
        file: PathBuf,
        #[clap(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
        #[clap(long)]
        out_dir: PathBuf,
    },
    GetImpl {
        #[clap(long)]
        contract: ContractId,
    },
    ProxyInfo,
    /// Points the node operators registry app at a new implementation.
    UpgradeNos {
        #[clap(long)]
        address: Address,
        #[clap(long)]
        deployer: Option<Address>,
    },
    DeployContract {
        #[clap(long)]
        artifact: PathBuf,
    },
    DepositState {
        #[clap(long, default_value_t = staking::DEFAULT_STAKING_MODULE_ID)]
        module: u64,
    },
    AddGuardian {
        #[clap(long)]
        address: Address,
        #[clap(long, default_value_t = deposits::DEFAULT_GUARDIAN_QUORUM)]
        quorum: u64,
    },
    /// Deposits buffered ACE into a staking module, signing the attest message with each guardian key.
    DepositBuffered {
        #[clap(long, default_value_t = staking::DEFAULT_STAKING_MODULE_ID)]
        module: u64,
        #[clap(long = "guardian-key")]
        guardian_keys: Vec<String>,
    },
    /// Fetches and decodes the logs of one event.
    EventLog {
        #[clap(long)]
        event: String,
        #[clap(long)]
        contract: ContractId,
        #[clap(long, default_value_t = 0)]
        from_block: u64,
        /// Defaults to the latest block.
        #[clap(long)]
        to_block: Option<u64>,
        #[clap(long)]
        chunk_size: Option<u64>,
    },
    /// First-deployment bootstrap of a fresh protocol deployment.
    ProtocolInit {
        #[clap(long)]
        oracle_member: Address,
        #[clap(long)]
        guardian: Option<Address>,
        #[clap(long, default_value_t = oracle::DEFAULT_QUORUM)]
        quorum: u64,
        #[clap(long, default_value_t = staking::DEFAULT_STAKING_MODULE_ID)]
        staking_module: u64,
        #[clap(long)]
        deployer: Option<Address>,
    },
    /// Writes a holder balance image built from every TransferShares event.
    SharesImage {
        #[clap(long)]
        out_dir: Option<PathBuf>,
    },
}

impl Command {
    /// Commands that work on local files only.
    pub fn run_offline(&self) -> Option<anyhow::Result<ScriptOutput>> {
        match self {
            Command::SplitDepositData {
                file,
                chunk_size,
                out_dir,
            } => Some(keys::split_deposit_data(file, *chunk_size, out_dir)),
            _ => None,
        }
    }

    pub async fn run(self, runtime: &ScriptRuntime) -> anyhow::Result<ScriptOutput> {
        match self {
            Command::WithdrawInfo { address } => withdrawals::withdraw_info(runtime, address).await,
            Command::WithdrawQueueInfo => withdrawals::withdraw_queue_info(runtime).await,
            Command::SetFrameConfig { epoch, fast_lane } => oracle::set_frame_config(runtime, epoch, fast_lane).await,
            Command::HashConsensusInfo => oracle::hash_consensus_info(runtime).await,
            Command::AddOracleMember { address, quorum } => oracle::add_oracle_member(runtime, address, quorum).await,
            Command::UpdateInitialEpoch => oracle::update_initial_epoch(runtime).await,
            Command::GetStakingModules => staking::get_staking_modules(runtime).await,
            Command::GetStakingLimit => staking::get_staking_limit(runtime).await,
            Command::StakingModuleSummary { module } => staking::staking_module_summary(runtime, module).await,
            Command::StakingOverview { module, operator } => {
                staking::staking_overview(runtime, module, operator).await
            }
            Command::TotalAce => staking::total_ace(runtime).await,
            Command::Balance { address } => staking::balance(runtime, address).await,
            Command::ProtocolStats => staking::protocol_stats(runtime).await,
            Command::SetRewardAddress { operator, address } => {
                operators::set_reward_address(runtime, operator, address).await
            }
            Command::SetStakingLimit { operator, limit } => operators::set_staking_limit(runtime, operator, limit).await,
            Command::NodeOperatorInfo { operator } => operators::node_operator_info(runtime, operator).await,
            Command::AddOperator { name, address } => operators::add_operator(runtime, &name, address).await,
            Command::AddKeys {
                operator,
                file,
                start,
                count,
                batch_size,
            } => {
                let args = keys::AddKeysArgs {
                    operator_id: operator,
                    file,
                    start,
                    count,
                    batch_size,
                };
                keys::add_keys(runtime, &args).await
            }
            Command::RemoveKeys {
                operator,
                index,
                count,
                iterations,
            } => keys::remove_keys(runtime, operator, index, count, iterations).await,
            Command::GetKeys { operator, start, end } => keys::get_keys(runtime, operator, start, end).await,
            Command::SplitDepositData {
                file,
                chunk_size,
                out_dir,
            } => keys::split_deposit_data(&file, chunk_size, &out_dir),
            Command::GetImpl { contract } => proxy::get_impl(runtime, contract).await,
            Command::ProxyInfo => proxy::proxy_info(runtime).await,
            Command::UpgradeNos { address, deployer } => proxy::upgrade_nos(runtime, address, deployer).await,
            Command::DeployContract { artifact } => proxy::deploy_contract(runtime, &artifact).await,
            Command::DepositState { module } => deposits::deposit_state(runtime, module).await,
            Command::AddGuardian { address, quorum } => deposits::add_guardian(runtime, address, quorum).await,
            Command::DepositBuffered { module, guardian_keys } => {
                deposits::deposit_buffered(runtime, module, &guardian_keys).await
            }
            Command::EventLog {
                event,
                contract,
                from_block,
                to_block,
                chunk_size,
            } => events::event_log(runtime, &event, contract, from_block, to_block, chunk_size).await,
            Command::ProtocolInit {
                oracle_member,
                guardian,
                quorum,
                staking_module,
                deployer,
            } => {
                let args = init::ProtocolInitArgs {
                    oracle_member,
                    guardian,
                    quorum,
                    staking_module_id: staking_module,
                    deployer,
                };
                init::protocol_init(runtime, &args).await
            }
            Command::SharesImage { out_dir } => shares_image::shares_image(runtime, out_dir).await,
        }
    }
}
