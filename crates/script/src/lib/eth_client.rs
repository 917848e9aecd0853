use alloy::contract::{CallBuilder, CallDecoder};
use alloy::eips::BlockNumberOrTag;
use alloy::network::{Ethereum, EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::decode_revert_reason;
use alloy::transports::http::reqwest::Url;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

use crate::prometheus_metrics::{self, services};

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("Contract rejected: {0}")]
    Revert(String),

    #[error("Custom rejection: {0}")]
    CustomRejection(String),

    #[error("Transaction {0} reverted without reason")]
    Reverted(TxHash),

    #[error("Deployment {0} did not create a contract")]
    NoContractAddress(TxHash),

    #[error("Other alloy error {0:#?}")]
    OtherAlloyError(alloy::contract::Error),

    #[error("Transaction error {0:#?}")]
    TransactionError(#[from] alloy::providers::PendingTransactionError),

    #[error(transparent)]
    Rpc(#[from] RPCError),
}

impl From<alloy::contract::Error> for ContractError {
    fn from(error: alloy::contract::Error) -> Self {
        if let alloy::contract::Error::TransportError(alloy::transports::RpcError::ErrorResp(ref error_payload)) = error
        {
            if let Some(reason) = error_payload.as_revert_data().and_then(|data| decode_revert(&data)) {
                return ContractError::Revert(reason);
            }
            if error_payload.message.contains("execution reverted") {
                return ContractError::CustomRejection(error_payload.message.to_string());
            }
        }
        ContractError::OtherAlloyError(error)
    }
}

/// Decodes `Error(string)`, `Panic(uint256)` or a raw UTF-8 revert payload.
pub fn decode_revert(data: &[u8]) -> Option<String> {
    decode_revert_reason(data)
}

#[derive(Debug, Error)]
pub enum RPCError {
    #[error(transparent)]
    Error(#[from] alloy::transports::RpcError<alloy::transports::TransportErrorKind>),

    #[error("Block {0} not found")]
    BlockNotFound(BlockNumberOrTag),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasSettings {
    pub gas_limit: u64,
    pub gas_price: u128,
}

impl GasSettings {
    pub fn apply<P, D>(&self, call: CallBuilder<P, D>) -> CallBuilder<P, D>
    where
        P: Provider<Ethereum>,
        D: CallDecoder,
    {
        call.gas(self.gas_limit).gas_price(self.gas_price)
    }
}

/// Issues contract reads and transactions with the configured gas settings.
pub struct TxSender {
    gas: GasSettings,
    metric_reporter: Arc<prometheus_metrics::Service>,
}

impl TxSender {
    pub fn new(gas: GasSettings, metric_reporter: Arc<prometheus_metrics::Service>) -> Self {
        Self { gas, metric_reporter }
    }

    pub async fn read<P, D>(&self, label: &str, call: CallBuilder<P, D>) -> Result<D::CallOutput, ContractError>
    where
        P: Provider<Ethereum>,
        D: CallDecoder,
    {
        let call = self.gas.apply(call);
        self.metric_reporter
            .run_with_metrics_and_logs_async(services::contracts::CALL, || async move {
                call.call()
                    .await
                    .inspect(|_| tracing::debug!(label, "Read completed"))
                    .map_err(ContractError::from)
            })
            .await
    }

    async fn send_impl<P, D>(&self, label: &str, call: CallBuilder<P, D>) -> Result<TxHash, ContractError>
    where
        P: Provider<Ethereum>,
        D: CallDecoder,
    {
        let tx_builder = self.gas.apply(call);
        // Preflight surfaces the revert reason before any gas is spent.
        if let Err(err) = tx_builder.call().await {
            tracing::error!(label, "Preflight call reverted: {err:?}");
            return Err(err.into());
        }

        tracing::info!(label, "Submitting transaction");
        let tx = tx_builder
            .send()
            .instrument(tracing::info_span!("send_tx"))
            .await
            .inspect(|val| tracing::debug!("Submitted transaction {}", val.tx_hash()))
            .inspect_err(|err| tracing::error!("Failed to submit transaction {err:?}"))?;

        let receipt = tx
            .get_receipt()
            .instrument(tracing::info_span!("get_receipt"))
            .await
            .inspect(|val| {
                if val.status() {
                    tracing::info!(label, "Transaction completed {:#?}", val.transaction_hash)
                } else {
                    tracing::error!(label, "Transaction reverted {:#?}", val.transaction_hash)
                }
            })
            .inspect_err(|err| tracing::error!("Transaction failed {err:?}"))?;

        if !receipt.status() {
            // Replay against the current state to recover a reason, if any.
            return match tx_builder.call().await {
                Ok(_) => Err(ContractError::Reverted(receipt.transaction_hash)),
                Err(e) => Err(e.into()),
            };
        }

        Ok(receipt.transaction_hash)
    }

    pub async fn send<P, D>(&self, label: &str, call: CallBuilder<P, D>) -> Result<TxHash, ContractError>
    where
        P: Provider<Ethereum>,
        D: CallDecoder,
    {
        let span = tracing::info_span!("send_transaction", label);
        self.metric_reporter
            .run_with_metrics_and_logs_async(services::contracts::SEND, || {
                self.send_impl(label, call).instrument(span)
            })
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub number: u64,
    pub hash: B256,
    pub timestamp: u64,
}

pub struct ExecutionLayerClient<P>
where
    P: Provider<Ethereum>,
{
    provider: Arc<P>,
    metric_reporter: Arc<prometheus_metrics::Service>,
}

impl<P> ExecutionLayerClient<P>
where
    P: Provider<Ethereum>,
{
    pub fn new(provider: Arc<P>, metric_reporter: Arc<prometheus_metrics::Service>) -> Self {
        Self {
            provider,
            metric_reporter,
        }
    }

    async fn get_latest_block_impl(&self) -> Result<BlockInfo, RPCError> {
        let tag = BlockNumberOrTag::Latest;
        let block = self
            .provider
            .get_block_by_number(tag)
            .await?
            .ok_or(RPCError::BlockNotFound(tag))?;
        Ok(BlockInfo {
            number: block.header.number,
            hash: block.header.hash,
            timestamp: block.header.timestamp,
        })
    }

    pub async fn get_latest_block(&self) -> Result<BlockInfo, RPCError> {
        self.metric_reporter
            .run_with_metrics_and_logs_async(services::eth_client::GET_LATEST_BLOCK, || {
                self.get_latest_block_impl()
            })
            .await
    }

    async fn get_logs_impl(
        &self,
        address: Address,
        topic0: B256,
        from_block: u64,
        to_block: u64,
        chunk_size: Option<u64>,
    ) -> Result<Vec<Log>, RPCError> {
        let mut logs = vec![];
        for (start, end) in block_ranges(from_block, to_block, chunk_size) {
            tracing::debug!(start, end, "Fetching logs");
            let filter = Filter::new()
                .address(address)
                .event_signature(topic0)
                .from_block(start)
                .to_block(end);
            logs.extend(self.provider.get_logs(&filter).await?);
        }
        tracing::info!(count = logs.len(), from_block, to_block, "Fetched logs");
        Ok(logs)
    }

    /// Fetches logs emitted by `address` with the given first topic, walking
    /// `[from_block, to_block]` in chunks when `chunk_size` is set.
    pub async fn get_logs(
        &self,
        address: Address,
        topic0: B256,
        from_block: u64,
        to_block: u64,
        chunk_size: Option<u64>,
    ) -> Result<Vec<Log>, RPCError> {
        self.metric_reporter
            .run_with_metrics_and_logs_async(services::eth_client::GET_LOGS, || {
                self.get_logs_impl(address, topic0, from_block, to_block, chunk_size)
            })
            .await
    }

    async fn deploy_impl(&self, bytecode: Bytes, gas: GasSettings) -> Result<(Address, TxHash), ContractError> {
        let tx = TransactionRequest::default()
            .with_deploy_code(bytecode)
            .with_gas_limit(gas.gas_limit)
            .with_gas_price(gas.gas_price);
        let receipt = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(RPCError::from)?
            .get_receipt()
            .await?;
        if !receipt.status() {
            return Err(ContractError::Reverted(receipt.transaction_hash));
        }
        let address = receipt
            .contract_address
            .ok_or(ContractError::NoContractAddress(receipt.transaction_hash))?;
        Ok((address, receipt.transaction_hash))
    }

    pub async fn deploy(&self, bytecode: Bytes, gas: GasSettings) -> Result<(Address, TxHash), ContractError> {
        self.metric_reporter
            .run_with_metrics_and_logs_async(services::eth_client::DEPLOY, || self.deploy_impl(bytecode, gas))
            .await
    }
}

/// Inclusive block ranges covering `[from, to]`. `None` or zero chunk means a single range.
pub fn block_ranges(from: u64, to: u64, chunk_size: Option<u64>) -> Vec<(u64, u64)> {
    if from > to {
        return vec![];
    }
    let chunk = match chunk_size {
        Some(size) if size > 0 => size,
        _ => return vec![(from, to)],
    };
    let mut ranges = vec![];
    let mut start = from;
    loop {
        let end = start.saturating_add(chunk - 1).min(to);
        ranges.push((start, end));
        if end == to {
            break;
        }
        start = end + 1;
    }
    ranges
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to convert string to hex")]
    FromHexError,
    #[error("Failed to parse private key")]
    ParsePrivateKeyError,
    #[error("Failed to deserialize private key")]
    DeserializePrivateKeyError,
}

pub type DefaultProvider = DynProvider<Ethereum>;

pub type EthELClient = ExecutionLayerClient<DefaultProvider>;

pub struct ProviderFactory {}
impl ProviderFactory {
    pub fn decode_key(private_key_raw: &str) -> Result<k256::SecretKey, ProviderError> {
        let key_str = private_key_raw.trim();
        let key_str = key_str.strip_prefix("0x").unwrap_or(key_str);
        if key_str.is_empty() {
            return Err(ProviderError::ParsePrivateKeyError);
        }
        let key_hex = hex::decode(key_str).map_err(|_e| ProviderError::FromHexError)?;
        if key_hex.len() != 32 {
            return Err(ProviderError::DeserializePrivateKeyError);
        }
        let key = k256::SecretKey::from_bytes((&key_hex[..]).into())
            .map_err(|_e| ProviderError::DeserializePrivateKeyError)?;
        Ok(key)
    }

    pub fn signer(key: k256::SecretKey) -> PrivateKeySigner {
        PrivateKeySigner::from(key)
    }

    pub fn create_provider(signer: PrivateKeySigner, endpoint: Url) -> DefaultProvider {
        let wallet: EthereumWallet = EthereumWallet::from(signer);
        ProviderBuilder::new().wallet(wallet).connect_http(endpoint).erased()
    }

    pub fn create_read_only_provider(endpoint: Url) -> DefaultProvider {
        ProviderBuilder::new().connect_http(endpoint).erased()
    }
}
