use alloy_network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy_primitives::{Address, B256, Signature};
use alloy_provider::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use linguaframe_types::config::RpcConfig;
use std::fmt;
use std::time::Duration;

#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};

use crate::chain::Eip155ChainReference;
use crate::signer::SignerLike;
use crate::wallet::{MetaTransaction, TransactionSender, TransferReceipt, WalletError};

/// Default bound on how long to wait for a receipt.
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// A private key plus a JSON-RPC provider for one chain.
///
/// Gas, nonce and chain id are filled by alloy's recommended fillers; the
/// transaction is signed locally and sent as a raw transaction.
pub struct Eip155LocalWallet {
    chain: Eip155ChainReference,
    signer: PrivateKeySigner,
    provider: DynProvider,
    receipt_timeout: Duration,
}

impl fmt::Debug for Eip155LocalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Eip155LocalWallet")
            .field("chain", &self.chain)
            .field("address", &self.signer.address())
            .field("receipt_timeout", &self.receipt_timeout)
            .finish_non_exhaustive()
    }
}

impl Eip155LocalWallet {
    pub fn new(signer: PrivateKeySigner, chain: Eip155ChainReference, rpc: &RpcConfig) -> Self {
        let signer = signer.with_chain_id(Some(chain.inner()));
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(rpc.http.clone())
            .erased();

        #[cfg(feature = "telemetry")]
        tracing::info!(chain = %chain, rpc_url = %rpc.http, address = %signer.address(), "Using local EVM wallet");

        Self {
            chain,
            signer,
            provider,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
        }
    }

    /// Parses a hex private key, with or without `0x`.
    pub fn from_private_key(
        private_key: &str,
        chain: Eip155ChainReference,
        rpc: &RpcConfig,
    ) -> Result<Self, WalletError> {
        let signer: PrivateKeySigner = private_key.trim().parse()?;
        Ok(Self::new(signer, chain, rpc))
    }

    pub fn with_receipt_timeout(mut self, receipt_timeout: Duration) -> Self {
        self.receipt_timeout = receipt_timeout;
        self
    }
}

#[async_trait]
impl SignerLike for Eip155LocalWallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error> {
        Signer::sign_hash(&self.signer, hash).await
    }
}

#[async_trait]
impl TransactionSender for Eip155LocalWallet {
    fn chain(&self) -> Eip155ChainReference {
        self.chain
    }

    #[cfg_attr(feature = "telemetry", instrument(name = "linguaframe.send_transaction", skip_all, err, fields(to = %tx.to)))]
    async fn send_transaction(&self, tx: MetaTransaction) -> Result<B256, WalletError> {
        let request = TransactionRequest::default()
            .with_to(tx.to)
            .with_from(self.signer.address())
            .with_input(tx.calldata);
        let pending = self.provider.send_transaction(request).await?;
        let tx_hash = *pending.tx_hash();

        #[cfg(feature = "telemetry")]
        debug!(tx_hash = %tx_hash, "Transaction accepted by node");

        Ok(tx_hash)
    }

    #[cfg_attr(feature = "telemetry", instrument(name = "linguaframe.wait_for_receipt", skip(self), err))]
    async fn wait_for_receipt(
        &self,
        tx_hash: B256,
        confirmations: u64,
    ) -> Result<TransferReceipt, WalletError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .with_required_confirmations(confirmations)
            .with_timeout(Some(self.receipt_timeout))
            .get_receipt()
            .await?;
        Ok(TransferReceipt {
            transaction_hash: receipt.transaction_hash,
            success: receipt.status(),
            block_number: receipt.block_number,
        })
    }
}
