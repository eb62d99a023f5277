//! Wallet sessions and the handles payments borrow from them.
//!
//! A [`WalletSession`] holds at most one connected wallet. Connecting hands out
//! [`SignerHandle`]s; disconnecting (or connecting another wallet) marks every
//! handle of the previous connection stale. A stale handle refuses to sign or
//! send with [`WalletError::NotConnected`] instead of reaching the old wallet.

use alloy_primitives::{Address, B256, Bytes, Signature};
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::chain::Eip155ChainReference;
use crate::signer::SignerLike;

mod local;

pub use local::Eip155LocalWallet;

/// A contract call to submit as a regular transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTransaction {
    pub to: Address,
    pub calldata: Bytes,
}

/// What came back once a transaction was mined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub transaction_hash: B256,
    /// `false` when execution reverted.
    pub success: bool,
    pub block_number: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Wallet not connected")]
    NotConnected,
    #[error("Invalid private key: {0}")]
    InvalidKey(#[from] alloy_signer_local::LocalSignerError),
    #[error(transparent)]
    Transport(#[from] alloy_transport::TransportError),
    #[error(transparent)]
    PendingTransaction(#[from] alloy_provider::PendingTransactionError),
    #[error(transparent)]
    Signer(#[from] alloy_signer::Error),
    #[error("{0}")]
    Custom(String),
}

/// A wallet able to submit transactions on one chain.
#[async_trait]
pub trait TransactionSender: SignerLike {
    fn chain(&self) -> Eip155ChainReference;

    /// Signs and broadcasts `tx`. Resolves once the node accepted it.
    async fn send_transaction(&self, tx: MetaTransaction) -> Result<B256, WalletError>;

    /// Waits until `tx_hash` has `confirmations` blocks on top of it, inclusive.
    async fn wait_for_receipt(
        &self,
        tx_hash: B256,
        confirmations: u64,
    ) -> Result<TransferReceipt, WalletError>;
}

struct Connection<W> {
    wallet: W,
    live: AtomicBool,
}

/// At most one connected wallet.
pub struct WalletSession<W> {
    current: RwLock<Option<Arc<Connection<W>>>>,
}

impl<W> Default for WalletSession<W> {
    fn default() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }
}

impl<W> fmt::Debug for WalletSession<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSession")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl<W> WalletSession<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connected(wallet: W) -> Self {
        let session = Self::new();
        session.connect(wallet);
        session
    }

    /// Connects `wallet`, replacing and invalidating any previous connection.
    pub fn connect(&self, wallet: W) -> SignerHandle<W> {
        let connection = Arc::new(Connection {
            wallet,
            live: AtomicBool::new(true),
        });
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.replace(connection.clone()) {
            previous.live.store(false, Ordering::Release);
        }
        SignerHandle { connection }
    }

    /// Drops the connection. Outstanding handles become stale.
    pub fn disconnect(&self) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.take() {
            previous.live.store(false, Ordering::Release);
        }
    }

    /// A handle to the connected wallet, if any.
    pub fn signer(&self) -> Option<SignerHandle<W>> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        current.as_ref().map(|connection| SignerHandle {
            connection: connection.clone(),
        })
    }

    pub fn is_connected(&self) -> bool {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        current.is_some()
    }
}

impl<W: SignerLike> WalletSession<W> {
    pub fn address(&self) -> Option<Address> {
        self.signer()
            .map(|handle| handle.connection.wallet.address())
    }
}

/// Borrowed capability to use the session's wallet.
///
/// Cheap to clone. Never outlives its connection in effect: once the session
/// disconnects, every operation fails with [`WalletError::NotConnected`].
pub struct SignerHandle<W> {
    connection: Arc<Connection<W>>,
}

impl<W> Clone for SignerHandle<W> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
        }
    }
}

impl<W> fmt::Debug for SignerHandle<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerHandle")
            .field("live", &self.is_live())
            .finish()
    }
}

impl<W> SignerHandle<W> {
    pub fn is_live(&self) -> bool {
        self.connection.live.load(Ordering::Acquire)
    }

    /// The wallet behind this handle, while the session still holds it.
    pub fn wallet(&self) -> Result<&W, WalletError> {
        if self.is_live() {
            Ok(&self.connection.wallet)
        } else {
            Err(WalletError::NotConnected)
        }
    }
}

#[async_trait]
impl<W: SignerLike + Send + Sync> SignerLike for SignerHandle<W> {
    /// The account stays known after disconnect; only its use is refused.
    fn address(&self) -> Address {
        self.connection.wallet.address()
    }

    async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error> {
        let wallet = self
            .wallet()
            .map_err(|_| alloy_signer::Error::other(WalletError::NotConnected))?;
        wallet.sign_hash(hash).await
    }
}

#[async_trait]
impl<W: TransactionSender + Send + Sync> TransactionSender for SignerHandle<W> {
    fn chain(&self) -> Eip155ChainReference {
        self.connection.wallet.chain()
    }

    async fn send_transaction(&self, tx: MetaTransaction) -> Result<B256, WalletError> {
        self.wallet()?.send_transaction(tx).await
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: B256,
        confirmations: u64,
    ) -> Result<TransferReceipt, WalletError> {
        self.wallet()?.wait_for_receipt(tx_hash, confirmations).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_signer_local::PrivateKeySigner;

    #[test]
    fn test_session_starts_disconnected() {
        let session = WalletSession::<PrivateKeySigner>::new();
        assert!(!session.is_connected());
        assert!(session.signer().is_none());
        assert!(session.address().is_none());
    }

    #[test]
    fn test_connect_hands_out_live_handles() {
        let signer = PrivateKeySigner::random();
        let expected = signer.address();
        let session = WalletSession::connected(signer);
        let handle = session.signer().unwrap();
        assert!(handle.is_live());
        assert_eq!(session.address(), Some(expected));
        assert_eq!(SignerLike::address(&handle), expected);
    }

    #[tokio::test]
    async fn test_disconnect_makes_handles_stale() {
        let session = WalletSession::connected(PrivateKeySigner::random());
        let handle = session.signer().unwrap();
        let hash = B256::repeat_byte(0x11);
        assert!(handle.sign_hash(&hash).await.is_ok());

        session.disconnect();
        assert!(!handle.is_live());
        assert!(matches!(handle.wallet(), Err(WalletError::NotConnected)));
        let error = handle.sign_hash(&hash).await.unwrap_err();
        assert_eq!(error.to_string(), "Wallet not connected");
        assert!(session.signer().is_none());
    }

    #[test]
    fn test_reconnect_invalidates_previous_handles() {
        let session = WalletSession::connected(PrivateKeySigner::random());
        let old = session.signer().unwrap();
        let new = session.connect(PrivateKeySigner::random());
        assert!(!old.is_live());
        assert!(new.is_live());
        assert_ne!(SignerLike::address(&old), SignerLike::address(&new));
    }
}
