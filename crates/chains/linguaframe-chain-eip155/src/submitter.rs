//! Direct token payments: one ERC-20 `transfer`, then wait for one confirmation.
//!
//! [`PaymentSubmitter::submit`] never fails past its boundary. Every problem,
//! from a missing wallet to a reverted transaction, comes back as
//! [`PaymentResult::Failure`] with a message fit to show the user.
//!
//! Validation happens before any I/O, in this order: signer connected, chain
//! matches the wallet, token resolved, recipient parsed, amount scaled.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use linguaframe_types::payment::{PaymentError, PaymentRequest, PaymentResult};
use std::str::FromStr;

#[cfg(feature = "telemetry")]
use tracing::{info, instrument, warn};

use crate::chain::erc20::IERC20;
use crate::chain::{Eip155ChainReference, Eip155TokenDeployment};
use crate::networks::{known_token, usdc_on_chain};
use crate::wallet::{MetaTransaction, SignerHandle, TransactionSender, WalletError};

/// Decimals assumed for token addresses LinguaFrame has no deployment record for.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 6;

/// Confirmations awaited before a payment counts as done.
pub const REQUIRED_CONFIRMATIONS: u64 = 1;

/// A validated transfer, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTransfer {
    pub token: Eip155TokenDeployment,
    pub recipient: Address,
    /// In the token's smallest unit.
    pub amount: U256,
}

impl PreparedTransfer {
    /// ABI-encoded `transfer(recipient, amount)`.
    pub fn calldata(&self) -> Bytes {
        IERC20::transferCall {
            to: self.recipient,
            amount: self.amount,
        }
        .abi_encode()
        .into()
    }

    pub fn meta_transaction(&self) -> MetaTransaction {
        MetaTransaction {
            to: self.token.address,
            calldata: self.calldata(),
        }
    }
}

/// Submits token transfers through a connected wallet.
#[derive(Debug, Clone)]
pub struct PaymentSubmitter {
    fallback_decimals: u8,
}

impl Default for PaymentSubmitter {
    fn default() -> Self {
        Self {
            fallback_decimals: DEFAULT_TOKEN_DECIMALS,
        }
    }
}

impl PaymentSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decimals used for custom token addresses without a known deployment.
    pub fn with_fallback_decimals(mut self, decimals: u8) -> Self {
        self.fallback_decimals = decimals;
        self
    }

    /// Transfers `request.amount` of the token to `request.recipient` and waits
    /// for [`REQUIRED_CONFIRMATIONS`].
    ///
    /// `signer` is `None` when no wallet is connected.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "linguaframe.submit_payment",
            skip_all,
            fields(
                recipient = %request.recipient,
                amount = %request.amount,
                chain_id = request.chain_id
            )
        )
    )]
    pub async fn submit<W>(
        &self,
        request: &PaymentRequest,
        signer: Option<&SignerHandle<W>>,
    ) -> PaymentResult
    where
        W: TransactionSender + Send + Sync,
    {
        match self.try_submit(request, signer).await {
            Ok(result) => result,
            Err(error) => {
                #[cfg(feature = "telemetry")]
                warn!(error = %error, "Payment failed");
                error.into()
            }
        }
    }

    /// Checks `request` against the wallet and resolves what would be sent.
    pub fn prepare<W>(
        &self,
        request: &PaymentRequest,
        signer: Option<&SignerHandle<W>>,
    ) -> Result<PreparedTransfer, PaymentError>
    where
        W: TransactionSender + Send + Sync,
    {
        let signer = signer.ok_or(PaymentError::WalletNotConnected)?;
        if !signer.is_live() {
            return Err(PaymentError::WalletNotConnected);
        }

        let chain = Eip155ChainReference::new(request.chain_id);
        let wallet_chain = signer.chain();
        if chain != wallet_chain {
            return Err(PaymentError::InvalidInput(format!(
                "Wallet is connected to chain {wallet_chain}, payment targets chain {chain}"
            )));
        }

        let token = self.resolve_token(chain, request.token_address.as_deref())?;

        let recipient = Address::from_str(request.recipient.trim()).map_err(|_| {
            PaymentError::InvalidInput(format!("Invalid recipient address: {}", request.recipient))
        })?;

        let amount = token
            .parse(request.amount.as_str())
            .map_err(|e| PaymentError::InvalidInput(format!("Invalid amount: {e}")))?;

        Ok(PreparedTransfer {
            token,
            recipient,
            amount,
        })
    }

    fn resolve_token(
        &self,
        chain: Eip155ChainReference,
        token_address: Option<&str>,
    ) -> Result<Eip155TokenDeployment, PaymentError> {
        match token_address {
            None => usdc_on_chain(chain).ok_or_else(|| {
                PaymentError::InvalidInput(format!("No default token known for chain {chain}"))
            }),
            Some(raw) => {
                let address = Address::from_str(raw.trim()).map_err(|_| {
                    PaymentError::InvalidInput(format!("Invalid token address: {raw}"))
                })?;
                Ok(known_token(chain, address).unwrap_or(Eip155TokenDeployment {
                    chain_reference: chain,
                    address,
                    decimals: self.fallback_decimals,
                    eip712: None,
                }))
            }
        }
    }

    async fn try_submit<W>(
        &self,
        request: &PaymentRequest,
        signer: Option<&SignerHandle<W>>,
    ) -> Result<PaymentResult, PaymentError>
    where
        W: TransactionSender + Send + Sync,
    {
        let transfer = self.prepare(request, signer)?;
        let signer = signer.ok_or(PaymentError::WalletNotConnected)?;

        let tx_hash = signer
            .send_transaction(transfer.meta_transaction())
            .await
            .map_err(submission_error)?;

        #[cfg(feature = "telemetry")]
        info!(tx_hash = %tx_hash, "Payment submitted, waiting for confirmation");

        let receipt = signer
            .wait_for_receipt(tx_hash, REQUIRED_CONFIRMATIONS)
            .await
            .map_err(submission_error)?;

        if !receipt.success {
            return Err(PaymentError::SubmissionFailure(format!(
                "Transaction reverted: {}",
                receipt.transaction_hash
            )));
        }

        #[cfg(feature = "telemetry")]
        info!(tx_hash = %receipt.transaction_hash, block = ?receipt.block_number, "Payment confirmed");

        Ok(PaymentResult::success(
            receipt.transaction_hash.to_string(),
            REQUIRED_CONFIRMATIONS,
        ))
    }
}

fn submission_error(error: WalletError) -> PaymentError {
    match error {
        WalletError::NotConnected => PaymentError::WalletNotConnected,
        other => PaymentError::submission_failure(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::SignerLike;
    use crate::wallet::{TransferReceipt, WalletSession};
    use alloy_primitives::{B256, Signature, address};
    use alloy_signer_local::PrivateKeySigner;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    const RECIPIENT: &str = "0x209693Bc6afc0C5328bA36FaF03C514EF312287C";

    #[derive(Clone, Copy)]
    enum Outcome {
        Confirmed,
        Reverted,
        Rejected,
        TimedOut,
    }

    /// In-memory wallet recording what it was asked to send.
    struct MockWallet {
        signer: PrivateKeySigner,
        chain: Eip155ChainReference,
        outcome: Outcome,
        sent: Arc<Mutex<Vec<MetaTransaction>>>,
        awaited: Mutex<Vec<(B256, u64)>>,
    }

    impl MockWallet {
        fn new(outcome: Outcome) -> Self {
            Self {
                signer: PrivateKeySigner::random(),
                chain: Eip155ChainReference::new(8453),
                outcome,
                sent: Arc::new(Mutex::new(Vec::new())),
                awaited: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SignerLike for MockWallet {
        fn address(&self) -> Address {
            self.signer.address()
        }

        async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error> {
            SignerLike::sign_hash(&self.signer, hash).await
        }
    }

    #[async_trait]
    impl TransactionSender for MockWallet {
        fn chain(&self) -> Eip155ChainReference {
            self.chain
        }

        async fn send_transaction(&self, tx: MetaTransaction) -> Result<B256, WalletError> {
            if let Outcome::Rejected = self.outcome {
                return Err(WalletError::Custom("User rejected the request.".into()));
            }
            self.sent.lock().unwrap().push(tx);
            Ok(B256::repeat_byte(0xab))
        }

        async fn wait_for_receipt(
            &self,
            tx_hash: B256,
            confirmations: u64,
        ) -> Result<TransferReceipt, WalletError> {
            self.awaited.lock().unwrap().push((tx_hash, confirmations));
            match self.outcome {
                Outcome::TimedOut => Err(WalletError::Custom("receipt timed out".into())),
                Outcome::Reverted => Ok(TransferReceipt {
                    transaction_hash: tx_hash,
                    success: false,
                    block_number: Some(10),
                }),
                _ => Ok(TransferReceipt {
                    transaction_hash: tx_hash,
                    success: true,
                    block_number: Some(10),
                }),
            }
        }
    }

    fn session(outcome: Outcome) -> WalletSession<MockWallet> {
        WalletSession::connected(MockWallet::new(outcome))
    }

    fn sent(handle: &SignerHandle<MockWallet>) -> Vec<MetaTransaction> {
        handle.wallet().unwrap().sent.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_one_usdc_is_one_million_units() {
        let session = session(Outcome::Confirmed);
        let handle = session.signer().unwrap();
        let request = PaymentRequest::new("1", RECIPIENT, 8453);

        let result = PaymentSubmitter::new().submit(&request, Some(&handle)).await;
        assert!(result.is_success(), "{result:?}");

        let sent = sent(&handle);
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].to,
            address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913")
        );
        let call = IERC20::transferCall::abi_decode(&sent[0].calldata).unwrap();
        assert_eq!(call.to, address!("0x209693Bc6afc0C5328bA36FaF03C514EF312287C"));
        assert_eq!(call.amount, U256::from(1_000_000u64));
    }

    #[tokio::test]
    async fn test_success_reports_one_confirmation() {
        let session = session(Outcome::Confirmed);
        let handle = session.signer().unwrap();
        let request = PaymentRequest::new("0.25", RECIPIENT, 8453);

        let result = PaymentSubmitter::new().submit(&request, Some(&handle)).await;
        assert_eq!(result.confirmations(), Some(1));
        let hash = result.transaction_hash().unwrap();
        assert_eq!(hash, B256::repeat_byte(0xab).to_string());
        let awaited = handle.wallet().unwrap().awaited.lock().unwrap().clone();
        assert_eq!(awaited, vec![(B256::repeat_byte(0xab), 1)]);
    }

    #[tokio::test]
    async fn test_no_wallet() {
        let request = PaymentRequest::new("1", RECIPIENT, 8453);
        let result = PaymentSubmitter::new()
            .submit::<MockWallet>(&request, None)
            .await;
        assert_eq!(result, PaymentResult::failure("Wallet not connected"));
    }

    #[tokio::test]
    async fn test_stale_handle() {
        let wallet = MockWallet::new(Outcome::Confirmed);
        let log = wallet.sent.clone();
        let session = WalletSession::connected(wallet);
        let handle = session.signer().unwrap();
        session.disconnect();

        let request = PaymentRequest::new("1", RECIPIENT, 8453);
        let result = PaymentSubmitter::new().submit(&request, Some(&handle)).await;
        assert_eq!(result.error(), Some("Wallet not connected"));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_garbage_amount_never_reaches_the_wallet() {
        let session = session(Outcome::Confirmed);
        let handle = session.signer().unwrap();
        let request = PaymentRequest::new("abc", RECIPIENT, 8453);

        let submitter = PaymentSubmitter::new();
        assert!(matches!(
            submitter.prepare(&request, Some(&handle)),
            Err(PaymentError::InvalidInput(_))
        ));
        let result = submitter.submit(&request, Some(&handle)).await;
        assert_eq!(result.error(), Some("Invalid amount: Invalid number format"));
        assert!(sent(&handle).is_empty());
    }

    #[tokio::test]
    async fn test_comma_amount_is_rejected_not_rescaled() {
        let session = session(Outcome::Confirmed);
        let handle = session.signer().unwrap();
        let submitter = PaymentSubmitter::new();

        for amount in ["1,5", "1,000"] {
            let request = PaymentRequest::new(amount, RECIPIENT, 8453);
            assert!(matches!(
                submitter.prepare(&request, Some(&handle)),
                Err(PaymentError::InvalidInput(_))
            ));
            let result = submitter.submit(&request, Some(&handle)).await;
            assert_eq!(result.error(), Some("Invalid amount: Invalid number format"));
        }
        assert!(sent(&handle).is_empty());
    }

    #[tokio::test]
    async fn test_invalid_inputs() {
        let session = session(Outcome::Confirmed);
        let handle = session.signer().unwrap();
        let submitter = PaymentSubmitter::new();

        let cases = [
            (PaymentRequest::new("1", "", 8453), "Invalid recipient address: "),
            (PaymentRequest::new("1", "0x1234", 8453), "Invalid recipient address: 0x1234"),
            (
                PaymentRequest::new("0.0000001", RECIPIENT, 8453),
                "Invalid amount: Too big of a precision: 7 vs 6 on token",
            ),
            (PaymentRequest::new("-1", RECIPIENT, 8453), "Invalid amount: Negative value is not allowed"),
            (
                PaymentRequest::new("1", RECIPIENT, 8453).with_token("usdc"),
                "Invalid token address: usdc",
            ),
            (
                PaymentRequest::new("1", RECIPIENT, 84532),
                "Wallet is connected to chain 8453, payment targets chain 84532",
            ),
        ];
        for (request, expected) in cases {
            let result = submitter.submit(&request, Some(&handle)).await;
            assert_eq!(result.error(), Some(expected));
        }
        assert!(sent(&handle).is_empty());
    }

    #[tokio::test]
    async fn test_custom_token_uses_fallback_decimals() {
        let session = session(Outcome::Confirmed);
        let handle = session.signer().unwrap();
        let token = "0x4200000000000000000000000000000000000006";
        let request = PaymentRequest::new("2", RECIPIENT, 8453).with_token(token);

        let submitter = PaymentSubmitter::new().with_fallback_decimals(18);
        let prepared = submitter.prepare(&request, Some(&handle)).unwrap();
        assert_eq!(prepared.token.address, token.parse::<Address>().unwrap());
        assert_eq!(prepared.amount, U256::from(2) * U256::from(10).pow(U256::from(18)));

        let default_decimals = PaymentSubmitter::new()
            .prepare(&request, Some(&handle))
            .unwrap();
        assert_eq!(default_decimals.amount, U256::from(2_000_000u64));
    }

    #[tokio::test]
    async fn test_zero_amount_is_allowed() {
        let session = session(Outcome::Confirmed);
        let handle = session.signer().unwrap();
        let request = PaymentRequest::new("0", RECIPIENT, 8453);
        let prepared = PaymentSubmitter::new()
            .prepare(&request, Some(&handle))
            .unwrap();
        assert_eq!(prepared.amount, U256::ZERO);
    }

    #[tokio::test]
    async fn test_reverted_transaction() {
        let session = session(Outcome::Reverted);
        let handle = session.signer().unwrap();
        let request = PaymentRequest::new("1", RECIPIENT, 8453);

        let result = PaymentSubmitter::new().submit(&request, Some(&handle)).await;
        assert!(!result.is_success());
        assert_eq!(
            result.error().unwrap(),
            format!("Transaction reverted: {}", B256::repeat_byte(0xab))
        );
    }

    #[tokio::test]
    async fn test_rejected_and_timed_out() {
        let request = PaymentRequest::new("1", RECIPIENT, 8453);

        let rejected = session(Outcome::Rejected);
        let result = PaymentSubmitter::new()
            .submit(&request, rejected.signer().as_ref())
            .await;
        assert_eq!(result.error(), Some("User rejected the request."));

        let timed_out = session(Outcome::TimedOut);
        let result = PaymentSubmitter::new()
            .submit(&request, timed_out.signer().as_ref())
            .await;
        assert_eq!(result.error(), Some("receipt timed out"));
    }
}
