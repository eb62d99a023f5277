//! The payment desk: what the app's pay button and paid requests go through.
//!
//! Holds the wallet session, allows one direct payment at a time, and keeps
//! the last result around for display.

use alloy_primitives::Address;
use linguaframe_chain_eip155::wallet::TransactionSender;
use linguaframe_chain_eip155::{PaymentSubmitter, WalletSession};
use linguaframe_reqwest::{ClientOptions, PaidRequestClient, create_client};
use linguaframe_types::payment::{PaymentError, PaymentRequest, PaymentResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

pub const PAYMENT_IN_PROGRESS: &str = "Payment already in progress";

pub struct PaymentDesk<W> {
    session: Arc<WalletSession<W>>,
    submitter: PaymentSubmitter,
    client_options: ClientOptions,
    is_processing: AtomicBool,
    last_payment: RwLock<Option<PaymentResult>>,
}

impl<W> std::fmt::Debug for PaymentDesk<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentDesk")
            .field("session", &self.session)
            .field("is_processing", &self.is_processing())
            .finish_non_exhaustive()
    }
}

/// Clears the processing flag however the submission ends, including when
/// its future is dropped.
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<W> PaymentDesk<W> {
    pub fn new(session: Arc<WalletSession<W>>) -> Self {
        Self {
            session,
            submitter: PaymentSubmitter::default(),
            client_options: ClientOptions::default(),
            is_processing: AtomicBool::new(false),
            last_payment: RwLock::new(None),
        }
    }

    pub fn with_submitter(mut self, submitter: PaymentSubmitter) -> Self {
        self.submitter = submitter;
        self
    }

    pub fn with_client_options(mut self, client_options: ClientOptions) -> Self {
        self.client_options = client_options;
        self
    }

    pub fn session(&self) -> &WalletSession<W> {
        &self.session
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing.load(Ordering::Acquire)
    }

    pub fn last_payment(&self) -> Option<PaymentResult> {
        self.last_payment
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }
}

impl<W> PaymentDesk<W>
where
    W: TransactionSender + Send + Sync + 'static,
{
    pub fn address(&self) -> Option<Address> {
        self.session.address()
    }

    /// Submits a direct token transfer with the connected wallet.
    ///
    /// Without a wallet this fails immediately and leaves `last_payment` as it
    /// was. A second call while one is in flight is refused.
    pub async fn handle_payment(&self, request: &PaymentRequest) -> PaymentResult {
        let Some(signer) = self.session.signer() else {
            tracing::error!("Wallet not connected");
            return PaymentError::WalletNotConnected.into();
        };
        if self
            .is_processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return PaymentResult::failure(PAYMENT_IN_PROGRESS);
        }
        let _processing = ProcessingGuard(&self.is_processing);

        let result = self.submitter.submit(request, Some(&signer)).await;
        *self
            .last_payment
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(result.clone());
        result
    }

    /// A client that pays for `402` responses, or `None` without a wallet.
    pub fn create_client(&self) -> Option<PaidRequestClient> {
        let signer = self.session.signer();
        if signer.is_none() {
            tracing::error!("No wallet connected, cannot create a paid request client");
            return None;
        }
        create_client(signer.as_ref(), self.client_options.clone())
    }
}
