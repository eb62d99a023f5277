//! The paid-request client handed out to application code.
//!
//! [`create_client`] wires a connected [`SignerHandle`] into an [`X402Client`]
//! and a reqwest client with a fixed timeout. Every failure, including a
//! non-2xx status after the paid retry, comes back as a [`PaymentError`].

use http::{HeaderMap, Method, StatusCode};
use linguaframe_chain_eip155::{Eip155ExactClient, SignerHandle, SignerLike};
use linguaframe_types::payment::PaymentError;
use linguaframe_types::proto::{PAYMENT_RESPONSE_HEADER, SettlementResponse, X_PAYMENT_RESPONSE_HEADER};
use reqwest_middleware as rqm;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::client::X402Client;

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Relative request paths are appended to this.
    pub base_url: Option<Url>,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl ClientOptions {
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Builds a paying HTTP client for the connected wallet.
///
/// `None` when there is no signer, the handle has gone stale, or the HTTP
/// client cannot be constructed.
pub fn create_client<W>(
    signer: Option<&SignerHandle<W>>,
    options: ClientOptions,
) -> Option<PaidRequestClient>
where
    W: SignerLike + Send + Sync + 'static,
{
    let signer = signer.filter(|handle| handle.is_live())?.clone();
    let liveness = signer.clone();
    let x402_client = X402Client::new().register(Eip155ExactClient::new(signer));
    let inner = reqwest::Client::builder()
        .timeout(options.timeout)
        .build()
        .map_err(|_e| {
            #[cfg(feature = "telemetry")]
            tracing::error!(error = %_e, "Failed to build HTTP client");
        })
        .ok()?;
    let http = rqm::ClientBuilder::new(inner).with(x402_client).build();
    Some(PaidRequestClient {
        http,
        base_url: options.base_url,
        is_live: Arc::new(move || liveness.is_live()),
    })
}

/// HTTP client that pays for `402` responses with the session's wallet.
#[derive(Clone)]
pub struct PaidRequestClient {
    http: rqm::ClientWithMiddleware,
    base_url: Option<Url>,
    is_live: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl fmt::Debug for PaidRequestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaidRequestClient")
            .field("base_url", &self.base_url)
            .field("live", &(self.is_live)())
            .finish_non_exhaustive()
    }
}

impl PaidRequestClient {
    pub async fn get(&self, url: &str) -> Result<PaidResponse, PaymentError> {
        self.send(self.request(Method::GET, url)?).await
    }

    pub async fn post<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<PaidResponse, PaymentError> {
        self.send(self.request(Method::POST, url)?.json(body)).await
    }

    pub fn request(&self, method: Method, url: &str) -> Result<rqm::RequestBuilder, PaymentError> {
        Ok(self.http.request(method, self.resolve_url(url)?))
    }

    /// Sends a prepared request; any non-2xx final status is a failure.
    #[cfg_attr(feature = "telemetry", instrument(name = "linguaframe.paid_request", skip_all, err))]
    pub async fn send(&self, request: rqm::RequestBuilder) -> Result<PaidResponse, PaymentError> {
        if !(self.is_live)() {
            return Err(PaymentError::WalletNotConnected);
        }
        let response = request.send().await.map_err(PaymentError::request_failure)?;
        let status = response.status();
        if !status.is_success() {
            return Err(PaymentError::request_failure(format!(
                "Request failed with status code {}",
                status.as_u16()
            )));
        }
        let settlement = settlement_from_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(PaymentError::request_failure)?
            .to_vec();
        Ok(PaidResponse {
            status,
            body,
            settlement,
        })
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    fn resolve_url(&self, url: &str) -> Result<Url, PaymentError> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute);
        }
        let base = self.base_url.as_ref().ok_or_else(|| {
            PaymentError::invalid_input(format!("Invalid URL: {url} (no API base URL configured)"))
        })?;
        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            url.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| PaymentError::invalid_input(format!("Invalid URL: {e}")))
    }
}

/// A successful response, possibly paid for.
#[derive(Debug, Clone)]
pub struct PaidResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
    /// Present when the server settled a payment for this request.
    pub settlement: Option<SettlementResponse>,
}

impl PaidResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

fn settlement_from_headers(headers: &HeaderMap) -> Option<SettlementResponse> {
    headers
        .get(PAYMENT_RESPONSE_HEADER)
        .or_else(|| headers.get(X_PAYMENT_RESPONSE_HEADER))
        .and_then(|value| SettlementResponse::from_header(value.as_bytes()))
}
