//! The x402 middleware: scheme registry, payment selection and the one retry.

use http::{Extensions, HeaderMap, HeaderValue, StatusCode};
use linguaframe_types::proto;
use linguaframe_types::proto::{v1, v2};
use linguaframe_types::scheme::client::{
    FirstMatch, PaymentCandidate, PaymentSelector, X402Error, X402SchemeClient,
};
use linguaframe_types::util::Base64Bytes;
use reqwest::{Request, Response};
use reqwest_middleware as rqm;
use std::sync::Arc;

#[cfg(feature = "telemetry")]
use tracing::{debug, info, instrument, trace};

/// Answers `402 Payment Required` with a signed payment.
///
/// Register one [`X402SchemeClient`] per scheme/chain you can pay with. On a
/// `402`, every registered client offers candidates, the selector picks one,
/// and the request is retried once with the signed payment attached.
///
/// ```rust,ignore
/// use linguaframe_reqwest::X402Client;
/// use linguaframe_chain_eip155::Eip155ExactClient;
///
/// let client = X402Client::new().register(Eip155ExactClient::new(signer));
/// ```
pub struct X402Client<TSelector> {
    schemes: ClientSchemes,
    selector: TSelector,
}

impl X402Client<FirstMatch> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for X402Client<FirstMatch> {
    fn default() -> Self {
        Self {
            schemes: ClientSchemes::default(),
            selector: FirstMatch,
        }
    }
}

impl<TSelector> X402Client<TSelector> {
    /// Adds a scheme client. Earlier registrations win ties under [`FirstMatch`].
    pub fn register<S>(mut self, scheme: S) -> Self
    where
        S: X402SchemeClient + 'static,
    {
        self.schemes.push(scheme);
        self
    }

    /// Replaces the payment selector, e.g. with a spend cap.
    ///
    /// ```rust,ignore
    /// use linguaframe_types::scheme::client::MaxAmount;
    ///
    /// let client = X402Client::new().with_selector(MaxAmount(U256::from(50_000)));
    /// ```
    pub fn with_selector<P: PaymentSelector + 'static>(self, selector: P) -> X402Client<P> {
        X402Client {
            selector,
            schemes: self.schemes,
        }
    }
}

impl<TSelector> X402Client<TSelector>
where
    TSelector: PaymentSelector,
{
    /// Turns a `402` response into the headers for the paid retry.
    ///
    /// # Errors
    ///
    /// [`X402Error::ParseError`] if the terms cannot be read,
    /// [`X402Error::NoMatchingPaymentOption`] if nothing registered can pay,
    /// and signing errors from the chosen candidate.
    #[cfg_attr(feature = "telemetry", instrument(name = "linguaframe.reqwest.make_payment_headers", skip_all, err))]
    pub async fn make_payment_headers(&self, res: Response) -> Result<HeaderMap, X402Error> {
        let payment_required = parse_payment_required(res)
            .await
            .ok_or(X402Error::ParseError("Invalid 402 response".to_string()))?;
        let candidates = self.schemes.candidates(&payment_required);

        let selected = self
            .selector
            .select(&candidates)
            .ok_or(X402Error::NoMatchingPaymentOption)?;

        #[cfg(feature = "telemetry")]
        debug!(
            scheme = %selected.scheme,
            chain_id = %selected.chain_id,
            amount = %selected.amount,
            "Selected payment option"
        );

        let signed_payload = selected.sign().await?;
        let header_value = HeaderValue::from_str(&signed_payload)
            .map_err(|e| X402Error::ParseError(e.to_string()))?;
        let mut headers = HeaderMap::new();
        headers.insert(payment_required.payment_header(), header_value);
        Ok(headers)
    }
}

/// Registered scheme clients, in registration order.
#[derive(Default)]
pub struct ClientSchemes(Vec<Arc<dyn X402SchemeClient>>);

impl ClientSchemes {
    pub fn push<T: X402SchemeClient + 'static>(&mut self, client: T) {
        self.0.push(Arc::new(client));
    }

    pub fn candidates(&self, payment_required: &proto::PaymentRequired) -> Vec<PaymentCandidate> {
        self.0
            .iter()
            .flat_map(|client| client.accept(payment_required))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[async_trait::async_trait]
impl<TSelector> rqm::Middleware for X402Client<TSelector>
where
    TSelector: PaymentSelector + Send + Sync + 'static,
{
    /// Passes non-402 responses through; pays and retries exactly once otherwise.
    #[cfg_attr(feature = "telemetry", instrument(name = "linguaframe.reqwest.handle", skip_all, err))]
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: rqm::Next<'_>,
    ) -> rqm::Result<Response> {
        let retry_req = req.try_clone();
        let res = next.clone().run(req, extensions).await?;

        if res.status() != StatusCode::PAYMENT_REQUIRED {
            #[cfg(feature = "telemetry")]
            trace!(status = ?res.status(), "No payment required");
            return Ok(res);
        }

        #[cfg(feature = "telemetry")]
        info!(url = %res.url(), "Received 402 Payment Required");

        let mut retry = retry_req.ok_or(rqm::Error::Middleware(
            X402Error::RequestNotCloneable.into(),
        ))?;
        let headers = self
            .make_payment_headers(res)
            .await
            .map_err(|e| rqm::Error::Middleware(e.into()))?;
        retry.headers_mut().extend(headers);

        #[cfg(feature = "telemetry")]
        trace!(url = %retry.url(), "Retrying with payment");

        next.run(retry, extensions).await
    }
}

/// Reads the payment terms of a `402`: the V2 header first, then a V1 body.
#[cfg_attr(feature = "telemetry", instrument(name = "linguaframe.reqwest.parse_payment_required", skip(response)))]
pub async fn parse_payment_required(response: Response) -> Option<proto::PaymentRequired> {
    let v2_payment_required = response
        .headers()
        .get(proto::PAYMENT_REQUIRED_HEADER)
        .and_then(|h| Base64Bytes::from(h.as_bytes()).decode_json::<v2::PaymentRequired>());
    if let Some(v2_payment_required) = v2_payment_required {
        #[cfg(feature = "telemetry")]
        debug!("Parsed V2 payment terms from header");
        return Some(proto::PaymentRequired::V2(v2_payment_required));
    }

    let v1_payment_required = response
        .bytes()
        .await
        .ok()
        .and_then(|b| serde_json::from_slice::<v1::PaymentRequired>(&b).ok());
    if let Some(v1_payment_required) = v1_payment_required {
        #[cfg(feature = "telemetry")]
        debug!("Parsed V1 payment terms from body");
        return Some(proto::PaymentRequired::V1(v1_payment_required));
    }

    #[cfg(feature = "telemetry")]
    debug!("Could not parse payment terms");

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(builder: http::response::Builder, body: &str) -> Response {
        Response::from(builder.body(body.to_string()).unwrap())
    }

    #[tokio::test]
    async fn test_parse_v2_header_before_body() {
        let terms = json!({
            "x402Version": 2,
            "resource": { "url": "https://api.example.com/translate" },
            "accepts": []
        });
        let header = Base64Bytes::encode_json(&terms).unwrap().to_string();
        let res = response(
            http::Response::builder()
                .status(402)
                .header(proto::PAYMENT_REQUIRED_HEADER, header),
            r#"{"x402Version":1,"accepts":[]}"#,
        );
        let parsed = parse_payment_required(res).await.unwrap();
        assert_eq!(parsed.x402_version(), 2);
    }

    #[tokio::test]
    async fn test_parse_v1_body() {
        let res = response(
            http::Response::builder().status(402),
            r#"{"x402Version":1,"error":"X-PAYMENT header is required","accepts":[]}"#,
        );
        let parsed = parse_payment_required(res).await.unwrap();
        assert_eq!(parsed.x402_version(), 1);
        assert_eq!(parsed.error(), Some("X-PAYMENT header is required"));
    }

    #[tokio::test]
    async fn test_parse_garbage() {
        let res = response(http::Response::builder().status(402), "Payment Required");
        assert!(parse_payment_required(res).await.is_none());
    }

    #[tokio::test]
    async fn test_no_registered_scheme_cannot_pay() {
        let client = X402Client::new();
        assert!(client.schemes.is_empty());
        let res = response(
            http::Response::builder().status(402),
            r#"{"x402Version":1,"accepts":[]}"#,
        );
        let error = client.make_payment_headers(res).await.unwrap_err();
        assert!(matches!(error, X402Error::NoMatchingPaymentOption));
    }
}
