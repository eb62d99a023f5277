//! Base64 payloads carried in x402 HTTP headers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::fmt::Display;

/// Bytes holding base64 text, borrowed from a header or owned after encoding.
///
/// ```rust
/// use linguaframe_types::util::Base64Bytes;
///
/// let encoded = Base64Bytes::encode(b"hello world");
/// assert_eq!(encoded.to_string(), "aGVsbG8gd29ybGQ=");
/// assert_eq!(encoded.decode().unwrap(), b"hello world");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Bytes<'a>(pub Cow<'a, [u8]>);

impl Base64Bytes<'_> {
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        b64.decode(&self.0)
    }

    pub fn encode<T: AsRef<[u8]>>(input: T) -> Base64Bytes<'static> {
        let encoded = b64.encode(input.as_ref());
        Base64Bytes(Cow::Owned(encoded.into_bytes()))
    }

    /// Serializes `value` to JSON and base64-encodes it.
    pub fn encode_json<T: Serialize>(value: &T) -> Result<Base64Bytes<'static>, serde_json::Error> {
        let json = serde_json::to_vec(value)?;
        Ok(Self::encode(json))
    }

    /// Decodes base64 then parses the JSON inside. `None` on either failure.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Option<T> {
        let bytes = self.decode().ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

impl AsRef<[u8]> for Base64Bytes<'_> {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl<'a> From<&'a [u8]> for Base64Bytes<'a> {
    fn from(slice: &'a [u8]) -> Self {
        Base64Bytes(Cow::Borrowed(slice))
    }
}

impl Display for Base64Bytes<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.0.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_through_base64() {
        let value = json!({ "success": true, "transaction": "0xabc" });
        let encoded = Base64Bytes::encode_json(&value).unwrap();
        let decoded: serde_json::Value = encoded.decode_json().unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_decode_json_rejects_garbage() {
        let garbage = Base64Bytes::from(&b"%%%not-base64"[..]);
        assert!(garbage.decode_json::<serde_json::Value>().is_none());
    }
}
