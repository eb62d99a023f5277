//! Configuration building blocks.
//!
//! [`LiteralOrEnv`] lets a JSON config file hold either a value or a reference to
//! an environment variable, so private keys stay out of the file:
//!
//! ```json
//! {
//!   "rpc": [{ "http": "https://mainnet.base.org" }],
//!   "signer": "$EVM_PRIVATE_KEY"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use url::Url;

/// A single JSON-RPC endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcConfig {
    pub http: Url,
}

/// A value given literally or as `$VAR` / `${VAR}`, resolved while deserializing.
#[derive(Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(T);

impl<T> LiteralOrEnv<T> {
    pub fn inner(&self) -> &T {
        &self.0
    }

    /// Returns the variable name if `s` is `$VAR` or `${VAR}`.
    fn parse_env_var_syntax(s: &str) -> Option<&str> {
        if let Some(braced) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
            Some(braced)
        } else {
            let var_name = s.strip_prefix('$')?;
            let valid = !var_name.is_empty()
                && var_name.chars().all(|c| c.is_alphanumeric() || c == '_');
            valid.then_some(var_name)
        }
    }
}

impl<T: FromStr> LiteralOrEnv<T> {
    /// Reads and parses `var`, if it is set and non-empty.
    pub fn from_env(var: &str) -> Option<Self> {
        let value = std::env::var(var).ok().filter(|v| !v.is_empty())?;
        value.parse().ok().map(Self)
    }
}

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Values may be secrets; never print them.
impl<T> fmt::Debug for LiteralOrEnv<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LiteralOrEnv(..)")
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        let value = if let Some(var_name) = Self::parse_env_var_syntax(&s) {
            std::env::var(var_name).map_err(|_| {
                serde::de::Error::custom(format!(
                    "Environment variable '{}' not found (referenced as '{}')",
                    var_name, s
                ))
            })?
        } else {
            s
        };

        let parsed = value
            .parse::<T>()
            .map_err(|e| serde::de::Error::custom(format!("Failed to parse value: {}", e)))?;

        Ok(LiteralOrEnv(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_syntax() {
        assert_eq!(LiteralOrEnv::<String>::parse_env_var_syntax("$KEY"), Some("KEY"));
        assert_eq!(
            LiteralOrEnv::<String>::parse_env_var_syntax("${SOME_KEY}"),
            Some("SOME_KEY")
        );
        assert_eq!(LiteralOrEnv::<String>::parse_env_var_syntax("$"), None);
        assert_eq!(LiteralOrEnv::<String>::parse_env_var_syntax("$A-B"), None);
        assert_eq!(LiteralOrEnv::<String>::parse_env_var_syntax("plain"), None);
    }

    #[test]
    fn test_literal_value() {
        let value: LiteralOrEnv<u16> = serde_json::from_str("\"8080\"").unwrap();
        assert_eq!(*value, 8080);
    }

    #[test]
    fn test_missing_env_var_is_an_error() {
        let result: Result<LiteralOrEnv<String>, _> =
            serde_json::from_str("\"$LINGUAFRAME_TEST_SURELY_UNSET_VARIABLE\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_hides_value() {
        let secret: LiteralOrEnv<String> = serde_json::from_str("\"0xdeadbeef\"").unwrap();
        assert_eq!(format!("{secret:?}"), "LiteralOrEnv(..)");
    }
}
