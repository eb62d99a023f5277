//! Payment schemes.
//!
//! A scheme is a way of paying on a family of chains, e.g. `exact` on `eip155`.
//! Chain crates implement [`client::X402SchemeClient`] for the schemes they can sign.

pub mod client;

/// Identifies which protocol version, chain namespace and scheme a handler serves.
pub trait X402SchemeId {
    fn x402_version(&self) -> u8 {
        2
    }

    /// CAIP-2 namespace, e.g. `"eip155"`.
    fn namespace(&self) -> &str;

    /// Scheme name, e.g. `"exact"`.
    fn scheme(&self) -> &str;

    /// `v2-eip155-exact` style slug, used in logs.
    fn id(&self) -> String {
        format!(
            "v{}-{}-{}",
            self.x402_version(),
            self.namespace(),
            self.scheme()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Exact;

    impl X402SchemeId for Exact {
        fn namespace(&self) -> &str {
            "eip155"
        }

        fn scheme(&self) -> &str {
            "exact"
        }
    }

    #[test]
    fn test_scheme_id_slug() {
        assert_eq!(Exact.id(), "v2-eip155-exact");
    }
}
