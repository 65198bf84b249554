use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use sha2::{Digest, Sha256};

/// Width of a function selector in bytes.
pub const SELECTOR_WIDTH: usize = 4;

/// Canonical signature reserved for the fallback/receive entry point.
///
/// The zero selector is never produced by hashing; it is a protocol-level
/// convention that pairs only with this fixed signature.
pub const RECEIVE_SIGNATURE: &str = "receive";

/// Fixed-width routing key derived from a function's canonical signature.
///
/// Selectors are compared, hashed, and ordered by their raw bytes, and render
/// as `0x`-prefixed lowercase hex in logs and serialized forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Selector([u8; SELECTOR_WIDTH]);

impl Selector {
    /// The reserved all-zero selector denoting the fallback/receive entry
    /// point.
    pub const ZERO: Selector = Selector([0; SELECTOR_WIDTH]);

    /// Build a selector from raw bytes.
    pub const fn from_bytes(bytes: [u8; SELECTOR_WIDTH]) -> Self {
        Selector(bytes)
    }

    /// Derive the selector for a canonical signature: the first
    /// [`SELECTOR_WIDTH`] bytes of its SHA-256 digest.
    pub fn derive(signature: &str) -> Self {
        let digest = Sha256::digest(signature.as_bytes());
        let mut bytes = [0u8; SELECTOR_WIDTH];
        bytes.copy_from_slice(&digest[..SELECTOR_WIDTH]);
        Selector(bytes)
    }

    /// Raw selector bytes.
    pub const fn as_bytes(&self) -> &[u8; SELECTOR_WIDTH] {
        &self.0
    }

    /// Whether this is the reserved fallback/receive selector.
    pub const fn is_zero(&self) -> bool {
        matches!(self.0, [0, 0, 0, 0])
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Error parsing a selector from its `0x`-prefixed hex form.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid selector '{input}': {reason}")]
pub struct ParseSelectorError {
    input: String,
    reason: &'static str,
}

impl ParseSelectorError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

impl FromStr for Selector {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("0x")
            .ok_or_else(|| ParseSelectorError::new(s, "missing 0x prefix"))?;
        if hex.len() != SELECTOR_WIDTH * 2 {
            return Err(ParseSelectorError::new(s, "expected 8 hex digits"));
        }
        let mut bytes = [0u8; SELECTOR_WIDTH];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk)
                .map_err(|_| ParseSelectorError::new(s, "not valid hex"))?;
            bytes[i] = u8::from_str_radix(pair, 16)
                .map_err(|_| ParseSelectorError::new(s, "not valid hex"))?;
        }
        Ok(Selector(bytes))
    }
}

impl Serialize for Selector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        let a = Selector::derive("foo()");
        let b = Selector::derive("foo()");
        assert_eq!(a, b);

        let c = Selector::derive("bar()");
        assert_ne!(a, c);
    }

    #[test]
    fn test_derived_selectors_are_not_zero() {
        assert!(!Selector::derive("foo()").is_zero());
        assert!(!Selector::derive(RECEIVE_SIGNATURE).is_zero());
    }

    #[test]
    fn test_zero_selector() {
        assert!(Selector::ZERO.is_zero());
        assert_eq!(Selector::ZERO.to_string(), "0x00000000");
    }

    #[test]
    fn test_display_and_parse_round_trip() {
        let selector = Selector::derive("transfer(address,uint256)");
        let text = selector.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.len(), 10);
        assert_eq!(text.parse::<Selector>().unwrap(), selector);
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!("deadbeef".parse::<Selector>().is_err());
        assert!("0xdead".parse::<Selector>().is_err());
        assert!("0xdeadbeefaa".parse::<Selector>().is_err());
        assert!("0xzzzzzzzz".parse::<Selector>().is_err());
    }

    #[test]
    fn test_serde_uses_textual_form() {
        let selector = Selector::from_bytes([0xde, 0xad, 0xbe, 0xef]);
        let json = serde_json::to_string(&selector).unwrap();
        assert_eq!(json, "\"0xdeadbeef\"");

        let back: Selector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, selector);
    }
}
