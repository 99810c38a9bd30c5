//! Identifiers used throughout the ledger.
//!
//! Property ids are external keys (zip code or property key), account ids are
//! 20-byte wallet addresses, and valuation correlation ids use UUIDv7 so
//! pending requests sort by issue time.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{RealtyError, Result};

// ---------------------------------------------------------------------------
// PropertyId
// ---------------------------------------------------------------------------

/// External identifier of a property pool (e.g., a postal code).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PropertyId(String);

impl PropertyId {
    /// Build a property id, rejecting empty or whitespace-only keys.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(RealtyError::InvalidPool {
                reason: "property id must not be empty".to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// A participant's wallet address (creator or holder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 20]);

impl AccountId {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse a `0x`-prefixed (or bare) 40-character hex address.
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(digits).map_err(|e| RealtyError::Serialization(format!(
            "invalid account address {s}: {e}"
        )))?;
        let bytes: [u8; 20] = raw.try_into().map_err(|_| {
            RealtyError::Serialization(format!("account address {s} is not 20 bytes"))
        })?;
        Ok(Self(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// First four bytes, for compact log fields.
    #[must_use]
    pub fn short(&self) -> String {
        format!("0x{}", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Random addresses for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl AccountId {
    #[must_use]
    pub fn random() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 20];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

// ---------------------------------------------------------------------------
// CorrelationId
// ---------------------------------------------------------------------------

/// Opaque token linking a valuation request to its fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "val:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// One create → fully-settled cycle of a property id.
///
/// A pool id may be re-created once its current generation is fully
/// settled; the new pool gets the next generation number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    pub const FIRST: Self = Self(1);

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_id_trims_and_rejects_empty() {
        let id = PropertyId::new(" 94103 ").unwrap();
        assert_eq!(id.as_str(), "94103");
        assert!(matches!(
            PropertyId::new("   "),
            Err(RealtyError::InvalidPool { .. })
        ));
    }

    #[test]
    fn account_id_hex_parse_and_display() {
        let addr = "0x00112233445566778899aabbccddeeff00112233";
        let id = AccountId::from_hex(addr).unwrap();
        assert_eq!(id.to_string(), addr);
        assert_eq!(id.short(), "0x00112233");
        assert_eq!(AccountId::from_hex(&addr[2..]).unwrap(), id);
    }

    #[test]
    fn account_id_rejects_wrong_length() {
        assert!(AccountId::from_hex("0xdeadbeef").is_err());
        assert!(AccountId::from_hex("0xzz").is_err());
    }

    #[test]
    fn correlation_ids_are_unique_and_ordered() {
        let a = CorrelationId::new();
        let b = CorrelationId::new();
        assert_ne!(a, b);
        assert!(a < b);
        assert!(a.to_string().starts_with("val:"));
    }

    #[test]
    fn generation_next() {
        assert_eq!(Generation::FIRST.next(), Generation(2));
        assert_eq!(format!("{}", Generation(7)), "gen:7");
    }
}
