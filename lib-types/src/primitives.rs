//! Canonical Primitive Types for the Stream Engine
//!
//! Rule: No String identifiers in engine state. Ever.
//!
//! These types are the foundational building blocks for all stream-engine
//! data structures. They are designed to be:
//! - Fixed-size (no dynamic allocation)
//! - Deterministically serializable
//! - Efficient to copy and compare

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TYPE ALIASES
// ============================================================================

/// Token amounts in the asset's base unit
pub type Amount = u64;

/// Unix timestamp in whole seconds
pub type UnixTimestamp = i64;

/// Registry-assigned stream index (0-indexed, monotonically increasing)
pub type StreamIndex = u64;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// 32-byte principal address (derived from public key)
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// Create a new Address from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a zeroed Address
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ============================================================================
// TOKEN TYPES
// ============================================================================

/// 32-byte token mint identifier
///
/// Opaque to the engine: it is carried, compared, and displayed but never
/// inspected.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default)]
pub struct TokenId(pub [u8; 32]);

impl TokenId {
    /// Create a new TokenId from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a zeroed TokenId
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero token id
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for TokenId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for TokenId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_basics() {
        let addr = Address::new([3u8; 32]);
        assert!(!addr.is_zero());
        assert_eq!(addr.as_bytes(), &[3u8; 32]);

        let zero = Address::zero();
        assert!(zero.is_zero());
    }

    #[test]
    fn test_token_id_basics() {
        let token = TokenId::new([7u8; 32]);
        assert!(!token.is_zero());
        assert_eq!(token.as_bytes(), &[7u8; 32]);

        assert!(TokenId::zero().is_zero());
    }

    #[test]
    fn test_display_is_full_hex() {
        let addr = Address::new([0xabu8; 32]);
        assert_eq!(format!("{}", addr), "ab".repeat(32));
    }

    #[test]
    fn test_debug_is_truncated_hex() {
        let token = TokenId::new([0x01u8; 32]);
        assert_eq!(format!("{:?}", token), "TokenId(0101010101010101)");
    }

    #[test]
    fn test_serialization_roundtrip() {
        let addr = Address::new([42u8; 32]);
        let serialized = bincode::serialize(&addr).unwrap();
        let deserialized: Address = bincode::deserialize(&serialized).unwrap();
        assert_eq!(addr, deserialized);

        let token = TokenId::new([9u8; 32]);
        let serialized = bincode::serialize(&token).unwrap();
        let deserialized: TokenId = bincode::deserialize(&serialized).unwrap();
        assert_eq!(token, deserialized);
    }

    #[test]
    fn test_from_array() {
        let bytes = [5u8; 32];
        let addr: Address = bytes.into();
        assert_eq!(addr.0, bytes);

        let token: TokenId = bytes.into();
        assert_eq!(token.0, bytes);
    }
}
