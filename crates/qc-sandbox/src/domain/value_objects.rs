//! # Value Objects
//!
//! Immutable domain primitives for the ledger sandbox.
//! These types represent concepts that are defined by their value, not identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export U256 from primitive-types for coin arithmetic
pub use primitive_types::U256;

/// Coin amounts, in nano-units.
pub type Coins = U256;

/// Number of nano-units in one whole coin.
pub const NANO_PER_COIN: u64 = 1_000_000_000;

/// Converts whole coins into nano-units.
#[must_use]
pub fn to_nano(coins: u64) -> Coins {
    U256::from(coins) * U256::from(NANO_PER_COIN)
}

// =============================================================================
// HASH (32 bytes)
// =============================================================================

/// A 32-byte SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// The zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Creates a hash from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Creates a hash from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(slice).ok().map(Self)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", hex::encode(&self.0[..4]), hex::encode(&self.0[30..]))
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

// =============================================================================
// ADDRESS (workchain + 32-byte account id)
// =============================================================================

/// A standard account address: a workchain id and a 256-bit account id.
///
/// Only workchains that fit in a signed byte are well-formed. The textual form
/// is `"<workchain>:<64 hex digits>"`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address {
    /// Workchain id (`0` basechain, `-1` masterchain).
    pub workchain: i32,
    /// Account id within the workchain.
    pub hash: Hash,
}

impl Address {
    /// Creates an address. Well-formedness is checked separately, see
    /// [`Address::is_well_formed`].
    #[must_use]
    pub const fn new(workchain: i32, hash: Hash) -> Self {
        Self { workchain, hash }
    }

    /// Returns true if the workchain id fits the standard address layout.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        i8::try_from(self.workchain).is_ok()
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::new(0, Hash::ZERO)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.workchain, self.hash)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workchain, self.hash)
    }
}

/// Error returned when parsing an address from text fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed address: {0}")]
pub struct AddressParseError(pub String);

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (wc, id) = s
            .split_once(':')
            .ok_or_else(|| AddressParseError(format!("missing workchain separator in {s:?}")))?;
        let workchain: i8 = wc
            .parse()
            .map_err(|_| AddressParseError(format!("bad workchain {wc:?}")))?;
        let bytes = hex::decode(id).map_err(|e| AddressParseError(e.to_string()))?;
        let hash = Hash::from_slice(&bytes)
            .ok_or_else(|| AddressParseError(format!("account id is {} bytes", bytes.len())))?;
        Ok(Self::new(i32::from(workchain), hash))
    }
}

// =============================================================================
// LOGICAL TIME
// =============================================================================

/// Logical time of a delivered message.
///
/// Strictly increasing across deliveries on one simulator instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct LogicalTime(pub u64);

impl LogicalTime {
    /// The origin of logical time.
    pub const ZERO: Self = Self(0);

    /// Returns the raw counter value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for LogicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lt={}", self.0)
    }
}

impl fmt::Display for LogicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// TESTS
// =============================================================================
