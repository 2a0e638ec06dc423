//! Arbitrary-precision bitfield accumulator
//!
//! Dex attributes grow past 64 bits once form indices are folded in, so the
//! accumulator is backed by `BigUint` rather than a fixed-width integer.

use num_bigint::BigUint;
use std::fmt;
use std::str::FromStr;

/// A set of independent flag bits of unbounded width
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Bitfield(BigUint);

impl Bitfield {
    /// Create an empty bitfield
    pub fn new() -> Self {
        Self(BigUint::default())
    }

    /// Create a bitfield from the low 64 bits
    pub fn from_u64(bits: u64) -> Self {
        Self(BigUint::from(bits))
    }

    /// Wrap an existing big integer
    pub fn from_biguint(bits: BigUint) -> Self {
        Self(bits)
    }

    /// Borrow the underlying big integer
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Unwrap into the underlying big integer
    pub fn into_biguint(self) -> BigUint {
        self.0
    }

    /// True when no bit is set
    pub fn is_empty(&self) -> bool {
        self.0.bits() == 0
    }

    /// Number of significant bits
    pub fn width(&self) -> u64 {
        self.0.bits()
    }

    /// Test a single bit
    pub fn has_bit(&self, bit: u64) -> bool {
        self.0.bit(bit)
    }

    /// Set a single bit
    pub fn set_bit(&mut self, bit: u64) {
        self.0.set_bit(bit, true);
    }

    /// Clear a single bit
    pub fn clear_bit(&mut self, bit: u64) {
        self.0.set_bit(bit, false);
    }

    /// True when any bit of `mask` is set
    pub fn intersects(&self, mask: u64) -> bool {
        (0..64).any(|bit| mask & (1 << bit) != 0 && self.0.bit(bit))
    }

    /// Set every bit of `mask`
    pub fn insert(&mut self, mask: u64) {
        self.0 |= BigUint::from(mask);
    }

    /// Clear every bit of `mask`
    pub fn remove(&mut self, mask: u64) {
        for bit in 0..64 {
            if mask & (1 << bit) != 0 {
                self.0.set_bit(bit, false);
            }
        }
    }

    /// Set every bit that is set in `other`
    pub fn union_with(&mut self, other: &Bitfield) {
        self.0 |= &other.0;
    }

    /// True when every bit of `other` is also set here
    pub fn is_superset_of(&self, other: &Bitfield) -> bool {
        (&self.0 & &other.0) == other.0
    }
}

impl fmt::Display for Bitfield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a decimal digit string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBitfieldError;

impl fmt::Display for ParseBitfieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bitfield must be a non-empty decimal digit string")
    }
}

impl std::error::Error for ParseBitfieldError {}

impl FromStr for Bitfield {
    type Err = ParseBitfieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseBitfieldError);
        }
        BigUint::parse_bytes(s.as_bytes(), 10)
            .map(Self)
            .ok_or(ParseBitfieldError)
    }
}

impl From<u64> for Bitfield {
    fn from(bits: u64) -> Self {
        Self::from_u64(bits)
    }
}
