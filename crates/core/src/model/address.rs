use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error raised when an address cell cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("empty address string")]
    Empty,
    #[error("invalid address '{value}': {reason}")]
    Invalid { value: String, reason: String },
    #[error("negative address {0}")]
    Negative(i64),
}

/// A virtual address as recorded by the capture tool.
///
/// Stored as `u128` so addresses from wide-capability architectures fit.
/// Serialized as its `0x` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub u128);

impl Address {
    pub fn new(value: u128) -> Self {
        Self(value)
    }

    pub fn value(self) -> u128 {
        self.0
    }

    /// Decode an address cell.
    ///
    /// `0x`/`0X` prefixed strings are hexadecimal, anything else is decimal.
    /// Surrounding whitespace is ignored.
    pub fn parse(text: &str) -> Result<Self, AddressError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }

        let (digits, radix) = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => (hex, 16),
            None => (trimmed, 10),
        };

        if digits.is_empty() {
            return Err(AddressError::Invalid {
                value: text.to_string(),
                reason: "missing digits after radix prefix".into(),
            });
        }
        // from_str_radix tolerates a leading '+'.
        if digits.starts_with(['+', '-']) {
            return Err(AddressError::Invalid {
                value: text.to_string(),
                reason: "signed address".into(),
            });
        }

        u128::from_str_radix(digits, radix).map(Address).map_err(|e| AddressError::Invalid {
            value: text.to_string(),
            reason: e.to_string(),
        })
    }

    /// Accept an SQLite INTEGER cell.
    pub fn from_i64(value: i64) -> Result<Self, AddressError> {
        u128::try_from(value).map(Address).map_err(|_| AddressError::Negative(value))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address(value as u128)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct AddressVisitor;

impl Visitor<'_> for AddressVisitor {
    type Value = Address;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an address string or non-negative integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Address, E> {
        Address::parse(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Address, E> {
        Ok(Address::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Address, E> {
        Address::from_i64(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AddressVisitor)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
