use serde::{Serialize, Serializer};
use std::fmt;
use crate::error::ValidationError;

/// Segment that must follow the first `.` of an ENS name
pub const ENS_SUFFIX: &str = "eth";

/// Shortest acceptable ENS name: three characters, the dot, and `eth`
pub const MIN_ENS_LENGTH: usize = 7;

/// Length of a `0x`-prefixed Ethereum address
pub const PREFIXED_ADDRESS_LENGTH: usize = 42;

/// Length of an Ethereum address without its prefix
pub const BARE_ADDRESS_LENGTH: usize = 40;

/// A wallet owner in the one canonical form the provider is queried with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// Hexadecimal account address, always `0x`-prefixed
    Hex(String),
    /// ENS name, passed through unchanged
    Ens(String),
}

impl Address {
    pub fn as_str(&self) -> &str {
        match self {
            Address::Hex(value) | Address::Ens(value) => value,
        }
    }

    pub fn is_ens(&self) -> bool {
        matches!(self, Address::Ens(_))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Validate a user-supplied wallet address or ENS name.
///
/// Hex input of 42 characters is returned as is, 40 characters gets the `0x`
/// prefix added. Anything else must look like an ENS name: at least
/// `MIN_ENS_LENGTH` characters with `eth` after the first dot.
pub fn validate_address(input: &str) -> Result<Address, ValidationError> {
    let candidate = input.trim();
    if candidate.is_empty() {
        return Err(ValidationError::InvalidAddress("empty input".to_string()));
    }

    if is_hexadecimal(candidate) {
        let has_prefix = has_hex_prefix(candidate);
        match candidate.len() {
            PREFIXED_ADDRESS_LENGTH => return Ok(Address::Hex(candidate.to_string())),
            BARE_ADDRESS_LENGTH if !has_prefix => {
                return Ok(Address::Hex(format!("0x{}", candidate)));
            }
            _ => log::debug!("Hex input {} has the wrong length, trying ENS rules", candidate),
        }
    }

    if is_ens_name(candidate) {
        Ok(Address::Ens(candidate.to_string()))
    } else {
        Err(ValidationError::InvalidAddress(candidate.to_string()))
    }
}

/// True if the string parses as a base-16 number, with or without a `0x` prefix
pub fn is_hexadecimal(value: &str) -> bool {
    let digits = if has_hex_prefix(value) { &value[2..] } else { value };
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit())
}

fn has_hex_prefix(value: &str) -> bool {
    value.starts_with("0x") || value.starts_with("0X")
}

fn is_ens_name(value: &str) -> bool {
    // Emoji labels are allowed, so length is counted in characters
    if value.chars().count() < MIN_ENS_LENGTH {
        return false;
    }

    matches!(value.split('.').nth(1), Some(ENS_SUFFIX))
}
