//! Session-style account and group identifiers.
//!
//! An identifier is a hex string made of a one-byte type prefix followed by the
//! key bytes. Only the standard prefix carries a key we can encrypt for.

use std::fmt::Display;
use std::str::FromStr;

use libsecp256k1::PublicKey;
use serde::{Deserialize, Serialize};

/// Length in bytes of a compressed secp256k1 public key.
pub const COMPRESSED_KEY_LEN: usize = 33;

/// Hex length of a standard identifier (prefix byte + compressed key).
///
/// 68 characters, not the 66 of ed25519-based session ids: the key behind a
/// standard id here is a 33-byte compressed secp256k1 point.
pub const STANDARD_ID_HEX_LEN: usize = (COMPRESSED_KEY_LEN + 1) * 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("Identifier is not a standard account id: {0}")]
    NotStandard(String),
    #[error("Identifier does not hold a valid curve point: {0}")]
    InvalidCurvePoint(String),
}

/// The type tag carried by the first byte of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPrefix {
    /// `05`: regular account ids and legacy closed group ids.
    Standard,
    /// `03`: groups using the keyed group config protocol.
    KeyedGroup,
    /// `15`: community-blinded ids.
    Blinded15,
    /// `25`: community-blinded ids, newer scheme.
    Blinded25,
    Unknown(u8),
}

impl KeyPrefix {
    fn from_byte(byte: u8) -> Self {
        match byte {
            0x05 => KeyPrefix::Standard,
            0x03 => KeyPrefix::KeyedGroup,
            0x15 => KeyPrefix::Blinded15,
            0x25 => KeyPrefix::Blinded25,
            other => KeyPrefix::Unknown(other),
        }
    }
}

/// A hex identifier in canonical (lowercase, trimmed) form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PubKey(String);

impl PubKey {
    /// Parse an identifier string.
    ///
    /// Accepts any even-length hex string with at least a prefix byte; the
    /// prefix decides what the identifier may be used for.
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        let trimmed = raw.trim();
        if trimmed.len() < 2
            || trimmed.len() % 2 != 0
            || !trimmed.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(IdentityError::InvalidIdentifier(raw.to_string()));
        }
        Ok(PubKey(trimmed.to_ascii_lowercase()))
    }

    /// Build a standard identifier from a secp256k1 public key.
    pub fn from_public_key(key: &PublicKey) -> Self {
        PubKey(format!("05{}", hex::encode(key.serialize_compressed())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn prefix(&self) -> KeyPrefix {
        // parse() guarantees at least one full hex byte
        let byte = u8::from_str_radix(&self.0[..2], 16).unwrap_or_default();
        KeyPrefix::from_byte(byte)
    }

    /// True for non-blinded account ids of the expected length.
    pub fn is_standard(&self) -> bool {
        self.prefix() == KeyPrefix::Standard && self.0.len() == STANDARD_ID_HEX_LEN
    }

    pub fn is_keyed_group(&self) -> bool {
        self.prefix() == KeyPrefix::KeyedGroup
    }

    pub fn is_blinded(&self) -> bool {
        matches!(self.prefix(), KeyPrefix::Blinded15 | KeyPrefix::Blinded25)
    }

    /// Raw identifier bytes, prefix included.
    pub fn to_bytes(&self) -> Vec<u8> {
        hex::decode(&self.0).unwrap_or_default()
    }

    /// The secp256k1 key behind a standard identifier.
    pub fn to_public_key(&self) -> Result<PublicKey, IdentityError> {
        if !self.is_standard() {
            return Err(IdentityError::NotStandard(self.0.clone()));
        }
        let bytes = self.to_bytes();
        let mut compressed = [0u8; COMPRESSED_KEY_LEN];
        compressed.copy_from_slice(&bytes[1..]);
        PublicKey::parse_compressed(&compressed)
            .map_err(|_| IdentityError::InvalidCurvePoint(self.0.clone()))
    }
}

impl Display for PubKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PubKey {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PubKey::parse(s)
    }
}

impl TryFrom<String> for PubKey {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PubKey::parse(&value)
    }
}

impl From<PubKey> for String {
    fn from(key: PubKey) -> Self {
        key.0
    }
}

/// Parse a list of identifier strings, failing on the first invalid one.
pub fn parse_pubkeys<I, S>(raw: I) -> Result<Vec<PubKey>, IdentityError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter().map(|s| PubKey::parse(s.as_ref())).collect()
}
