//! The shared encryption key pair of a legacy closed group.

use libsecp256k1::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};

use super::error::{CryptoError, Result};

/// A group encryption key pair.
///
/// Always generated fresh; never derived from a previous pair.
#[derive(Clone)]
pub struct GroupKeyPair {
    public_key: PublicKey,
    secret_key: SecretKey,
}

/// Hex form used by key pair stores.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexKeyPair {
    pub public_hex: String,
    pub private_hex: String,
}

/// Raw bytes carried by control messages that ship a key pair in the clear
/// (the transport encrypts those messages per recipient).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPairBytes {
    pub public_key: Vec<u8>,
    pub private_key: Vec<u8>,
}

impl GroupKeyPair {
    pub fn generate() -> Self {
        let secret_key = SecretKey::random(&mut rand::thread_rng());
        Self::from_secret(secret_key)
    }

    pub fn from_secret(secret_key: SecretKey) -> Self {
        Self {
            public_key: PublicKey::from_secret_key(&secret_key),
            secret_key,
        }
    }

    /// Rebuild a pair from its parts, checking that they belong together.
    pub fn from_parts(public_key: &[u8], private_key: &[u8]) -> Result<Self> {
        let secret_key = SecretKey::parse_slice(private_key)
            .map_err(|e| CryptoError::InvalidKey(format!("{e:?}")))?;
        let pair = Self::from_secret(secret_key);
        if pair.public_key_bytes().as_slice() != public_key {
            return Err(CryptoError::InvalidKey(
                "public key does not match private key".to_string(),
            ));
        }
        Ok(pair)
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.public_key.serialize_compressed()
    }

    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.secret_key.serialize()
    }

    pub fn public_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    pub fn to_hex_pair(&self) -> HexKeyPair {
        HexKeyPair {
            public_hex: self.public_hex(),
            private_hex: hex::encode(self.secret_key_bytes()),
        }
    }

    pub fn from_hex_pair(pair: &HexKeyPair) -> Result<Self> {
        let public_key = hex::decode(&pair.public_hex)?;
        let private_key = hex::decode(&pair.private_hex)?;
        Self::from_parts(&public_key, &private_key)
    }

    pub fn to_key_pair_bytes(&self) -> KeyPairBytes {
        KeyPairBytes {
            public_key: self.public_key_bytes().to_vec(),
            private_key: self.secret_key_bytes().to_vec(),
        }
    }
}

impl PartialEq for GroupKeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.public_key_bytes() == other.public_key_bytes()
            && self.secret_key_bytes() == other.secret_key_bytes()
    }
}

impl Eq for GroupKeyPair {}

impl std::fmt::Debug for GroupKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupKeyPair")
            .field("public_key", &self.public_hex())
            .finish_non_exhaustive()
    }
}
