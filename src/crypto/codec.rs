//! Key pair framing and per-recipient sealed wrappers.

use serde::{Deserialize, Serialize};

use super::error::{CryptoError, Result};
use super::keypair::GroupKeyPair;
use crate::identity::PubKey;

/// Version byte leading every encoded key pair.
pub const FRAME_VERSION: u8 = 1;

/// `[version][33-byte compressed public key][32-byte secret key]`
pub const ENCODED_LEN: usize = 1 + 33 + 32;

/// A key pair sealed for exactly one recipient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedKeyPairWrapper {
    pub recipient: PubKey,
    pub ciphertext: Vec<u8>,
}

pub struct KeyPairCodec;

impl KeyPairCodec {
    pub fn encode(pair: &GroupKeyPair) -> Vec<u8> {
        let mut frame = Vec::with_capacity(ENCODED_LEN);
        frame.push(FRAME_VERSION);
        frame.extend_from_slice(&pair.public_key_bytes());
        frame.extend_from_slice(&pair.secret_key_bytes());
        frame
    }

    pub fn decode(frame: &[u8]) -> Result<GroupKeyPair> {
        if frame.len() != ENCODED_LEN {
            return Err(CryptoError::InvalidFrame(format!(
                "expected {ENCODED_LEN} bytes, got {}",
                frame.len()
            )));
        }
        if frame[0] != FRAME_VERSION {
            return Err(CryptoError::InvalidFrame(format!(
                "unsupported version {}",
                frame[0]
            )));
        }
        GroupKeyPair::from_parts(&frame[1..34], &frame[34..])
    }

    /// Seal `pair` for one recipient using ECIES over the recipient's key.
    ///
    /// The ephemeral sender key makes the wrapper sender-anonymous; only the
    /// recipient's secret key opens it.
    pub fn wrap_for(pair: &GroupKeyPair, recipient: &PubKey) -> Result<EncryptedKeyPairWrapper> {
        let recipient_key = recipient.to_public_key()?;
        let ciphertext = ecies::encrypt(&recipient_key.serialize_compressed(), &Self::encode(pair))
            .map_err(|e| CryptoError::EncryptionFailed {
                recipient: recipient.to_string(),
                reason: format!("{e:?}"),
            })?;
        Ok(EncryptedKeyPairWrapper {
            recipient: recipient.clone(),
            ciphertext,
        })
    }

    /// Wrap for every recipient. One bad recipient fails the whole batch.
    pub fn wrap_for_all(
        pair: &GroupKeyPair,
        recipients: &[PubKey],
    ) -> Result<Vec<EncryptedKeyPairWrapper>> {
        recipients
            .iter()
            .map(|recipient| Self::wrap_for(pair, recipient))
            .collect()
    }

    pub fn unwrap(wrapper: &EncryptedKeyPairWrapper, recipient_secret: &[u8]) -> Result<GroupKeyPair> {
        let frame = ecies::decrypt(recipient_secret, &wrapper.ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(format!("{e:?}")))?;
        Self::decode(&frame)
    }
}
