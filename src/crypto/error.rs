//! Error types for key pair operations.

use crate::identity::IdentityError;

/// Result type alias for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid recipient key: {0}")]
    InvalidRecipient(#[from] IdentityError),

    #[error("Encryption failed for {recipient}: {reason}")]
    EncryptionFailed { recipient: String, reason: String },

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid key pair frame: {0}")]
    InvalidFrame(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}
