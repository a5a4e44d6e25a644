//! Core library errors.

use thiserror::Error;

use crate::crypto::CryptoError;
use crate::identity::IdentityError;
use crate::storage::StorageError;

/// Errors that can occur in the core library.
///
/// Dispatch failures are not listed here: they are reported in the
/// returned reports and never cross the send boundary as errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Rejected before any side effect.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// A group or key pair the operation depends on is missing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Key material could not be sealed for a recipient.
    #[error("Encryption failure: {0}")]
    EncryptionFailure(#[from] CryptoError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Identity error: {0}")]
    IdentityError(#[from] IdentityError),
}
