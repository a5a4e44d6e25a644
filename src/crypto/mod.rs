//! Key material for legacy closed groups.
//!
//! This module provides the group encryption key pair and the codec that
//! turns it into per-recipient sealed wrappers:
//!
//! - Fresh secp256k1 key pair generation
//! - Deterministic binary framing of a key pair
//! - ECIES wrapping for exactly one recipient per wrapper
//!
//! # Quick Start
//!
//! ```ignore
//! use closed_group::crypto::{GroupKeyPair, KeyPairCodec};
//!
//! let pair = GroupKeyPair::generate();
//! let wrapper = KeyPairCodec::wrap_for(&pair, &bob)?;
//! let received = KeyPairCodec::unwrap(&wrapper, &bob_secret)?;
//! assert_eq!(received, pair);
//! ```

mod codec;
mod error;
mod keypair;

pub use codec::{EncryptedKeyPairWrapper, KeyPairCodec, ENCODED_LEN, FRAME_VERSION};
pub use error::{CryptoError, Result};
pub use keypair::{GroupKeyPair, HexKeyPair, KeyPairBytes};
