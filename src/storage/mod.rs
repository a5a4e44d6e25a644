//! Storage abstraction for group state, notices and key pairs.
//!
//! This module provides the `GroupStore` and `KeyPairStore` traits for
//! pluggable storage backends. Use the in-memory implementations for
//! development/testing, or implement your own for persistence.

mod memory;

pub use memory::{MemoryGroupStore, MemoryKeyPairStore};

use crate::core::{GroupState, GroupUpdateNotice};
use crate::crypto::GroupKeyPair;
use crate::identity::PubKey;

/// Storage operation errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage lock error: {0}")]
    Lock(String),

    #[error("Storage serialization error: {0}")]
    Serialization(String),

    #[error("Group not found in storage: {0}")]
    GroupNotFound(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Conversation storage for groups and their update notices.
///
/// All calls are synchronous. Implementations must be `Send + Sync`;
/// internal synchronization is the implementation's responsibility.
pub trait GroupStore: Send + Sync + 'static {
    fn get_group(&self, id: &PubKey) -> Result<Option<GroupState>, StorageError>;

    /// Insert the group, or replace the stored state with `state`.
    fn create_or_update_group(&self, state: GroupState) -> Result<(), StorageError>;

    /// Mark the group as modified so snapshots built from it are refreshed.
    fn commit(&self, id: &PubKey) -> Result<(), StorageError>;

    fn add_notice(&self, notice: GroupUpdateNotice) -> Result<(), StorageError>;
}

/// History of group encryption key pairs, latest last.
pub trait KeyPairStore: Send + Sync + 'static {
    fn latest_key_pair(&self, group: &PubKey) -> Result<Option<GroupKeyPair>, StorageError>;

    /// Append `pair` unless it is already stored. Returns whether it was added.
    fn add_key_pair_if_needed(
        &self,
        group: &PubKey,
        pair: &GroupKeyPair,
    ) -> Result<bool, StorageError>;
}
