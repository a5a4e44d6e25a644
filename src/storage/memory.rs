//! In-memory storage implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{GroupStore, KeyPairStore, StorageError};
use crate::core::{GroupState, GroupUpdateNotice};
use crate::crypto::{GroupKeyPair, HexKeyPair};
use crate::identity::PubKey;

/// In-memory group store for development and testing.
///
/// All data is lost on restart.
#[derive(Default)]
pub struct MemoryGroupStore {
    groups: RwLock<HashMap<PubKey, GroupState>>,
    notices: RwLock<Vec<GroupUpdateNotice>>,
    commits: RwLock<HashMap<PubKey, u64>>,
    writes: RwLock<u64>,
}

impl MemoryGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices recorded for a conversation, oldest first.
    pub fn notices(&self, conversation_id: &PubKey) -> Result<Vec<GroupUpdateNotice>, StorageError> {
        Ok(self
            .notices
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?
            .iter()
            .filter(|n| &n.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    pub fn commit_count(&self, id: &PubKey) -> Result<u64, StorageError> {
        Ok(self
            .commits
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?
            .get(id)
            .copied()
            .unwrap_or_default())
    }

    /// Number of group writes (inserts or updates) since creation.
    pub fn write_count(&self) -> Result<u64, StorageError> {
        Ok(*self
            .writes
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?)
    }
}

impl GroupStore for MemoryGroupStore {
    fn get_group(&self, id: &PubKey) -> Result<Option<GroupState>, StorageError> {
        Ok(self
            .groups
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?
            .get(id)
            .cloned())
    }

    fn create_or_update_group(&self, state: GroupState) -> Result<(), StorageError> {
        self.groups
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?
            .insert(state.id.clone(), state);
        *self
            .writes
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))? += 1;
        Ok(())
    }

    fn commit(&self, id: &PubKey) -> Result<(), StorageError> {
        if !self
            .groups
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?
            .contains_key(id)
        {
            return Err(StorageError::GroupNotFound(id.to_string()));
        }
        *self
            .commits
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?
            .entry(id.clone())
            .or_default() += 1;
        Ok(())
    }

    fn add_notice(&self, notice: GroupUpdateNotice) -> Result<(), StorageError> {
        self.notices
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?
            .push(notice);
        Ok(())
    }
}

/// In-memory key pair history, stored in hex form like a database row.
#[derive(Default)]
pub struct MemoryKeyPairStore {
    pairs: RwLock<HashMap<PubKey, Vec<HexKeyPair>>>,
}

impl MemoryKeyPairStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history_len(&self, group: &PubKey) -> Result<usize, StorageError> {
        Ok(self
            .pairs
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?
            .get(group)
            .map(Vec::len)
            .unwrap_or_default())
    }
}

impl KeyPairStore for MemoryKeyPairStore {
    fn latest_key_pair(&self, group: &PubKey) -> Result<Option<GroupKeyPair>, StorageError> {
        let pairs = self
            .pairs
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        pairs
            .get(group)
            .and_then(|history| history.last())
            .map(|hex_pair| {
                GroupKeyPair::from_hex_pair(hex_pair)
                    .map_err(|e| StorageError::Serialization(e.to_string()))
            })
            .transpose()
    }

    fn add_key_pair_if_needed(
        &self,
        group: &PubKey,
        pair: &GroupKeyPair,
    ) -> Result<bool, StorageError> {
        let hex_pair = pair.to_hex_pair();
        let mut pairs = self
            .pairs
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        let history = pairs.entry(group.clone()).or_default();
        if history.contains(&hex_pair) {
            return Ok(false);
        }
        history.push(hex_pair);
        Ok(true)
    }
}
