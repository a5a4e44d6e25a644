//! Core types for legacy closed group updates.

use std::collections::BTreeSet;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::identity::PubKey;

/// Disappearing-message mode configured on a conversation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisappearingMode {
    #[default]
    Off,
    /// Mode set by clients predating per-type expiration.
    Legacy,
    DeleteAfterRead,
    DeleteAfterSend,
}

/// Expiration type stamped on messages and notices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpirationType {
    #[default]
    Unknown,
    DeleteAfterRead,
    DeleteAfterSend,
}

/// Resolve the expiration type a group conversation uses.
///
/// Groups resolve the legacy mode to delete-after-send. A zero timer means
/// nothing expires.
pub fn expiration_type_for_group(mode: DisappearingMode, expire_timer: u64) -> ExpirationType {
    if expire_timer == 0 {
        return ExpirationType::Unknown;
    }
    match mode {
        DisappearingMode::Off => ExpirationType::Unknown,
        DisappearingMode::Legacy | DisappearingMode::DeleteAfterSend => {
            ExpirationType::DeleteAfterSend
        }
        DisappearingMode::DeleteAfterRead => ExpirationType::DeleteAfterRead,
    }
}

/// Expiration settings carried along with a notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpireUpdate {
    pub expiration_type: ExpirationType,
    pub expiration_timer: u64,
    pub is_legacy_data_message: bool,
}

/// Persisted state of one group conversation.
///
/// Owned by the group store; callers get a copy per call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupState {
    pub id: PubKey,
    pub name: String,
    pub members: BTreeSet<PubKey>,
    /// Removed members that have not been purged yet.
    pub zombies: BTreeSet<PubKey>,
    /// Ordered; the first entry is the primary admin.
    pub admins: Vec<PubKey>,
    pub active_at: i64,
    pub left: bool,
    pub expiration_mode: DisappearingMode,
    pub expire_timer: u64,
}

impl GroupState {
    pub fn new(id: PubKey, name: &str, members: impl IntoIterator<Item = PubKey>) -> Self {
        Self {
            id,
            name: name.to_string(),
            members: members.into_iter().collect(),
            zombies: BTreeSet::new(),
            admins: Vec::new(),
            active_at: 0,
            left: false,
            expiration_mode: DisappearingMode::Off,
            expire_timer: 0,
        }
    }

    pub fn with_admins(mut self, admins: impl IntoIterator<Item = PubKey>) -> Self {
        self.admins = admins.into_iter().collect();
        self
    }

    pub fn with_zombies(mut self, zombies: impl IntoIterator<Item = PubKey>) -> Self {
        self.zombies = zombies.into_iter().collect();
        self
    }

    pub fn with_expiration(mut self, mode: DisappearingMode, expire_timer: u64) -> Self {
        self.expiration_mode = mode;
        self.expire_timer = expire_timer;
        self
    }

    /// Legacy closed groups are everything but keyed groups.
    pub fn is_legacy(&self) -> bool {
        !self.id.is_keyed_group()
    }

    pub fn is_admin(&self, key: &PubKey) -> bool {
        self.admins.contains(key)
    }

    pub fn primary_admin(&self) -> Option<&PubKey> {
        self.admins.first()
    }
}

/// A proposed group snapshot, as built from a local edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: PubKey,
    pub name: String,
    pub members: Vec<PubKey>,
    pub zombies: Vec<PubKey>,
    pub active_at: i64,
    /// Left empty to keep the stored admin list untouched.
    pub admins: Vec<PubKey>,
    pub expiration_type: ExpirationType,
    pub expire_timer: u64,
}

/// The single classified change between two group snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GroupDiff {
    NameChange {
        new_name: String,
    },
    MembersAdded {
        added: Vec<PubKey>,
        with_history: bool,
    },
    MembersKicked {
        kicked: Vec<PubKey>,
    },
    NoChange,
}

impl GroupDiff {
    pub fn is_no_change(&self) -> bool {
        matches!(self, GroupDiff::NoChange)
    }
}

impl Display for GroupDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupDiff::NameChange { new_name } => write!(f, "Name change: {new_name}"),
            GroupDiff::MembersAdded { added, .. } => write!(f, "Members added: {}", added.len()),
            GroupDiff::MembersKicked { kicked } => write!(f, "Members kicked: {}", kicked.len()),
            GroupDiff::NoChange => write!(f, "No change"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timer_never_expires() {
        assert_eq!(
            expiration_type_for_group(DisappearingMode::DeleteAfterSend, 0),
            ExpirationType::Unknown
        );
        assert_eq!(
            expiration_type_for_group(DisappearingMode::DeleteAfterRead, 0),
            ExpirationType::Unknown
        );
    }

    #[test]
    fn legacy_mode_resolves_to_after_send() {
        assert_eq!(
            expiration_type_for_group(DisappearingMode::Legacy, 60),
            ExpirationType::DeleteAfterSend
        );
        assert_eq!(
            expiration_type_for_group(DisappearingMode::DeleteAfterRead, 60),
            ExpirationType::DeleteAfterRead
        );
        assert_eq!(
            expiration_type_for_group(DisappearingMode::Off, 60),
            ExpirationType::Unknown
        );
    }
}
