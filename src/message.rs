//! Control messages exchanged inside a legacy closed group.
//!
//! These carry the semantic content of each message; the transport owns the
//! wire encoding. Every message has the same envelope:
//!  - `group_id`: the group's public key
//!  - `identifier`: the id of the local notice the message belongs to
//!  - `created_at_ms`: network time at creation
//!  - `expire_timer`: always 0, legacy group control messages never expire
//!
//! and one of the payloads in [`ControlKind`]:
//!  - [`ControlKind::NameChange`]
//!  - [`ControlKind::MembersAdded`]
//!  - [`ControlKind::MembersRemoved`]
//!  - [`ControlKind::EncryptionKeyPair`]
//!  - [`ControlKind::New`] (sent individually to invited members)

use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::crypto::{EncryptedKeyPairWrapper, GroupKeyPair, KeyPairBytes};
use crate::identity::PubKey;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMessage {
    pub group_id: PubKey,
    pub identifier: String,
    pub created_at_ms: i64,
    pub expire_timer: u64,
    pub kind: ControlKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlKind {
    NameChange {
        name: String,
    },
    MembersAdded {
        added: Vec<PubKey>,
    },
    MembersRemoved {
        removed: Vec<PubKey>,
    },
    EncryptionKeyPair {
        wrappers: Vec<EncryptedKeyPairWrapper>,
    },
    New {
        name: String,
        members: Vec<PubKey>,
        admins: Vec<PubKey>,
        key_pair: KeyPairBytes,
    },
}

impl ControlMessage {
    fn new(group_id: &PubKey, identifier: &str, created_at_ms: i64, kind: ControlKind) -> Self {
        Self {
            group_id: group_id.clone(),
            identifier: identifier.to_string(),
            created_at_ms,
            expire_timer: 0,
            kind,
        }
    }

    pub fn name_change(group_id: &PubKey, identifier: &str, created_at_ms: i64, name: &str) -> Self {
        Self::new(
            group_id,
            identifier,
            created_at_ms,
            ControlKind::NameChange {
                name: name.to_string(),
            },
        )
    }

    pub fn members_added(
        group_id: &PubKey,
        identifier: &str,
        created_at_ms: i64,
        added: Vec<PubKey>,
    ) -> Self {
        Self::new(
            group_id,
            identifier,
            created_at_ms,
            ControlKind::MembersAdded { added },
        )
    }

    pub fn members_removed(
        group_id: &PubKey,
        identifier: &str,
        created_at_ms: i64,
        removed: Vec<PubKey>,
    ) -> Self {
        Self::new(
            group_id,
            identifier,
            created_at_ms,
            ControlKind::MembersRemoved { removed },
        )
    }

    pub fn encryption_key_pair(
        group_id: &PubKey,
        identifier: &str,
        created_at_ms: i64,
        wrappers: Vec<EncryptedKeyPairWrapper>,
    ) -> Self {
        Self::new(
            group_id,
            identifier,
            created_at_ms,
            ControlKind::EncryptionKeyPair { wrappers },
        )
    }

    /// Invitation carrying everything a new member needs to join, including
    /// the group's current key pair.
    #[allow(clippy::too_many_arguments)]
    pub fn new_group(
        group_id: &PubKey,
        identifier: &str,
        created_at_ms: i64,
        name: &str,
        members: Vec<PubKey>,
        admins: Vec<PubKey>,
        key_pair: &GroupKeyPair,
    ) -> Self {
        Self::new(
            group_id,
            identifier,
            created_at_ms,
            ControlKind::New {
                name: name.to_string(),
                members,
                admins,
                key_pair: key_pair.to_key_pair_bytes(),
            },
        )
    }
}

impl Display for ControlMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            ControlKind::NameChange { .. } => "NameChange",
            ControlKind::MembersAdded { .. } => "MembersAdded",
            ControlKind::MembersRemoved { .. } => "MembersRemoved",
            ControlKind::EncryptionKeyPair { .. } => "EncryptionKeyPair",
            ControlKind::New { .. } => "New",
        };
        write!(f, "{kind} for {} ({})", self.group_id, self.identifier)
    }
}
