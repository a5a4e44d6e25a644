//! Encryption key pair rotation for legacy closed groups.
//!
//! A rotation moves through these states:
//!
//! ```text
//! ┌────────────┐  register  ┌────────────┐  send ok  ┌────────────┐
//! │ Generated  │ ─────────► │  In flight │ ────────► │ Committed  │
//! └────────────┘            └────────────┘           └────────────┘
//!                              │      │
//!               newer attempt  │      │ send failed
//!                              ▼      ▼
//!                     ┌────────────┐ ┌─────────────┐
//!                     │ Superseded │ │ Outstanding │
//!                     └────────────┘ └─────────────┘
//! ```
//!
//! The in-flight registry keeps at most one attempt per group; registering
//! a new attempt replaces the previous one. A confirmation only commits if
//! its attempt is still the registered one.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::core::error::CoreError;
use crate::core::provider::{ClosedGroupProvider, Collaborators};
use crate::crypto::{GroupKeyPair, KeyPairCodec};
use crate::ds::{MessageDispatcher, Namespace};
use crate::identity::PubKey;
use crate::message::ControlMessage;
use crate::storage::{GroupStore, KeyPairStore};

/// Identifies one rotation attempt.
pub type AttemptId = Uuid;

/// A key pair generated for a group and not yet committed.
#[derive(Clone, Debug)]
pub struct InFlightRotation {
    pub attempt: AttemptId,
    pub key_pair: GroupKeyPair,
}

/// Process-local registry of in-flight rotations, keyed by group id.
///
/// Never persisted and never a source of truth for the active key pair.
#[derive(Clone, Debug, Default)]
pub struct InFlightRotations {
    entries: Arc<Mutex<HashMap<PubKey, InFlightRotation>>>,
}

impl InFlightRotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key_pair` for `group`, replacing any previous attempt.
    pub async fn register(&self, group: &PubKey, key_pair: GroupKeyPair) -> AttemptId {
        let attempt = Uuid::new_v4();
        let previous = self
            .entries
            .lock()
            .await
            .insert(group.clone(), InFlightRotation { attempt, key_pair });
        if let Some(previous) = previous {
            debug!(
                "Rotation {} for {group} supersedes {}",
                attempt, previous.attempt
            );
        }
        attempt
    }

    pub async fn get(&self, group: &PubKey) -> Option<InFlightRotation> {
        self.entries.lock().await.get(group).cloned()
    }

    pub async fn is_current(&self, group: &PubKey, attempt: AttemptId) -> bool {
        self.entries
            .lock()
            .await
            .get(group)
            .is_some_and(|entry| entry.attempt == attempt)
    }

    /// Drop the entry for `group` only if it still belongs to `attempt`.
    pub async fn remove_if_current(&self, group: &PubKey, attempt: AttemptId) -> bool {
        let mut entries = self.entries.lock().await;
        if entries
            .get(group)
            .is_some_and(|entry| entry.attempt == attempt)
        {
            entries.remove(group);
            return true;
        }
        false
    }

    /// Run `commit` and drop the entry, all under one lock, only if `attempt`
    /// is still the registered one for `group`.
    ///
    /// Returns `Ok(false)` without calling `commit` for a stale attempt. If
    /// `commit` fails the entry stays registered.
    pub async fn commit_if_current<E>(
        &self,
        group: &PubKey,
        attempt: AttemptId,
        commit: impl FnOnce(&InFlightRotation) -> Result<(), E>,
    ) -> Result<bool, E> {
        let mut entries = self.entries.lock().await;
        match entries.get(group) {
            Some(entry) if entry.attempt == attempt => {
                commit(entry)?;
                entries.remove(group);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

/// How a rotation ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum RotationOutcome {
    /// Distributed and committed as the group's current key pair.
    Committed {
        public_key: String,
        recipients: usize,
    },
    /// A newer attempt replaced this one before its confirmation arrived.
    Superseded,
    /// The send failed; the in-flight entry is left for a later retry.
    Outstanding,
    /// Group missing, or not a legacy closed group.
    NotApplicable,
    /// The requester is not an admin of the group.
    Unauthorized,
    /// The new key pair could not be wrapped; nothing was sent.
    Failed { reason: String },
}

/// A prepared rotation waiting for its key pair message to be confirmed.
#[derive(Clone, Debug)]
pub struct PendingRotation {
    pub group_id: PubKey,
    pub attempt: AttemptId,
    pub key_pair: GroupKeyPair,
    pub message: ControlMessage,
    pub recipients: usize,
}

#[derive(Debug)]
pub enum PreparedRotation {
    Ready(PendingRotation),
    Skipped(RotationOutcome),
}

/// Generates, distributes and commits new group key pairs.
pub struct KeyRotationCoordinator<P: ClosedGroupProvider> {
    config: ServiceConfig,
    collaborators: Collaborators<P>,
    in_flight: InFlightRotations,
}

impl<P: ClosedGroupProvider> KeyRotationCoordinator<P> {
    pub fn new(config: ServiceConfig, collaborators: Collaborators<P>) -> Self {
        Self {
            config,
            collaborators,
            in_flight: InFlightRotations::new(),
        }
    }

    pub fn in_flight(&self) -> &InFlightRotations {
        &self.in_flight
    }

    /// Rotate the key pair of `group_id` and distribute it to `targets`.
    ///
    /// `targets` is the post-removal member list; removed members never get
    /// a wrapper. The new pair is committed only once the key pair message
    /// is confirmed sent.
    ///
    /// # Errors
    /// - [`CoreError::EncryptionFailure`] if any target key cannot be used;
    ///   nothing is sent in that case
    /// - [`CoreError::StorageError`] if the group or key pair store fails
    pub async fn rotate(
        &self,
        group_id: &PubKey,
        targets: &[PubKey],
        requester_is_admin: bool,
    ) -> Result<RotationOutcome, CoreError> {
        let pending = match self.prepare(group_id, targets, requester_is_admin).await? {
            PreparedRotation::Ready(pending) => pending,
            PreparedRotation::Skipped(outcome) => return Ok(outcome),
        };

        match self
            .collaborators
            .dispatcher
            .send_to_group(
                group_id,
                pending.message.clone(),
                Namespace::LegacyClosedGroup,
            )
            .await
        {
            Ok(message_id) => {
                debug!("Key pair message {message_id} for {group_id} confirmed");
                self.confirm(pending).await
            }
            Err(e) => {
                warn!("Key pair message for {group_id} was not sent, leaving rotation outstanding: {e}");
                Ok(RotationOutcome::Outstanding)
            }
        }
    }

    /// Check preconditions, generate a key pair, register it and build the
    /// wrapped key pair message.
    pub async fn prepare(
        &self,
        group_id: &PubKey,
        targets: &[PubKey],
        requester_is_admin: bool,
    ) -> Result<PreparedRotation, CoreError> {
        if let Some(outcome) = self.authorize(group_id, requester_is_admin)? {
            return Ok(PreparedRotation::Skipped(outcome));
        }

        let key_pair = GroupKeyPair::generate();
        let attempt = self.in_flight.register(group_id, key_pair.clone()).await;

        let wrappers = match KeyPairCodec::wrap_for_all(&key_pair, targets) {
            Ok(wrappers) => wrappers,
            Err(e) => {
                warn!("Unable to wrap new key pair for {group_id}, aborting rotation: {e}");
                self.in_flight.remove_if_current(group_id, attempt).await;
                return Err(e.into());
            }
        };

        let message = ControlMessage::encryption_key_pair(
            group_id,
            &Uuid::new_v4().to_string(),
            self.config.network_now_ms(),
            wrappers,
        );
        info!(
            "Prepared key pair rotation {attempt} for {group_id} with {} recipients",
            targets.len()
        );

        Ok(PreparedRotation::Ready(PendingRotation {
            group_id: group_id.clone(),
            attempt,
            key_pair,
            message,
            recipients: targets.len(),
        }))
    }

    /// Commit a rotation whose key pair message was confirmed sent.
    ///
    /// A confirmation for an attempt that is no longer registered is ignored.
    pub async fn confirm(&self, pending: PendingRotation) -> Result<RotationOutcome, CoreError> {
        let PendingRotation {
            group_id,
            attempt,
            key_pair,
            recipients,
            ..
        } = pending;

        // a newer register() waits on the registry lock until this pair is stored
        let committed = self
            .in_flight
            .commit_if_current(&group_id, attempt, |entry| {
                self.collaborators
                    .key_pairs
                    .add_key_pair_if_needed(&group_id, &entry.key_pair)
                    .map(|_| ())
            })
            .await?;
        if !committed {
            info!("Ignoring stale confirmation of rotation {attempt} for {group_id}");
            return Ok(RotationOutcome::Superseded);
        }

        self.collaborators.groups.commit(&group_id)?;

        info!("Key pair message for {group_id} sent, saved the new encryption key pair");
        Ok(RotationOutcome::Committed {
            public_key: key_pair.public_hex(),
            recipients,
        })
    }

    fn authorize(
        &self,
        group_id: &PubKey,
        requester_is_admin: bool,
    ) -> Result<Option<RotationOutcome>, CoreError> {
        let Some(group) = self.collaborators.groups.get_group(group_id)? else {
            warn!("Key pair rotation: conversation not found {group_id}");
            return Ok(Some(RotationOutcome::NotApplicable));
        };
        if !group.is_legacy() {
            warn!("Key pair rotation: conversation not a legacy closed group {group_id}");
            return Ok(Some(RotationOutcome::NotApplicable));
        }
        if !requester_is_admin || !group.is_admin(&self.config.our_pubkey) {
            warn!("Key pair rotation: cannot rotate {group_id} as a non admin");
            return Ok(Some(RotationOutcome::Unauthorized));
        }
        Ok(None)
    }
}
