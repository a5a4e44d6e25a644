//! Local membership, name and key changes of a legacy closed group.
//!
//! [`ClosedGroupService::apply_local_change`] is the entry point called when
//! the local user edits a group. It is never called for updates coming from
//! the network, even from another of our devices.
//!
//! # Flow
//!
//! ```text
//! load group ─► check preconditions ─► diff ─► persist roster
//!                                               │
//!                     NoChange ◄────────────────┤
//!                     (commit)                  ▼
//!                                   notice ─► dispatch ─► commit
//!                                               │
//!                     MembersKicked, confirmed  ▼
//!                                        KeyRotationCoordinator
//! ```
//!
//! Local state is recorded first and delivery is best effort: a failed send
//! never rolls back the persisted roster or the notice.

use std::collections::BTreeSet;

use futures::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;

use crate::config::ServiceConfig;
use crate::core::diff::compute_diff;
use crate::core::error::CoreError;
use crate::core::notice::{GroupUpdateNotice, NoticeChange};
use crate::core::provider::{ClosedGroupProvider, Collaborators};
use crate::core::rotation::{KeyRotationCoordinator, RotationOutcome};
use crate::core::types::{
    expiration_type_for_group, ExpirationType, ExpireUpdate, GroupDiff, GroupInfo, GroupState,
};
use crate::crypto::GroupKeyPair;
use crate::ds::{DeliveryServiceError, MessageDispatcher, Namespace};
use crate::identity::PubKey;
use crate::message::ControlMessage;
use crate::storage::{GroupStore, KeyPairStore};

/// Result of one send attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DispatchStatus {
    Sent { message_id: String },
    Failed { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DispatchRecord {
    pub destination: PubKey,
    pub namespace: Namespace,
    pub status: DispatchStatus,
}

impl DispatchRecord {
    fn new(
        destination: &PubKey,
        namespace: Namespace,
        result: &Result<String, DeliveryServiceError>,
    ) -> Self {
        let status = match result {
            Ok(message_id) => DispatchStatus::Sent {
                message_id: message_id.clone(),
            },
            Err(e) => DispatchStatus::Failed {
                reason: e.to_string(),
            },
        };
        Self {
            destination: destination.clone(),
            namespace,
            status,
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self.status, DispatchStatus::Sent { .. })
    }
}

/// What a local change did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub diff: GroupDiff,
    pub notice: Option<GroupUpdateNotice>,
    pub dispatches: Vec<DispatchRecord>,
    pub rotation: Option<RotationOutcome>,
}

impl UpdateReport {
    fn new(diff: GroupDiff) -> Self {
        Self {
            diff,
            notice: None,
            dispatches: Vec::new(),
            rotation: None,
        }
    }
}

/// Entry point for local edits of legacy closed groups.
pub struct ClosedGroupService<P: ClosedGroupProvider> {
    config: ServiceConfig,
    collaborators: Collaborators<P>,
    rotation: KeyRotationCoordinator<P>,
}

impl<P: ClosedGroupProvider> ClosedGroupService<P> {
    pub fn new(config: ServiceConfig, collaborators: Collaborators<P>) -> Self {
        let rotation = KeyRotationCoordinator::new(config.clone(), collaborators.clone());
        Self {
            config,
            collaborators,
            rotation,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn rotation(&self) -> &KeyRotationCoordinator<P> {
        &self.rotation
    }

    /// Apply a local edit of a group's name and member list.
    ///
    /// Pass the current name or members to leave them unchanged.
    ///
    /// # Errors
    /// - [`CoreError::PreconditionFailed`] for keyed groups, read-based
    ///   expiration, self-removal, or removing the primary admin while
    ///   others remain; nothing is written or sent
    /// - [`CoreError::NotFound`] if the group is missing, or members are
    ///   added while no current key pair exists; nothing is written or sent
    ///
    /// Send failures and a failed follow-up rotation are not errors: the
    /// change is already recorded, so they land in the report.
    pub async fn apply_local_change(
        &self,
        group_id: &PubKey,
        name: &str,
        members: &[PubKey],
    ) -> Result<UpdateReport, CoreError> {
        if group_id.is_keyed_group() {
            return Err(CoreError::PreconditionFailed(
                "apply_local_change does not handle keyed groups".to_string(),
            ));
        }

        let current = self
            .collaborators
            .groups
            .get_group(group_id)?
            .ok_or_else(|| CoreError::NotFound(format!("group {group_id}")))?;

        let expiration_type =
            expiration_type_for_group(current.expiration_mode, current.expire_timer);
        if expiration_type == ExpirationType::DeleteAfterRead {
            warn!("Groups cannot be deleteAfterRead. convo id: {group_id}");
            return Err(CoreError::PreconditionFailed(
                "groups cannot be deleteAfterRead".to_string(),
            ));
        }

        let members: BTreeSet<PubKey> = members.iter().cloned().collect();
        let proposed = GroupInfo {
            id: group_id.clone(),
            name: name.to_string(),
            members: members.iter().cloned().collect(),
            // zombies no longer in the group are dropped
            zombies: current
                .zombies
                .iter()
                .filter(|z| members.contains(*z))
                .cloned()
                .collect(),
            active_at: self.config.now_ms(),
            admins: current.admins.clone(),
            expiration_type,
            expire_timer: current.expire_timer,
        };

        let diff = compute_diff(&current, &proposed);
        debug!("Local change of {group_id}: {diff}");
        let current_key_pair = self.check_diff_preconditions(&current, &proposed, &diff)?;

        self.update_or_create_group(&proposed)?;

        let mut report = UpdateReport::new(diff.clone());
        if diff.is_no_change() {
            info!("Local change of {group_id} produced no diff");
            self.collaborators.groups.commit(group_id)?;
            return Ok(report);
        }

        let Some(change) = NoticeChange::from_diff(&diff) else {
            self.collaborators.groups.commit(group_id)?;
            return Ok(report);
        };
        if let NoticeChange::Name(new_name) = &change {
            if new_name.is_empty() {
                warn!("No name given for group update of {group_id}. Skipping");
                self.collaborators.groups.commit(group_id)?;
                return Ok(report);
            }
        }

        let expire_update = ExpireUpdate {
            expiration_type,
            expiration_timer: current.expire_timer,
            is_legacy_data_message: false,
        };
        let notice = self.add_update_notice(
            group_id,
            change,
            &self.config.our_pubkey,
            self.config.now_ms(),
            Some(&expire_update),
        )?;
        report.notice = Some(notice.clone());

        match &diff {
            GroupDiff::NameChange { new_name } => {
                report
                    .dispatches
                    .push(self.send_new_name(group_id, new_name, &notice.id).await);
            }
            GroupDiff::MembersAdded { added, .. } => {
                // checked by check_diff_preconditions
                if let Some(key_pair) = current_key_pair.as_ref() {
                    let records = self
                        .send_added_members(&current, &proposed, added, key_pair, &notice.id)
                        .await;
                    report.dispatches.extend(records);
                }
            }
            GroupDiff::MembersKicked { kicked } => {
                let record = self.send_removed_members(group_id, kicked, &notice.id).await;
                let confirmed = record.is_sent();
                report.dispatches.push(record);
                if confirmed {
                    let is_admin = current.is_admin(&self.config.our_pubkey);
                    if is_admin {
                        info!(
                            "A user was removed from {group_id} and we are the admin. Generating and sending a new encryption key pair"
                        );
                    }
                    match self
                        .rotation
                        .rotate(group_id, &proposed.members, is_admin)
                        .await
                    {
                        Ok(outcome) => report.rotation = Some(outcome),
                        Err(e) => {
                            warn!("Key pair rotation for {group_id} failed after removal: {e}");
                            report.rotation = Some(RotationOutcome::Failed {
                                reason: e.to_string(),
                            });
                        }
                    }
                }
            }
            GroupDiff::NoChange => {}
        }

        self.collaborators.groups.commit(group_id)?;
        Ok(report)
    }

    /// Create the group if missing and store the given snapshot.
    ///
    /// The admin list is only replaced when `details.admins` is non-empty.
    pub fn update_or_create_group(&self, details: &GroupInfo) -> Result<GroupState, CoreError> {
        let groups = &self.collaborators.groups;
        let mut state = groups
            .get_group(&details.id)?
            .unwrap_or_else(|| GroupState::new(details.id.clone(), &details.name, []));

        state.name = details.name.clone();
        state.members = details.members.iter().cloned().collect();
        state.zombies = details.zombies.iter().cloned().collect();
        state.active_at = details.active_at;
        state.left = details.active_at == 0;
        if !details.admins.is_empty() {
            state.admins = details.admins.clone();
        }

        groups.create_or_update_group(state.clone())?;
        groups.commit(&details.id)?;
        Ok(state)
    }

    /// Record a group update notice in a conversation log.
    ///
    /// Notices sent by us are outgoing, anything else is incoming.
    pub fn add_update_notice(
        &self,
        conversation_id: &PubKey,
        change: NoticeChange,
        sender: &PubKey,
        sent_at: i64,
        expire_update: Option<&ExpireUpdate>,
    ) -> Result<GroupUpdateNotice, CoreError> {
        let notice = GroupUpdateNotice::new(
            conversation_id,
            change,
            sender,
            &self.config.our_pubkey,
            sent_at,
        )
        .with_expire_update(expire_update);
        self.collaborators.groups.add_notice(notice.clone())?;
        Ok(notice)
    }

    fn check_diff_preconditions(
        &self,
        current: &GroupState,
        proposed: &GroupInfo,
        diff: &GroupDiff,
    ) -> Result<Option<GroupKeyPair>, CoreError> {
        match diff {
            GroupDiff::MembersKicked { kicked } => {
                if kicked.contains(&self.config.our_pubkey) {
                    return Err(CoreError::PreconditionFailed(
                        "cannot remove members and leave the group at the same time".to_string(),
                    ));
                }
                if let Some(primary) = current.primary_admin() {
                    if kicked.contains(primary) && !proposed.members.is_empty() {
                        return Err(CoreError::PreconditionFailed(
                            "cannot remove the admin from a closed group without removing everyone"
                                .to_string(),
                        ));
                    }
                }
                Ok(None)
            }
            GroupDiff::MembersAdded { .. } => {
                let key_pair = self
                    .collaborators
                    .key_pairs
                    .latest_key_pair(&current.id)?
                    .ok_or_else(|| {
                        CoreError::NotFound(format!("encryption key pair for group {}", current.id))
                    })?;
                Ok(Some(key_pair))
            }
            GroupDiff::NameChange { .. } | GroupDiff::NoChange => Ok(None),
        }
    }

    async fn send_new_name(&self, group_id: &PubKey, name: &str, identifier: &str) -> DispatchRecord {
        let message =
            ControlMessage::name_change(group_id, identifier, self.config.network_now_ms(), name);
        self.send_to_group(group_id, message).await
    }

    async fn send_added_members(
        &self,
        current: &GroupState,
        proposed: &GroupInfo,
        added: &[PubKey],
        key_pair: &GroupKeyPair,
        identifier: &str,
    ) -> Vec<DispatchRecord> {
        let group_id = &current.id;

        // only members already in the group get this one
        let added_message = ControlMessage::members_added(
            group_id,
            identifier,
            self.config.network_now_ms(),
            added.to_vec(),
        );
        let mut records = vec![self.send_to_group(group_id, added_message).await];

        let invitation = ControlMessage::new_group(
            group_id,
            identifier,
            self.config.network_now_ms(),
            &proposed.name,
            proposed.members.clone(),
            current.admins.clone(),
            key_pair,
        );
        let sends = added.iter().map(|member| {
            let invitation = invitation.clone();
            async move {
                let result = self
                    .collaborators
                    .dispatcher
                    .send_to_member(member, invitation, Namespace::Default)
                    .await;
                if let Err(e) = &result {
                    warn!("Failed to invite {member} to {group_id}: {e}");
                }
                DispatchRecord::new(member, Namespace::Default, &result)
            }
        });
        records.extend(join_all(sends).await);
        records
    }

    async fn send_removed_members(
        &self,
        group_id: &PubKey,
        removed: &[PubKey],
        identifier: &str,
    ) -> DispatchRecord {
        let message = ControlMessage::members_removed(
            group_id,
            identifier,
            self.config.network_now_ms(),
            removed.to_vec(),
        );
        self.send_to_group(group_id, message).await
    }

    async fn send_to_group(&self, group_id: &PubKey, message: ControlMessage) -> DispatchRecord {
        debug!("Sending {message}");
        let result = self
            .collaborators
            .dispatcher
            .send_to_group(group_id, message, Namespace::LegacyClosedGroup)
            .await;
        if let Err(e) = &result {
            warn!("Failed to send group update to {group_id}: {e}");
        }
        DispatchRecord::new(group_id, Namespace::LegacyClosedGroup, &result)
    }
}
