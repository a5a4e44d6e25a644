//! Core library for legacy closed group updates.
//!
//! This module turns a local edit of a group into a persisted roster, a
//! conversation notice, the control messages the other members need, and,
//! after a confirmed removal, a fresh group encryption key pair.
//!
//! # Key Components
//!
//! - [`compute_diff`]: classifies a proposed snapshot against the stored one
//! - [`ClosedGroupService`]: entry point for local changes
//! - [`KeyRotationCoordinator`]: generates, distributes and commits key pairs
//! - [`ClosedGroupProvider`]: bundles the storage and transport collaborators
//!
//! # Example
//!
//! ```ignore
//! use closed_group::core::{ClosedGroupService, Collaborators};
//!
//! let service = ClosedGroupService::<MyProvider>::new(config, collaborators);
//! let report = service.apply_local_change(&group_id, "Team", &members).await?;
//! ```

mod diff;
mod error;
mod notice;
mod provider;
mod rotation;
mod types;
mod update;

pub use diff::compute_diff;
pub use error::CoreError;
pub use notice::{Direction, GroupUpdateNotice, NoticeChange};
pub use provider::{ClosedGroupProvider, Collaborators};
pub use rotation::{
    AttemptId, InFlightRotation, InFlightRotations, KeyRotationCoordinator, PendingRotation,
    PreparedRotation, RotationOutcome,
};
pub use types::{
    expiration_type_for_group, DisappearingMode, ExpirationType, ExpireUpdate, GroupDiff,
    GroupInfo, GroupState,
};
pub use update::{ClosedGroupService, DispatchRecord, DispatchStatus, UpdateReport};
