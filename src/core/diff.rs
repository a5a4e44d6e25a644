//! Classifies a local edit of a group into exactly one [`GroupDiff`].
//!
//! Checks run in a fixed order and the first hit wins:
//!
//! ```text
//! name differs?          ──yes──► NameChange
//!      │ no
//! (new ∪ zombies) − (old ∪ zombies), standard ids only, non-empty?
//!                        ──yes──► MembersAdded { with_history: false }
//!      │ no
//! (old ∪ zombies) − (new ∪ zombies), standard ids only, non-empty?
//!                        ──yes──► MembersKicked
//!      │ no
//!      ▼
//!   NoChange
//! ```
//!
//! A single legacy control message cannot carry both a rename and a roster
//! change, so a rename hides any membership difference. Additions are
//! reported before removals.

use std::collections::BTreeSet;

use crate::core::types::{GroupDiff, GroupInfo, GroupState};
use crate::identity::PubKey;

pub fn compute_diff(old: &GroupState, proposed: &GroupInfo) -> GroupDiff {
    if proposed.name != old.name {
        return GroupDiff::NameChange {
            new_name: proposed.name.clone(),
        };
    }

    let old_full: BTreeSet<&PubKey> = old.members.iter().chain(old.zombies.iter()).collect();
    let new_full: BTreeSet<&PubKey> = proposed
        .members
        .iter()
        .chain(proposed.zombies.iter())
        .collect();

    let added = standard_only(new_full.difference(&old_full));
    if !added.is_empty() {
        return GroupDiff::MembersAdded {
            added,
            with_history: false,
        };
    }

    let kicked = standard_only(old_full.difference(&new_full));
    if !kicked.is_empty() {
        return GroupDiff::MembersKicked { kicked };
    }

    GroupDiff::NoChange
}

fn standard_only<'a>(keys: impl Iterator<Item = &'a &'a PubKey>) -> Vec<PubKey> {
    keys.filter(|key| key.is_standard())
        .map(|key| (*key).clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ExpirationType;
    use libsecp256k1::{PublicKey, SecretKey};

    fn key() -> PubKey {
        let secret = SecretKey::random(&mut rand::thread_rng());
        PubKey::from_public_key(&PublicKey::from_secret_key(&secret))
    }

    fn blinded() -> PubKey {
        PubKey::parse(&format!("15{}", &key().as_str()[2..])).unwrap()
    }

    fn group_id() -> PubKey {
        key()
    }

    fn proposed(old: &GroupState, name: &str, members: &[PubKey], zombies: &[PubKey]) -> GroupInfo {
        GroupInfo {
            id: old.id.clone(),
            name: name.to_string(),
            members: members.to_vec(),
            zombies: zombies.to_vec(),
            active_at: 1,
            admins: Vec::new(),
            expiration_type: ExpirationType::Unknown,
            expire_timer: 0,
        }
    }

    #[test]
    fn name_change_dominates_member_changes() {
        let (a, b, c) = (key(), key(), key());
        let old = GroupState::new(group_id(), "Team", [a.clone(), b.clone()]);
        let update = proposed(&old, "Renamed", &[a, c], &[]);
        assert_eq!(
            compute_diff(&old, &update),
            GroupDiff::NameChange {
                new_name: "Renamed".to_string()
            }
        );
    }

    #[test]
    fn additions_win_over_removals() {
        let (a, b, c) = (key(), key(), key());
        let old = GroupState::new(group_id(), "Team", [a.clone(), b]);
        let update = proposed(&old, "Team", &[a, c.clone()], &[]);
        assert_eq!(
            compute_diff(&old, &update),
            GroupDiff::MembersAdded {
                added: vec![c],
                with_history: false
            }
        );
    }

    #[test]
    fn removal_is_reported_as_kicked() {
        let (a, b, c) = (key(), key(), key());
        let old = GroupState::new(group_id(), "Team", [a.clone(), b.clone(), c.clone()]);
        let update = proposed(&old, "Team", &[a, b], &[]);
        assert_eq!(
            compute_diff(&old, &update),
            GroupDiff::MembersKicked { kicked: vec![c] }
        );
    }

    #[test]
    fn identical_snapshot_is_no_change() {
        let (a, b, z) = (key(), key(), key());
        let old = GroupState::new(group_id(), "Team", [a.clone(), b.clone()]).with_zombies([z.clone()]);
        let update = proposed(&old, "Team", &[b, a], &[z]);
        assert_eq!(compute_diff(&old, &update), GroupDiff::NoChange);
    }

    #[test]
    fn zombies_count_as_present() {
        let (a, z) = (key(), key());
        let old = GroupState::new(group_id(), "Team", [a.clone(), z.clone()]);
        // z moves from members to zombies: still part of the full roster
        let update = proposed(&old, "Team", &[a], &[z]);
        assert_eq!(compute_diff(&old, &update), GroupDiff::NoChange);
    }

    #[test]
    fn dropping_a_zombie_is_a_kick() {
        let (a, z) = (key(), key());
        let old = GroupState::new(group_id(), "Team", [a.clone()]).with_zombies([z.clone()]);
        let update = proposed(&old, "Team", &[a], &[]);
        assert_eq!(
            compute_diff(&old, &update),
            GroupDiff::MembersKicked { kicked: vec![z] }
        );
    }

    #[test]
    fn non_standard_ids_are_ignored() {
        let a = key();
        let old = GroupState::new(group_id(), "Team", [a.clone()]);
        let update = proposed(&old, "Team", &[a.clone(), blinded()], &[]);
        assert_eq!(compute_diff(&old, &update), GroupDiff::NoChange);

        let old = GroupState::new(group_id(), "Team", [a.clone(), blinded()]);
        let update = proposed(&old, "Team", &[a], &[]);
        assert_eq!(compute_diff(&old, &update), GroupDiff::NoChange);
    }

    #[test]
    fn duplicates_in_proposal_are_collapsed() {
        let (a, c) = (key(), key());
        let old = GroupState::new(group_id(), "Team", [a.clone()]);
        let update = proposed(&old, "Team", &[a, c.clone(), c.clone()], &[c.clone()]);
        assert_eq!(
            compute_diff(&old, &update),
            GroupDiff::MembersAdded {
                added: vec![c],
                with_history: false
            }
        );
    }
}
