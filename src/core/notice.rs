//! Conversation-log notices describing group updates.

use serde::{Deserialize, Serialize};

use crate::core::types::{ExpirationType, ExpireUpdate, GroupDiff};
use crate::identity::PubKey;

/// What a notice reports. Exactly one payload per notice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum NoticeChange {
    #[serde(rename = "rename")]
    Name(String),
    Joined(Vec<PubKey>),
    JoinedWithHistory(Vec<PubKey>),
    Kicked(Vec<PubKey>),
    Left(Vec<PubKey>),
    Promoted(Vec<PubKey>),
    AvatarChange,
}

impl NoticeChange {
    /// The notice matching a diff, keeping only the fields of its variant.
    pub fn from_diff(diff: &GroupDiff) -> Option<Self> {
        match diff {
            GroupDiff::NameChange { new_name } => Some(NoticeChange::Name(new_name.clone())),
            GroupDiff::MembersAdded {
                added,
                with_history: true,
            } => Some(NoticeChange::JoinedWithHistory(added.clone())),
            GroupDiff::MembersAdded { added, .. } => Some(NoticeChange::Joined(added.clone())),
            GroupDiff::MembersKicked { kicked } => Some(NoticeChange::Kicked(kicked.clone())),
            GroupDiff::NoChange => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// A group update record in a conversation log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUpdateNotice {
    pub id: String,
    pub conversation_id: PubKey,
    pub sender: PubKey,
    pub sent_at: i64,
    pub direction: Direction,
    pub change: NoticeChange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_type: Option<ExpirationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_timer: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_start: Option<i64>,
}

impl GroupUpdateNotice {
    pub fn new(
        conversation_id: &PubKey,
        change: NoticeChange,
        sender: &PubKey,
        our_key: &PubKey,
        sent_at: i64,
    ) -> Self {
        let direction = if sender == our_key {
            Direction::Outgoing
        } else {
            Direction::Incoming
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: conversation_id.clone(),
            sender: sender.clone(),
            sent_at,
            direction,
            change,
            expiration_type: None,
            expire_timer: None,
            expiration_start: None,
        }
    }

    /// Stamp expiration fields. Only delete-after-send survives on a group
    /// notice; any other type is stored as unknown with a zero timer.
    pub fn with_expire_update(mut self, update: Option<&ExpireUpdate>) -> Self {
        let Some(update) = update else {
            return self;
        };
        if update.expiration_type == ExpirationType::Unknown || update.expiration_timer == 0 {
            return self;
        }
        let after_send = update.expiration_type == ExpirationType::DeleteAfterSend;
        self.expiration_type = Some(if after_send {
            ExpirationType::DeleteAfterSend
        } else {
            ExpirationType::Unknown
        });
        self.expire_timer = Some(if after_send { update.expiration_timer } else { 0 });
        if update.is_legacy_data_message || after_send {
            self.expiration_start = Some(self.sent_at);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pk(byte: &str) -> PubKey {
        PubKey::parse(&format!("05{}", byte.repeat(33))).unwrap()
    }

    #[test]
    fn diff_maps_to_one_payload() {
        let added = vec![pk("aa")];
        assert_eq!(
            NoticeChange::from_diff(&GroupDiff::MembersAdded {
                added: added.clone(),
                with_history: false
            }),
            Some(NoticeChange::Joined(added.clone()))
        );
        assert_eq!(
            NoticeChange::from_diff(&GroupDiff::MembersAdded {
                added: added.clone(),
                with_history: true
            }),
            Some(NoticeChange::JoinedWithHistory(added))
        );
        assert_eq!(NoticeChange::from_diff(&GroupDiff::NoChange), None);
    }

    #[test]
    fn direction_follows_sender() {
        let (group, us, them) = (pk("01"), pk("02"), pk("03"));
        let ours = GroupUpdateNotice::new(&group, NoticeChange::AvatarChange, &us, &us, 10);
        let theirs = GroupUpdateNotice::new(&group, NoticeChange::AvatarChange, &them, &us, 10);
        assert_eq!(ours.direction, Direction::Outgoing);
        assert_eq!(theirs.direction, Direction::Incoming);
        assert_ne!(ours.id, theirs.id);
    }

    #[test]
    fn after_send_update_is_stamped() {
        let (group, us) = (pk("01"), pk("02"));
        let update = ExpireUpdate {
            expiration_type: ExpirationType::DeleteAfterSend,
            expiration_timer: 300,
            is_legacy_data_message: false,
        };
        let notice = GroupUpdateNotice::new(&group, NoticeChange::Kicked(vec![]), &us, &us, 42)
            .with_expire_update(Some(&update));
        assert_eq!(notice.expiration_type, Some(ExpirationType::DeleteAfterSend));
        assert_eq!(notice.expire_timer, Some(300));
        assert_eq!(notice.expiration_start, Some(42));
    }

    #[test]
    fn other_updates_do_not_expire() {
        let (group, us) = (pk("01"), pk("02"));
        let update = ExpireUpdate {
            expiration_type: ExpirationType::DeleteAfterRead,
            expiration_timer: 300,
            is_legacy_data_message: false,
        };
        let notice = GroupUpdateNotice::new(&group, NoticeChange::Name("x".into()), &us, &us, 42)
            .with_expire_update(Some(&update));
        assert_eq!(notice.expiration_type, Some(ExpirationType::Unknown));
        assert_eq!(notice.expire_timer, Some(0));
        assert_eq!(notice.expiration_start, None);

        let untouched = GroupUpdateNotice::new(&group, NoticeChange::Name("x".into()), &us, &us, 42)
            .with_expire_update(None);
        assert_eq!(untouched.expiration_type, None);
    }

    #[test]
    fn schema_serializes_type_tags() {
        let (group, us) = (pk("01"), pk("02"));
        let notice = GroupUpdateNotice::new(&group, NoticeChange::Name("Team".into()), &us, &us, 1);
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["change"]["type"], "rename");
        assert_eq!(json["change"]["payload"], "Team");
        assert!(json.get("expire_timer").is_none());

        let json = serde_json::to_value(NoticeChange::JoinedWithHistory(vec![])).unwrap();
        assert_eq!(json["type"], "joinedWithHistory");
    }
}
