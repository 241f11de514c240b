use crate::model::{Id, post::PostMarker, user::UserMarker};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct NotificationMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
    Repost,
    Follow,
    Mention,
    Reply,
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
            NotificationKind::Repost => "repost",
            NotificationKind::Follow => "follow",
            NotificationKind::Mention => "mention",
            NotificationKind::Reply => "reply",
        })
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Notification {
    pub id: Id<NotificationMarker>,
    pub recipient: Id<UserMarker>,
    pub sender: Id<UserMarker>,
    pub sender_name: String,
    pub kind: NotificationKind,
    pub post: Option<Id<PostMarker>>,
    pub created_at: UtcDateTime,
    pub read: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreateNotification {
    pub recipient: Id<UserMarker>,
    pub sender: Id<UserMarker>,
    pub sender_name: String,
    pub kind: NotificationKind,
    pub post: Option<Id<PostMarker>>,
}
