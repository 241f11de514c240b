use flock_common::model::{
    Id, follow::FollowId, notification::NotificationMarker, post::PostMarker, reply::ReplyMarker,
    repost::RepostMarker, user::UserMarker,
};
use std::fmt::{Display, Formatter};

pub use serde_json::Value;

pub type Fields = serde_json::Map<String, Value>;

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct CollectionPath(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct DocumentKey {
    pub collection: CollectionPath,
    pub id: String,
}

impl CollectionPath {
    #[must_use]
    pub fn root(name: &str) -> Self {
        Self(name.to_owned())
    }

    #[must_use]
    pub fn nested(parent: &DocumentKey, name: &str) -> Self {
        Self(format!("{parent}/{name}"))
    }

    #[must_use]
    pub fn doc(&self, id: impl Display) -> DocumentKey {
        DocumentKey {
            collection: self.clone(),
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Display for CollectionPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Display for DocumentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Snapshot {
    pub key: DocumentKey,
    pub version: u64,
    pub data: Fields,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct DocumentChange {
    pub key: DocumentKey,
    pub kind: ChangeKind,
}

pub mod paths {
    use super::{CollectionPath, DocumentKey, FollowId, Id};
    use super::{NotificationMarker, PostMarker, ReplyMarker, RepostMarker, UserMarker};

    #[must_use]
    pub fn posts() -> CollectionPath {
        CollectionPath::root("posts")
    }

    #[must_use]
    pub fn post(id: Id<PostMarker>) -> DocumentKey {
        posts().doc(id)
    }

    #[must_use]
    pub fn replies(post_id: Id<PostMarker>) -> CollectionPath {
        CollectionPath::nested(&post(post_id), "replies")
    }

    #[must_use]
    pub fn reply(post_id: Id<PostMarker>, id: Id<ReplyMarker>) -> DocumentKey {
        replies(post_id).doc(id)
    }

    #[must_use]
    pub fn reposts() -> CollectionPath {
        CollectionPath::root("reposts")
    }

    #[must_use]
    pub fn repost(id: Id<RepostMarker>) -> DocumentKey {
        reposts().doc(id)
    }

    #[must_use]
    pub fn user_reposts(user_id: Id<UserMarker>) -> CollectionPath {
        CollectionPath::nested(&user(user_id), "reposts")
    }

    #[must_use]
    pub fn user_repost(user_id: Id<UserMarker>, post_id: Id<PostMarker>) -> DocumentKey {
        user_reposts(user_id).doc(post_id)
    }

    #[must_use]
    pub fn follows() -> CollectionPath {
        CollectionPath::root("follows")
    }

    #[must_use]
    pub fn follow(id: FollowId) -> DocumentKey {
        follows().doc(id)
    }

    #[must_use]
    pub fn user_stats(user_id: Id<UserMarker>) -> DocumentKey {
        CollectionPath::root("user_stats").doc(user_id)
    }

    #[must_use]
    pub fn notifications() -> CollectionPath {
        CollectionPath::root("notifications")
    }

    #[must_use]
    pub fn notification(id: Id<NotificationMarker>) -> DocumentKey {
        notifications().doc(id)
    }

    #[must_use]
    pub fn users() -> CollectionPath {
        CollectionPath::root("users")
    }

    #[must_use]
    pub fn user(id: Id<UserMarker>) -> DocumentKey {
        users().doc(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::document::paths;
    use flock_common::model::{Id, follow::FollowId};

    #[test]
    fn nested_paths() {
        assert_eq!(paths::post(Id::from(5)).to_string(), "posts/5");
        assert_eq!(
            paths::reply(Id::from(5), Id::from(9)).to_string(),
            "posts/5/replies/9"
        );
        assert_eq!(
            paths::user_repost(Id::from(3), Id::from(5)).to_string(),
            "users/3/reposts/5"
        );
        assert_eq!(
            paths::follow(FollowId::new(Id::from(1), Id::from(2))).to_string(),
            "follows/1_2"
        );
        assert_eq!(paths::replies(Id::from(5)).get(), "posts/5/replies");
    }
}
