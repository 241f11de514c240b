use crate::model::{
    Id,
    post::{PostContent, PostMarker},
    user::{Author, UserMarker},
};
use std::collections::BTreeSet;
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct ReplyMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Reply {
    pub id: Id<ReplyMarker>,
    pub post: Id<PostMarker>,
    pub author: Author,
    pub content: PostContent,
    pub created_at: UtcDateTime,
    pub like_count: u64,
    pub liked_by: BTreeSet<Id<UserMarker>>,
    pub repost_count: u64,
}

impl Reply {
    #[must_use]
    pub fn is_liked_by(&self, user: Id<UserMarker>) -> bool {
        self.liked_by.contains(&user)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct CreateReply {
    pub post: Id<PostMarker>,
    pub author: Author,
    pub content: PostContent,
}
