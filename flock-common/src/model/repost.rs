use crate::model::{Id, post::PostMarker, user::UserMarker};
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct RepostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Repost {
    pub id: Id<RepostMarker>,
    pub original_post: Id<PostMarker>,
    pub reposter: Id<UserMarker>,
    pub reposter_name: String,
    pub created_at: UtcDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct RepostStatus {
    pub repost: Id<RepostMarker>,
    pub reposter: Id<UserMarker>,
    pub reposter_name: String,
    pub reposted_at: UtcDateTime,
}

impl From<&Repost> for RepostStatus {
    fn from(repost: &Repost) -> Self {
        Self {
            repost: repost.id,
            reposter: repost.reposter,
            reposter_name: repost.reposter_name.clone(),
            reposted_at: repost.created_at,
        }
    }
}
