use crate::{
    document::{Fields, Value, paths},
    error::Result,
    record::{StatsRecord, encode},
    write::WriteBatch,
};
use flock_common::model::{Id, follow::FollowId, stats::UserStats, user::UserMarker};
use std::collections::BTreeSet;

pub(crate) const LIKED_BY: &str = "likedBy";
pub(crate) const LIKE_COUNT: &str = "likeCount";
pub(crate) const REPLY_COUNT: &str = "replyCount";
pub(crate) const REPOST_COUNT: &str = "repostCount";
pub(crate) const FOLLOWERS_COUNT: &str = "followersCount";
pub(crate) const FOLLOWING_COUNT: &str = "followingCount";

pub(crate) fn apply_like(
    liked_by: &mut BTreeSet<Id<UserMarker>>,
    user: Id<UserMarker>,
    liked: bool,
) -> bool {
    if liked {
        liked_by.insert(user)
    } else {
        liked_by.remove(&user)
    }
}

pub(crate) fn like_fields(liked_by: &BTreeSet<Id<UserMarker>>) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        LIKED_BY.to_owned(),
        Value::Array(
            liked_by
                .iter()
                .map(|user| Value::from(u64::from(*user)))
                .collect(),
        ),
    );
    fields.insert(LIKE_COUNT.to_owned(), Value::from(liked_by.len()));
    fields
}

pub(crate) fn empty_stats(user: Id<UserMarker>) -> Result<Fields> {
    encode(&StatsRecord::from(&UserStats::empty(user)))
}

pub(crate) fn follow_deltas(batch: &mut WriteBatch, id: FollowId, delta: i64) {
    batch
        .increment(paths::user_stats(id.followed), FOLLOWERS_COUNT, delta)
        .increment(paths::user_stats(id.follower), FOLLOWING_COUNT, delta);
}

#[cfg(test)]
mod tests {
    use crate::counters::{LIKE_COUNT, LIKED_BY, apply_like, like_fields};
    use flock_common::model::Id;
    use serde_json::json;
    use std::collections::BTreeSet;

    #[test]
    fn like_set_changes_are_idempotent() {
        let mut liked_by = BTreeSet::new();

        assert!(apply_like(&mut liked_by, Id::from(1), true));
        assert!(!apply_like(&mut liked_by, Id::from(1), true));
        assert!(apply_like(&mut liked_by, Id::from(2), true));
        assert!(!apply_like(&mut liked_by, Id::from(3), false));
        assert!(apply_like(&mut liked_by, Id::from(1), false));

        let fields = like_fields(&liked_by);
        assert_eq!(fields.get(LIKED_BY), Some(&json!([2])));
        assert_eq!(fields.get(LIKE_COUNT), Some(&json!(1)));
    }
}
