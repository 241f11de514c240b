use crate::{
    backend::DocumentStore,
    client::StoreClient,
    counters::{REPOST_COUNT, apply_like, follow_deltas, like_fields},
    document::{DocumentKey, paths},
    error::{Result, StoreError},
    query::Query,
    record::{FollowRecord, LikesRecord, RepostRecord, decode_record, encode},
    transaction::run_transaction,
    write::{Precondition, WriteBatch},
};
use flock_common::{
    model::{
        Id,
        follow::{Follow, FollowId},
        post::PostMarker,
        reply::ReplyMarker,
        repost::Repost,
        user::UserMarker,
    },
    util::now,
};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum LikeTarget {
    Post(Id<PostMarker>),
    Reply {
        post: Id<PostMarker>,
        reply: Id<ReplyMarker>,
    },
}

impl LikeTarget {
    #[must_use]
    pub fn key(self) -> DocumentKey {
        match self {
            LikeTarget::Post(post) => paths::post(post),
            LikeTarget::Reply { post, reply } => paths::reply(post, reply),
        }
    }

    #[must_use]
    pub fn post(self) -> Id<PostMarker> {
        match self {
            LikeTarget::Post(post) | LikeTarget::Reply { post, .. } => post,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct LikeUpdate {
    pub author: Id<UserMarker>,
    pub liked_by: BTreeSet<Id<UserMarker>>,
    pub like_count: u64,
    pub changed: bool,
}

impl<B: DocumentStore> StoreClient<B> {
    pub async fn set_liked(
        &self,
        target: LikeTarget,
        user: Id<UserMarker>,
        liked: bool,
    ) -> Result<LikeUpdate> {
        let key = target.key();

        let update = run_transaction::<_, _, StoreError, _>(
            &self.backend,
            std::slice::from_ref(&key),
            self.max_attempts,
            |reads| {
                let snapshot = reads
                    .get(&key)
                    .ok_or_else(|| StoreError::NotFound(key.clone()))?;
                let record: LikesRecord = decode_record(snapshot)?;

                let mut liked_by: BTreeSet<_> = record.liked_by.iter().copied().collect();
                let changed = apply_like(&mut liked_by, user, liked);
                let like_count = liked_by.len() as u64;

                let mut batch = WriteBatch::new();
                // also repairs counts that drifted from the set
                if changed || record.like_count != like_count {
                    batch.update(key.clone(), like_fields(&liked_by));
                }

                Ok((
                    batch,
                    LikeUpdate {
                        author: record.author_id,
                        liked_by,
                        like_count,
                        changed,
                    },
                ))
            },
        )
        .await?;

        debug!(%key, %user, liked, changed = update.changed, "Updated like");
        Ok(update)
    }

    pub async fn find_repost(
        &self,
        post: Id<PostMarker>,
        reposter: Id<UserMarker>,
    ) -> Result<Option<Repost>> {
        let query = Query::new(paths::reposts())
            .where_eq("originalPostId", u64::from(post))
            .where_eq("reposterId", u64::from(reposter))
            .limit(1);
        Ok(self
            .query_all::<RepostRecord, Repost>(&query)
            .await?
            .into_iter()
            .next())
    }

    /// The mirror must not exist yet, so of two racing calls only one
    /// commits. Returns `None` for the loser.
    pub async fn create_repost(
        &self,
        post: Id<PostMarker>,
        reposter: Id<UserMarker>,
        reposter_name: String,
    ) -> Result<Option<Repost>> {
        let repost = Repost {
            id: self.generate_id().await?,
            original_post: post,
            reposter,
            reposter_name,
            created_at: now(),
        };
        let fields = encode(&RepostRecord::from(&repost))?;
        let mirror = paths::user_repost(reposter, post);

        let mut batch = WriteBatch::new();
        batch
            .create(paths::repost(repost.id), fields.clone())
            .increment(paths::post(post), REPOST_COUNT, 1)
            .create(mirror.clone(), fields);

        match self.backend.commit(batch).await {
            Ok(()) => {
                debug!(repost = %repost.id, %post, %reposter, "Created repost");
                Ok(Some(repost))
            }
            Err(StoreError::PreconditionFailed(key)) if key == mirror => {
                debug!(%post, %reposter, "Repost already exists");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn delete_repost(&self, repost: &Repost) -> Result<bool> {
        let record = paths::repost(repost.id);

        let mut batch = WriteBatch::new();
        batch
            .require(record.clone(), Precondition::Exists)
            .delete(record.clone())
            .increment(paths::post(repost.original_post), REPOST_COUNT, -1)
            .delete(paths::user_repost(repost.reposter, repost.original_post));

        match self.backend.commit(batch).await {
            Ok(()) => {
                debug!(repost = %repost.id, "Deleted repost");
                Ok(true)
            }
            Err(StoreError::PreconditionFailed(key)) if key == record => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Both stats documents must exist, see [`StoreClient::ensure_stats`].
    pub async fn create_follow(&self, id: FollowId) -> Result<bool> {
        let follow = Follow {
            id,
            created_at: now(),
        };
        let key = paths::follow(id);

        let mut batch = WriteBatch::new();
        batch.create(key.clone(), encode(&FollowRecord::from(&follow))?);
        follow_deltas(&mut batch, id, 1);

        match self.backend.commit(batch).await {
            Ok(()) => {
                debug!(follow = %id, "Created follow");
                Ok(true)
            }
            Err(StoreError::PreconditionFailed(failed)) if failed == key => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub async fn delete_follow(&self, id: FollowId) -> Result<bool> {
        let key = paths::follow(id);

        let deleted = run_transaction::<_, _, StoreError, _>(
            &self.backend,
            std::slice::from_ref(&key),
            self.max_attempts,
            |reads| {
                let mut batch = WriteBatch::new();
                if reads.get(&key).is_none() {
                    return Ok((batch, false));
                }

                batch.delete(key.clone());
                follow_deltas(&mut batch, id, -1);
                Ok((batch, true))
            },
        )
        .await?;

        debug!(follow = %id, deleted, "Deleted follow");
        Ok(deleted)
    }
}
