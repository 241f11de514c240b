use crate::{
    backend::DocumentStore,
    counters::{REPLY_COUNT, empty_stats},
    document::{DocumentChange, Fields, paths},
    error::{Result, StoreError},
    query::{Direction, Query},
    record::{
        FollowRecord, NotificationRecord, PostRecord, ProfileRecord, ReplyRecord, RepostRecord,
        StatsRecord, decode, encode,
    },
    transaction::DEFAULT_MAX_ATTEMPTS,
    write::WriteBatch,
};
use flock_common::{
    model::{
        FlockSnowflakeGenerator, Id, ModelValidationError,
        follow::{Follow, FollowId},
        notification::{CreateNotification, Notification, NotificationMarker},
        post::{CreatePost, Post, PostMarker},
        reply::{CreateReply, Reply},
        repost::Repost,
        stats::UserStats,
        user::{UserMarker, UserProfile},
    },
    snowflake::{ProcessId, WorkerId},
    util::now,
};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

pub struct StoreClient<B> {
    pub(crate) backend: B,
    snowflake_generator: Mutex<FlockSnowflakeGenerator>,
    pub(crate) max_attempts: u32,
}

impl<B: DocumentStore> StoreClient<B> {
    #[must_use]
    pub fn new(backend: B, worker_id: WorkerId, process_id: ProcessId) -> Self {
        let snowflake_generator = Mutex::new(FlockSnowflakeGenerator::new(worker_id, process_id));

        Self {
            backend,
            snowflake_generator,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn changes(&self) -> broadcast::Receiver<DocumentChange> {
        self.backend.changes()
    }

    pub(crate) async fn generate_id<Marker>(&self) -> Result<Id<Marker>> {
        let snowflake = self.snowflake_generator.lock().await.generate()?;
        Ok(Id::new(snowflake))
    }

    pub(crate) async fn query_all<R, M>(&self, query: &Query) -> Result<Vec<M>>
    where
        R: DeserializeOwned,
        M: TryFrom<R, Error = ModelValidationError>,
    {
        self.backend
            .query(query)
            .await?
            .iter()
            .map(decode::<R, M>)
            .collect()
    }

    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let snapshot = self.backend.get(&paths::post(post_id)).await?;
        snapshot.as_ref().map(decode::<PostRecord, Post>).transpose()
    }

    pub async fn create_post(&self, post: CreatePost) -> Result<Post> {
        let post = Post {
            id: self.generate_id().await?,
            author: post.author,
            content: post.content,
            image_urls: post.image_urls,
            created_at: now(),
            like_count: 0,
            reply_count: 0,
            repost_count: 0,
            liked_by: BTreeSet::new(),
            repost: None,
        };

        let mut batch = WriteBatch::new();
        batch.create(paths::post(post.id), encode(&PostRecord::from(&post))?);
        self.backend.commit(batch).await?;

        debug!(post = %post.id, author = %post.author.id, "Created post");
        Ok(post)
    }

    pub async fn fetch_recent_posts(&self, limit: usize) -> Result<Vec<Post>> {
        let query = Query::new(paths::posts())
            .order_by("createdAt", Direction::Descending)
            .limit(limit);
        self.query_all::<PostRecord, Post>(&query).await
    }

    pub async fn fetch_user_posts(
        &self,
        user_id: Id<UserMarker>,
        limit: usize,
    ) -> Result<Vec<Post>> {
        let query = Query::new(paths::posts())
            .where_eq("authorId", u64::from(user_id))
            .order_by("createdAt", Direction::Descending)
            .limit(limit);
        self.query_all::<PostRecord, Post>(&query).await
    }

    pub async fn fetch_recent_reposts(&self, limit: usize) -> Result<Vec<Repost>> {
        let query = Query::new(paths::reposts())
            .order_by("timestamp", Direction::Descending)
            .limit(limit);
        self.query_all::<RepostRecord, Repost>(&query).await
    }

    pub async fn fetch_user_reposts(&self, user_id: Id<UserMarker>) -> Result<Vec<Repost>> {
        let query = Query::new(paths::user_reposts(user_id))
            .order_by("timestamp", Direction::Descending);
        self.query_all::<RepostRecord, Repost>(&query).await
    }

    pub async fn fetch_replies(&self, post_id: Id<PostMarker>) -> Result<Vec<Reply>> {
        let query =
            Query::new(paths::replies(post_id)).order_by("createdAt", Direction::Ascending);
        self.query_all::<ReplyRecord, Reply>(&query).await
    }

    pub async fn create_reply(&self, reply: CreateReply) -> Result<Reply> {
        let reply = Reply {
            id: self.generate_id().await?,
            post: reply.post,
            author: reply.author,
            content: reply.content,
            created_at: now(),
            like_count: 0,
            liked_by: BTreeSet::new(),
            repost_count: 0,
        };

        let mut batch = WriteBatch::new();
        batch
            .create(
                paths::reply(reply.post, reply.id),
                encode(&ReplyRecord::from(&reply))?,
            )
            .increment(paths::post(reply.post), REPLY_COUNT, 1);
        self.backend.commit(batch).await?;

        debug!(reply = %reply.id, post = %reply.post, "Created reply");
        Ok(reply)
    }

    pub async fn fetch_profile(&self, user_id: Id<UserMarker>) -> Result<Option<UserProfile>> {
        let snapshot = self.backend.get(&paths::user(user_id)).await?;
        snapshot
            .as_ref()
            .map(decode::<ProfileRecord, UserProfile>)
            .transpose()
    }

    pub async fn put_profile(&self, profile: &UserProfile) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.set(paths::user(profile.id), encode(&ProfileRecord::from(profile))?);
        self.backend.commit(batch).await
    }

    pub async fn fetch_stats(&self, user_id: Id<UserMarker>) -> Result<Option<UserStats>> {
        let snapshot = self.backend.get(&paths::user_stats(user_id)).await?;
        snapshot
            .as_ref()
            .map(decode::<StatsRecord, UserStats>)
            .transpose()
    }

    /// Creates the stats aggregate with zero counts unless it exists. Losing
    /// a creation race to another client counts as success.
    pub async fn ensure_stats(&self, user_id: Id<UserMarker>) -> Result<()> {
        let key = paths::user_stats(user_id);
        if self.backend.get(&key).await?.is_some() {
            return Ok(());
        }

        let mut batch = WriteBatch::new();
        batch.create(key, empty_stats(user_id)?);
        match self.backend.commit(batch).await {
            Ok(()) => {
                debug!(user = %user_id, "Initialized user stats");
                Ok(())
            }
            Err(StoreError::PreconditionFailed(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }

    pub async fn fetch_follow(&self, id: FollowId) -> Result<Option<Follow>> {
        let snapshot = self.backend.get(&paths::follow(id)).await?;
        snapshot
            .as_ref()
            .map(decode::<FollowRecord, Follow>)
            .transpose()
    }

    pub async fn fetch_following(&self, user_id: Id<UserMarker>) -> Result<Vec<Id<UserMarker>>> {
        let query = Query::new(paths::follows()).where_eq("followerId", u64::from(user_id));
        let follows = self.query_all::<FollowRecord, Follow>(&query).await?;
        Ok(follows.into_iter().map(|follow| follow.id.followed).collect())
    }

    pub async fn fetch_followers(&self, user_id: Id<UserMarker>) -> Result<Vec<Id<UserMarker>>> {
        let query = Query::new(paths::follows()).where_eq("followedId", u64::from(user_id));
        let follows = self.query_all::<FollowRecord, Follow>(&query).await?;
        Ok(follows.into_iter().map(|follow| follow.id.follower).collect())
    }

    pub async fn create_notification(
        &self,
        notification: CreateNotification,
    ) -> Result<Notification> {
        let notification = Notification {
            id: self.generate_id().await?,
            recipient: notification.recipient,
            sender: notification.sender,
            sender_name: notification.sender_name,
            kind: notification.kind,
            post: notification.post,
            created_at: now(),
            read: false,
        };

        let mut batch = WriteBatch::new();
        batch.create(
            paths::notification(notification.id),
            encode(&NotificationRecord::from(&notification))?,
        );
        self.backend.commit(batch).await?;

        Ok(notification)
    }

    pub async fn fetch_notifications(
        &self,
        recipient: Id<UserMarker>,
        limit: usize,
    ) -> Result<Vec<Notification>> {
        let query = Query::new(paths::notifications())
            .where_eq("recipientId", u64::from(recipient))
            .order_by("timestamp", Direction::Descending)
            .limit(limit);
        self.query_all::<NotificationRecord, Notification>(&query)
            .await
    }

    pub async fn mark_notification_read(&self, id: Id<NotificationMarker>) -> Result<()> {
        let mut fields = Fields::new();
        fields.insert("read".to_owned(), true.into());

        let mut batch = WriteBatch::new();
        batch.update(paths::notification(id), fields);
        self.backend.commit(batch).await
    }
}
