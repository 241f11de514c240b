use crate::{
    config::ClientConfig,
    error::{InteractionError, Result},
    notify::Notifier,
};
use flock_common::model::{
    Id,
    follow::FollowId,
    notification::NotificationKind,
    post::{Post, PostContent, PostMarker},
    reply::{CreateReply, Reply},
    repost::Repost,
    user::{Author, UserMarker},
};
use flock_store::{
    backend::DocumentStore,
    client::StoreClient,
    social::{LikeTarget, LikeUpdate},
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum RepostOutcome {
    Created(Repost),
    AlreadyReposted,
}

pub struct Interactions<B> {
    store: Arc<StoreClient<B>>,
    notifier: Notifier<B>,
}

impl<B: DocumentStore> Interactions<B> {
    #[must_use]
    pub fn new(store: Arc<StoreClient<B>>, config: &ClientConfig) -> Self {
        let notifier = Notifier::new(Arc::clone(&store), config.notifications_enabled);
        Self { store, notifier }
    }

    #[must_use]
    pub fn from_config(backend: B, config: &ClientConfig) -> Self {
        let store = StoreClient::new(backend, config.worker_id, config.process_id)
            .with_max_attempts(config.transaction_max_attempts);
        Self::new(Arc::new(store), config)
    }

    #[must_use]
    pub fn store(&self) -> &Arc<StoreClient<B>> {
        &self.store
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier<B> {
        &self.notifier
    }

    pub async fn settle(&self) {
        self.notifier.settle().await;
    }

    pub async fn set_like(
        &self,
        target: LikeTarget,
        actor: Id<UserMarker>,
        desired: bool,
    ) -> Result<LikeUpdate> {
        let update = self.store.set_liked(target, actor, desired).await?;

        if desired && update.changed {
            self.notifier.emit(
                update.author,
                actor,
                NotificationKind::Like,
                Some(target.post()),
            );
        }

        Ok(update)
    }

    pub async fn repost(
        &self,
        post: Id<PostMarker>,
        actor: Id<UserMarker>,
    ) -> Result<RepostOutcome> {
        let original = self.fetch_post(post).await?;
        if self.store.find_repost(post, actor).await?.is_some() {
            debug!(%post, %actor, "Post is already reposted");
            return Ok(RepostOutcome::AlreadyReposted);
        }

        let reposter_name = self.author(actor).await?.name;
        let Some(repost) = self.store.create_repost(post, actor, reposter_name).await? else {
            return Ok(RepostOutcome::AlreadyReposted);
        };

        info!(%post, %actor, "Reposted post");
        self.notifier.emit(
            original.author.id,
            actor,
            NotificationKind::Repost,
            Some(post),
        );
        Ok(RepostOutcome::Created(repost))
    }

    pub async fn undo_repost(
        &self,
        post: Id<PostMarker>,
        actor: Id<UserMarker>,
    ) -> Result<bool> {
        let Some(repost) = self.store.find_repost(post, actor).await? else {
            return Ok(false);
        };

        let deleted = self.store.delete_repost(&repost).await?;
        if deleted {
            info!(%post, %actor, "Undid repost");
        }
        Ok(deleted)
    }

    pub async fn is_following(
        &self,
        actor: Id<UserMarker>,
        target: Id<UserMarker>,
    ) -> Result<bool> {
        let follow = self.store.fetch_follow(FollowId::new(actor, target)).await?;
        Ok(follow.is_some())
    }

    pub async fn follow(&self, actor: Id<UserMarker>, target: Id<UserMarker>) -> Result<bool> {
        let id = self.prepare_follow(actor, target).await?;
        self.create_follow(id).await
    }

    pub async fn unfollow(&self, actor: Id<UserMarker>, target: Id<UserMarker>) -> Result<bool> {
        let id = self.prepare_follow(actor, target).await?;
        self.delete_follow(id).await
    }

    pub async fn toggle_follow(
        &self,
        actor: Id<UserMarker>,
        target: Id<UserMarker>,
    ) -> Result<bool> {
        let id = self.prepare_follow(actor, target).await?;

        if self.store.fetch_follow(id).await?.is_some() {
            self.delete_follow(id).await?;
            Ok(false)
        } else {
            self.create_follow(id).await?;
            Ok(true)
        }
    }

    pub async fn post_reply(
        &self,
        post: Id<PostMarker>,
        actor: Id<UserMarker>,
        content: PostContent,
    ) -> Result<Reply> {
        let original = self.fetch_post(post).await?;
        let author = self.author(actor).await?;

        let reply = self
            .store
            .create_reply(CreateReply {
                post,
                author,
                content,
            })
            .await?;

        self.notifier.emit(
            original.author.id,
            actor,
            NotificationKind::Reply,
            Some(post),
        );
        Ok(reply)
    }

    async fn fetch_post(&self, post: Id<PostMarker>) -> Result<Post> {
        self.store
            .fetch_post(post)
            .await?
            .ok_or(InteractionError::PostNotFound(post))
    }

    async fn author(&self, actor: Id<UserMarker>) -> Result<Author> {
        let profile = self.store.fetch_profile(actor).await?;
        Ok(profile.as_ref().map_or_else(
            || Author {
                id: actor,
                name: String::new(),
                avatar_url: None,
            },
            Author::from,
        ))
    }

    async fn prepare_follow(
        &self,
        actor: Id<UserMarker>,
        target: Id<UserMarker>,
    ) -> Result<FollowId> {
        let id = FollowId::new(actor, target);
        if id.is_self_follow() {
            return Err(InteractionError::SelfFollow(actor));
        }

        self.store.ensure_stats(actor).await?;
        self.store.ensure_stats(target).await?;
        Ok(id)
    }

    async fn create_follow(&self, id: FollowId) -> Result<bool> {
        let created = self.store.create_follow(id).await?;
        if created {
            info!(follower = %id.follower, followed = %id.followed, "Followed user");
            self.notifier
                .emit(id.followed, id.follower, NotificationKind::Follow, None);
        }
        Ok(created)
    }

    async fn delete_follow(&self, id: FollowId) -> Result<bool> {
        let deleted = self.store.delete_follow(id).await?;
        if deleted {
            info!(follower = %id.follower, followed = %id.followed, "Unfollowed user");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::ClientConfig,
        error::InteractionError,
        interactions::RepostOutcome,
        testing::TestWorld,
    };
    use flock_common::model::{
        Id, follow::FollowId, notification::NotificationKind, post::PostContent,
    };
    use flock_store::{document::paths, error::StoreError, memory::Fault, social::LikeTarget};

    #[tokio::test]
    async fn liking_a_post_records_the_liker_and_notifies_the_author() {
        let world = TestWorld::new().await;
        let target = LikeTarget::Post(world.post.id);

        let update = world
            .interactions
            .set_like(target, world.bob, true)
            .await
            .unwrap();
        world.interactions.settle().await;

        assert_eq!(update.like_count, 1);
        assert_eq!(update.liked_by.iter().copied().collect::<Vec<_>>(), [world.bob]);

        let inbox = world.store.fetch_notifications(world.ada, 10).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].sender, world.bob);
        assert_eq!(inbox[0].sender_name, "Bob");
        assert_eq!(inbox[0].kind, NotificationKind::Like);
        assert_eq!(inbox[0].post, Some(world.post.id));

        // liking your own post stays silent
        world
            .interactions
            .set_like(target, world.ada, true)
            .await
            .unwrap();
        world.interactions.settle().await;
        assert_eq!(world.backend.count(&paths::notifications()).await, 1);
    }

    #[tokio::test]
    async fn liking_twice_equals_liking_once() {
        let world = TestWorld::new().await;
        let target = LikeTarget::Post(world.post.id);

        world
            .interactions
            .set_like(target, world.bob, true)
            .await
            .unwrap();
        let once = world.store.fetch_post(world.post.id).await.unwrap().unwrap();

        let again = world
            .interactions
            .set_like(target, world.bob, true)
            .await
            .unwrap();
        world.interactions.settle().await;
        let twice = world.store.fetch_post(world.post.id).await.unwrap().unwrap();

        assert!(!again.changed);
        assert_eq!(once, twice);
        assert_eq!(world.backend.count(&paths::notifications()).await, 1);

        world
            .interactions
            .set_like(target, world.bob, false)
            .await
            .unwrap();
        world.interactions.settle().await;
        let unliked = world.store.fetch_post(world.post.id).await.unwrap().unwrap();
        assert_eq!(unliked.like_count, 0);
        assert!(unliked.liked_by.is_empty());
        assert_eq!(world.backend.count(&paths::notifications()).await, 1);
    }

    #[tokio::test]
    async fn failed_like_reports_the_error_and_writes_nothing() {
        let world = TestWorld::new().await;
        world.backend.inject(Fault::Unavailable).await;

        let result = world
            .interactions
            .set_like(LikeTarget::Post(world.post.id), world.bob, true)
            .await;
        world.interactions.settle().await;

        assert!(matches!(
            result,
            Err(InteractionError::Store(StoreError::Unavailable(_)))
        ));
        let post = world.store.fetch_post(world.post.id).await.unwrap().unwrap();
        assert_eq!(post.like_count, 0);
        assert_eq!(world.backend.count(&paths::notifications()).await, 0);
    }

    #[tokio::test]
    async fn racing_double_repost_settles_on_one_record() {
        let world = TestWorld::slow().await;
        let post = world.post.id;

        let (first, second) = tokio::join!(
            world.interactions.repost(post, world.bob),
            world.interactions.repost(post, world.bob),
        );
        world.interactions.settle().await;

        let outcomes = [first.unwrap(), second.unwrap()];
        let created = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, RepostOutcome::Created(_)))
            .count();
        assert_eq!(created, 1);
        assert!(outcomes.contains(&RepostOutcome::AlreadyReposted));

        assert_eq!(world.backend.count(&paths::reposts()).await, 1);
        assert_eq!(
            world.store.fetch_post(post).await.unwrap().unwrap().repost_count,
            1
        );
        let inbox = world.store.fetch_notifications(world.ada, 10).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::Repost);
    }

    #[tokio::test]
    async fn undo_repost_removes_record_mirror_and_count() {
        let world = TestWorld::new().await;
        let post = world.post.id;

        let outcome = world.interactions.repost(post, world.bob).await.unwrap();
        let RepostOutcome::Created(repost) = outcome else {
            panic!("repost was not created");
        };
        assert_eq!(repost.reposter_name, "Bob");
        assert_eq!(
            world.interactions.repost(post, world.bob).await.unwrap(),
            RepostOutcome::AlreadyReposted
        );

        assert!(world.interactions.undo_repost(post, world.bob).await.unwrap());
        assert!(!world.interactions.undo_repost(post, world.bob).await.unwrap());
        world.interactions.settle().await;

        assert_eq!(world.backend.count(&paths::reposts()).await, 0);
        assert!(world.store.fetch_user_reposts(world.bob).await.unwrap().is_empty());
        assert_eq!(
            world.store.fetch_post(post).await.unwrap().unwrap().repost_count,
            0
        );
        // only the repost itself notified
        assert_eq!(world.backend.count(&paths::notifications()).await, 1);

        let missing = world.interactions.repost(Id::from(404), world.bob).await;
        assert!(matches!(missing, Err(InteractionError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn follow_counters_move_symmetrically() {
        let world = TestWorld::new().await;
        let interactions = &world.interactions;

        assert!(interactions.toggle_follow(world.bob, world.ada).await.unwrap());
        interactions.settle().await;

        let ada = world.store.fetch_stats(world.ada).await.unwrap().unwrap();
        let bob = world.store.fetch_stats(world.bob).await.unwrap().unwrap();
        assert_eq!((ada.followers_count, ada.following_count), (1, 0));
        assert_eq!((bob.followers_count, bob.following_count), (0, 1));
        assert!(interactions.is_following(world.bob, world.ada).await.unwrap());
        assert!(!interactions.follow(world.bob, world.ada).await.unwrap());

        let inbox = world.store.fetch_notifications(world.ada, 10).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::Follow);

        assert!(!interactions.toggle_follow(world.bob, world.ada).await.unwrap());
        assert!(!interactions.unfollow(world.bob, world.ada).await.unwrap());

        let ada = world.store.fetch_stats(world.ada).await.unwrap().unwrap();
        let bob = world.store.fetch_stats(world.bob).await.unwrap().unwrap();
        assert_eq!((ada.followers_count, ada.following_count), (0, 0));
        assert_eq!((bob.followers_count, bob.following_count), (0, 0));
    }

    #[tokio::test]
    async fn self_follow_is_rejected() {
        let world = TestWorld::new().await;

        let result = world.interactions.toggle_follow(world.carol, world.carol).await;

        assert!(matches!(
            result,
            Err(InteractionError::SelfFollow(user)) if user == world.carol
        ));
        assert!(world.store.fetch_stats(world.carol).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn racing_follow_and_unfollow_keep_counters_bounded() {
        let world = TestWorld::slow().await;
        let interactions = &world.interactions;

        let (followed, unfollowed) = tokio::join!(
            interactions.follow(world.bob, world.carol),
            interactions.unfollow(world.bob, world.carol),
        );
        followed.unwrap();
        unfollowed.unwrap();

        let following = world
            .store
            .fetch_follow(FollowId::new(world.bob, world.carol))
            .await
            .unwrap()
            .is_some();
        let carol = world.store.fetch_stats(world.carol).await.unwrap().unwrap();
        let bob = world.store.fetch_stats(world.bob).await.unwrap().unwrap();

        assert!(carol.followers_count <= 1);
        assert_eq!(carol.followers_count, u64::from(following));
        assert_eq!(bob.following_count, u64::from(following));
    }

    #[tokio::test]
    async fn replies_bump_the_count_and_notify() {
        let world = TestWorld::new().await;

        let reply = world
            .interactions
            .post_reply(
                world.post.id,
                world.carol,
                PostContent::new("nice".to_owned()).unwrap(),
            )
            .await
            .unwrap();
        world.interactions.settle().await;

        assert_eq!(reply.author.name, "Carol");
        let post = world.store.fetch_post(world.post.id).await.unwrap().unwrap();
        assert_eq!(post.reply_count, 1);

        let inbox = world.store.fetch_notifications(world.ada, 10).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::Reply);

        let update = world
            .interactions
            .set_like(
                LikeTarget::Reply {
                    post: world.post.id,
                    reply: reply.id,
                },
                world.ada,
                true,
            )
            .await
            .unwrap();
        world.interactions.settle().await;
        assert_eq!(update.author, world.carol);
        let inbox = world.store.fetch_notifications(world.carol, 10).await.unwrap();
        assert_eq!(inbox.len(), 1);
    }

    #[tokio::test]
    async fn disabled_notifications_are_not_written() {
        let world = TestWorld::with_config(ClientConfig {
            notifications_enabled: false,
            ..ClientConfig::default()
        })
        .await;

        world
            .interactions
            .set_like(LikeTarget::Post(world.post.id), world.bob, true)
            .await
            .unwrap();
        world.interactions.follow(world.bob, world.ada).await.unwrap();
        world.interactions.settle().await;

        assert_eq!(world.backend.count(&paths::notifications()).await, 0);
    }
}
