use crate::tasks::Tasks;
use flock_common::model::{
    Id,
    notification::{CreateNotification, Notification, NotificationKind},
    post::PostMarker,
    user::UserMarker,
};
use flock_store::{backend::DocumentStore, client::StoreClient, error::StoreError};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct Notifier<B> {
    store: Arc<StoreClient<B>>,
    tasks: Tasks,
    enabled: bool,
}

impl<B> Clone for Notifier<B> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            tasks: self.tasks.clone(),
            enabled: self.enabled,
        }
    }
}

impl<B: DocumentStore> Notifier<B> {
    #[must_use]
    pub fn new(store: Arc<StoreClient<B>>, enabled: bool) -> Self {
        Self {
            store,
            tasks: Tasks::default(),
            enabled,
        }
    }

    /// Failures are logged and never reach the caller.
    pub fn emit(
        &self,
        recipient: Id<UserMarker>,
        actor: Id<UserMarker>,
        kind: NotificationKind,
        post: Option<Id<PostMarker>>,
    ) -> Option<JoinHandle<()>> {
        if !self.enabled || recipient == actor {
            return None;
        }

        let notifier = self.clone();
        Some(self.tasks.spawn(async move {
            if let Err(error) = notifier.deliver(recipient, actor, kind, post).await {
                warn!(%error, %recipient, %actor, %kind, "Failed to deliver notification");
            }
        }))
    }

    pub async fn deliver(
        &self,
        recipient: Id<UserMarker>,
        actor: Id<UserMarker>,
        kind: NotificationKind,
        post: Option<Id<PostMarker>>,
    ) -> Result<Option<Notification>, StoreError> {
        if recipient == actor {
            return Ok(None);
        }

        let sender_name = self
            .store
            .fetch_profile(actor)
            .await?
            .map(|profile| profile.name.into_inner())
            .unwrap_or_default();

        let notification = self
            .store
            .create_notification(CreateNotification {
                recipient,
                sender: actor,
                sender_name,
                kind,
                post,
            })
            .await?;

        debug!(notification = %notification.id, %recipient, %kind, "Delivered notification");
        Ok(Some(notification))
    }

    pub async fn settle(&self) {
        self.tasks.settle().await;
    }
}

#[cfg(test)]
mod tests {
    use crate::{notify::Notifier, testing::TestWorld};
    use flock_common::model::{Id, notification::NotificationKind};
    use flock_store::{document::paths, memory::Fault};

    #[tokio::test]
    async fn self_notifications_are_suppressed() {
        let world = TestWorld::new().await;
        let notifier = Notifier::new(world.store.clone(), true);

        assert!(
            notifier
                .emit(world.ada, world.ada, NotificationKind::Like, None)
                .is_none()
        );
        let delivered = notifier
            .deliver(world.ada, world.ada, NotificationKind::Like, None)
            .await
            .unwrap();
        assert!(delivered.is_none());
        assert_eq!(world.backend.count(&paths::notifications()).await, 0);
    }

    #[tokio::test]
    async fn sender_name_is_looked_up_at_emit_time() {
        let world = TestWorld::new().await;
        let notifier = Notifier::new(world.store.clone(), true);

        notifier
            .emit(world.ada, world.bob, NotificationKind::Follow, None)
            .unwrap()
            .await
            .unwrap();
        let unknown = notifier
            .deliver(world.ada, Id::from(999), NotificationKind::Follow, None)
            .await
            .unwrap()
            .unwrap();

        let inbox = world.store.fetch_notifications(world.ada, 10).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert!(inbox.iter().any(|n| n.sender == world.bob && n.sender_name == "Bob"));
        assert!(unknown.sender_name.is_empty());
    }

    #[tokio::test]
    async fn failures_and_disabled_delivery_stay_silent() {
        let world = TestWorld::new().await;
        let notifier = Notifier::new(world.store.clone(), true);

        world.backend.inject(Fault::Unavailable).await;
        let handle = notifier
            .emit(world.ada, world.bob, NotificationKind::Repost, None)
            .unwrap();
        handle.await.unwrap();
        notifier.settle().await;

        let disabled = Notifier::new(world.store.clone(), false);
        assert!(
            disabled
                .emit(world.ada, world.bob, NotificationKind::Repost, None)
                .is_none()
        );
        assert_eq!(world.backend.count(&paths::notifications()).await, 0);
    }
}
