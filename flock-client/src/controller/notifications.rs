use crate::{
    config::ClientConfig,
    controller::{Screen, copy_on_write},
    error::Result,
    interactions::Interactions,
    state::NotificationsState,
};
use flock_common::model::{
    Id,
    notification::{Notification, NotificationMarker},
    user::UserMarker,
};
use flock_store::{backend::DocumentStore, document::paths};
use std::sync::Arc;
use tokio::{
    sync::{broadcast::error::RecvError, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

pub struct NotificationsController<B> {
    screen: Screen<B, NotificationsState>,
}

impl<B: DocumentStore> NotificationsController<B> {
    #[must_use]
    pub fn new(
        interactions: Arc<Interactions<B>>,
        me: Id<UserMarker>,
        config: ClientConfig,
    ) -> Self {
        Self {
            screen: Screen::new(interactions, me, config, NotificationsState::default()),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NotificationsState> {
        self.screen.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> NotificationsState {
        self.screen.state.borrow().clone()
    }

    pub async fn settle(&self) {
        self.screen.settle().await;
    }

    pub fn refresh(&self) -> JoinHandle<()> {
        self.screen.start_loading();
        self.screen.spawn(|screen| async move {
            screen.reload().await;
        })
    }

    pub fn mark_read(&self, notification: Id<NotificationMarker>) -> JoinHandle<()> {
        self.screen.spawn(move |screen| async move {
            let store = screen.interactions.store();
            if let Err(error) = store.mark_notification_read(notification).await {
                screen.report("mark notification read", &error.into());
                return;
            }

            screen.state.send_if_modified(|state| {
                let touched = copy_on_write(&mut state.notifications, |notifications| {
                    let mut touched = false;
                    for entry in notifications.iter_mut().filter(|n| n.id == notification) {
                        touched |= !entry.read;
                        entry.read = true;
                    }
                    touched
                });
                state.unread = unread(&state.notifications);
                touched
            });
        })
    }

    /// Reloads the inbox whenever a notification document changes, until
    /// `token` is cancelled. Not covered by `settle`.
    pub fn listen(&self, token: CancellationToken) -> JoinHandle<()> {
        let mut changes = self.screen.interactions.store().changes();
        let notifications = paths::notifications();

        self.screen.spawn_detached(move |screen| async move {
            loop {
                let change = tokio::select! {
                    () = token.cancelled() => break,
                    change = changes.recv() => change,
                };

                match change {
                    Ok(change) if change.key.collection == notifications => {
                        trace!(key = %change.key, "Notification changed");
                        screen.reload().await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Change feed lagged, reloading");
                        screen.reload().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            debug!(user = %screen.me, "Stopped listening for notifications");
        })
    }
}

impl<B: DocumentStore> Screen<B, NotificationsState> {
    async fn load(&self) -> Result<Arc<[Notification]>> {
        let store = self.interactions.store();
        let notifications = store
            .fetch_notifications(self.me, self.config.feed_page_size)
            .await?;
        Ok(notifications.into())
    }

    async fn reload(&self) {
        let result = self.load().await;
        self.finish_loading("load notifications", result, |state, notifications| {
            state.unread = unread(&notifications);
            state.notifications = notifications;
        });
    }
}

fn unread(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}
