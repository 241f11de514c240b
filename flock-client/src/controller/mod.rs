mod feed;
mod notifications;
mod profile;
mod thread;

pub use feed::FeedController;
pub use notifications::NotificationsController;
pub use profile::ProfileController;
pub use thread::ThreadController;

use crate::{
    config::ClientConfig,
    error::InteractionError,
    interactions::Interactions,
    state::{Likeable, LocalLikes, ViewState},
    tasks::Tasks,
};
use flock_common::model::{Id, user::UserMarker};
use flock_store::social::LikeUpdate;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::warn;

pub(crate) struct Screen<B, S> {
    pub interactions: Arc<Interactions<B>>,
    pub me: Id<UserMarker>,
    pub config: ClientConfig,
    pub state: Arc<watch::Sender<S>>,
    ops: Arc<AtomicU64>,
    tasks: Tasks,
}

impl<B, S> Clone for Screen<B, S> {
    fn clone(&self) -> Self {
        Self {
            interactions: Arc::clone(&self.interactions),
            me: self.me,
            config: self.config,
            state: Arc::clone(&self.state),
            ops: Arc::clone(&self.ops),
            tasks: self.tasks.clone(),
        }
    }
}

impl<B, S: ViewState> Screen<B, S> {
    pub fn new(
        interactions: Arc<Interactions<B>>,
        me: Id<UserMarker>,
        config: ClientConfig,
        initial: S,
    ) -> Self {
        let (state, _) = watch::channel(initial);

        Self {
            interactions,
            me,
            config,
            state: Arc::new(state),
            ops: Arc::new(AtomicU64::new(0)),
            tasks: Tasks::default(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.state.subscribe()
    }

    /// Stamp of a new operation. Completions only touch entries still
    /// carrying their own stamp, so later toggles win over earlier ones.
    pub fn next_op(&self) -> u64 {
        self.ops.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn spawn<F, Fut>(&self, task: F) -> JoinHandle<()>
    where
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task(self.clone()))
    }

    /// Not awaited by `settle`.
    pub fn spawn_detached<F, Fut>(&self, task: F) -> JoinHandle<()>
    where
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(task(self.clone()))
    }

    pub async fn settle(&self) {
        self.tasks.settle().await;
    }

    pub fn start_loading(&self) {
        self.state.send_modify(|state| state.set_loading(true));
    }

    pub fn finish_loading<T>(
        &self,
        action: &'static str,
        result: Result<T, InteractionError>,
        apply: impl FnOnce(&mut S, T),
    ) {
        if let Err(error) = &result {
            warn!(%error, user = %self.me, action, "Failed to load screen");
        }

        self.state.send_modify(|state| {
            state.set_loading(false);
            match result {
                Ok(value) => {
                    apply(state, value);
                    state.set_error(None);
                }
                Err(error) => state.set_error(Some(error.to_string())),
            }
        });
    }

    pub fn report(&self, action: &'static str, error: &InteractionError) {
        warn!(%error, user = %self.me, action, "Interaction failed");
        self.state
            .send_modify(|state| state.set_error(Some(error.to_string())));
    }
}

pub(crate) fn copy_on_write<T: Clone, R>(
    items: &mut Arc<[T]>,
    f: impl FnOnce(&mut [T]) -> R,
) -> R {
    let mut copy = items.to_vec();
    let result = f(&mut copy);
    *items = copy.into();
    result
}

pub(crate) struct PendingLike {
    pub desired: bool,
    previous: LocalLikes,
}

pub(crate) fn begin_like<'a, T: Likeable + 'a>(
    entries: impl IntoIterator<Item = &'a mut T>,
    me: Id<UserMarker>,
    op: u64,
) -> Option<PendingLike> {
    let mut pending: Option<PendingLike> = None;

    for entry in entries {
        let previous = entry.likes();
        let desired = pending.as_ref().map_or(!previous.liked, |pending| pending.desired);
        entry.set_likes(previous.toggled(me, desired));
        entry.set_op(op);
        if pending.is_none() {
            pending = Some(PendingLike { desired, previous });
        }
    }

    pending
}

pub(crate) fn finish_like<'a, T: Likeable + 'a>(
    entries: impl IntoIterator<Item = &'a mut T>,
    op: u64,
    pending: &PendingLike,
    outcome: Option<&LikeUpdate>,
    me: Id<UserMarker>,
    revert: bool,
) -> bool {
    let mut touched = false;

    for entry in entries.into_iter().filter(|entry| entry.op() == op) {
        match outcome {
            Some(update) => entry.set_likes(LocalLikes::committed(update, me)),
            None if revert => entry.set_likes(pending.previous.clone()),
            None => {}
        }
        touched = true;
    }

    touched
}
