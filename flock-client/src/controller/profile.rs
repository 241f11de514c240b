use crate::{
    config::ClientConfig,
    controller::Screen,
    error::Result,
    interactions::Interactions,
    state::ProfileState,
};
use flock_common::model::{
    Id,
    follow::FollowId,
    repost::Repost,
    stats::UserStats,
    user::{UserMarker, UserProfile},
};
use flock_store::backend::DocumentStore;
use std::sync::Arc;
use tokio::{sync::watch, task::JoinHandle};

struct LoadedProfile {
    profile: Option<UserProfile>,
    stats: UserStats,
    reposts: Arc<[Repost]>,
    following: Option<bool>,
}

pub struct ProfileController<B> {
    screen: Screen<B, ProfileState>,
    user: Id<UserMarker>,
}

impl<B: DocumentStore> ProfileController<B> {
    #[must_use]
    pub fn new(
        interactions: Arc<Interactions<B>>,
        me: Id<UserMarker>,
        config: ClientConfig,
        user: Id<UserMarker>,
    ) -> Self {
        Self {
            screen: Screen::new(interactions, me, config, ProfileState::default()),
            user,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProfileState> {
        self.screen.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> ProfileState {
        self.screen.state.borrow().clone()
    }

    #[must_use]
    pub fn is_following(&self, user: Id<UserMarker>) -> Option<bool> {
        self.screen.state.borrow().follow_status.get(&user).copied()
    }

    pub async fn settle(&self) {
        self.screen.settle().await;
    }

    pub fn refresh(&self) -> JoinHandle<()> {
        let user = self.user;

        self.screen.start_loading();
        self.screen.spawn(move |screen| async move {
            let result = screen.load(user).await;
            screen.finish_loading("load profile", result, |state, loaded| {
                state.profile = loaded.profile;
                state.stats = Some(loaded.stats);
                state.reposts = loaded.reposts;
                if let Some(following) = loaded.following {
                    let mut status = (*state.follow_status).clone();
                    status.insert(user, following);
                    state.follow_status = Arc::new(status);
                }
            });
        })
    }

    /// Follows or unfollows `target`. The follow status only changes once the
    /// store confirmed it.
    pub fn toggle_follow(&self, target: Id<UserMarker>) -> JoinHandle<()> {
        let user = self.user;

        self.screen.spawn(move |screen| async move {
            let result = screen.interactions.toggle_follow(screen.me, target).await;
            let following = match result {
                Ok(following) => following,
                Err(error) => {
                    screen.report("toggle follow", &error);
                    return;
                }
            };

            // the counters of the shown user may have moved either way
            let stats = screen.interactions.store().fetch_stats(user).await;
            screen.state.send_modify(|state| {
                let mut status = (*state.follow_status).clone();
                status.insert(target, following);
                state.follow_status = Arc::new(status);
                if let Ok(Some(stats)) = stats {
                    state.stats = Some(stats);
                }
            });
        })
    }
}

impl<B: DocumentStore> Screen<B, ProfileState> {
    async fn load(&self, user: Id<UserMarker>) -> Result<LoadedProfile> {
        let store = self.interactions.store();

        let profile = store.fetch_profile(user).await?;
        let stats = store
            .fetch_stats(user)
            .await?
            .unwrap_or_else(|| UserStats::empty(user));
        let reposts = store.fetch_user_reposts(user).await?.into();
        let following = if user == self.me {
            None
        } else {
            let follow = store.fetch_follow(FollowId::new(self.me, user)).await?;
            Some(follow.is_some())
        };

        Ok(LoadedProfile {
            profile,
            stats,
            reposts,
            following,
        })
    }
}
