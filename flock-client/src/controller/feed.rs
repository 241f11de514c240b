use crate::{
    config::ClientConfig,
    controller::{Screen, begin_like, copy_on_write, finish_like},
    error::Result,
    interactions::Interactions,
    state::{FeedState, PostView},
};
use flock_common::model::{
    Id,
    post::{Post, PostMarker},
    repost::RepostStatus,
    user::UserMarker,
};
use flock_store::{backend::DocumentStore, social::LikeTarget};
use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet, btree_map::Entry},
    sync::Arc,
};
use time::UtcDateTime;
use tokio::{sync::watch, task::JoinHandle};
use tracing::debug;

pub struct FeedController<B> {
    screen: Screen<B, FeedState>,
}

impl<B: DocumentStore> FeedController<B> {
    #[must_use]
    pub fn new(
        interactions: Arc<Interactions<B>>,
        me: Id<UserMarker>,
        config: ClientConfig,
    ) -> Self {
        Self {
            screen: Screen::new(interactions, me, config, FeedState::default()),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.screen.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> FeedState {
        self.screen.state.borrow().clone()
    }

    pub async fn settle(&self) {
        self.screen.settle().await;
    }

    pub fn refresh(&self) -> JoinHandle<()> {
        self.screen.start_loading();
        self.screen.spawn(|screen| async move {
            let result = screen.load().await;
            screen.finish_loading("load feed", result, |state, entries| {
                state.entries = entries;
            });
        })
    }

    pub fn toggle_like(&self, post: Id<PostMarker>) -> Option<JoinHandle<()>> {
        let me = self.screen.me;
        let op = self.screen.next_op();

        let mut pending = None;
        self.screen.state.send_if_modified(|state| {
            pending = copy_on_write(&mut state.entries, |entries| {
                begin_like(entries.iter_mut().filter(|e| e.post.id == post), me, op)
            });
            pending.is_some()
        });
        let pending = pending?;

        Some(self.screen.spawn(move |screen| async move {
            let result = screen
                .interactions
                .set_like(LikeTarget::Post(post), me, pending.desired)
                .await;

            let revert = screen.config.revert_on_failure;
            screen.state.send_if_modified(|state| {
                copy_on_write(&mut state.entries, |entries| {
                    finish_like(
                        entries.iter_mut().filter(|e| e.post.id == post),
                        op,
                        &pending,
                        result.as_ref().ok(),
                        me,
                        revert,
                    )
                })
            });

            if let Err(error) = result {
                screen.report("like post", &error);
            }
        }))
    }

    pub fn toggle_repost(&self, post: Id<PostMarker>) -> Option<JoinHandle<()>> {
        let me = self.screen.me;
        let op = self.screen.next_op();

        let mut previous = None;
        self.screen.state.send_if_modified(|state| {
            let Some(current) = state.entries.iter().find(|e| e.post.id == post) else {
                return false;
            };
            let before = (current.reposted, current.post.repost_count);
            let desired = !before.0;

            copy_on_write(&mut state.entries, |entries| {
                for entry in entries.iter_mut().filter(|e| e.post.id == post) {
                    entry.reposted = desired;
                    entry.post.repost_count = if desired {
                        before.1.saturating_add(1)
                    } else {
                        before.1.saturating_sub(1)
                    };
                    entry.op = op;
                }
            });
            previous = Some(before);
            true
        });
        let (was_reposted, repost_count) = previous?;
        let desired = !was_reposted;

        Some(self.screen.spawn(move |screen| async move {
            let committed = if desired {
                screen.interactions.repost(post, me).await.map(|_| ())
            } else {
                screen.interactions.undo_repost(post, me).await.map(|_| ())
            };
            // the optimistic count is a guess, the committed one wins
            let fresh = match committed {
                Ok(()) => Some(screen.interactions.store().fetch_post(post).await),
                Err(_) => None,
            };

            let revert = screen.config.revert_on_failure;
            screen.state.send_if_modified(|state| {
                copy_on_write(&mut state.entries, |entries| {
                    let mut touched = false;
                    for entry in entries
                        .iter_mut()
                        .filter(|e| e.post.id == post && e.op == op)
                    {
                        match (&committed, &fresh) {
                            (Ok(()), Some(Ok(Some(fresh)))) => entry.reconcile(fresh, me),
                            (Err(_), _) if revert => {
                                entry.reposted = was_reposted;
                                entry.post.repost_count = repost_count;
                            }
                            _ => {}
                        }
                        touched = true;
                    }
                    touched
                })
            });

            match (committed, fresh) {
                (Err(error), _) => screen.report("toggle repost", &error),
                (Ok(()), Some(Err(error))) => screen.report("refetch reposted post", &error.into()),
                _ => {}
            }
        }))
    }
}

impl<B: DocumentStore> Screen<B, FeedState> {
    async fn load(&self) -> Result<Arc<[PostView]>> {
        let store = self.interactions.store();
        let limit = self.config.feed_page_size;

        let mut entries = store.fetch_recent_posts(limit).await?;
        let reposts = store.fetch_recent_reposts(limit).await?;
        let mine: BTreeSet<_> = store
            .fetch_user_reposts(self.me)
            .await?
            .into_iter()
            .map(|repost| repost.original_post)
            .collect();

        let mut originals: BTreeMap<Id<PostMarker>, Option<Post>> = BTreeMap::new();
        for repost in &reposts {
            let original = match originals.entry(repost.original_post) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    entry.insert(store.fetch_post(repost.original_post).await?)
                }
            };
            let Some(original) = original else {
                debug!(repost = %repost.id, "Skipping repost of a deleted post");
                continue;
            };

            let mut entry = original.clone();
            entry.repost = Some(RepostStatus::from(repost));
            entries.push(entry);
        }

        entries.sort_by_key(|post| Reverse(listed_at(post)));
        entries.truncate(limit);

        Ok(entries
            .into_iter()
            .map(|post| PostView::new(post, self.me, &mine))
            .collect())
    }
}

fn listed_at(post: &Post) -> (UtcDateTime, u64) {
    post.repost.as_ref().map_or_else(
        || (post.created_at, post.id.into()),
        |repost| (repost.reposted_at, repost.repost.into()),
    )
}
