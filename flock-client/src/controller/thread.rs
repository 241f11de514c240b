use crate::{
    config::ClientConfig,
    controller::{Screen, begin_like, copy_on_write, finish_like},
    error::{InteractionError, Result},
    interactions::Interactions,
    state::{PostView, ReplyView, ThreadState},
};
use flock_common::model::{
    Id,
    post::{PostContent, PostMarker},
    reply::ReplyMarker,
    user::UserMarker,
};
use flock_store::{backend::DocumentStore, social::LikeTarget};
use std::{collections::BTreeSet, sync::Arc};
use tokio::{sync::watch, task::JoinHandle};

pub struct ThreadController<B> {
    screen: Screen<B, ThreadState>,
    post: Id<PostMarker>,
}

impl<B: DocumentStore> ThreadController<B> {
    #[must_use]
    pub fn new(
        interactions: Arc<Interactions<B>>,
        me: Id<UserMarker>,
        config: ClientConfig,
        post: Id<PostMarker>,
    ) -> Self {
        Self {
            screen: Screen::new(interactions, me, config, ThreadState::default()),
            post,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ThreadState> {
        self.screen.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> ThreadState {
        self.screen.state.borrow().clone()
    }

    pub async fn settle(&self) {
        self.screen.settle().await;
    }

    pub fn refresh(&self) -> JoinHandle<()> {
        let post = self.post;

        self.screen.start_loading();
        self.screen.spawn(move |screen| async move {
            let result = screen.load(post).await;
            screen.finish_loading("load thread", result, |state, (post, replies)| {
                state.post = Some(post);
                state.replies = replies;
            });
        })
    }

    pub fn toggle_post_like(&self) -> Option<JoinHandle<()>> {
        let me = self.screen.me;
        let op = self.screen.next_op();
        let post = self.post;

        let mut pending = None;
        self.screen.state.send_if_modified(|state| {
            pending = begin_like(state.post.iter_mut(), me, op);
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
                let outcome = result.as_ref().ok();
                finish_like(state.post.iter_mut(), op, &pending, outcome, me, revert)
            });

            if let Err(error) = result {
                screen.report("like post", &error);
            }
        }))
    }

    pub fn toggle_reply_like(&self, reply: Id<ReplyMarker>) -> Option<JoinHandle<()>> {
        let me = self.screen.me;
        let op = self.screen.next_op();
        let post = self.post;

        let mut pending = None;
        self.screen.state.send_if_modified(|state| {
            pending = copy_on_write(&mut state.replies, |replies| {
                begin_like(replies.iter_mut().filter(|r| r.reply.id == reply), me, op)
            });
            pending.is_some()
        });
        let pending = pending?;

        Some(self.screen.spawn(move |screen| async move {
            let target = LikeTarget::Reply { post, reply };
            let result = screen
                .interactions
                .set_like(target, me, pending.desired)
                .await;

            let revert = screen.config.revert_on_failure;
            screen.state.send_if_modified(|state| {
                copy_on_write(&mut state.replies, |replies| {
                    finish_like(
                        replies.iter_mut().filter(|r| r.reply.id == reply),
                        op,
                        &pending,
                        result.as_ref().ok(),
                        me,
                        revert,
                    )
                })
            });

            if let Err(error) = result {
                screen.report("like reply", &error);
            }
        }))
    }

    pub fn post_reply(&self, content: PostContent) -> JoinHandle<()> {
        let post = self.post;

        self.screen.spawn(move |screen| async move {
            let result = screen
                .interactions
                .post_reply(post, screen.me, content)
                .await;

            match result {
                Ok(reply) => {
                    let view = ReplyView::new(reply, screen.me);
                    screen.state.send_modify(|state| {
                        state.replies = state
                            .replies
                            .iter()
                            .cloned()
                            .chain(std::iter::once(view))
                            .collect();
                        if let Some(post) = &mut state.post {
                            post.post.reply_count = post.post.reply_count.saturating_add(1);
                        }
                    });
                }
                Err(error) => screen.report("post reply", &error),
            }
        })
    }
}

impl<B: DocumentStore> Screen<B, ThreadState> {
    async fn load(&self, post: Id<PostMarker>) -> Result<(PostView, Arc<[ReplyView]>)> {
        let store = self.interactions.store();

        let loaded = store
            .fetch_post(post)
            .await?
            .ok_or(InteractionError::PostNotFound(post))?;
        let reposted: BTreeSet<_> = store
            .find_repost(post, self.me)
            .await?
            .map(|repost| repost.original_post)
            .into_iter()
            .collect();
        let replies = store
            .fetch_replies(post)
            .await?
            .into_iter()
            .map(|reply| ReplyView::new(reply, self.me))
            .collect();

        Ok((PostView::new(loaded, self.me, &reposted), replies))
    }
}
