use flock_common::model::{
    Id,
    notification::Notification,
    post::{Post, PostMarker},
    reply::Reply,
    repost::Repost,
    stats::UserStats,
    user::{UserMarker, UserProfile},
};
use flock_store::social::LikeUpdate;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PostView {
    pub post: Post,
    pub liked: bool,
    pub reposted: bool,
    pub(crate) op: u64,
}

impl PostView {
    #[must_use]
    pub fn new(post: Post, me: Id<UserMarker>, reposted: &BTreeSet<Id<PostMarker>>) -> Self {
        Self {
            liked: post.is_liked_by(me),
            reposted: reposted.contains(&post.id),
            post,
            op: 0,
        }
    }

    pub(crate) fn reconcile(&mut self, fresh: &Post, me: Id<UserMarker>) {
        self.post.like_count = fresh.like_count;
        self.post.liked_by.clone_from(&fresh.liked_by);
        self.post.reply_count = fresh.reply_count;
        self.post.repost_count = fresh.repost_count;
        self.liked = fresh.is_liked_by(me);
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ReplyView {
    pub reply: Reply,
    pub liked: bool,
    pub(crate) op: u64,
}

impl ReplyView {
    #[must_use]
    pub fn new(reply: Reply, me: Id<UserMarker>) -> Self {
        Self {
            liked: reply.is_liked_by(me),
            reply,
            op: 0,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) struct LocalLikes {
    pub liked_by: BTreeSet<Id<UserMarker>>,
    pub like_count: u64,
    pub liked: bool,
}

impl LocalLikes {
    pub fn toggled(&self, me: Id<UserMarker>, desired: bool) -> Self {
        let mut next = self.clone();
        let changed = if desired {
            next.liked_by.insert(me)
        } else {
            next.liked_by.remove(&me)
        };
        if changed {
            next.like_count = if desired {
                next.like_count.saturating_add(1)
            } else {
                next.like_count.saturating_sub(1)
            };
        }
        next.liked = desired;
        next
    }

    pub fn committed(update: &LikeUpdate, me: Id<UserMarker>) -> Self {
        Self {
            liked_by: update.liked_by.clone(),
            like_count: update.like_count,
            liked: update.liked_by.contains(&me),
        }
    }
}

pub(crate) trait Likeable {
    fn likes(&self) -> LocalLikes;
    fn set_likes(&mut self, likes: LocalLikes);
    fn op(&self) -> u64;
    fn set_op(&mut self, op: u64);
}

impl Likeable for PostView {
    fn likes(&self) -> LocalLikes {
        LocalLikes {
            liked_by: self.post.liked_by.clone(),
            like_count: self.post.like_count,
            liked: self.liked,
        }
    }

    fn set_likes(&mut self, likes: LocalLikes) {
        self.post.liked_by = likes.liked_by;
        self.post.like_count = likes.like_count;
        self.liked = likes.liked;
    }

    fn op(&self) -> u64 {
        self.op
    }

    fn set_op(&mut self, op: u64) {
        self.op = op;
    }
}

impl Likeable for ReplyView {
    fn likes(&self) -> LocalLikes {
        LocalLikes {
            liked_by: self.reply.liked_by.clone(),
            like_count: self.reply.like_count,
            liked: self.liked,
        }
    }

    fn set_likes(&mut self, likes: LocalLikes) {
        self.reply.liked_by = likes.liked_by;
        self.reply.like_count = likes.like_count;
        self.liked = likes.liked;
    }

    fn op(&self) -> u64 {
        self.op
    }

    fn set_op(&mut self, op: u64) {
        self.op = op;
    }
}

pub(crate) trait ViewState: Send + Sync + 'static {
    fn set_loading(&mut self, loading: bool);
    fn set_error(&mut self, error: Option<String>);
}

macro_rules! impl_view_state {
    ($($state:ty),*) => {
        $(
            impl ViewState for $state {
                fn set_loading(&mut self, loading: bool) {
                    self.loading = loading;
                }

                fn set_error(&mut self, error: Option<String>) {
                    self.last_error = error;
                }
            }
        )*
    };
}

impl_view_state!(FeedState, ThreadState, ProfileState, NotificationsState);

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct FeedState {
    pub entries: Arc<[PostView]>,
    pub loading: bool,
    pub last_error: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct ThreadState {
    pub post: Option<PostView>,
    pub replies: Arc<[ReplyView]>,
    pub loading: bool,
    pub last_error: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct ProfileState {
    pub profile: Option<UserProfile>,
    pub stats: Option<UserStats>,
    pub reposts: Arc<[Repost]>,
    pub follow_status: Arc<BTreeMap<Id<UserMarker>, bool>>,
    pub loading: bool,
    pub last_error: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct NotificationsState {
    pub notifications: Arc<[Notification]>,
    pub unread: usize,
    pub loading: bool,
    pub last_error: Option<String>,
}
