use flock_client::{
    config::{ClientConfig, ConfigError},
    controller::{FeedController, NotificationsController, ProfileController, ThreadController},
    interactions::Interactions,
};
use flock_common::model::{
    Id, ModelValidationError,
    notification::NotificationKind,
    post::{CreatePost, PostContent},
    user::{Author, DisplayName, UserMarker, UserProfile},
};
use flock_store::{error::StoreError, memory::MemoryStore};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Error seeding the store: {0}")]
    Store(#[from] StoreError),
    #[error("Invalid seed data: {0}")]
    Data(#[from] ModelValidationError),
    #[error("Background task failed: {0}")]
    Task(#[from] JoinError),
    #[error("Error serializing the summary: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    post_id: String,
    like_count: u64,
    repost_count: u64,
    reply_count: u64,
    liked_by_viewer: bool,
    reposted_by_viewer: bool,
    author_followers: u64,
    viewer_follows_author: bool,
    notifications: Vec<NotificationSummary>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationSummary {
    kind: NotificationKind,
    sender_name: String,
    read: bool,
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "flock_client=debug,flock_store=debug,flock_common=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn profile(id: u64, name: &str) -> Result<UserProfile, InitError> {
    Ok(UserProfile {
        id: Id::from(id),
        name: DisplayName::new(name.to_owned()).map_err(ModelValidationError::from)?,
        avatar_url: None,
        bio: String::new(),
    })
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let config = ClientConfig::from_env()?;
    let interactions = Arc::new(Interactions::from_config(MemoryStore::new(), &config));
    let store = interactions.store();

    let author = profile(1, "Ada")?;
    let viewer = profile(2, "Bob")?;
    store.put_profile(&author).await?;
    store.put_profile(&viewer).await?;
    let post = store
        .create_post(CreatePost {
            author: Author::from(&author),
            content: PostContent::new("Hello from flock".to_owned())
                .map_err(ModelValidationError::from)?,
            image_urls: Vec::new(),
        })
        .await?;
    info!(post = %post.id, "Seeded store");

    let me: Id<UserMarker> = viewer.id;
    let feed = FeedController::new(Arc::clone(&interactions), me, config);
    feed.refresh().await?;
    if let Some(like) = feed.toggle_like(post.id) {
        like.await?;
    }
    if let Some(repost) = feed.toggle_repost(post.id) {
        repost.await?;
    }

    let thread = ThreadController::new(Arc::clone(&interactions), me, config, post.id);
    thread.refresh().await?;
    let reply = PostContent::new("Welcome!".to_owned()).map_err(ModelValidationError::from)?;
    thread.post_reply(reply).await?;

    let page = ProfileController::new(Arc::clone(&interactions), me, config, author.id);
    page.refresh().await?;
    page.toggle_follow(author.id).await?;
    interactions.settle().await;

    let inbox = NotificationsController::new(Arc::clone(&interactions), author.id, config);
    inbox.refresh().await?;

    let feed_state = feed.state();
    let stored = store.fetch_post(post.id).await?;
    let profile_state = page.state();
    let summary = Summary {
        post_id: post.id.to_string(),
        like_count: stored.as_ref().map_or(0, |post| post.like_count),
        repost_count: stored.as_ref().map_or(0, |post| post.repost_count),
        reply_count: stored.as_ref().map_or(0, |post| post.reply_count),
        liked_by_viewer: feed_state.entries.iter().any(|entry| entry.liked),
        reposted_by_viewer: feed_state.entries.iter().any(|entry| entry.reposted),
        author_followers: profile_state.stats.map_or(0, |stats| stats.followers_count),
        viewer_follows_author: page.is_following(author.id).unwrap_or(false),
        notifications: inbox
            .state()
            .notifications
            .iter()
            .map(|notification| NotificationSummary {
                kind: notification.kind,
                sender_name: notification.sender_name.clone(),
                read: notification.read,
            })
            .collect(),
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
