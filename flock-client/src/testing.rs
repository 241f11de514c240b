use crate::{config::ClientConfig, interactions::Interactions};
use flock_common::model::{
    Id,
    post::{CreatePost, Post, PostContent},
    user::{Author, DisplayName, UserMarker, UserProfile},
};
use flock_store::{client::StoreClient, memory::MemoryStore};
use std::{sync::Arc, time::Duration};

pub(crate) type TestBackend = Arc<MemoryStore>;

pub(crate) struct TestWorld {
    pub backend: TestBackend,
    pub store: Arc<StoreClient<TestBackend>>,
    pub interactions: Arc<Interactions<TestBackend>>,
    pub config: ClientConfig,
    pub ada: Id<UserMarker>,
    pub bob: Id<UserMarker>,
    pub carol: Id<UserMarker>,
    pub post: Post,
}

impl TestWorld {
    pub async fn new() -> Self {
        Self::build(MemoryStore::new(), ClientConfig::default()).await
    }

    pub async fn slow() -> Self {
        Self::build(
            MemoryStore::new().with_latency(Duration::from_millis(1)),
            ClientConfig::default(),
        )
        .await
    }

    pub async fn with_config(config: ClientConfig) -> Self {
        Self::build(MemoryStore::new(), config).await
    }

    async fn build(backend: MemoryStore, config: ClientConfig) -> Self {
        let backend = Arc::new(backend);
        let store = Arc::new(
            StoreClient::new(Arc::clone(&backend), config.worker_id, config.process_id)
                .with_max_attempts(config.transaction_max_attempts),
        );
        let interactions = Arc::new(Interactions::new(Arc::clone(&store), &config));

        let mut profiles = Vec::new();
        for (id, name) in [(1, "Ada"), (2, "Bob"), (3, "Carol")] {
            let profile = UserProfile {
                id: Id::from(id),
                name: DisplayName::new(name.to_owned()).unwrap(),
                avatar_url: None,
                bio: String::new(),
            };
            store.put_profile(&profile).await.unwrap();
            profiles.push(profile);
        }

        let post = store
            .create_post(CreatePost {
                author: Author::from(&profiles[0]),
                content: PostContent::new("hello flock".to_owned()).unwrap(),
                image_urls: Vec::new(),
            })
            .await
            .unwrap();

        Self {
            backend,
            store,
            interactions,
            config,
            ada: profiles[0].id,
            bob: profiles[1].id,
            carol: profiles[2].id,
            post,
        }
    }

    pub async fn create_post(&self, author: Id<UserMarker>, content: &str) -> Post {
        let profile = self.store.fetch_profile(author).await.unwrap().unwrap();
        self.store
            .create_post(CreatePost {
                author: Author::from(&profile),
                content: PostContent::new(content.to_owned()).unwrap(),
                image_urls: Vec::new(),
            })
            .await
            .unwrap()
    }
}
