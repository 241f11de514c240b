use crate::model::{
    Id,
    repost::RepostStatus,
    user::{Author, UserMarker},
};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::collections::BTreeSet;
use thiserror::Error;
use time::UtcDateTime;

pub const POST_CONTENT_MAX_LEN: usize = 500;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author: Author,
    pub content: PostContent,
    pub image_urls: Vec<String>,
    pub created_at: UtcDateTime,
    pub like_count: u64,
    pub reply_count: u64,
    pub repost_count: u64,
    pub liked_by: BTreeSet<Id<UserMarker>>,
    pub repost: Option<RepostStatus>,
}

impl Post {
    #[must_use]
    pub fn is_liked_by(&self, user: Id<UserMarker>) -> bool {
        self.liked_by.contains(&user)
    }

    #[must_use]
    pub fn likes_consistent(&self) -> bool {
        self.like_count == self.liked_by.len() as u64
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct CreatePost {
    pub author: Author,
    pub content: PostContent,
    pub image_urls: Vec<String>,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct PostContent(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The post content exceeds {POST_CONTENT_MAX_LEN} characters")]
pub struct InvalidPostContentError(String);

impl PostContent {
    pub fn new(content: String) -> Result<Self, InvalidPostContentError> {
        if content.chars().count() <= POST_CONTENT_MAX_LEN {
            Ok(PostContent(content))
        } else {
            Err(InvalidPostContentError(content))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for PostContent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        PostContent::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"PostContent"))
    }
}
