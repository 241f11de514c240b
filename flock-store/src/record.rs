use crate::{
    document::{DocumentKey, Fields, Snapshot, Value},
    error::{Result, StoreError},
};
use flock_common::{
    model::{
        Id, ModelValidationError,
        follow::{Follow, FollowId},
        notification::{Notification, NotificationKind, NotificationMarker},
        post::{Post, PostContent, PostMarker},
        reply::{Reply, ReplyMarker},
        repost::{Repost, RepostMarker},
        stats::UserStats,
        user::{Author, DisplayName, UserMarker, UserProfile},
    },
    util::{from_unix_millis, to_unix_millis},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostRecord {
    pub id: Id<PostMarker>,
    pub author_id: Id<UserMarker>,
    pub author_name: String,
    #[serde(default)]
    pub author_avatar_url: Option<String>,
    pub content: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub created_at: i64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub repost_count: u64,
    #[serde(default)]
    pub liked_by: Vec<Id<UserMarker>>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReplyRecord {
    pub id: Id<ReplyMarker>,
    pub post_id: Id<PostMarker>,
    pub author_id: Id<UserMarker>,
    pub author_name: String,
    #[serde(default)]
    pub author_avatar_url: Option<String>,
    pub content: String,
    pub created_at: i64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub liked_by: Vec<Id<UserMarker>>,
    #[serde(default)]
    pub repost_count: u64,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LikesRecord {
    pub author_id: Id<UserMarker>,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub liked_by: Vec<Id<UserMarker>>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RepostRecord {
    pub id: Id<RepostMarker>,
    pub original_post_id: Id<PostMarker>,
    pub reposter_id: Id<UserMarker>,
    #[serde(default)]
    pub reposter_name: String,
    pub timestamp: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FollowRecord {
    pub follower_id: Id<UserMarker>,
    pub followed_id: Id<UserMarker>,
    pub timestamp: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatsRecord {
    pub user_id: Id<UserMarker>,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NotificationRecord {
    pub id: Id<NotificationMarker>,
    pub recipient_id: Id<UserMarker>,
    pub sender_id: Id<UserMarker>,
    #[serde(default)]
    pub sender_name: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub post_id: Option<Id<PostMarker>>,
    pub timestamp: i64,
    #[serde(default)]
    pub read: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileRecord {
    pub id: Id<UserMarker>,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: String,
}

pub(crate) fn decode<R, M>(snapshot: &Snapshot) -> Result<M>
where
    R: DeserializeOwned,
    M: TryFrom<R, Error = ModelValidationError>,
{
    let record = decode_record::<R>(snapshot)?;
    M::try_from(record).map_err(|source| StoreError::Data {
        key: snapshot.key.clone(),
        source,
    })
}

pub(crate) fn decode_record<R: DeserializeOwned>(snapshot: &Snapshot) -> Result<R> {
    decode_fields(&snapshot.key, &snapshot.data)
}

pub(crate) fn decode_fields<R: DeserializeOwned>(key: &DocumentKey, fields: &Fields) -> Result<R> {
    serde_json::from_value(Value::Object(fields.clone())).map_err(|source| StoreError::Decode {
        key: key.clone(),
        source,
    })
}

pub(crate) fn encode<R: Serialize>(record: &R) -> Result<Fields> {
    match serde_json::to_value(record).map_err(StoreError::Encode)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::Encode(serde::ser::Error::custom(format!(
            "record encoded to a non-object: {other}"
        )))),
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            author: Author {
                id: value.author_id,
                name: value.author_name,
                avatar_url: value.author_avatar_url,
            },
            content: PostContent::new(value.content)?,
            image_urls: value.image_urls,
            created_at: from_unix_millis(value.created_at)?,
            like_count: value.like_count,
            reply_count: value.reply_count,
            repost_count: value.repost_count,
            liked_by: value.liked_by.into_iter().collect(),
            repost: None,
        })
    }
}

impl From<&Post> for PostRecord {
    fn from(value: &Post) -> Self {
        Self {
            id: value.id,
            author_id: value.author.id,
            author_name: value.author.name.clone(),
            author_avatar_url: value.author.avatar_url.clone(),
            content: value.content.get().to_owned(),
            image_urls: value.image_urls.clone(),
            created_at: to_unix_millis(value.created_at),
            like_count: value.like_count,
            reply_count: value.reply_count,
            repost_count: value.repost_count,
            liked_by: value.liked_by.iter().copied().collect(),
        }
    }
}

impl TryFrom<ReplyRecord> for Reply {
    type Error = ModelValidationError;

    fn try_from(value: ReplyRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            post: value.post_id,
            author: Author {
                id: value.author_id,
                name: value.author_name,
                avatar_url: value.author_avatar_url,
            },
            content: PostContent::new(value.content)?,
            created_at: from_unix_millis(value.created_at)?,
            like_count: value.like_count,
            liked_by: value.liked_by.into_iter().collect(),
            repost_count: value.repost_count,
        })
    }
}

impl From<&Reply> for ReplyRecord {
    fn from(value: &Reply) -> Self {
        Self {
            id: value.id,
            post_id: value.post,
            author_id: value.author.id,
            author_name: value.author.name.clone(),
            author_avatar_url: value.author.avatar_url.clone(),
            content: value.content.get().to_owned(),
            created_at: to_unix_millis(value.created_at),
            like_count: value.like_count,
            liked_by: value.liked_by.iter().copied().collect(),
            repost_count: value.repost_count,
        }
    }
}

impl TryFrom<RepostRecord> for Repost {
    type Error = ModelValidationError;

    fn try_from(value: RepostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            original_post: value.original_post_id,
            reposter: value.reposter_id,
            reposter_name: value.reposter_name,
            created_at: from_unix_millis(value.timestamp)?,
        })
    }
}

impl From<&Repost> for RepostRecord {
    fn from(value: &Repost) -> Self {
        Self {
            id: value.id,
            original_post_id: value.original_post,
            reposter_id: value.reposter,
            reposter_name: value.reposter_name.clone(),
            timestamp: to_unix_millis(value.created_at),
        }
    }
}

impl TryFrom<FollowRecord> for Follow {
    type Error = ModelValidationError;

    fn try_from(value: FollowRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: FollowId::new(value.follower_id, value.followed_id),
            created_at: from_unix_millis(value.timestamp)?,
        })
    }
}

impl From<&Follow> for FollowRecord {
    fn from(value: &Follow) -> Self {
        Self {
            follower_id: value.id.follower,
            followed_id: value.id.followed,
            timestamp: to_unix_millis(value.created_at),
        }
    }
}

impl TryFrom<StatsRecord> for UserStats {
    type Error = ModelValidationError;

    fn try_from(value: StatsRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: value.user_id,
            followers_count: value.followers_count,
            following_count: value.following_count,
        })
    }
}

impl From<&UserStats> for StatsRecord {
    fn from(value: &UserStats) -> Self {
        Self {
            user_id: value.user,
            followers_count: value.followers_count,
            following_count: value.following_count,
        }
    }
}

impl TryFrom<NotificationRecord> for Notification {
    type Error = ModelValidationError;

    fn try_from(value: NotificationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            recipient: value.recipient_id,
            sender: value.sender_id,
            sender_name: value.sender_name,
            kind: value.kind,
            post: value.post_id,
            created_at: from_unix_millis(value.timestamp)?,
            read: value.read,
        })
    }
}

impl From<&Notification> for NotificationRecord {
    fn from(value: &Notification) -> Self {
        Self {
            id: value.id,
            recipient_id: value.recipient,
            sender_id: value.sender,
            sender_name: value.sender_name.clone(),
            kind: value.kind,
            post_id: value.post,
            timestamp: to_unix_millis(value.created_at),
            read: value.read,
        }
    }
}

impl TryFrom<ProfileRecord> for UserProfile {
    type Error = ModelValidationError;

    fn try_from(value: ProfileRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            name: DisplayName::new(value.name)?,
            avatar_url: value.avatar_url,
            bio: value.bio,
        })
    }
}

impl From<&UserProfile> for ProfileRecord {
    fn from(value: &UserProfile) -> Self {
        Self {
            id: value.id,
            name: value.name.get().to_owned(),
            avatar_url: value.avatar_url.clone(),
            bio: value.bio.clone(),
        }
    }
}
