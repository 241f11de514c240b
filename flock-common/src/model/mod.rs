pub mod follow;
pub mod notification;
pub mod post;
pub mod reply;
pub mod repost;
pub mod stats;
pub mod user;

use crate::{
    model::{post::InvalidPostContentError, user::InvalidDisplayNameError},
    snowflake::{Epoch, Snowflake, SnowflakeGenerator},
    util::TimestampOutOfRangeError,
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData, num::ParseIntError, str::FromStr};
use thiserror::Error;
use time::{UtcDateTime, macros::utc_datetime};

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    DisplayName(#[from] InvalidDisplayNameError),
    #[error(transparent)]
    PostContent(#[from] InvalidPostContentError),
    #[error(transparent)]
    Timestamp(#[from] TimestampOutOfRangeError),
    #[error("Follow relationship id is malformed: {0}")]
    FollowId(String),
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct FlockEpoch;
impl Epoch for FlockEpoch {
    const EPOCH_TIME: UtcDateTime = utc_datetime!(2024-01-01 00:00);
}

pub type FlockSnowflake = Snowflake<FlockEpoch>;
pub type FlockSnowflakeGenerator = SnowflakeGenerator<FlockEpoch>;

#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id<Marker>(FlockSnowflake, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(snowflake: FlockSnowflake) -> Self {
        Self(snowflake, PhantomData)
    }

    #[must_use]
    pub fn snowflake(self) -> FlockSnowflake {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> FromStr for Id<Marker> {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str(s).map(Self::from)
    }
}

impl<Marker> From<FlockSnowflake> for Id<Marker> {
    fn from(value: FlockSnowflake) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<u64> for Id<Marker> {
    fn from(value: u64) -> Self {
        Id::new(FlockSnowflake::new(value))
    }
}

impl<Marker> From<Id<Marker>> for u64 {
    fn from(value: Id<Marker>) -> Self {
        value.snowflake().get()
    }
}
