use crate::model::{Id, ModelValidationError, user::UserMarker};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct FollowId {
    pub follower: Id<UserMarker>,
    pub followed: Id<UserMarker>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct Follow {
    pub id: FollowId,
    pub created_at: UtcDateTime,
}

impl FollowId {
    #[must_use]
    pub fn new(follower: Id<UserMarker>, followed: Id<UserMarker>) -> Self {
        Self { follower, followed }
    }

    #[must_use]
    pub fn is_self_follow(self) -> bool {
        self.follower == self.followed
    }
}

impl Display for FollowId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.follower, self.followed)
    }
}

impl FromStr for FollowId {
    type Err = ModelValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelValidationError::FollowId(s.to_owned());

        let (follower, followed) = s.split_once('_').ok_or_else(invalid)?;
        Ok(Self {
            follower: follower.parse().map_err(|_| invalid())?,
            followed: followed.parse().map_err(|_| invalid())?,
        })
    }
}
