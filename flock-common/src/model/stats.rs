use crate::model::{Id, user::UserMarker};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserStats {
    pub user: Id<UserMarker>,
    pub followers_count: u64,
    pub following_count: u64,
}

impl UserStats {
    #[must_use]
    pub fn empty(user: Id<UserMarker>) -> Self {
        Self {
            user,
            followers_count: 0,
            following_count: 0,
        }
    }
}
