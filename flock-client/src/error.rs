use flock_common::model::{Id, post::PostMarker, user::UserMarker};
use flock_store::error::StoreError;
use thiserror::Error;

pub type Result<T, E = InteractionError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("User {0} cannot follow themselves")]
    SelfFollow(Id<UserMarker>),
    #[error("Post with id {0} was not found.")]
    PostNotFound(Id<PostMarker>),
}
