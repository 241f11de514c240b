use crate::{
    document::{DocumentChange, DocumentKey, Snapshot},
    error::Result,
    query::Query,
    write::WriteBatch,
};
use std::{future::Future, sync::Arc};
use tokio::sync::broadcast;

pub trait DocumentStore: Send + Sync + 'static {
    fn get(&self, key: &DocumentKey) -> impl Future<Output = Result<Option<Snapshot>>> + Send;

    fn query(&self, query: &Query) -> impl Future<Output = Result<Vec<Snapshot>>> + Send;

    /// Commits the batch atomically. Fails with
    /// [`StoreError::PreconditionFailed`](crate::error::StoreError::PreconditionFailed)
    /// without applying anything if a precondition does not hold.
    fn commit(&self, batch: WriteBatch) -> impl Future<Output = Result<()>> + Send;

    fn changes(&self) -> broadcast::Receiver<DocumentChange>;
}

impl<S: DocumentStore> DocumentStore for Arc<S> {
    fn get(&self, key: &DocumentKey) -> impl Future<Output = Result<Option<Snapshot>>> + Send {
        (**self).get(key)
    }

    fn query(&self, query: &Query) -> impl Future<Output = Result<Vec<Snapshot>>> + Send {
        (**self).query(query)
    }

    fn commit(&self, batch: WriteBatch) -> impl Future<Output = Result<()>> + Send {
        (**self).commit(batch)
    }

    fn changes(&self) -> broadcast::Receiver<DocumentChange> {
        (**self).changes()
    }
}
