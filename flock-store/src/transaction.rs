use crate::{
    backend::DocumentStore,
    document::{DocumentKey, Snapshot},
    error::StoreError,
    write::{Precondition, WriteBatch},
};
use tracing::debug;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct TransactionReads {
    reads: Vec<(DocumentKey, Option<Snapshot>)>,
}

impl TransactionReads {
    #[must_use]
    pub fn get(&self, key: &DocumentKey) -> Option<&Snapshot> {
        self.reads
            .iter()
            .find(|(read_key, _)| read_key == key)
            .and_then(|(_, snapshot)| snapshot.as_ref())
    }

    fn preconditions(&self) -> impl Iterator<Item = (DocumentKey, Precondition)> + '_ {
        self.reads.iter().map(|(key, snapshot)| {
            let precondition = snapshot
                .as_ref()
                .map_or(Precondition::Missing, |snapshot| {
                    Precondition::Version(snapshot.version)
                });
            (key.clone(), precondition)
        })
    }
}

/// Commits the batch `plan` builds only if none of `keys` changed since they
/// were read, retrying from fresh reads otherwise. Errors from `plan` are not
/// retried.
pub async fn run_transaction<B, T, E, F>(
    store: &B,
    keys: &[DocumentKey],
    max_attempts: u32,
    mut plan: F,
) -> Result<T, E>
where
    B: DocumentStore,
    E: From<StoreError>,
    F: FnMut(&TransactionReads) -> Result<(WriteBatch, T), E>,
{
    for attempt in 1..=max_attempts {
        let mut reads = TransactionReads::default();
        for key in keys {
            let snapshot = store.get(key).await?;
            reads.reads.push((key.clone(), snapshot));
        }

        let (mut batch, output) = plan(&reads)?;
        if !batch.has_writes() {
            return Ok(output);
        }

        for (key, precondition) in reads.preconditions() {
            batch.require(key, precondition);
        }

        match store.commit(batch).await {
            Ok(()) => return Ok(output),
            Err(StoreError::PreconditionFailed(key)) => {
                debug!(%key, attempt, "Transaction conflicted, retrying");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(StoreError::TooManyAttempts(max_attempts).into())
}

#[cfg(test)]
mod tests {
    use crate::{
        backend::DocumentStore,
        document::{CollectionPath, DocumentKey, Fields},
        error::StoreError,
        memory::{Fault, MemoryStore},
        transaction::{TransactionReads, run_transaction},
        write::WriteBatch,
    };
    use serde_json::json;

    fn counter(value: u64) -> Fields {
        json!({ "n": value }).as_object().cloned().unwrap()
    }

    fn read_counter(reads: &TransactionReads, key: &DocumentKey) -> u64 {
        reads
            .get(key)
            .and_then(|snapshot| snapshot.data.get("n"))
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0)
    }

    async fn increment(store: &MemoryStore, key: &DocumentKey) -> Result<u64, StoreError> {
        run_transaction(store, std::slice::from_ref(key), 20, |reads| {
            let next = read_counter(reads, key) + 1;
            let mut batch = WriteBatch::new();
            batch.set(key.clone(), counter(next));
            Ok((batch, next))
        })
        .await
    }

    #[tokio::test]
    async fn retries_on_conflict() {
        let store = MemoryStore::new();
        let key = CollectionPath::root("counters").doc("a");
        store.inject(Fault::Conflict).await;
        store.inject(Fault::Conflict).await;

        let mut attempts = 0;
        let result: Result<u64, StoreError> =
            run_transaction(&store, std::slice::from_ref(&key), 5, |reads| {
                attempts += 1;
                let next = read_counter(reads, &key) + 1;
                let mut batch = WriteBatch::new();
                batch.set(key.clone(), counter(next));
                Ok((batch, next))
            })
            .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(attempts, 3);
        assert_eq!(
            store.get(&key).await.unwrap().unwrap().data.get("n"),
            Some(&json!(1))
        );
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let store = MemoryStore::new();
        let key = CollectionPath::root("counters").doc("a");
        for _ in 0..3 {
            store.inject(Fault::Conflict).await;
        }

        let result: Result<(), StoreError> = run_transaction(&store, &[key.clone()], 3, |_| {
            let mut batch = WriteBatch::new();
            batch.set(key.clone(), counter(1));
            Ok((batch, ()))
        })
        .await;

        assert!(matches!(result, Err(StoreError::TooManyAttempts(3))));
        assert!(store.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let store = MemoryStore::new().with_latency(std::time::Duration::from_millis(1));
        let key = CollectionPath::root("counters").doc("a");

        let (a, b, c) = tokio::join!(
            increment(&store, &key),
            increment(&store, &key),
            increment(&store, &key)
        );
        let mut results = [a.unwrap(), b.unwrap(), c.unwrap()];
        results.sort_unstable();
        assert_eq!(results, [1, 2, 3]);

        assert_eq!(
            store.get(&key).await.unwrap().unwrap().data.get("n"),
            Some(&json!(3))
        );
    }
}
