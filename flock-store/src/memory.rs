use crate::{
    backend::DocumentStore,
    document::{ChangeKind, CollectionPath, DocumentChange, DocumentKey, Fields, Snapshot, Value},
    error::{Result, StoreError},
    query::Query,
    write::{Precondition, Write, WriteBatch},
};
use flock_common::util::apply_delta;
use std::{
    collections::{BTreeMap, VecDeque},
    time::Duration,
};
use tokio::sync::{Mutex, broadcast};
use tracing::trace;

const CHANGE_FEED_CAPACITY: usize = 1024;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum Fault {
    Unavailable,
    Conflict,
}

#[derive(Clone, Eq, PartialEq, Debug)]
struct StoredDocument {
    version: u64,
    data: Fields,
}

#[derive(Debug, Default)]
struct Inner {
    documents: BTreeMap<DocumentKey, StoredDocument>,
    last_version: u64,
    faults: VecDeque<Fault>,
}

#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    changes: broadcast::Sender<DocumentChange>,
    latency: Option<Duration>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);

        Self {
            inner: Mutex::new(Inner::default()),
            changes,
            latency: None,
        }
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes the next commit fail with `fault`. Faults queue up.
    pub async fn inject(&self, fault: Fault) {
        self.inner.lock().await.faults.push_back(fault);
    }

    pub async fn count(&self, collection: &CollectionPath) -> usize {
        self.inner
            .lock()
            .await
            .documents
            .keys()
            .filter(|key| &key.collection == collection)
            .count()
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, key: &DocumentKey) -> Result<Option<Snapshot>> {
        self.delay().await;

        let inner = self.inner.lock().await;
        Ok(inner.documents.get(key).map(|document| Snapshot {
            key: key.clone(),
            version: document.version,
            data: document.data.clone(),
        }))
    }

    async fn query(&self, query: &Query) -> Result<Vec<Snapshot>> {
        self.delay().await;

        let inner = self.inner.lock().await;
        let mut matching: Vec<_> = inner
            .documents
            .iter()
            .filter(|(key, document)| {
                key.collection == query.collection && query.matches(&document.data)
            })
            .collect();
        // the map iterates in key order, so ties stay ordered by id
        matching.sort_by(|(_, a), (_, b)| query.compare(&a.data, &b.data));

        Ok(matching
            .into_iter()
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|(key, document)| Snapshot {
                key: key.clone(),
                version: document.version,
                data: document.data.clone(),
            })
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.delay().await;

        let mut inner = self.inner.lock().await;

        if let Some(fault) = inner.faults.pop_front() {
            trace!(?fault, "Injecting fault into commit");
            let key = batch.first_key().cloned();
            return Err(match (fault, key) {
                (Fault::Conflict, Some(key)) => StoreError::PreconditionFailed(key),
                _ => StoreError::Unavailable("injected fault".to_owned()),
            });
        }

        for (key, precondition) in batch.preconditions() {
            let current = inner.documents.get(key).map(|document| document.version);
            let holds = match precondition {
                Precondition::Version(version) => current == Some(*version),
                Precondition::Exists => current.is_some(),
                Precondition::Missing => current.is_none(),
            };
            if !holds {
                return Err(StoreError::PreconditionFailed(key.clone()));
            }
        }

        // apply onto copies first so a failing write leaves the store untouched
        let mut staged: BTreeMap<DocumentKey, (Option<Fields>, Option<Fields>)> = BTreeMap::new();
        for (key, write) in batch.writes() {
            let (_, after) = staged.entry(key.clone()).or_insert_with(|| {
                let before = inner.documents.get(key).map(|document| document.data.clone());
                (before.clone(), before)
            });
            apply_write(key, after, write)?;
        }

        inner.last_version += 1;
        let version = inner.last_version;
        let mut changes = Vec::with_capacity(staged.len());

        for (key, (before, after)) in staged {
            let kind = match (before.is_some(), &after) {
                (false, None) => continue,
                (true, None) => ChangeKind::Removed,
                (false, Some(_)) => ChangeKind::Added,
                (true, Some(_)) => ChangeKind::Modified,
            };

            match after {
                Some(data) => {
                    inner
                        .documents
                        .insert(key.clone(), StoredDocument { version, data });
                }
                None => {
                    inner.documents.remove(&key);
                }
            }
            changes.push(DocumentChange { key, kind });
        }
        drop(inner);

        for change in changes {
            // no subscribers is fine
            let _ = self.changes.send(change);
        }

        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<DocumentChange> {
        self.changes.subscribe()
    }
}

fn apply_write(key: &DocumentKey, document: &mut Option<Fields>, write: &Write) -> Result<()> {
    match write {
        Write::Set(fields) => *document = Some(fields.clone()),
        Write::Update(fields) => {
            let existing = document
                .as_mut()
                .ok_or_else(|| StoreError::NotFound(key.clone()))?;
            existing.extend(fields.clone());
        }
        Write::Increment { field, delta } => {
            let existing = document
                .as_mut()
                .ok_or_else(|| StoreError::NotFound(key.clone()))?;
            let current = match existing.get(field) {
                None | Some(Value::Null) => 0,
                // negative counts left behind by older clients count as zero
                Some(Value::Number(number)) => number
                    .as_u64()
                    .or_else(|| number.as_i64().map(|_| 0))
                    .ok_or_else(|| not_a_counter(key, field))?,
                Some(_) => return Err(not_a_counter(key, field)),
            };
            existing.insert(field.clone(), Value::from(apply_delta(current, *delta)));
        }
        Write::Delete => *document = None,
    }

    Ok(())
}

fn not_a_counter(key: &DocumentKey, field: &str) -> StoreError {
    StoreError::NotACounter {
        key: key.clone(),
        field: field.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        backend::DocumentStore,
        document::{ChangeKind, CollectionPath, Fields},
        error::StoreError,
        memory::{Fault, MemoryStore},
        query::{Direction, Query},
        write::{Precondition, WriteBatch},
    };
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    fn counters() -> CollectionPath {
        CollectionPath::root("counters")
    }

    #[tokio::test]
    async fn batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        let a = counters().doc("a");
        let b = counters().doc("b");

        let mut batch = WriteBatch::new();
        batch.set(a.clone(), fields(json!({"n": 1})));
        store.commit(batch).await.unwrap();

        // incrementing a missing document fails the whole batch
        let mut batch = WriteBatch::new();
        batch.increment(a.clone(), "n", 1).increment(b.clone(), "n", 1);
        assert!(matches!(
            store.commit(batch).await,
            Err(StoreError::NotFound(key)) if key == b
        ));

        let snapshot = store.get(&a).await.unwrap().unwrap();
        assert_eq!(snapshot.data.get("n"), Some(&json!(1)));
        assert!(store.get(&b).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn increments_floor_at_zero() {
        let store = MemoryStore::new();
        let key = counters().doc("a");

        let mut batch = WriteBatch::new();
        batch
            .set(key.clone(), fields(json!({"n": 1, "label": "x"})))
            .increment(key.clone(), "n", -3)
            .increment(key.clone(), "missing", 2);
        store.commit(batch).await.unwrap();

        let data = store.get(&key).await.unwrap().unwrap().data;
        assert_eq!(data.get("n"), Some(&json!(0)));
        assert_eq!(data.get("missing"), Some(&json!(2)));

        let mut batch = WriteBatch::new();
        batch.increment(key.clone(), "label", 1);
        assert!(matches!(
            store.commit(batch).await,
            Err(StoreError::NotACounter { .. })
        ));
    }

    #[tokio::test]
    async fn preconditions_guard_versions() {
        let store = MemoryStore::new();
        let key = counters().doc("a");

        let mut batch = WriteBatch::new();
        batch.create(key.clone(), fields(json!({"n": 0})));
        store.commit(batch.clone()).await.unwrap();
        assert!(store.commit(batch).await.unwrap_err().is_conflict());

        let version = store.get(&key).await.unwrap().unwrap().version;

        let mut stale = WriteBatch::new();
        stale
            .require(key.clone(), Precondition::Version(version))
            .update(key.clone(), fields(json!({"n": 5})));

        let mut bump = WriteBatch::new();
        bump.increment(key.clone(), "n", 1);
        store.commit(bump).await.unwrap();

        assert!(store.commit(stale).await.unwrap_err().is_conflict());
        let data = store.get(&key).await.unwrap().unwrap().data;
        assert_eq!(data.get("n"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn query_filters_orders_and_limits() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        for (id, owner, at) in [("1", 1, 30), ("2", 2, 20), ("3", 1, 10), ("4", 1, 40)] {
            batch.set(counters().doc(id), fields(json!({"owner": owner, "at": at})));
        }
        batch.set(
            CollectionPath::root("other").doc("5"),
            fields(json!({"owner": 1, "at": 50})),
        );
        store.commit(batch).await.unwrap();

        let query = Query::new(counters())
            .where_eq("owner", 1)
            .order_by("at", Direction::Descending)
            .limit(2);
        let ids: Vec<_> = store
            .query(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|snapshot| snapshot.key.id)
            .collect();

        assert_eq!(ids, ["4", "1"]);
        assert_eq!(store.count(&counters()).await, 4);
    }

    #[tokio::test]
    async fn faults_and_change_feed() {
        let store = MemoryStore::new();
        let mut changes = store.changes();
        let key = counters().doc("a");

        store.inject(Fault::Unavailable).await;
        let mut batch = WriteBatch::new();
        batch.set(key.clone(), fields(json!({"n": 1})));
        assert!(matches!(
            store.commit(batch.clone()).await,
            Err(StoreError::Unavailable(_))
        ));
        store.inject(Fault::Conflict).await;
        assert!(store.commit(batch.clone()).await.unwrap_err().is_conflict());

        store.commit(batch.clone()).await.unwrap();
        store.commit(batch).await.unwrap();
        let mut delete = WriteBatch::new();
        delete.delete(key.clone());
        store.commit(delete).await.unwrap();

        let kinds: Vec<_> = [
            changes.recv().await.unwrap(),
            changes.recv().await.unwrap(),
            changes.recv().await.unwrap(),
        ]
        .into_iter()
        .map(|change| change.kind)
        .collect();
        assert_eq!(
            kinds,
            [ChangeKind::Added, ChangeKind::Modified, ChangeKind::Removed]
        );
        assert!(changes.try_recv().is_err());
    }
}
