use std::{collections::HashMap, hash::Hash, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::TurnstileStorageError;

use super::{StorageBackend, StorageScan, TransactionalBackend};

struct Rows<Key, Value> {
    entries: HashMap<Key, (Value, u64)>,
    next_edition: u64,
}

impl<Key, Value> Default for Rows<Key, Value> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            next_edition: 1,
        }
    }
}

/// A trivial implementation of [StorageBackend] - backed by a [HashMap] -
/// where all values are kept in memory and never persisted. Every row carries
/// a monotonically increasing edition, so the backend also implements
/// [TransactionalBackend] with exact conflict detection.
#[derive(Clone, Default)]
pub struct MemoryStorageBackend<Key, Value>
where
    Key: Eq + Hash,
    Value: Clone,
{
    rows: Arc<RwLock<Rows<Key, Value>>>,
}

#[async_trait]
impl<Key, Value> StorageBackend for MemoryStorageBackend<Key, Value>
where
    Key: Clone + Eq + Hash + Send + Sync,
    Value: Clone + Send + Sync,
{
    type Key = Key;
    type Value = Value;
    type Error = TurnstileStorageError;

    async fn set(&mut self, key: Self::Key, value: Self::Value) -> Result<(), Self::Error> {
        let mut rows = self.rows.write().await;
        let edition = rows.next_edition;
        rows.next_edition += 1;
        rows.entries.insert(key, (value, edition));
        Ok(())
    }

    async fn get(&self, key: &Self::Key) -> Result<Option<Self::Value>, Self::Error> {
        let rows = self.rows.read().await;
        Ok(rows.entries.get(key).map(|(value, _)| value.clone()))
    }

    async fn remove(&mut self, key: &Self::Key) -> Result<(), Self::Error> {
        let mut rows = self.rows.write().await;
        rows.entries.remove(key);
        Ok(())
    }
}

#[async_trait]
impl<Key, Value> TransactionalBackend for MemoryStorageBackend<Key, Value>
where
    Key: Clone + Eq + Hash + Send + Sync,
    Value: Clone + Send + Sync,
{
    type Edition = u64;

    async fn resolve(
        &self,
        key: &Self::Key,
    ) -> Result<Option<(Self::Value, Self::Edition)>, Self::Error> {
        let rows = self.rows.read().await;
        Ok(rows
            .entries
            .get(key)
            .map(|(value, edition)| (value.clone(), *edition)))
    }

    async fn commit(
        &self,
        reads: Vec<(Self::Key, Option<Self::Edition>)>,
        writes: Vec<(Self::Key, Option<Self::Value>)>,
    ) -> Result<(), Self::Error> {
        // A single write-lock acquisition spans validation and application,
        // so the commit is all-or-nothing even if the caller's future is
        // dropped mid-await.
        let mut rows = self.rows.write().await;

        for (key, observed) in &reads {
            let current = rows.entries.get(key).map(|(_, edition)| *edition);
            if current != *observed {
                tracing::debug!("commit rejected: row edition diverged");
                return Err(TurnstileStorageError::Conflict);
            }
        }

        for (key, write) in writes {
            match write {
                Some(value) => {
                    let edition = rows.next_edition;
                    rows.next_edition += 1;
                    rows.entries.insert(key, (value, edition));
                }
                None => {
                    rows.entries.remove(&key);
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl<Key, Value> StorageScan for MemoryStorageBackend<Key, Value>
where
    Key: AsRef<[u8]> + Clone + Eq + Hash + Ord + Send + Sync,
    Value: Clone + Send + Sync,
{
    async fn keys_with_prefix(&self, prefix: &Self::Key) -> Result<Vec<Self::Key>, Self::Error> {
        let rows = self.rows.read().await;
        let mut keys = rows
            .entries
            .keys()
            .filter(|key| key.as_ref().starts_with(prefix.as_ref()))
            .cloned()
            .collect::<Vec<_>>();
        keys.sort();
        Ok(keys)
    }
}
