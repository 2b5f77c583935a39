use std::{collections::HashMap, hash::Hash};

use crate::TransactionalBackend;

/// A snapshot read-set/write-set handle over a [TransactionalBackend].
///
/// [Transaction::get] records the edition each row carried when it was first
/// observed; [Transaction::put] and [Transaction::delete] buffer mutations
/// without touching storage. [Transaction::commit] hands both sets to the
/// backend, which validates every observed edition and applies the write set
/// atomically. A competing writer that has touched any observed row in the
/// interim causes the whole commit to fail with
/// [crate::TurnstileStorageError::Conflict]; the transaction never retries on
/// its own.
///
/// ```ignore
/// let mut txn = Transaction::begin(&backend);
/// let row = txn.get(&key).await?;
/// txn.put(key, updated_row);
/// txn.commit().await?;
/// ```
pub struct Transaction<'a, Backend>
where
    Backend: TransactionalBackend,
{
    backend: &'a Backend,
    reads: Vec<(Backend::Key, Option<Backend::Edition>)>,
    writes: HashMap<Backend::Key, Option<Backend::Value>>,
}

impl<'a, Backend> Transaction<'a, Backend>
where
    Backend: TransactionalBackend,
    Backend::Key: Clone + Eq + Hash,
    Backend::Value: Clone,
{
    /// Open a transaction against `backend`
    pub fn begin(backend: &'a Backend) -> Self {
        Self {
            backend,
            reads: Vec::new(),
            writes: HashMap::new(),
        }
    }

    /// Read a row within the transaction.
    ///
    /// Buffered writes from this transaction are served back without touching
    /// storage. The first storage read of each key records the edition that
    /// the commit will later validate.
    pub async fn get(&mut self, key: &Backend::Key) -> Result<Option<Backend::Value>, Backend::Error> {
        if let Some(buffered) = self.writes.get(key) {
            return Ok(buffered.clone());
        }

        let resolved = self.backend.resolve(key).await?;

        if !self.reads.iter().any(|(read_key, _)| read_key == key) {
            self.reads
                .push((key.clone(), resolved.as_ref().map(|(_, edition)| edition.clone())));
        }

        Ok(resolved.map(|(value, _)| value))
    }

    /// Buffer a write of `value` against `key`
    pub fn put(&mut self, key: Backend::Key, value: Backend::Value) {
        self.writes.insert(key, Some(value));
    }

    /// Buffer a deletion of the row at `key`
    pub fn delete(&mut self, key: Backend::Key) {
        self.writes.insert(key, None);
    }

    /// Validate the read set and apply the write set atomically
    pub async fn commit(self) -> Result<(), Backend::Error> {
        self.backend
            .commit(self.reads, self.writes.into_iter().collect())
            .await
    }
}
