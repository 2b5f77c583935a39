use async_trait::async_trait;

use crate::TurnstileStorageError;

mod memory;
pub use memory::*;

/// A [StorageBackend] is a facade over some generalized storage substrate
/// that is capable of storing and/or retrieving values by some key
#[async_trait]
pub trait StorageBackend: Clone {
    /// The key type used by this [StorageBackend]
    type Key: Send + Sync;
    /// The value type able to be stored by this [StorageBackend]
    type Value: Send;
    /// The error type produced by this [StorageBackend]
    type Error: Into<TurnstileStorageError>;

    /// Store the given value against the given key
    async fn set(&mut self, key: Self::Key, value: Self::Value) -> Result<(), Self::Error>;
    /// Retrieve a value (if any) stored against the given key
    async fn get(&self, key: &Self::Key) -> Result<Option<Self::Value>, Self::Error>;
    /// Remove the value (if any) stored against the given key; removing an
    /// absent row is not an error
    async fn remove(&mut self, key: &Self::Key) -> Result<(), Self::Error>;
}

/// A [TransactionalBackend] is a [StorageBackend] whose rows carry an
/// edition: an opaque version identifier that changes on every write to the
/// row. Editions are the basis for optimistic concurrency control.
///
/// The contract has two halves. [TransactionalBackend::resolve] reads a row
/// together with its current edition. [TransactionalBackend::commit]
/// validates that every row in a read set still carries the edition that was
/// observed (`None` meaning "the row was absent"), and only then applies a
/// write set — insertions and deletions together — as a single atomic unit.
/// A failed validation leaves storage untouched and surfaces
/// [TurnstileStorageError::Conflict].
#[async_trait]
pub trait TransactionalBackend: StorageBackend {
    /// The per-row version identifier produced by this backend
    type Edition: Clone + Eq + Send + Sync;

    /// Retrieve a value and its current edition (if the row exists)
    async fn resolve(
        &self,
        key: &Self::Key,
    ) -> Result<Option<(Self::Value, Self::Edition)>, Self::Error>;

    /// Atomically validate `reads` against current row editions and, if every
    /// edition matches, apply `writes` (a value to store, or `None` to
    /// delete). All writes land, or none do.
    async fn commit(
        &self,
        reads: Vec<(Self::Key, Option<Self::Edition>)>,
        writes: Vec<(Self::Key, Option<Self::Value>)>,
    ) -> Result<(), Self::Error>;
}

/// A [StorageScan] backend can enumerate the keys that begin with a given
/// prefix, without loading their values. Row keys in Turnstile are
/// hierarchical byte strings, so a prefix scan is an ancestor query: it
/// yields every row that structurally descends from the prefix.
#[async_trait]
pub trait StorageScan: StorageBackend {
    /// Enumerate all keys beginning with `prefix`, in lexicographic order
    async fn keys_with_prefix(&self, prefix: &Self::Key) -> Result<Vec<Self::Key>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::{MemoryStorageBackend, StorageBackend, StorageScan, TransactionalBackend};

    #[tokio::test]
    async fn it_writes_and_reads_a_value() -> Result<()> {
        let mut backend = MemoryStorageBackend::<Vec<u8>, Vec<u8>>::default();

        backend.set(vec![1, 2, 3], vec![4, 5, 6]).await?;
        let value = backend.get(&vec![1, 2, 3]).await?;

        assert_eq!(value, Some(vec![4, 5, 6]));

        Ok(())
    }

    #[tokio::test]
    async fn it_removes_a_value_and_tolerates_absent_rows() -> Result<()> {
        let mut backend = MemoryStorageBackend::<Vec<u8>, Vec<u8>>::default();

        backend.set(vec![1], vec![2]).await?;
        backend.remove(&vec![1]).await?;
        backend.remove(&vec![1]).await?;

        assert_eq!(backend.get(&vec![1]).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn it_changes_the_edition_on_every_write() -> Result<()> {
        let mut backend = MemoryStorageBackend::<Vec<u8>, Vec<u8>>::default();

        backend.set(vec![1], vec![2]).await?;
        let (_, first) = backend.resolve(&vec![1]).await?.expect("row exists");

        backend.set(vec![1], vec![3]).await?;
        let (_, second) = backend.resolve(&vec![1]).await?.expect("row exists");

        assert_ne!(first, second);

        Ok(())
    }

    #[tokio::test]
    async fn it_scans_keys_by_prefix_in_order() -> Result<()> {
        let mut backend = MemoryStorageBackend::<Vec<u8>, Vec<u8>>::default();

        backend.set(b"a/1".to_vec(), vec![0]).await?;
        backend.set(b"a/2".to_vec(), vec![0]).await?;
        backend.set(b"b/1".to_vec(), vec![0]).await?;

        let keys = backend.keys_with_prefix(&b"a/".to_vec()).await?;
        assert_eq!(keys, vec![b"a/1".to_vec(), b"a/2".to_vec()]);

        Ok(())
    }
}
