use futures_util::future::try_join_all;
use rand::Rng;

use turnstile_storage::{Transaction, TransactionalBackend, TurnstileStorageError};

use crate::position::{MAX_SHARDS, POSITION_TOKENS};
use crate::LedgerError;

/// The default number of shards for a counter
pub const DEFAULT_SHARD_COUNT: usize = 50;

/// The default entity kind under which counter shards are stored
pub const COUNTER_KIND: &str = "Counter";

pub(crate) fn encode_count(count: i64) -> Result<Vec<u8>, LedgerError> {
    serde_json::to_vec(&count)
        .map_err(|error| TurnstileStorageError::EncodeFailed(error.to_string()).into())
}

pub(crate) fn decode_count(bytes: &[u8]) -> Result<i64, LedgerError> {
    serde_json::from_slice(bytes)
        .map_err(|error| TurnstileStorageError::DecodeFailed(error.to_string()).into())
}

/// A counter spread across `shard_count` independent storage rows.
///
/// Each increment lands on one shard chosen uniformly at random, bounding
/// write contention to `O(1/N)` of total traffic per shard. The logical
/// value is the sum of all shards at read time; because [ShardedCounter::value]
/// is a plain multi-row read, it is only eventually consistent with
/// concurrent increments and must not be treated as a linearizable snapshot.
///
/// Many `ShardedCounter` values may point at the same counter name; they
/// coordinate purely through storage. Constructing the same name with
/// different shard counts is undefined behavior at the counting level
/// (reads will only sum the shards they know about).
#[derive(Clone)]
pub struct ShardedCounter<Backend>
where
    Backend: TransactionalBackend<Key = String, Value = Vec<u8>, Error = TurnstileStorageError>,
{
    backend: Backend,
    shard_keys: Vec<String>,
}

impl<Backend> ShardedCounter<Backend>
where
    Backend: TransactionalBackend<Key = String, Value = Vec<u8>, Error = TurnstileStorageError>,
{
    /// A counter named `name` under the default entity kind.
    ///
    /// `shard_count` must be between 1 and 1000; the bound caps the fan-out
    /// cost of a full [ShardedCounter::value] read.
    pub fn new(backend: Backend, name: &str, shard_count: usize) -> Result<Self, LedgerError> {
        Self::with_kind(backend, COUNTER_KIND, name, shard_count)
    }

    /// A counter under an explicit entity kind
    pub fn with_kind(
        backend: Backend,
        kind: &str,
        name: &str,
        shard_count: usize,
    ) -> Result<Self, LedgerError> {
        if shard_count < 1 || shard_count > MAX_SHARDS {
            return Err(LedgerError::BadShardCount);
        }

        let shard_keys = POSITION_TOKENS[..shard_count]
            .iter()
            .map(|position| format!("{kind}/{name}:{position}"))
            .collect();

        Ok(Self {
            backend,
            shard_keys,
        })
    }

    /// Add `delta` to the counter. Supply a negative delta to decrement.
    ///
    /// The increment is an atomic read-modify-write of one randomly chosen
    /// shard. A lost race re-runs against a freshly chosen shard, so the
    /// loop settles as soon as a write lands uncontended; each individual
    /// attempt is strictly atomic. Open a [Transaction] and use
    /// [ShardedCounter::increment_in] instead when the increment must join
    /// a larger atomic unit.
    pub async fn increment(&self, delta: i64) -> Result<(), LedgerError> {
        loop {
            let mut txn = Transaction::begin(&self.backend);
            self.increment_in(&mut txn, delta).await?;

            match txn.commit().await {
                Ok(()) => return Ok(()),
                Err(TurnstileStorageError::Conflict) => {
                    tracing::trace!("shard increment contended; retrying");
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Add `delta` to one randomly chosen shard inside the caller's open
    /// transaction. The write commits — and conflicts — together with the
    /// rest of the caller's transaction.
    pub async fn increment_in(
        &self,
        txn: &mut Transaction<'_, Backend>,
        delta: i64,
    ) -> Result<(), LedgerError> {
        let shard = rand::thread_rng().gen_range(0..self.shard_keys.len());
        let key = &self.shard_keys[shard];

        let current = match txn.get(key).await? {
            Some(bytes) => decode_count(&bytes)?,
            None => 0,
        };

        txn.put(key.clone(), encode_count(current + delta)?);

        Ok(())
    }

    /// The counter's current value: the sum of every shard, read in
    /// parallel. Absent shard rows count as zero; any other shard failure
    /// aborts the whole read.
    pub async fn value(&self) -> Result<i64, LedgerError> {
        let shards = try_join_all(self.shard_keys.iter().map(|key| self.backend.get(key))).await?;

        let mut total = 0i64;
        for bytes in shards.into_iter().flatten() {
            total += decode_count(&bytes)?;
        }

        Ok(total)
    }

    /// Remove every shard row. Rows that are already absent are not an
    /// error, so the operation is idempotent.
    pub async fn delete(&self) -> Result<(), LedgerError> {
        let writes = self
            .shard_keys
            .iter()
            .map(|key| (key.clone(), None))
            .collect();

        self.backend.commit(Vec::new(), writes).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use futures_util::future::try_join_all;

    use turnstile_storage::{MemoryStorageBackend, Transaction};

    use super::{DEFAULT_SHARD_COUNT, ShardedCounter};
    use crate::LedgerError;

    fn backend() -> MemoryStorageBackend<String, Vec<u8>> {
        MemoryStorageBackend::default()
    }

    #[test]
    fn it_rejects_shard_counts_outside_the_supported_range() {
        assert!(matches!(
            ShardedCounter::new(backend(), "hits", 0),
            Err(LedgerError::BadShardCount)
        ));
        assert!(matches!(
            ShardedCounter::new(backend(), "hits", 1001),
            Err(LedgerError::BadShardCount)
        ));
        assert!(ShardedCounter::new(backend(), "hits", 1000).is_ok());
    }

    #[tokio::test]
    async fn a_fresh_counter_reads_zero() -> Result<()> {
        let counter = ShardedCounter::new(backend(), "hits", DEFAULT_SHARD_COUNT)?;

        assert_eq!(counter.value().await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn it_counts_increments_and_decrements() -> Result<()> {
        let counter = ShardedCounter::new(backend(), "hits", 10)?;

        counter.increment(5).await?;
        counter.increment(3).await?;
        counter.increment(-2).await?;

        assert_eq!(counter.value().await?, 6);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_increments_all_land() -> Result<()> {
        let backend = backend();
        let counter = ShardedCounter::new(backend, "hits", 50)?;

        let tasks = (0..100).map(|_| {
            let counter = counter.clone();
            tokio::spawn(async move { counter.increment(1).await })
        });

        for outcome in try_join_all(tasks).await? {
            outcome?;
        }

        assert_eq!(counter.value().await?, 100);

        Ok(())
    }

    #[tokio::test]
    async fn increments_can_join_a_larger_transaction() -> Result<()> {
        let backend = backend();
        let counter = ShardedCounter::new(backend.clone(), "hits", 1)?;

        let mut txn = Transaction::begin(&backend);
        counter.increment_in(&mut txn, 7).await?;

        // Nothing lands until the caller's transaction commits.
        assert_eq!(counter.value().await?, 0);

        txn.commit().await?;
        assert_eq!(counter.value().await?, 7);

        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_all_shards_and_is_idempotent() -> Result<()> {
        let counter = ShardedCounter::new(backend(), "hits", 10)?;

        counter.increment(4).await?;
        counter.delete().await?;
        counter.delete().await?;

        assert_eq!(counter.value().await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn counters_with_different_names_do_not_interfere() -> Result<()> {
        let backend = backend();
        let hits = ShardedCounter::new(backend.clone(), "hits", 10)?;
        let misses = ShardedCounter::new(backend, "misses", 10)?;

        hits.increment(2).await?;
        misses.increment(9).await?;

        assert_eq!(hits.value().await?, 2);
        assert_eq!(misses.value().await?, 9);

        Ok(())
    }
}
