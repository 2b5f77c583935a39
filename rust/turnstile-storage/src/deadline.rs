use std::{future::Future, time::Duration};

use crate::TurnstileStorageError;

/// Impose a deadline on a storage operation.
///
/// Cancellation in this stack is cooperative: abandoning a future abandons
/// the operation, and commits apply under a single lock acquisition so an
/// abandoned transaction can never be half-applied. This helper maps an
/// elapsed deadline to the stable [TurnstileStorageError::Cancelled] kind so
/// callers can distinguish "timed out" from a storage failure.
pub async fn with_deadline<F, T, E>(deadline: Duration, operation: F) -> Result<T, TurnstileStorageError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<TurnstileStorageError>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(outcome) => outcome.map_err(Into::into),
        Err(_) => Err(TurnstileStorageError::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;

    use crate::{MemoryStorageBackend, StorageBackend, TurnstileStorageError, with_deadline};

    #[tokio::test]
    async fn it_passes_through_a_prompt_operation() -> Result<()> {
        let mut backend = MemoryStorageBackend::<Vec<u8>, Vec<u8>>::default();
        backend.set(b"key".to_vec(), vec![1]).await?;

        let value =
            with_deadline(Duration::from_secs(1), backend.get(&b"key".to_vec())).await?;

        assert_eq!(value, Some(vec![1]));

        Ok(())
    }

    #[tokio::test]
    async fn it_maps_an_elapsed_deadline_to_cancelled() {
        let outcome = with_deadline(Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, TurnstileStorageError>(())
        })
        .await;

        assert!(matches!(outcome, Err(TurnstileStorageError::Cancelled)));
    }
}
