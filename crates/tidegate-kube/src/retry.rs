//! Bounded retry for optimistic-concurrency conflicts.

use std::future::Future;

use tracing::debug;

/// The last error from a retried operation and how many attempts were made.
#[derive(Debug)]
pub struct RetryFailure<E> {
    pub error: E,
    pub attempts: u32,
}

/// Run `op` until it succeeds, fails with a non-conflict error, or
/// `max_attempts` attempts have been made.
///
/// `op` receives the 1-based attempt number.
pub async fn with_conflict_retry<T, E, F, Fut, C>(
    max_attempts: u32,
    is_conflict: C,
    mut op: F,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if is_conflict(&e) && attempt < max_attempts => {
                debug!(attempt, max_attempts, "write conflict, re-reading and retrying");
                attempt += 1;
            }
            Err(error) => {
                return Err(RetryFailure {
                    error,
                    attempts: attempt,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Conflict,
        Fatal,
    }

    fn is_conflict(e: &TestError) -> bool {
        *e == TestError::Conflict
    }

    #[tokio::test]
    async fn succeeds_after_conflicts() {
        let calls = Cell::new(0);
        let result = with_conflict_retry(3, is_conflict, |attempt| {
            calls.set(calls.get() + 1);
            async move {
                if attempt < 3 {
                    Err(TestError::Conflict)
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let err = with_conflict_retry(3, is_conflict, |_| {
            calls.set(calls.get() + 1);
            async { Err::<(), _>(TestError::Conflict) }
        })
        .await
        .unwrap_err();

        assert_eq!(err.error, TestError::Conflict);
        assert_eq!(err.attempts, 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = Cell::new(0);
        let err = with_conflict_retry(5, is_conflict, |_| {
            calls.set(calls.get() + 1);
            async { Err::<(), _>(TestError::Fatal) }
        })
        .await
        .unwrap_err();

        assert_eq!(err.error, TestError::Fatal);
        assert_eq!(err.attempts, 1);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let result = with_conflict_retry(0, is_conflict, |_| async { Ok::<_, TestError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
