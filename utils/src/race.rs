//! "First success, last failure" over a fixed set of concurrent futures.

use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RaceError<E> {
    #[error("no tasks to race")]
    NoTasks,

    /// Every task failed; carries the error that settled last.
    #[error("all tasks failed: {0}")]
    AllFailed(E),
}

/// Poll every future concurrently and resolve with the first `Ok`.
///
/// Resolves with an error only once every future has failed, reporting the
/// error of the one that failed last. A future that never settles does not
/// block the result as long as another succeeds.
pub async fn first_ok<I, F, T, E>(tasks: I) -> Result<T, RaceError<E>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let mut pending: FuturesUnordered<F> = tasks.into_iter().collect();
    if pending.is_empty() {
        return Err(RaceError::NoTasks);
    }

    let mut last_error = None;
    while let Some(result) = pending.next().await {
        match result {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }
    match last_error {
        Some(e) => Err(RaceError::AllFailed(e)),
        None => Err(RaceError::NoTasks),
    }
}
