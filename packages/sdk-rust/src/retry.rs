//! Deadline-bounded retry for inner fetch loops.

use std::{future::Future, time::Duration};

use tokio::time::{sleep, timeout};

use crate::error::{Error, Result};

/// Run `op` until it succeeds or `budget` elapses, pausing `pause` between
/// failed attempts.
///
/// The whole loop, including a call that never returns, is bounded by
/// `budget`; running out yields [`Error::Deadline`] labelled with `what`.
pub async fn retry_until_deadline<T, F, Fut>(
    what:   &'static str,
    budget: Duration,
    pause:  Duration,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = async {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return value,
                Err(err) => {
                    tracing::debug!(what, attempt, error = %err, "retrying");
                    sleep(pause).await;
                }
            }
        }
    };

    timeout(budget, attempts)
        .await
        .map_err(|_| Error::Deadline { what, budget })
}
