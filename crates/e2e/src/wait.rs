//! Polling waits.
//!
//! [`try_await`] is the soft form: it reports whether the condition held
//! before the deadline and never fails. [`expect_within`] is the hard form
//! and turns an expired deadline into [`E2eError::Timeout`].

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::error::{E2eError, E2eResult};

pub const DEFAULT_POLL: Duration = Duration::from_millis(50);

/// Poll `condition` until it holds or `timeout` elapses. The condition is
/// always checked at least once.
pub async fn try_await<F, Fut>(mut condition: F, timeout: Duration, poll: Duration) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        sleep(poll.min(deadline - now)).await;
    }
}

pub async fn expect_within<F, Fut>(condition: F, timeout: Duration, poll: Duration, what: &str) -> E2eResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    if try_await(condition, timeout, poll).await {
        Ok(())
    } else {
        Err(E2eError::Timeout(format!("{} (after {} ms)", what, timeout.as_millis())))
    }
}
