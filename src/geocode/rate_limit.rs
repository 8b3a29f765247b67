//! Minimum-interval spacing between external geocoding calls

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

/// Enforces a minimum gap between consecutive external calls,
/// regardless of how each call turned out.
#[derive(Clone)]
pub struct MinIntervalLimiter {
    inner: Arc<Mutex<LimiterState>>,
}

struct LimiterState {
    last_call: Option<Instant>,
    min_interval: Duration,
}

impl MinIntervalLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LimiterState {
                last_call: None,
                min_interval,
            })),
        }
    }

    /// Wait until the next external call is allowed.
    pub async fn wait(&self) {
        let mut state = self.inner.lock().await;

        if let Some(last) = state.last_call {
            let elapsed = last.elapsed();
            if elapsed < state.min_interval {
                let wait_time = state.min_interval - elapsed;
                trace!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        state.last_call = Some(Instant::now());
    }
}
