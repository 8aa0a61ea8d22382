//! Fixed-delay pacing between dependent upstream calls.
//!
//! The registry's document chain is walked with one request per hop; a fixed
//! sleep before each hop bounds the request rate against the upstream API.

use std::time::Duration;

/// Pacing controller. Cheap to clone; holds only the configured delay.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Sleep for the configured delay. A zero delay returns immediately
    /// without yielding to the timer (used by tests).
    pub async fn pace(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}
