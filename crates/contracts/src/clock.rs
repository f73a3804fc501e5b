//! Clock trait - injectable "wait, then resume"

use std::time::Duration;

/// Delay scheduler used between retries
///
/// Production code sleeps on the async runtime timer; tests substitute a
/// clock that records the requested delay and returns at once.
#[trait_variant::make(Clock: Send)]
pub trait LocalClock {
    async fn sleep(&self, delay: Duration);
}

impl<C: Clock + Sync> Clock for std::sync::Arc<C> {
    async fn sleep(&self, delay: Duration) {
        Clock::sleep(&**self, delay).await
    }
}
