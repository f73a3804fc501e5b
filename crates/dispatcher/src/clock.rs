//! TokioClock - retry delays on the tokio timer

use std::time::Duration;

use contracts::Clock;

/// Clock backed by `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_tokio_clock_waits() {
        let start = Instant::now();
        TokioClock.sleep(Duration::from_millis(20)).await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
