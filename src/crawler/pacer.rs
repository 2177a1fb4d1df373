//! Request pacing and cancellation
//!
//! Every remote call is preceded by a fixed delay, and a longer pause is taken every
//! `batch-size` units of work. Both waits are interruptible:
//! - a stop request abandons the wait so the next checkpoint can end the run cleanly
//! - a shutdown abandons the wait with `CrawlError::Interrupted`

use crate::config::PacingConfig;
use crate::{CrawlError, CrawlResult};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Cancellation signals handed to one running session
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    /// Cooperative stop for this session only
    pub stop: CancellationToken,
    /// Registry-wide shutdown
    pub shutdown: CancellationToken,
}

impl RunControl {
    pub fn new(stop: CancellationToken, shutdown: CancellationToken) -> Self {
        Self { stop, shutdown }
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }
}

/// Whether `count` units of work end a batch
pub fn is_batch_boundary(count: u32, batch_size: u32) -> bool {
    batch_size > 0 && count > 0 && count % batch_size == 0
}

/// Fixed, configuration-driven delays
#[derive(Debug, Clone)]
pub struct Pacer {
    request_delay: Duration,
    batch_size: u32,
    batch_delay: Duration,
}

impl Pacer {
    pub fn new(request_delay: Duration, batch_size: u32, batch_delay: Duration) -> Self {
        Self {
            request_delay,
            batch_size,
            batch_delay,
        }
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(
            config.request_delay(),
            config.batch_size,
            config.batch_delay(),
        )
    }

    /// Sleeps the request delay before a remote call
    pub async fn delay_between_requests(&self, control: &RunControl) -> CrawlResult<()> {
        self.sleep(self.request_delay, control).await
    }

    /// Sleeps the batch delay when `count` closes a batch
    pub async fn maybe_batch_pause(&self, count: u32, control: &RunControl) -> CrawlResult<()> {
        if !is_batch_boundary(count, self.batch_size) {
            return Ok(());
        }
        tracing::debug!("Batch of {} done, pausing for {:?}", count, self.batch_delay);
        self.sleep(self.batch_delay, control).await
    }

    async fn sleep(&self, duration: Duration, control: &RunControl) -> CrawlResult<()> {
        if duration.is_zero() {
            return if control.shutdown.is_cancelled() {
                Err(CrawlError::Interrupted)
            } else {
                Ok(())
            };
        }

        tokio::select! {
            biased;
            _ = control.shutdown.cancelled() => Err(CrawlError::Interrupted),
            _ = control.stop.cancelled() => Ok(()),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn pacer() -> Pacer {
        Pacer::new(Duration::from_millis(500), 3, Duration::from_secs(5))
    }

    #[test]
    fn test_batch_boundary() {
        assert!(!is_batch_boundary(0, 3));
        assert!(!is_batch_boundary(2, 3));
        assert!(is_batch_boundary(3, 3));
        assert!(is_batch_boundary(6, 3));
        assert!(!is_batch_boundary(3, 0));
        assert!(is_batch_boundary(1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_delay_elapses() {
        let start = Instant::now();
        pacer()
            .delay_between_requests(&RunControl::default())
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_pause_only_on_boundary() {
        let control = RunControl::default();
        let p = pacer();

        let start = Instant::now();
        p.maybe_batch_pause(2, &control).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(1));

        p.maybe_batch_pause(3, &control).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cuts_sleep_short() {
        let control = RunControl::default();
        let stop = control.stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            stop.cancel();
        });

        let start = Instant::now();
        pacer().maybe_batch_pause(3, &control).await.unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_sleep() {
        let control = RunControl::default();
        control.shutdown.cancel();

        let result = pacer().delay_between_requests(&control).await;
        assert!(matches!(result, Err(CrawlError::Interrupted)));
    }

    #[tokio::test]
    async fn test_zero_delay_still_sees_shutdown() {
        let p = Pacer::new(Duration::ZERO, 1, Duration::ZERO);
        let control = RunControl::default();
        p.delay_between_requests(&control).await.unwrap();

        control.shutdown.cancel();
        assert!(matches!(
            p.delay_between_requests(&control).await,
            Err(CrawlError::Interrupted)
        ));
    }
}
