//! Cancellable fixed-period retry timer.
//!
//! Replaces interval callbacks with an explicit handle owned by the
//! connection state: the timer task only sends unit ticks on a channel, the
//! session decides what a tick means, and cancelling the handle stops the
//! task so a superseded state can never be fired against.

use std::time::Duration;

use tokio::{
    sync::mpsc,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

/// Handle to a running retry timer.
///
/// Dropping the handle cancels the timer, so a state transition that
/// replaces the owning variant can never leak a live timer.
#[derive(Debug)]
pub struct RetryTimer {
    cancel: CancellationToken,
}

impl RetryTimer {
    /// Arm a timer that sends a tick on `tick_tx` every `period` until
    /// cancelled or the receiver is dropped.
    #[must_use]
    pub fn arm(period: Duration, tick_tx: mpsc::Sender<()>) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // An interval's first tick completes immediately; the first
            // retry should wait a full period.
            interval.tick().await;
            loop {
                tokio::select! {
                    biased;

                    () = token.cancelled() => break,
                    _ = interval.tick() => {
                        if tick_tx.send(()).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
        Self { cancel }
    }

    /// Stop the timer. Idempotent; also performed on drop.
    pub fn cancel(&self) { self.cancel.cancel(); }
}

impl Drop for RetryTimer {
    fn drop(&mut self) { self.cancel.cancel(); }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::RetryTimer;

    #[tokio::test(start_paused = true)]
    async fn ticks_on_the_configured_period() {
        let (tick_tx, mut tick_rx) = mpsc::channel(4);
        let timer = RetryTimer::arm(Duration::from_millis(500), tick_tx);

        let before = tokio::time::Instant::now();
        tick_rx.recv().await.expect("expected a first tick");
        assert_eq!(before.elapsed(), Duration::from_millis(500));

        tick_rx.recv().await.expect("expected a second tick");
        assert_eq!(before.elapsed(), Duration::from_millis(1000));

        timer.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_stops_ticking() {
        let (tick_tx, mut tick_rx) = mpsc::channel(4);
        let timer = RetryTimer::arm(Duration::from_millis(500), tick_tx);
        timer.cancel();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(tick_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels() {
        let (tick_tx, mut tick_rx) = mpsc::channel(4);
        drop(RetryTimer::arm(Duration::from_millis(500), tick_tx));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(tick_rx.try_recv().is_err());
    }
}
