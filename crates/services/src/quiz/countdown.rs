//! Owned once-per-period tick source for the quiz timer.
//!
//! `start` spawns a tokio task that pushes one tick per period into a channel.
//! The `CountdownHandle` owns the task; cancelling it (or dropping it) stops
//! the task, and from then on `Ticks::next` returns `None` even if a tick was
//! already buffered.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::debug;

/// Cancellation handle for a running countdown.
#[derive(Debug)]
pub struct CountdownHandle {
    cancelled: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

/// Receiving end of a countdown.
#[derive(Debug)]
pub struct Ticks {
    cancelled: Arc<AtomicBool>,
    rx: mpsc::Receiver<()>,
}

/// Start a countdown that fires every `period`, first firing one period from now.
///
/// Must be called from within a tokio runtime.
#[must_use]
pub fn start(period: Duration) -> (CountdownHandle, Ticks) {
    let cancelled = Arc::new(AtomicBool::new(false));
    let shutdown = Arc::new(Notify::new());
    let (tx, rx) = mpsc::channel(1);

    let task = {
        let cancelled = Arc::clone(&cancelled);
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if cancelled.load(Ordering::Acquire) {
                            break;
                        }
                        if tx.send(()).await.is_err() {
                            break;
                        }
                    }
                    () = shutdown.notified() => {
                        debug!("countdown stopped");
                        break;
                    }
                }
            }
        })
    };

    (
        CountdownHandle {
            cancelled: Arc::clone(&cancelled),
            shutdown,
            task: Some(task),
        },
        Ticks { cancelled, rx },
    )
}

impl CountdownHandle {
    /// Stop the countdown. Idempotent.
    pub fn cancel(&mut self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        // notify_one keeps a permit if the task is not parked on `notified` yet.
        self.shutdown.notify_one();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Ticks {
    /// Wait for the next tick. `None` once the countdown is cancelled.
    pub async fn next(&mut self) -> Option<()> {
        if self.cancelled.load(Ordering::Acquire) {
            return None;
        }
        let tick = self.rx.recv().await;
        if self.cancelled.load(Ordering::Acquire) {
            return None;
        }
        tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_period() {
        let (_handle, mut ticks) = start(Duration::from_secs(1));
        let started = Instant::now();
        for _ in 0..3 {
            assert_eq!(ticks.next().await, Some(()));
        }
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_ends_the_stream() {
        let (mut handle, mut ticks) = start(Duration::from_secs(1));
        assert_eq!(ticks.next().await, Some(()));

        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(ticks.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels() {
        let (handle, mut ticks) = start(Duration::from_secs(1));
        drop(handle);
        assert_eq!(ticks.next().await, None);
    }
}
