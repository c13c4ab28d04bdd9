//! One-second tick subscription backing a running timer

use std::{ops::ControlFlow, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

/// Cancellable periodic callback.
///
/// At most one subscription is active at a time: activating again first
/// cancels the previous one. Ticks missed while the process was suspended
/// are not replayed.
#[derive(Debug)]
pub struct TickSource {
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl TickSource {
    /// Create a tick source with a one second period
    pub fn new() -> Self {
        Self::with_period(Duration::from_secs(1))
    }

    pub fn with_period(period: Duration) -> Self {
        Self { period, task: None }
    }

    /// Start calling `callback` once per period.
    ///
    /// The first call happens one full period after activation. Returning
    /// `ControlFlow::Break` from the callback ends the subscription.
    /// Must be called from within a tokio runtime.
    pub fn activate<F>(&mut self, mut callback: F)
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        self.deactivate();

        let period = self.period;
        self.task = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if callback().is_break() {
                    debug!("Tick subscription finished");
                    break;
                }
            }
        }));
    }

    /// Cancel the subscription. Safe to call when nothing is active.
    pub fn deactivate(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Check if a subscription is still delivering ticks
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Default for TickSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TickSource {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() -> ControlFlow<()> + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        (count, move || {
            handle.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_second() {
        let mut ticks = TickSource::new();
        let (count, callback) = counter();
        ticks.activate(callback);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(3_000)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(ticks.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn deactivate_stops_ticks_and_is_idempotent() {
        let mut ticks = TickSource::new();
        let (count, callback) = counter();
        ticks.activate(callback);

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        ticks.deactivate();
        ticks.deactivate();
        assert!(!ticks.is_active());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn activate_replaces_previous_subscription() {
        let mut ticks = TickSource::new();
        let (first, first_callback) = counter();
        let (second, second_callback) = counter();

        ticks.activate(first_callback);
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        ticks.activate(second_callback);
        tokio::time::sleep(Duration::from_millis(3_200)).await;

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn break_ends_subscription() {
        let mut ticks = TickSource::new();
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        ticks.activate(move || {
            if handle.fetch_add(1, Ordering::SeqCst) + 1 == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(!ticks.is_active());
    }
}
