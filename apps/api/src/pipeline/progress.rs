//! Synthetic upload progress.
//!
//! Blob uploads only report done / not done. While one is in flight a
//! `ProgressSimulator` ticks a percentage upward by a random step, stopping
//! at 95; `complete()` jumps to 100. The simulator is a guard: the tick task
//! is aborted when it reaches the cap, on `complete()`, or on drop, whichever
//! comes first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub const PROGRESS_CAP: u8 = 95;
pub const PROGRESS_DONE: u8 = 100;
/// Upper bound (exclusive) of a single tick's increment.
const MAX_STEP: f64 = 5.0;

pub struct ProgressSimulator {
    progress: Arc<watch::Sender<u8>>,
    halted: Arc<AtomicBool>,
    ticker: JoinHandle<()>,
}

impl ProgressSimulator {
    /// Resets `progress` to 0 and starts ticking every `tick`.
    pub fn start(progress: Arc<watch::Sender<u8>>, tick: Duration) -> Self {
        progress.send_replace(0);
        let halted = Arc::new(AtomicBool::new(false));
        let ticker = tokio::spawn(run_ticker(progress.clone(), halted.clone(), tick));
        Self {
            progress,
            halted,
            ticker,
        }
    }

    /// Sets progress to 100 and stops the tick task.
    pub fn complete(self) {
        self.halt();
        self.progress.send_replace(PROGRESS_DONE);
    }

    #[allow(dead_code)]
    pub fn value(&self) -> u8 {
        *self.progress.borrow()
    }

    /// Whether the tick task is still running.
    #[allow(dead_code)]
    pub fn is_ticking(&self) -> bool {
        !self.ticker.is_finished()
    }

    fn halt(&self) {
        // the ticker checks this flag under the channel lock before writing,
        // so no tick lands after a halt
        self.halted.store(true, Ordering::SeqCst);
        self.ticker.abort();
    }
}

impl Drop for ProgressSimulator {
    fn drop(&mut self) {
        self.halt();
    }
}

async fn run_ticker(progress: Arc<watch::Sender<u8>>, halted: Arc<AtomicBool>, tick: Duration) {
    let mut interval = interval_at(Instant::now() + tick, tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut current = 0.0_f64;

    loop {
        interval.tick().await;
        current = (current + rand::rng().random_range(0.0..MAX_STEP)).min(PROGRESS_CAP as f64);
        let shown = current.round() as u8;

        let written = progress.send_if_modified(|value| {
            if halted.load(Ordering::SeqCst) {
                return false;
            }
            *value = shown;
            true
        });
        if !written || shown >= PROGRESS_CAP {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(200);

    fn channel() -> (Arc<watch::Sender<u8>>, watch::Receiver<u8>) {
        let (tx, rx) = watch::channel(0);
        (Arc::new(tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_is_monotonic_and_capped() {
        let (tx, rx) = channel();
        let simulator = ProgressSimulator::start(tx, TICK);

        let mut last = 0;
        for _ in 0..200 {
            tokio::time::sleep(TICK).await;
            let now = *rx.borrow();
            assert!(now >= last, "progress went from {last} to {now}");
            assert!(now <= PROGRESS_CAP);
            last = now;
        }
        drop(simulator);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_stops_at_cap() {
        let (tx, rx) = channel();
        let simulator = ProgressSimulator::start(tx, TICK);

        tokio::time::sleep(TICK * 10_000).await;
        assert_eq!(*rx.borrow(), PROGRESS_CAP);
        assert!(!simulator.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_sets_100_and_stops_ticking() {
        let (tx, rx) = channel();
        let simulator = ProgressSimulator::start(tx.clone(), TICK);
        tokio::time::sleep(TICK * 3).await;

        simulator.complete();
        assert_eq!(*rx.borrow(), PROGRESS_DONE);

        tokio::time::sleep(TICK * 50).await;
        assert_eq!(*rx.borrow(), PROGRESS_DONE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_to_zero() {
        let (tx, rx) = channel();
        ProgressSimulator::start(tx.clone(), TICK).complete();
        assert_eq!(*rx.borrow(), PROGRESS_DONE);

        let second = ProgressSimulator::start(tx, TICK);
        assert_eq!(second.value(), 0);
        assert_eq!(*rx.borrow(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_ticker() {
        let (tx, rx) = channel();
        let simulator = ProgressSimulator::start(tx, TICK);
        tokio::time::sleep(TICK * 2).await;
        drop(simulator);

        let frozen = *rx.borrow();
        tokio::time::sleep(TICK * 100).await;
        assert_eq!(*rx.borrow(), frozen);
        assert!(frozen < PROGRESS_DONE);
    }
}
