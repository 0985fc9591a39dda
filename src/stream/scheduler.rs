//! Timer and background-task primitives for the capture loop.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ClientError;

pub type IntervalTask = Arc<dyn Fn() + Send + Sync>;
pub type BackgroundTask = Box<dyn FnOnce() + Send>;

/// A scheduled repeating task. Cancelling is idempotent.
pub trait IntervalHandle: Send {
    fn cancel(&mut self);
}

pub trait Scheduler: Send + Sync {
    /// Runs `task` every `period` until the handle is cancelled. Ticks do not
    /// wait for work started by earlier ticks.
    fn every(&self, period: Duration, task: IntervalTask) -> Result<Box<dyn IntervalHandle>, ClientError>;

    /// Runs `task` once in the background.
    fn spawn(&self, task: BackgroundTask);
}

/// Scheduler backed by OS threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadScheduler;

struct ThreadInterval {
    stop: Option<mpsc::Sender<()>>,
}

impl IntervalHandle for ThreadInterval {
    fn cancel(&mut self) {
        // Dropping the sender wakes the timer thread immediately.
        self.stop.take();
    }
}

impl Drop for ThreadInterval {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Scheduler for ThreadScheduler {
    /// Ticks land on `start + n * period` regardless of how long each task
    /// takes. Deadlines missed by a slow task are skipped, not replayed.
    fn every(&self, period: Duration, task: IntervalTask) -> Result<Box<dyn IntervalHandle>, ClientError> {
        if period.is_zero() {
            return Err(ClientError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "interval period must be non-zero",
            )));
        }
        let (tx, rx) = mpsc::channel::<()>();
        std::thread::Builder::new()
            .name("capture-interval".to_string())
            .spawn(move || {
                let mut deadline = Instant::now() + period;
                loop {
                    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                        Err(RecvTimeoutError::Timeout) => {
                            task();
                            deadline = next_deadline(deadline, period, Instant::now());
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;
        Ok(Box::new(ThreadInterval { stop: Some(tx) }))
    }

    fn spawn(&self, task: BackgroundTask) {
        if let Err(e) = std::thread::Builder::new()
            .name("frame-submit".to_string())
            .spawn(task)
        {
            log::error!("failed to spawn background task: {}", e);
        }
    }
}

/// First deadline after `now` on the grid that starts at `deadline`.
fn next_deadline(deadline: Instant, period: Duration, now: Instant) -> Instant {
    let mut next = deadline + period;
    while next <= now {
        next += period;
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn interval_ticks_until_cancelled() {
        let count = Arc::new(AtomicUsize::new(0));
        let ticks = count.clone();
        let mut handle = ThreadScheduler
            .every(
                Duration::from_millis(10),
                Arc::new(move || {
                    ticks.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
        std::thread::sleep(Duration::from_millis(100));
        handle.cancel();
        std::thread::sleep(Duration::from_millis(30));
        let after_cancel = count.load(Ordering::SeqCst);
        assert!(after_cancel >= 1);
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(count.load(Ordering::SeqCst), after_cancel);
    }

    #[test]
    fn slow_task_does_not_stretch_the_period() {
        let count = Arc::new(AtomicUsize::new(0));
        let ticks = count.clone();
        let mut handle = ThreadScheduler
            .every(
                Duration::from_millis(100),
                Arc::new(move || {
                    std::thread::sleep(Duration::from_millis(60));
                    ticks.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
        std::thread::sleep(Duration::from_millis(2_050));
        handle.cancel();
        let n = count.load(Ordering::SeqCst);
        // 19 ticks complete inside the window on a fixed grid; a period
        // stretched by the task gives about 13.
        assert!(n >= 18, "got {n} ticks");
    }

    #[test]
    fn missed_deadlines_are_skipped() {
        let start = Instant::now();
        let period = Duration::from_millis(100);
        assert_eq!(next_deadline(start, period, start), start + period);
        assert_eq!(
            next_deadline(start, period, start + Duration::from_millis(250)),
            start + Duration::from_millis(300)
        );
        assert_eq!(
            next_deadline(start, period, start + Duration::from_millis(300)),
            start + Duration::from_millis(400)
        );
    }

    #[test]
    fn zero_period_is_rejected() {
        let result = ThreadScheduler.every(Duration::ZERO, Arc::new(|| {}));
        assert!(matches!(result, Err(ClientError::Io(_))));
    }
}
