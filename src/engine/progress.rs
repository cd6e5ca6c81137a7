//! engine::progress
//!
//! Progress reporting and cooperative cancellation.
//!
//! # Design
//!
//! Long computations call [`ProgressReporter::report`] synchronously at
//! fixed checkpoints and poll a [`CancelToken`] at the top of their outer
//! loops. Nothing is preemptive: a cancelled run notices the flag at its
//! next checkpoint, drops its private state and returns an error.
//!
//! # Thread Safety
//!
//! [`CancelToken`] is a clonable handle over an atomic flag and can be
//! triggered from any thread. [`SyncProgress`] wraps any reporter behind a
//! mutex so concurrent callers cannot interleave updates to its timing and
//! fraction state.
//!
//! # Example
//!
//! ```
//! use conlat::engine::progress::{CancelToken, FnProgress, ProgressReporter, SyncProgress};
//!
//! let progress = SyncProgress::new(FnProgress::new(|fraction, message| {
//!     assert!((0.0..=1.0).contains(&fraction));
//!     assert!(!message.is_empty());
//! }));
//! progress.report(0.5, "halfway");
//! progress.report(0.25, "late update"); // clamped to 0.5
//! assert_eq!(progress.last_fraction(), 0.5);
//!
//! let cancel = CancelToken::new();
//! let handle = cancel.clone();
//! handle.cancel();
//! assert!(cancel.is_cancelled());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Receives progress checkpoints.
///
/// `fraction` lies in `[0, 1]`. Implementations must not block.
pub trait ProgressReporter {
    fn report(&self, fraction: f64, message: &str);
}

impl<T: ProgressReporter + ?Sized> ProgressReporter for &T {
    fn report(&self, fraction: f64, message: &str) {
        (**self).report(fraction, message);
    }
}

impl<T: ProgressReporter + ?Sized> ProgressReporter for Arc<T> {
    fn report(&self, fraction: f64, message: &str) {
        (**self).report(fraction, message);
    }
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _fraction: f64, _message: &str) {}
}

/// Forwards updates to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, fraction: f64, message: &str) {
        tracing::info!(percent = fraction * 100.0, "{}", message);
    }
}

/// Adapts a closure into a reporter.
pub struct FnProgress<F> {
    f: F,
}

impl<F> FnProgress<F>
where
    F: Fn(f64, &str),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ProgressReporter for FnProgress<F>
where
    F: Fn(f64, &str),
{
    fn report(&self, fraction: f64, message: &str) {
        (self.f)(fraction, message);
    }
}

impl<F> std::fmt::Debug for FnProgress<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnProgress").finish_non_exhaustive()
    }
}

/// Timing and fraction state guarded by [`SyncProgress`].
#[derive(Debug, Default)]
struct ProgressState {
    started: Option<Instant>,
    last_fraction: f64,
    calls: u64,
}

/// Thread-safe wrapper serializing calls to an inner reporter.
///
/// Fractions are clamped to `[0, 1]` and never move backwards; a `NaN`
/// repeats the previous fraction. The lock is held while the inner
/// reporter runs, so updates reach it one at a time and in order.
#[derive(Debug)]
pub struct SyncProgress<R> {
    inner: R,
    state: Mutex<ProgressState>,
}

impl<R: ProgressReporter> SyncProgress<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            state: Mutex::new(ProgressState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        // A panicking reporter leaves the numbers intact.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Most recent fraction passed to the inner reporter.
    pub fn last_fraction(&self) -> f64 {
        self.lock().last_fraction
    }

    /// Number of updates forwarded so far.
    pub fn calls(&self) -> u64 {
        self.lock().calls
    }

    /// Time since the first update, or zero before any.
    pub fn elapsed(&self) -> Duration {
        self.lock()
            .started
            .map(|s| s.elapsed())
            .unwrap_or_default()
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: ProgressReporter> ProgressReporter for SyncProgress<R> {
    fn report(&self, fraction: f64, message: &str) {
        let mut state = self.lock();
        state.started.get_or_insert_with(Instant::now);
        let fraction = if fraction.is_nan() {
            state.last_fraction
        } else {
            fraction.clamp(0.0, 1.0).max(state.last_fraction)
        };
        state.last_fraction = fraction;
        state.calls += 1;
        self.inner.report(fraction, message);
    }
}

/// Cooperative cancellation flag shared between a caller and a computation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe from any thread; idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn sync_progress_clamps_and_is_monotonic() {
        let seen = Mutex::new(Vec::new());
        let progress = SyncProgress::new(FnProgress::new(|f, _| seen.lock().unwrap().push(f)));
        progress.report(-1.0, "below");
        progress.report(0.4, "a");
        progress.report(0.2, "b");
        progress.report(f64::NAN, "nan");
        progress.report(7.0, "above");
        assert_eq!(*seen.lock().unwrap(), vec![0.0, 0.4, 0.4, 0.4, 1.0]);
        assert_eq!(progress.calls(), 5);
    }

    #[test]
    fn sync_progress_serializes_threads() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let progress = Arc::new(SyncProgress::new(FnProgress::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let progress = Arc::clone(&progress);
                thread::spawn(move || {
                    for i in 0..25 {
                        progress.report((t * 25 + i) as f64 / 100.0, "tick");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(count.load(Ordering::SeqCst), 100);
        assert_eq!(progress.calls(), 100);
        assert!(progress.last_fraction() <= 1.0);
    }

    #[test]
    fn elapsed_starts_at_first_report() {
        let progress = SyncProgress::new(NoProgress);
        assert_eq!(progress.elapsed(), Duration::ZERO);
        progress.report(0.1, "start");
        assert_eq!(progress.calls(), 1);
    }

    #[test]
    fn cancel_token_is_shared() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let other = token.clone();
        thread::spawn(move || other.cancel()).join().unwrap();
        assert!(token.is_cancelled());
    }
}
