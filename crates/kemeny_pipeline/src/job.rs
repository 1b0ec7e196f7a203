//! Job/worker layer (`spec.md` §4.F, §5): core-token semaphore, the
//! wall-clock/free-RAM limiter, status streaming, and a task that ties a
//! solver call to a [`kemeny_algo::CancelToken`].
//!
//! Grounded in `original_source/source/jobmanagement.cpp`/`.hpp`:
//! `fullspeed_core[4]` → [`CoreSemaphore`]; `ResourcesLimiter::operator()`
//! → [`Limiter::run`]; `StatusOutput` → [`StatusStreamer`];
//! `InstanceSolver` → [`Task`]. `spec.md` §9's redesign flag replaces the
//! original's global `boost::mutex` array with an explicit semaphore type
//! whose tokens are acquired/released through RAII, and cancellation is a
//! polled [`kemeny_algo::CancelToken`] instead of a thrown exception.

use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use kemeny_algo::CancelToken;

use crate::errors::CancelReason;

/// A fixed array of mutual-exclusion tokens modeling physical cores
/// (`spec.md` §4.F, default size 4). A worker acquires a token before CPU
/// work and releases it on every exit path via [`CoreToken`]'s `Drop`.
pub struct CoreSemaphore {
    available: Mutex<Vec<bool>>,
    changed: Condvar,
}

impl CoreSemaphore {
    pub fn new(cores: usize) -> Arc<Self> {
        Arc::new(CoreSemaphore {
            available: Mutex::new(vec![true; cores.max(1)]),
            changed: Condvar::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.available.lock().unwrap().len()
    }

    /// Block until a token is free, then hold it.
    pub fn acquire(self: &Arc<Self>) -> CoreToken {
        let mut slots = self.available.lock().unwrap();
        loop {
            if let Some(id) = slots.iter().position(|&free| free) {
                slots[id] = false;
                return CoreToken {
                    sem: Arc::clone(self),
                    id,
                };
            }
            slots = self.changed.wait(slots).unwrap();
        }
    }

    /// Non-blocking probe used by the limiter to detect whether a
    /// specific core has gone idle (mirrors `fullspeed_core[id].try_lock()`
    /// in `ResourcesLimiter::operator()`).
    pub fn is_free(&self, id: usize) -> bool {
        self.available.lock().unwrap().get(id).copied().unwrap_or(true)
    }

    fn release(&self, id: usize) {
        let mut slots = self.available.lock().unwrap();
        if let Some(slot) = slots.get_mut(id) {
            *slot = true;
        }
        self.changed.notify_all();
    }
}

/// RAII handle to one acquired core token; releases on drop regardless of
/// how the holding scope exits (success, error, or cancellation).
pub struct CoreToken {
    sem: Arc<CoreSemaphore>,
    id: usize,
}

impl CoreToken {
    pub fn id(&self) -> usize {
        self.id
    }
}

impl Drop for CoreToken {
    fn drop(&mut self) {
        self.sem.release(self.id);
    }
}

/// Samples free-RAM percentage and wall clock once a second and raises a
/// [`CancelToken`] if either threshold is crossed. Grounded in
/// `ResourcesLimiter::operator()`: the 5%-free-RAM floor and the
/// polling-plus-`try_lock` idle-detection loop.
pub struct Limiter {
    timelimit: Duration,
    poll_interval: Duration,
}

impl Limiter {
    pub fn new(timelimit: Duration) -> Self {
        Limiter {
            timelimit,
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Run the sampling loop on the calling thread until the core goes
    /// idle, the time limit elapses, or free RAM drops below 5%. Intended
    /// to be spawned on its own thread alongside the worker; returns the
    /// reason it stopped watching, or `None` if the core went idle on its
    /// own (the task finished before either limit fired).
    pub fn watch(&self, sem: &Arc<CoreSemaphore>, core: usize, cancel: &CancelToken) -> Option<CancelReason> {
        let deadline = Instant::now() + self.timelimit;
        loop {
            std::thread::sleep(self.poll_interval);
            if sem.is_free(core) {
                return None;
            }
            if free_ram_percent() < 0.05 {
                cancel.cancel();
                return Some(CancelReason::RamOut);
            }
            if Instant::now() >= deadline {
                cancel.cancel();
                return Some(CancelReason::Timeout);
            }
        }
    }
}

/// Fraction of total RAM currently free, read from `/proc/meminfo` on
/// Linux (`MemAvailable` when present, else `MemFree / MemTotal`). On
/// platforms without `/proc` this fails open (reports plenty of RAM free)
/// rather than inventing a cross-platform memory API — the original tool
/// was Linux-only and this keeps behavior identical there.
pub fn free_ram_percent() -> f64 {
    let Ok(mut f) = std::fs::File::open("/proc/meminfo") else {
        return 1.0;
    };
    let mut contents = String::new();
    if f.read_to_string(&mut contents).is_err() {
        return 1.0;
    }
    let mut total: Option<u64> = None;
    let mut available: Option<u64> = None;
    let mut free: Option<u64> = None;
    for line in contents.lines() {
        let mut parts = line.split_whitespace();
        let Some(key) = parts.next() else { continue };
        let Some(value) = parts.next().and_then(|v| v.parse::<u64>().ok()) else {
            continue;
        };
        match key {
            "MemTotal:" => total = Some(value),
            "MemAvailable:" => available = Some(value),
            "MemFree:" => free = Some(value),
            _ => {}
        }
    }
    match (total, available.or(free)) {
        (Some(t), Some(a)) if t > 0 => a as f64 / t as f64,
        _ => 1.0,
    }
}

/// One `StatusStreamer`-owned ring of status lines, periodically flushed
/// to a sink. Workers append to their own buffer; only the streamer
/// drains it, matching `StatusOutput`'s single-writer/single-reader split
/// in the original.
pub struct StatusStreamer {
    lines: Mutex<Vec<String>>,
    drained: AtomicUsize,
}

impl StatusStreamer {
    pub fn new() -> Self {
        StatusStreamer {
            lines: Mutex::new(Vec::new()),
            drained: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, line: impl Into<String>) {
        self.lines.lock().unwrap().push(line.into());
    }

    /// Lines appended since the last call to `drain`, in order.
    pub fn drain(&self) -> Vec<String> {
        let all = self.lines.lock().unwrap();
        let start = self.drained.swap(all.len(), Ordering::SeqCst);
        all[start.min(all.len())..].to_vec()
    }
}

impl Default for StatusStreamer {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of [`run_task`]: either the closure's own return value, or the
/// reason it was cancelled before producing one.
pub struct TaskOutcome<T> {
    pub value: Option<T>,
    pub cancel_reason: Option<CancelReason>,
}

/// Run `work` on its own thread under one core token, watched by `limiter`
/// for the wall-clock/free-RAM limits (`spec.md` §4.F/§5's `Task`
/// abstraction; grounded in `jobmanagement.cpp`'s `InstanceSolver`, which
/// paired each solve with exactly this core-token + limiter combination).
///
/// The token is moved into the worker thread and dropped there when
/// `work` returns, so [`CoreSemaphore::is_free`] only reports the core
/// idle once the solve itself has actually finished — matching the
/// original's `fullspeed_core[id].try_lock()` probe, which observed the
/// same thing from the limiter's side.
pub fn run_task<T, F>(sem: &Arc<CoreSemaphore>, limiter: &Limiter, work: F) -> TaskOutcome<T>
where
    T: Send + 'static,
    F: FnOnce(&CancelToken) -> T + Send + 'static,
{
    let token = sem.acquire();
    let core_id = token.id();
    let cancel = CancelToken::new();
    let cancel_for_worker = cancel.clone();
    let (tx, rx) = std::sync::mpsc::channel();

    let handle = std::thread::spawn(move || {
        let _token = token;
        let result = work(&cancel_for_worker);
        let _ = tx.send(result);
    });

    let cancel_reason = limiter.watch(sem, core_id, &cancel);
    let value = rx.recv().ok();
    let _ = handle.join();

    TaskOutcome { value, cancel_reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_semaphore_reuses_released_token() {
        let sem = CoreSemaphore::new(1);
        let a = sem.acquire();
        assert_eq!(a.id(), 0);
        drop(a);
        let b = sem.acquire();
        assert_eq!(b.id(), 0);
    }

    #[test]
    fn core_semaphore_reports_free_token() {
        let sem = CoreSemaphore::new(2);
        assert!(sem.is_free(0));
        let _held = sem.acquire();
        assert!(!sem.is_free(0));
        assert!(sem.is_free(1));
    }

    #[test]
    fn status_streamer_drains_only_new_lines() {
        let streamer = StatusStreamer::new();
        streamer.push("a");
        assert_eq!(streamer.drain(), vec!["a".to_string()]);
        assert!(streamer.drain().is_empty());
        streamer.push("b");
        assert_eq!(streamer.drain(), vec!["b".to_string()]);
    }

    #[test]
    fn free_ram_percent_is_a_fraction_between_zero_and_one() {
        let pct = free_ram_percent();
        assert!(pct >= 0.0 && pct <= 1.0);
    }

    #[test]
    fn run_task_returns_the_closures_value_and_frees_its_core() {
        let sem = CoreSemaphore::new(1);
        let limiter = Limiter::new(Duration::from_secs(30));
        let outcome = run_task(&sem, &limiter, |_cancel| 2 + 2);
        assert_eq!(outcome.value, Some(4));
        assert_eq!(outcome.cancel_reason, None);
        assert!(sem.is_free(0));
    }
}
