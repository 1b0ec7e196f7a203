//! The `Solver` trait and its shared cancellation/outcome types.
//!
//! `spec.md` §9's redesign flag: the original implementation modeled
//! `InstanceSolver` as a class hierarchy and stopped a running solve by
//! throwing `boost::thread_interrupted` into it. Neither survives here —
//! one trait, and cancellation is a plain polled flag. A solver checks
//! [`CancelToken::is_cancelled`] at its own convenient points (DP layer
//! boundaries, search-tree node visits) and returns
//! [`SolveOutcome::Cancelled`] instead of unwinding through a panic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kemeny_core::{CandidateId, Election};

/// A shared, cloneable flag the job/worker layer (`kemeny_pipeline`) sets
/// when a solve should stop: a time limit or RAM limit was hit, or the
/// user's process was asked to cancel.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of a (possibly interrupted) solve attempt.
#[derive(Clone, Debug)]
pub enum SolveOutcome {
    /// One or more tied-optimal rankings of `score` each. More than one
    /// entry is only ever populated when the caller asked to keep all
    /// solutions (`spec.md` §6's `--keep-all-solutions`).
    Optimal {
        score: u64,
        rankings: Vec<Vec<CandidateId>>,
    },
    /// The cancellation token fired before a provably optimal ranking was
    /// found.
    Cancelled,
}

impl SolveOutcome {
    pub fn score(&self) -> Option<u64> {
        match self {
            SolveOutcome::Optimal { score, .. } => Some(*score),
            SolveOutcome::Cancelled => None,
        }
    }
}

/// Anything that can turn an [`Election`] into an optimal consensus
/// ranking (or report that it was cancelled first).
pub trait Solver {
    /// `collect_all`: when `true`, every tied-optimal ranking is returned
    /// instead of just the lexicographically-first one.
    fn solve(&self, election: &Election, cancel: &CancelToken, collect_all: bool) -> SolveOutcome;
}
