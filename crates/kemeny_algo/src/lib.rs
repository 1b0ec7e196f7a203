//! kemeny_algo — Kemeny consensus solvers.
//!
//! Three interchangeable ways to turn an [`kemeny_core::Election`] into a
//! ranking, all implementing the single [`solver::Solver`] trait
//! (`spec.md` §9's redesign flag collapses the original `InstanceSolver`
//! class hierarchy down to one trait):
//!
//! - [`dp`] — exact, Θ(2^m · m²) subset dynamic program; feasible up to
//!   [`subset::DenseSubset::MAX_CANDIDATES`] candidates.
//! - [`search_tree`] — exact, fixed-parameter branch-and-bound over just
//!   the dirty (genuinely contested) candidates, with iterative deepening
//!   on the target score.
//! - [`heuristics::pick_a_random_ballot`] — O(1) approximate fallback for
//!   instances too large for either exact solver.
//!
//! This crate depends only on `kemeny_core`: it knows nothing about ballot
//! files, CLI flags, or job scheduling.

#![forbid(unsafe_code)]

#[cfg(feature = "dp")]
pub mod dp;
#[cfg(feature = "heuristics")]
pub mod heuristics;
#[cfg(feature = "search_tree")]
pub mod search_tree;
pub mod solver;
pub mod subset;

pub use solver::{CancelToken, SolveOutcome, Solver};
pub use subset::DenseSubset;

#[cfg(feature = "dp")]
pub use dp::DpSolver;
#[cfg(feature = "heuristics")]
pub use heuristics::pick_a_random_ballot;
#[cfg(feature = "search_tree")]
pub use search_tree::SearchTreeSolver;
