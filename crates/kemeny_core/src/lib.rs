//! kemeny_core — pairwise-preference model and score algebra for the
//! Kemeny consensus engine.
//!
//! This crate is **I/O-free**: it knows nothing about ballot files, CLI
//! flags, or on-disk artifacts. It defines the stable types shared by
//! `kemeny_io` (parsing), `kemeny_algo` (solvers), and `kemeny_pipeline`
//! (reduction + orchestration):
//!
//! - [`candidate::CandidateId`] — a dense 0-based candidate handle.
//! - [`ballot::Ballot`] — a strict total order over a subset of candidates.
//! - [`election::Election`] — ballots plus the derived pairwise matrix,
//!   with cached dirty-pair/majority/bound analyses.
//! - [`determinism`] — stable tie-break comparators shared by the solvers.
//! - [`rng`] — a seeded RNG used only where randomness is explicitly
//!   requested (the pick-a-random-ballot heuristic); solver search order
//!   never depends on it.
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod ballot;
pub mod candidate;
pub mod determinism;
pub mod election;
pub mod errors;
pub mod rng;

pub use ballot::Ballot;
pub use candidate::CandidateId;
pub use election::Election;
pub use errors::CoreError;
