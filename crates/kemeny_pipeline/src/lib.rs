//! kemeny_pipeline — orchestration layer sitting between the model
//! (`kemeny_core`), the solvers (`kemeny_algo`), and the artifact/CLI
//! layers (`kemeny_io`, `kemeny_cli`):
//!
//! - [`reduction`] — the data-reduction preprocessor (`spec.md` §4.C),
//!   rules R1–R5 run to a fixed point.
//! - [`job`] — the core-token semaphore, wall-clock/free-RAM limiter,
//!   status streamer, and the [`job::run_task`] abstraction that ties a
//!   solve to a cancellation token (`spec.md` §4.F, §5).
//! - [`aggregate`] — solver dispatch per the `modus` table and
//!   sub-instance splicing (`spec.md` §4.F).
//! - [`backend`] — the external MIP subprocess shim (`spec.md` §6).

#![forbid(unsafe_code)]

pub mod aggregate;
pub mod backend;
pub mod errors;
pub mod job;
pub mod reduction;

pub use aggregate::{run_election, AggregateOutcome, Modus, SolvedBlock};
pub use errors::{CancelReason, PipelineError, PipelineResult};
pub use job::{run_task, CoreSemaphore, CoreToken, Limiter, StatusStreamer, TaskOutcome};
pub use reduction::{reduce, CandidateSet, ReductionConfig, ReductionStep, ReductionTrace, RuleFlags, SetChoice};
