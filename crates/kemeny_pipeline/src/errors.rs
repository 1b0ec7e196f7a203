//! Unified error type for reduction, job dispatch, and backend failures
//! (`spec.md` §7).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("rules-selection-mode must be a 4-bit binary string (got {0:?})")]
    BadRulesMask(String),

    #[error("core: {0}")]
    Core(#[from] kemeny_core::CoreError),

    #[error("io: {0}")]
    Io(#[from] kemeny_io::IoError),

    #[error("{backend} exited with status {exit_code:?}: {stderr}")]
    BackendFailure {
        backend: &'static str,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("invariant violated: {0}")]
    Internal(&'static str),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Why a task stopped short of an optimal result (`spec.md` §5). Surfaced
/// as the sentinel `(score = -1, consensus = "")` at the job-layer
/// boundary, never as a propagated error — cancellation is an ordinary
/// outcome, not a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    Timeout,
    RamOut,
    Requested,
}
