//! Minimal error set for core-domain invariant violations.
//!
//! Parsing and CLI-boundary errors live in `kemeny_io`/`kemeny_cli`; this
//! crate only ever fails on programmer error (an invariant broken by a
//! caller), which is why [`CoreError`] has no `Display`-friendly payload
//! beyond a static description.

use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum CoreError {
    #[error("not a permutation of the candidate universe")]
    NotAPermutation,
    #[error("empty candidate universe")]
    EmptyUniverse,
    #[error("invariant violated: {0}")]
    Internal(&'static str),
}
