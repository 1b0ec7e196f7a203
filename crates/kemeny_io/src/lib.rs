//! Ballot parsing and anonymization, canonical JSON, hashing, and the
//! atomic on-disk artifact layer for the Kemeny consensus engine.
//!
//! `kemeny_core` knows nothing about file formats or candidate names; this
//! crate is the only place that touches a byte stream. Everything it
//! produces for `kemeny_core` is already anonymized, 0-based, and validated.

#![forbid(unsafe_code)]

use thiserror::Error;

pub mod artifacts;
pub mod canonical_json;
pub mod dictionary;
pub mod hasher;
pub mod parser;
pub mod sidecar;

/// Unified error type for every fallible operation in this crate.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("election file not found: {0}")]
    FileNotFound(String),

    #[error("parse error at line {line}, column {column}: {kind}")]
    Parse {
        line: usize,
        column: usize,
        kind: ParseErrorKind,
    },

    #[error("tie marker '^' is not supported (line {line}); ties must be broken before input")]
    TieUnsupported { line: usize },

    #[error("no candidate is ranked on every ballot; intersection universe is empty")]
    EmptyUniverse,

    #[error("bad conversion: {0}")]
    BadConversion(String),

    #[cfg(feature = "serde")]
    #[error("json error: {0}")]
    Json(String),

    #[error("hash error: {0}")]
    Hash(String),

    #[error(transparent)]
    Core(#[from] kemeny_core::CoreError),
}

pub type IoResult<T> = Result<T, IoError>;

#[cfg(feature = "serde")]
impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        IoError::Json(e.to_string())
    }
}

/// A single row of parse-error detail, kept separate from the error message
/// so callers (the CLI's `--verbose` stream) can format it themselves.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseErrorKind {
    EmptyRanking,
    DuplicateCandidateOnBallot,
    UnexpectedCharacter,
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParseErrorKind::EmptyRanking => "ranking has no candidates",
            ParseErrorKind::DuplicateCandidateOnBallot => "candidate repeated on one ballot",
            ParseErrorKind::UnexpectedCharacter => "unexpected character outside a candidate name",
        };
        f.write_str(s)
    }
}

/// Compute a SHA-256 hex digest, or fail loudly when the `hash` feature is
/// off rather than silently returning an empty string.
pub fn try_sha256_hex(bytes: &[u8]) -> IoResult<String> {
    #[cfg(feature = "hash")]
    {
        Ok(hasher::sha256_hex(bytes))
    }
    #[cfg(not(feature = "hash"))]
    {
        let _ = bytes;
        Err(IoError::Hash("hash feature disabled".into()))
    }
}

pub mod prelude {
    pub use crate::{IoError, IoResult, ParseErrorKind};

    pub use crate::artifacts;
    pub use crate::canonical_json;
    pub use crate::dictionary;
    pub use crate::hasher;
    pub use crate::parser;
    pub use crate::sidecar;

    pub use crate::dictionary::Dictionary;
    pub use crate::parser::RawBallot;
    pub use crate::sidecar::Sidecar;
}
