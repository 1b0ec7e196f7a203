//! Dense candidate identifiers.
//!
//! A [`CandidateId`] is the anonymized, 0-based integer produced by
//! `kemeny_io`'s interning step (`spec.md` §4.A). Nothing in this crate
//! ever looks at the original candidate name — that bijection is owned by
//! `kemeny_io::dictionary`.

use core::fmt;

#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateId(pub u32);

impl CandidateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn from_index(i: usize) -> Self {
        CandidateId(i as u32)
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<u32> for CandidateId {
    fn from(v: u32) -> Self {
        CandidateId(v)
    }
}
