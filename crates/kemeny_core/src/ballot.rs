//! Ballots: strict total orders over a subset of the candidate universe.
//!
//! `spec.md` §3: a ballot is represented in parallel as (a) a position map
//! `Candidate -> rank` and (b) an ordered sequence, for stable iteration in
//! either direction. Construction enforces the invariant that positions
//! are `0..|S|` contiguous with no repeats.

use std::collections::HashMap;

use crate::candidate::CandidateId;
use crate::errors::CoreError;

/// A single voter's strict ranking over some subset of candidates.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ballot {
    sequence: Vec<CandidateId>,
    positions: HashMap<CandidateId, u32>,
}

impl Ballot {
    /// Build a ballot from an already-deduplicated ranked sequence
    /// (best-to-worst). Returns `Err` if a candidate repeats.
    pub fn from_sequence(sequence: Vec<CandidateId>) -> Result<Self, CoreError> {
        let mut positions = HashMap::with_capacity(sequence.len());
        for (rank, &cand) in sequence.iter().enumerate() {
            if positions.insert(cand, rank as u32).is_some() {
                return Err(CoreError::Internal("duplicate candidate on ballot"));
            }
        }
        Ok(Ballot { sequence, positions })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Ordered, best-to-worst iteration.
    #[inline]
    pub fn sequence(&self) -> &[CandidateId] {
        &self.sequence
    }

    /// Rank of `cand` on this ballot (0 = most preferred), or `None` if the
    /// ballot does not rank `cand`.
    #[inline]
    pub fn position_of(&self, cand: CandidateId) -> Option<u32> {
        self.positions.get(&cand).copied()
    }

    #[inline]
    pub fn ranks(&self, a: CandidateId) -> bool {
        self.positions.contains_key(&a)
    }

    /// `true` if this ballot ranks `a` strictly above `b`. Both must be
    /// present on the ballot.
    pub fn prefers(&self, a: CandidateId, b: CandidateId) -> Option<bool> {
        let pa = self.position_of(a)?;
        let pb = self.position_of(b)?;
        Some(pa < pb)
    }

    /// Restrict this ballot to `keep`, preserving relative order, and
    /// renumber positions to stay contiguous. Used by the anonymizer's
    /// universe-intersection step (`kemeny_io`).
    pub fn restricted_to(&self, keep: &std::collections::HashSet<CandidateId>) -> Ballot {
        let sequence: Vec<CandidateId> = self
            .sequence
            .iter()
            .copied()
            .filter(|c| keep.contains(c))
            .collect();
        Ballot::from_sequence(sequence).expect("restriction cannot introduce duplicates")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(i: u32) -> CandidateId {
        CandidateId(i)
    }

    #[test]
    fn builds_contiguous_positions() {
        let b = Ballot::from_sequence(vec![c(2), c(0), c(1)]).unwrap();
        assert_eq!(b.position_of(c(2)), Some(0));
        assert_eq!(b.position_of(c(0)), Some(1));
        assert_eq!(b.position_of(c(1)), Some(2));
    }

    #[test]
    fn rejects_duplicates() {
        assert!(Ballot::from_sequence(vec![c(0), c(1), c(0)]).is_err());
    }

    #[test]
    fn prefers_respects_order() {
        let b = Ballot::from_sequence(vec![c(0), c(1), c(2)]).unwrap();
        assert_eq!(b.prefers(c(0), c(2)), Some(true));
        assert_eq!(b.prefers(c(2), c(0)), Some(false));
        assert_eq!(b.prefers(c(0), c(9)), None);
    }

    #[test]
    fn restriction_preserves_relative_order() {
        let b = Ballot::from_sequence(vec![c(3), c(1), c(2), c(0)]).unwrap();
        let keep: std::collections::HashSet<_> = [c(1), c(0)].into_iter().collect();
        let r = b.restricted_to(&keep);
        assert_eq!(r.sequence(), &[c(1), c(0)]);
    }
}
