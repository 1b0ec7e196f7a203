//! Typed sidecar record for sub-instance aggregation (`spec.md` §4.F/§4.G).
//!
//! When the reduction engine (§4.C) splits an election into independent
//! sub-instances, each sub-instance is solved on its own and its partial
//! ranking has to be spliced back into the parent's permutation at the
//! right offset, carrying whatever score it contributes across the split.
//! The original implementation tracked this with a handful of ad hoc
//! per-instance fields (`.scoreToSuccessors`, `.replaceCandidate`,
//! `.weight`); here it is one small, serializable struct so the splice
//! step has a single source of truth instead of three loosely related
//! ones.

use kemeny_core::CandidateId;

/// Bookkeeping attached to one solved sub-instance so it can be spliced
/// back into its parent's consensus ranking.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sidecar {
    /// Kemeny-score contribution this sub-instance's internal ranking
    /// adds against every candidate ranked *after* it in the parent
    /// (the "cross" term between sub-instances).
    pub cross_contribution: u64,

    /// The candidates this sub-instance covers, in the parent's id space.
    pub candidate_ids: Vec<CandidateId>,

    /// This sub-instance's position among its siblings, ascending —
    /// determines where its internal ranking is spliced into the parent
    /// sequence.
    pub order_index: usize,
}

impl Sidecar {
    pub fn new(candidate_ids: Vec<CandidateId>, order_index: usize) -> Self {
        Sidecar {
            cross_contribution: 0,
            candidate_ids,
            order_index,
        }
    }

    pub fn len(&self) -> usize {
        self.candidate_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidate_ids.is_empty()
    }
}

/// Sum of `cross_contribution` across a set of solved sub-instances, i.e.
/// the total score owed to cross-pairs once every sub-instance's internal
/// ranking is fixed.
pub fn total_cross_contribution(sidecars: &[Sidecar]) -> u64 {
    sidecars.iter().map(|s| s.cross_contribution).sum()
}

/// Splice per-sub-instance rankings into one parent sequence, ordered by
/// `order_index` ascending.
pub fn splice(sidecars: &[Sidecar], rankings: &[Vec<CandidateId>]) -> Vec<CandidateId> {
    assert_eq!(sidecars.len(), rankings.len());
    let mut order: Vec<usize> = (0..sidecars.len()).collect();
    order.sort_by_key(|&i| sidecars[i].order_index);
    let mut out = Vec::new();
    for i in order {
        out.extend_from_slice(&rankings[i]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(i: u32) -> CandidateId {
        CandidateId::from(i)
    }

    #[test]
    fn splice_respects_order_index_not_vector_position() {
        let sidecars = vec![Sidecar::new(vec![c(2)], 1), Sidecar::new(vec![c(0)], 0)];
        let rankings = vec![vec![c(2)], vec![c(0)]];
        assert_eq!(splice(&sidecars, &rankings), vec![c(0), c(2)]);
    }

    #[test]
    fn total_cross_contribution_sums_all_sidecars() {
        let mut a = Sidecar::new(vec![c(0)], 0);
        a.cross_contribution = 3;
        let mut b = Sidecar::new(vec![c(1)], 1);
        b.cross_contribution = 5;
        assert_eq!(total_cross_contribution(&[a, b]), 8);
    }
}
