//! Stable ordering helpers shared by the solvers and the reduction engine.
//!
//! Every tie-break named in `spec.md` (§4.D's "lex-smallest first", §4.E's
//! "ties broken by lexicographic order of the permutation's candidate
//! sequence") routes through here so the two solvers and the reducer agree
//! on what "smallest" means.

use core::cmp::Ordering;

use crate::candidate::CandidateId;

/// Lexicographic comparison of two candidate sequences of equal length.
pub fn cmp_lexicographic(a: &[CandidateId], b: &[CandidateId]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.0.cmp(&y.0) {
            Ordering::Equal => continue,
            o => return o,
        }
    }
    a.len().cmp(&b.len())
}

/// Compare `(score, sequence)` pairs: ascending score first, lexicographic
/// sequence as the tie-break. This is the exact rule `spec.md` §4.E uses to
/// order permutations within a dirty set.
pub fn cmp_scored_sequence(
    a: (u64, &[CandidateId]),
    b: (u64, &[CandidateId]),
) -> Ordering {
    match a.0.cmp(&b.0) {
        Ordering::Equal => cmp_lexicographic(a.1, b.1),
        o => o,
    }
}

/// Sort candidates ascending by id — the canonical order used whenever the
/// spec says "lexicographic order of candidate index" without further
/// qualification.
pub fn sort_candidates(ids: &mut [CandidateId]) {
    ids.sort_by_key(|c| c.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(i: u32) -> CandidateId {
        CandidateId(i)
    }

    #[test]
    fn lexicographic_orders_by_first_difference() {
        let a = [c(0), c(1), c(2)];
        let b = [c(0), c(2), c(1)];
        assert_eq!(cmp_lexicographic(&a, &b), Ordering::Less);
    }

    #[test]
    fn scored_sequence_breaks_ties_lexicographically() {
        let a = [c(1), c(0)];
        let b = [c(0), c(1)];
        assert_eq!(cmp_scored_sequence((5, &a), (5, &b)), Ordering::Greater);
        assert_eq!(cmp_scored_sequence((4, &a), (5, &b)), Ordering::Less);
    }
}
