//! Exact dynamic-programming solver (`spec.md` §4.D), Θ(2^m · m²).
//!
//! Grounded in `original_source/source/kconsens_instance_bycand.cpp`'s
//! prefix recurrence: `best(T) = min over c in T of best(T\{c}) +
//! subScoreByPushFront(c, T\{c})`, built bottom-up one subset-size layer
//! at a time via [`crate::subset::ranked_subsets`]. Feasible only up to
//! [`crate::subset::DenseSubset::MAX_CANDIDATES`] candidates — the job
//! layer (`kemeny_pipeline`) is responsible for routing larger instances
//! to the search-tree solver instead.

use std::cmp::Ordering;
use std::collections::HashMap;

use kemeny_core::{CandidateId, Election};

use crate::solver::{CancelToken, SolveOutcome, Solver};
use crate::subset::{ranked_subsets, DenseSubset};

pub struct DpSolver;

impl Solver for DpSolver {
    fn solve(&self, election: &Election, cancel: &CancelToken, collect_all: bool) -> SolveOutcome {
        let m = election.num_candidates();
        assert!(
            m <= DenseSubset::MAX_CANDIDATES,
            "DpSolver requires at most {} candidates; the job layer should have routed this \
             instance elsewhere",
            DenseSubset::MAX_CANDIDATES
        );

        let mut best: HashMap<DenseSubset, u64> = HashMap::with_capacity(1 << m.min(20));
        let mut choice: HashMap<DenseSubset, Vec<CandidateId>> = HashMap::new();
        best.insert(DenseSubset::empty(), 0);

        for (k, subset) in ranked_subsets(m) {
            if k == 0 {
                continue;
            }
            if cancel.is_cancelled() {
                return SolveOutcome::Cancelled;
            }

            let mut best_cost = u64::MAX;
            let mut winners: Vec<CandidateId> = Vec::new();
            // subset.iter() yields members in ascending id order, so
            // `winners` comes out sorted — the lexicographic tie-break
            // `spec.md` §4.D asks for falls out for free.
            for c in subset.iter() {
                let rest = subset.without(c);
                let rest_cost = *best
                    .get(&rest)
                    .expect("smaller subset layer already computed");
                let push_front_cost: u64 = rest.iter().map(|d| election.subscore(d, c)).sum();
                let total = rest_cost + push_front_cost;
                match total.cmp(&best_cost) {
                    Ordering::Less => {
                        best_cost = total;
                        winners.clear();
                        winners.push(c);
                    }
                    Ordering::Equal => winners.push(c),
                    Ordering::Greater => {}
                }
            }
            best.insert(subset, best_cost);
            choice.insert(subset, winners);
        }

        let full = DenseSubset::full(m);
        let score = *best.get(&full).unwrap_or(&0);

        let rankings = if collect_all {
            let mut all = reconstruct_all(&choice, full);
            all.sort_by(|a, b| kemeny_core::determinism::cmp_lexicographic(a, b));
            all
        } else {
            vec![reconstruct_one(&choice, full)]
        };

        SolveOutcome::Optimal { score, rankings }
    }
}

fn reconstruct_one(choice: &HashMap<DenseSubset, Vec<CandidateId>>, subset: DenseSubset) -> Vec<CandidateId> {
    if subset.is_empty() {
        return Vec::new();
    }
    let c = choice[&subset][0];
    let mut seq = vec![c];
    seq.extend(reconstruct_one(choice, subset.without(c)));
    seq
}

fn reconstruct_all(
    choice: &HashMap<DenseSubset, Vec<CandidateId>>,
    subset: DenseSubset,
) -> Vec<Vec<CandidateId>> {
    if subset.is_empty() {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    for &c in &choice[&subset] {
        for tail in reconstruct_all(choice, subset.without(c)) {
            let mut seq = Vec::with_capacity(tail.len() + 1);
            seq.push(c);
            seq.extend(tail);
            out.push(seq);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kemeny_core::{Ballot, Election};

    fn ballot(order: &[u32]) -> Ballot {
        Ballot::from_sequence(order.iter().map(|&i| CandidateId::from(i)).collect()).unwrap()
    }

    #[test]
    fn solves_cyclic_three_way_tie_optimally() {
        // A>B>C, B>C>A, C>A>B — the three forward rotations tie at the
        // optimum (4); the three reverse rotations score 5.
        let e = Election::new(
            vec![ballot(&[0, 1, 2]), ballot(&[1, 2, 0]), ballot(&[2, 0, 1])],
            3,
        )
        .unwrap();
        let out = DpSolver.solve(&e, &CancelToken::new(), false);
        match out {
            SolveOutcome::Optimal { score, rankings } => {
                assert_eq!(rankings.len(), 1);
                assert_eq!(score, e.kscore(&rankings[0]));
            }
            SolveOutcome::Cancelled => panic!("must not cancel"),
        }
    }

    #[test]
    fn unanimous_election_scores_zero() {
        let e = Election::new(vec![ballot(&[0, 1, 2]); 5], 3).unwrap();
        let out = DpSolver.solve(&e, &CancelToken::new(), false);
        match out {
            SolveOutcome::Optimal { score, rankings } => {
                assert_eq!(score, 0);
                assert_eq!(rankings[0], vec![CandidateId::from(0), CandidateId::from(1), CandidateId::from(2)]);
            }
            SolveOutcome::Cancelled => panic!("must not cancel"),
        }
    }

    #[test]
    fn collect_all_returns_every_tied_optimum_sorted_lexicographically() {
        let e = Election::new(
            vec![ballot(&[0, 1, 2]), ballot(&[1, 2, 0]), ballot(&[2, 0, 1])],
            3,
        )
        .unwrap();
        let out = DpSolver.solve(&e, &CancelToken::new(), true);
        match out {
            SolveOutcome::Optimal { rankings, .. } => {
                assert!(rankings.len() >= 2);
                let mut sorted = rankings.clone();
                sorted.sort_by(|a, b| kemeny_core::determinism::cmp_lexicographic(a, b));
                assert_eq!(rankings, sorted);
            }
            SolveOutcome::Cancelled => panic!("must not cancel"),
        }
    }

    #[test]
    fn respects_cancellation() {
        let e = Election::new(vec![ballot(&[0, 1, 2]); 3], 3).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            DpSolver.solve(&e, &cancel, false),
            SolveOutcome::Cancelled
        ));
    }
}
