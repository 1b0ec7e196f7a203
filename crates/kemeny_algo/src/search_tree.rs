//! Fixed-parameter search-tree solver with iterative deepening
//! (`spec.md` §4.E).
//!
//! Grounded in `original_source/source/kconsens_instance_dirtypairs_based.cpp`:
//!
//! - `rule2_check` — a unique-ballot majority shortcut: if one ranking's
//!   voter count exceeds its own Kemeny score, it is provably optimal and
//!   the search never has to start.
//! - `rule1_prepare`/`rule1_reinsert` — non-dirty candidates (every one
//!   of their pairwise relations is unanimous) are pulled out to a fixed
//!   position before the search and spliced back in afterward; only the
//!   genuinely contested ("dirty") candidates are searched.
//! - `initLD`/`getDirtySets` — here, one flat branch-and-bound search over
//!   the whole dirty set rather than the original's further split into
//!   per-component dirty blocks: that splitting is the reduction engine's
//!   job (`kemeny_pipeline`'s R5 Condorcet-component rule), which this
//!   solver assumes has already run when it's beneficial to. Calling this
//!   solver directly on an unreduced election (`-p 0`) still produces a
//!   correct answer, just without that extra speedup.

use std::collections::BTreeSet;

use kemeny_core::{determinism, CandidateId, Election};

use crate::solver::{CancelToken, SolveOutcome, Solver};
use crate::subset::DenseSubset;

pub struct SearchTreeSolver;

impl Solver for SearchTreeSolver {
    fn solve(&self, election: &Election, cancel: &CancelToken, collect_all: bool) -> SolveOutcome {
        if let Some(seq) = unique_majority_shortcut(election) {
            let score = election.kscore(&seq);
            return SolveOutcome::Optimal {
                score,
                rankings: vec![seq],
            };
        }

        let dirty_ids: BTreeSet<u32> = election.dirty_candidates().clone();
        let mut dirty_block: Vec<CandidateId> = dirty_ids
            .iter()
            .map(|&i| CandidateId::from_index(i as usize))
            .collect();
        dirty_block.sort_by_key(|c| c.0);

        let non_dirty_ranks: Vec<(CandidateId, usize)> = election
            .candidates()
            .filter(|c| !dirty_ids.contains(&c.0))
            .map(|c| (c, fixed_rank(election, c)))
            .collect();

        if dirty_block.is_empty() {
            let mut seq: Vec<Option<CandidateId>> = vec![None; election.num_candidates()];
            for (c, rank) in &non_dirty_ranks {
                seq[*rank] = Some(*c);
            }
            let seq: Vec<CandidateId> = seq.into_iter().map(|x| x.unwrap()).collect();
            let score = election.kscore(&seq);
            return SolveOutcome::Optimal {
                score,
                rankings: vec![seq],
            };
        }

        match solve_block(election, &dirty_block, cancel, collect_all) {
            None => SolveOutcome::Cancelled,
            Some((_block_score, block_rankings)) => {
                let m = election.num_candidates();
                let rankings: Vec<Vec<CandidateId>> = block_rankings
                    .into_iter()
                    .map(|block_seq| splice_fixed(m, &non_dirty_ranks, &block_seq))
                    .collect();
                let score = election.kscore(&rankings[0]);
                SolveOutcome::Optimal { score, rankings }
            }
        }
    }
}

/// A ranking `r` with voter weight `w(r)` where `w(r) > K(r)` is provably
/// the unique Kemeny consensus: no other ranking can beat the cost those
/// `w(r)` unanimous ballots already concede against every alternative.
fn unique_majority_shortcut(election: &Election) -> Option<Vec<CandidateId>> {
    use std::collections::HashMap;

    let mut counts: HashMap<&[CandidateId], u64> = HashMap::new();
    for b in election.ballots() {
        *counts.entry(b.sequence()).or_insert(0) += 1;
    }
    let (seq, weight) = counts.into_iter().max_by_key(|(_, w)| *w)?;
    if weight > election.kscore(seq) {
        Some(seq.to_vec())
    } else {
        None
    }
}

/// `x`'s position in the final ranking implied purely by unanimous
/// (non-dirty) pairwise relations: the number of other candidates who
/// unanimously beat `x`. Well-defined for a non-dirty `x` even though the
/// mutual order of dirty candidates isn't decided yet, because `x`'s
/// relation to *every* other candidate — dirty or not — is unanimous.
fn fixed_rank(election: &Election, x: CandidateId) -> usize {
    election
        .candidates()
        .filter(|&y| y != x && election.subscore(y, x) > election.subscore(x, y))
        .count()
}

/// Rebuild the full `m`-length ranking: non-dirty candidates at their
/// fixed global rank, the dirty block's locally optimal sequence filling
/// the remaining slots in order.
fn splice_fixed(m: usize, non_dirty_ranks: &[(CandidateId, usize)], block_seq: &[CandidateId]) -> Vec<CandidateId> {
    let mut slots: Vec<Option<CandidateId>> = vec![None; m];
    for &(c, rank) in non_dirty_ranks {
        slots[rank] = Some(c);
    }
    let mut block_iter = block_seq.iter().copied();
    for slot in slots.iter_mut() {
        if slot.is_none() {
            *slot = block_iter.next();
        }
    }
    slots.into_iter().map(|s| s.expect("slots fully covered")).collect()
}

/// Branch-and-bound search over the `r`-candidate dirty block, by
/// iterative deepening on the target score. Returns `None` if cancelled.
fn solve_block(
    election: &Election,
    block: &[CandidateId],
    cancel: &CancelToken,
    collect_all: bool,
) -> Option<(u64, Vec<Vec<CandidateId>>)> {
    let r = block.len();
    if r <= 1 {
        return Some((0, vec![block.to_vec()]));
    }
    assert!(r <= DenseSubset::MAX_CANDIDATES, "dirty block too large for this solver; reduce with -x");

    let mut pair_min = vec![vec![0u64; r]; r];
    let mut pair_max = vec![vec![0u64; r]; r];
    let mut lower = 0u64;
    for i in 0..r {
        for j in (i + 1)..r {
            let ab = election.subscore(block[i], block[j]);
            let ba = election.subscore(block[j], block[i]);
            pair_min[i][j] = ab.min(ba);
            pair_max[i][j] = ab.max(ba);
            lower += pair_min[i][j];
        }
    }

    let mut k = lower;
    loop {
        if cancel.is_cancelled() {
            return None;
        }
        let mut found = Vec::new();
        let mut chosen: Vec<usize> = Vec::with_capacity(r);
        let mut visited = 0u64;
        let full = DenseSubset::full(r);
        dfs(
            election, block, &pair_min, full, &mut chosen, 0, k, collect_all, &mut found, cancel, &mut visited,
        );
        if cancel.is_cancelled() {
            return None;
        }
        if !found.is_empty() {
            let mut rankings: Vec<Vec<CandidateId>> = found
                .into_iter()
                .map(|idxs: Vec<usize>| idxs.into_iter().map(|i| block[i]).collect())
                .collect();
            rankings.sort_by(|a, b| determinism::cmp_lexicographic(a, b));
            return Some((k, rankings));
        }
        let total_upper: u64 = (0..r)
            .flat_map(|i| ((i + 1)..r).map(move |j| (i, j)))
            .map(|(i, j)| pair_max[i][j])
            .sum();
        if k >= total_upper {
            return Some((total_upper, Vec::new()));
        }
        k += 1;
    }
}

#[allow(clippy::too_many_arguments)]
fn dfs(
    election: &Election,
    block: &[CandidateId],
    pair_min: &[Vec<u64>],
    remaining: DenseSubset,
    chosen: &mut Vec<usize>,
    cost_so_far: u64,
    k: u64,
    collect_all: bool,
    found: &mut Vec<Vec<usize>>,
    cancel: &CancelToken,
    visited: &mut u64,
) {
    if !collect_all && !found.is_empty() {
        return;
    }
    *visited += 1;
    if *visited % 4096 == 0 && cancel.is_cancelled() {
        return;
    }

    if remaining.is_empty() {
        if cost_so_far == k {
            found.push(chosen.clone());
        }
        return;
    }

    let remaining_lower: u64 = remaining
        .iter()
        .flat_map(|a| remaining.iter().map(move |b| (a, b)))
        .filter(|(a, b)| a.index() < b.index())
        .map(|(a, b)| pair_min[a.index()][b.index()])
        .sum();
    if cost_so_far + remaining_lower > k {
        return;
    }

    for next in remaining.iter() {
        let local = next.index();
        let added: u64 = chosen.iter().map(|&prev| election.subscore(block[local], block[prev])).sum();
        let new_cost = cost_so_far + added;
        if new_cost > k {
            continue;
        }
        chosen.push(local);
        dfs(
            election,
            block,
            pair_min,
            remaining.without(next),
            chosen,
            new_cost,
            k,
            collect_all,
            found,
            cancel,
            visited,
        );
        chosen.pop();
        if !collect_all && !found.is_empty() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kemeny_core::{Ballot, Election};

    fn ballot(order: &[u32]) -> Ballot {
        Ballot::from_sequence(order.iter().map(|&i| CandidateId::from(i)).collect()).unwrap()
    }

    #[test]
    fn agrees_with_dp_on_cyclic_election() {
        let e = Election::new(
            vec![ballot(&[0, 1, 2]), ballot(&[1, 2, 0]), ballot(&[2, 0, 1])],
            3,
        )
        .unwrap();
        let out = SearchTreeSolver.solve(&e, &CancelToken::new(), false);
        match out {
            SolveOutcome::Optimal { score, rankings } => {
                assert_eq!(score, e.kscore(&rankings[0]));
                // Lower bound from per-pair minorities is 3, but the cycle
                // forces one majority to break; true optimum is 4.
                assert_eq!(score, 4);
            }
            SolveOutcome::Cancelled => panic!("must not cancel"),
        }
    }

    #[test]
    fn splices_non_dirty_candidate_at_fixed_position() {
        // D beats everyone unanimously and should always rank first;
        // A/B/C form a cyclic (dirty) trio behind it.
        let e = Election::new(
            vec![
                ballot(&[3, 0, 1, 2]),
                ballot(&[3, 1, 2, 0]),
                ballot(&[3, 2, 0, 1]),
            ],
            4,
        )
        .unwrap();
        let out = SearchTreeSolver.solve(&e, &CancelToken::new(), false);
        match out {
            SolveOutcome::Optimal { rankings, .. } => {
                assert_eq!(rankings[0][0], CandidateId::from(3));
            }
            SolveOutcome::Cancelled => panic!("must not cancel"),
        }
    }

    #[test]
    fn unique_majority_shortcut_fires_when_one_ranking_dominates() {
        let e = Election::new(
            vec![
                ballot(&[0, 1, 2]),
                ballot(&[0, 1, 2]),
                ballot(&[0, 1, 2]),
                ballot(&[2, 1, 0]),
            ],
            3,
        )
        .unwrap();
        assert!(unique_majority_shortcut(&e).is_some());
    }
}
