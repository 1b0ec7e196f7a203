//! Sub-instance aggregation (`spec.md` §4.F): once the reduction engine
//! (§4.C) has decomposed an election into an ordered sequence of
//! independent candidate blocks, each block is solved on its own — by
//! whichever solver the `modus` dispatch table names — and the partial
//! rankings are spliced back into one consensus via `kemeny_io::sidecar`.
//!
//! Grounded in `original_source/source/kconsens_instance_dirtypairs_based.cpp`'s
//! top-level driver, which solves each `DirtySetPermed` block with the
//! mode the caller requested and sums `scoreToSuccessors` across blocks;
//! here that bookkeeping is the typed `Sidecar` (`kemeny_io`) instead of
//! loose fields threaded through the block struct.

use std::collections::HashSet;

use kemeny_algo::{pick_a_random_ballot, CancelToken, DpSolver, SearchTreeSolver, SolveOutcome, Solver};
use kemeny_core::rng::TieRng;
use kemeny_core::{Ballot, CandidateId, Election};
use kemeny_io::sidecar::{splice, total_cross_contribution, Sidecar};

use crate::backend::{Backend, BackendKind, BackendOutcome, ExternalProcessBackend};
use crate::errors::{PipelineError, PipelineResult};
use crate::reduction::{reduce, CandidateSet, ReductionConfig, ReductionTrace};

/// Solver selection decoded from `--solve-with-modus` / `-s`
/// (`spec.md` §4.F, §6).
#[derive(Clone, Copy, Debug)]
pub enum Modus {
    /// Negative values: shell out to an external MIP backend.
    ExternalBackend(BackendKind),
    /// `0`: pick-a-random-ballot heuristic.
    RandomBallot,
    /// `1`: the exact subset-DP solver.
    Dp,
    /// `>= 2`: the exact search-tree solver, with the value also acting
    /// as the dirty-set size below which DP is used instead (`spec.md`
    /// §4.F's dispatch rule).
    SearchTree(usize),
}

impl Modus {
    /// Decode the raw `-s` integer. `spec.md` §6 names four external
    /// backends (`glpsol`, `cplex`, `gurobi_cl`, `linOrder`) but does not
    /// say which negative value selects which; `-1..=-4` map to that list
    /// in the order given, an implementation decision recorded in
    /// `DESIGN.md`.
    pub fn from_raw(raw: i64) -> PipelineResult<Modus> {
        Ok(match raw {
            n if n < 0 => {
                let kind = match n {
                    -1 => BackendKind::Glpsol,
                    -2 => BackendKind::Cplex,
                    -3 => BackendKind::GurobiCl,
                    -4 => BackendKind::LinOrder,
                    _ => {
                        return Err(PipelineError::Internal(
                            "unsupported negative modus value (only -1..=-4 name a backend)",
                        ))
                    }
                };
                Modus::ExternalBackend(kind)
            }
            0 => Modus::RandomBallot,
            1 => Modus::Dp,
            n => Modus::SearchTree(n as usize),
        })
    }
}

/// One solved sub-instance, in the parent election's (global) candidate
/// id space.
#[derive(Clone, Debug)]
pub struct SolvedBlock {
    pub ranking: Vec<CandidateId>,
    pub score: u64,
}

/// Outcome of running a whole election through reduction, dispatch, and
/// aggregation.
#[derive(Clone, Debug)]
pub struct AggregateOutcome {
    /// `None` once any sub-task is cancelled — the sentinel of `spec.md`
    /// §5 ("aggregate score = -1, consensus = empty").
    pub score: Option<u64>,
    pub consensus: Vec<CandidateId>,
    pub cross_contribution: u64,
    /// Number of independent blocks the reduction engine produced (`1`
    /// when reduction was not requested or found nothing to split).
    pub num_blocks: usize,
    pub trace: ReductionTrace,
}

impl AggregateOutcome {
    fn cancelled(num_blocks: usize, trace: ReductionTrace) -> Self {
        AggregateOutcome {
            score: None,
            consensus: Vec::new(),
            cross_contribution: 0,
            num_blocks,
            trace,
        }
    }
}

/// Run the reduction engine (if `reduction` is `Some`) and solve every
/// resulting block in order, sequentially — `spec.md` §5 treats
/// aggregation as strictly following the order the reducer emitted, not
/// as an opportunity for further parallel dispatch.
pub fn run_election(
    election: &Election,
    reduction: Option<&ReductionConfig>,
    modus: Modus,
    rng: &mut TieRng,
    cancel: &CancelToken,
) -> PipelineResult<AggregateOutcome> {
    let (blocks, trace): (Vec<CandidateSet>, ReductionTrace) = match reduction {
        Some(config) => reduce(election, config),
        None => (vec![election.candidates().collect()], ReductionTrace::default()),
    };

    let num_blocks = blocks.len();
    let mut sidecars: Vec<Sidecar> = Vec::with_capacity(blocks.len());
    let mut rankings: Vec<Vec<CandidateId>> = Vec::with_capacity(blocks.len());
    let mut total_internal = 0u64;

    for (index, block) in blocks.iter().enumerate() {
        if cancel.is_cancelled() {
            return Ok(AggregateOutcome::cancelled(num_blocks, trace));
        }
        let Some(solved) = solve_block(election, block, modus, rng, cancel)? else {
            return Ok(AggregateOutcome::cancelled(num_blocks, trace));
        };
        total_internal += solved.score;

        let mut sidecar = Sidecar::new(block.iter().copied().collect(), index);
        sidecar.cross_contribution = cross_contribution_for(election, &blocks, index);
        sidecars.push(sidecar);
        rankings.push(solved.ranking);
    }

    let cross = total_cross_contribution(&sidecars);
    let consensus = splice(&sidecars, &rankings);

    Ok(AggregateOutcome {
        score: Some(total_internal + cross),
        consensus,
        cross_contribution: cross,
        num_blocks,
        trace,
    })
}

/// Score contribution between block `index` and every later block: for
/// `a` in this block and `b` in a later one, the consensus ranks `a`
/// before `b`, so the cost is `s(b, a) = P[b][a]` (`spec.md` §3's `X`
/// term, restricted to one block's outgoing pairs).
fn cross_contribution_for(election: &Election, blocks: &[CandidateSet], index: usize) -> u64 {
    let mut total = 0u64;
    for later in &blocks[index + 1..] {
        for &a in &blocks[index] {
            for &b in later {
                total += election.subscore(b, a);
            }
        }
    }
    total
}

/// Solve one block. `spec.md` §4.F's dispatch rule overrides `modus`
/// whenever the block is too small to matter: a singleton costs nothing,
/// and any block smaller than a search-tree cap falls back to DP
/// regardless of the requested `modus`.
fn solve_block(
    election: &Election,
    block: &CandidateSet,
    modus: Modus,
    rng: &mut TieRng,
    cancel: &CancelToken,
) -> PipelineResult<Option<SolvedBlock>> {
    if block.len() <= 1 {
        return Ok(Some(SolvedBlock {
            ranking: block.iter().copied().collect(),
            score: 0,
        }));
    }

    let effective = match modus {
        Modus::SearchTree(cap) if block.len() < cap => Modus::Dp,
        other => other,
    };

    match effective {
        Modus::RandomBallot => {
            let (sub, global_ids) = sub_election(election, block);
            let local_ranking = pick_a_random_ballot(&sub, rng);
            let ranking = to_global(&global_ids, &local_ranking);
            let score = internal_score(election, &ranking);
            Ok(Some(SolvedBlock { ranking, score }))
        }
        Modus::Dp => solve_with(election, block, &DpSolver, cancel),
        Modus::SearchTree(_) => solve_with(election, block, &SearchTreeSolver, cancel),
        Modus::ExternalBackend(kind) => solve_with_backend(election, block, kind, cancel),
    }
}

fn solve_with(
    election: &Election,
    block: &CandidateSet,
    solver: &dyn Solver,
    cancel: &CancelToken,
) -> PipelineResult<Option<SolvedBlock>> {
    let (sub, global_ids) = sub_election(election, block);
    match solver.solve(&sub, cancel, false) {
        SolveOutcome::Cancelled => Ok(None),
        SolveOutcome::Optimal { rankings, .. } => {
            let ranking = to_global(&global_ids, &rankings[0]);
            let score = internal_score(election, &ranking);
            Ok(Some(SolvedBlock { ranking, score }))
        }
    }
}

fn solve_with_backend(
    election: &Election,
    block: &CandidateSet,
    kind: BackendKind,
    cancel: &CancelToken,
) -> PipelineResult<Option<SolvedBlock>> {
    let backend = ExternalProcessBackend::new(kind);
    let lp_path = std::env::temp_dir().join(format!(
        "kemeny-{}-{}-{}.lp",
        kind.program(),
        std::process::id(),
        block.iter().next().map(|c| c.index()).unwrap_or(0)
    ));
    crate::backend::write_lp(election, block, &lp_path)?;
    let child = backend.spawn(&lp_path)?;
    match backend.wait_with_cancel(child, cancel)? {
        BackendOutcome::Cancelled => Ok(None),
        BackendOutcome::Solved(solution) => {
            let ranking = crate::backend::ranking_from_solution(block, &solution);
            Ok(Some(SolvedBlock {
                score: solution.score,
                ranking,
            }))
        }
    }
}

/// Build a sub-election over `block`'s candidates in a fresh, dense local
/// id space, plus the ascending global-id table needed to translate
/// results back. Every parent ballot ranks the full universe, so
/// restricting preserves each pair's relative order exactly — the
/// sub-election's own pairwise matrix agrees with the parent's on every
/// pair inside the block.
fn sub_election(election: &Election, block: &CandidateSet) -> (Election, Vec<CandidateId>) {
    let global_ids: Vec<CandidateId> = block.iter().copied().collect();
    let keep: HashSet<CandidateId> = global_ids.iter().copied().collect();

    let local_ballots: Vec<Ballot> = election
        .ballots()
        .iter()
        .map(|b| {
            let restricted = b.restricted_to(&keep);
            let local_seq: Vec<CandidateId> = restricted
                .sequence()
                .iter()
                .map(|g| {
                    let idx = global_ids
                        .binary_search(g)
                        .expect("restricted ballot only contains this block's members");
                    CandidateId::from_index(idx)
                })
                .collect();
            Ballot::from_sequence(local_seq).expect("restriction cannot introduce duplicates")
        })
        .collect();

    let sub = Election::new(local_ballots, global_ids.len())
        .expect("every ballot ranks the full universe, so it ranks every block fully too");
    (sub, global_ids)
}

fn to_global(global_ids: &[CandidateId], local_ranking: &[CandidateId]) -> Vec<CandidateId> {
    local_ranking.iter().map(|c| global_ids[c.index()]).collect()
}

/// The Kemeny score of `ranking` using the parent's matrix — equals the
/// sub-election's own `kscore` since the pairwise counts agree.
fn internal_score(election: &Election, ranking: &[CandidateId]) -> u64 {
    let mut total = 0u64;
    for j in 0..ranking.len() {
        for i in 0..j {
            total += election.subscore(ranking[j], ranking[i]);
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use kemeny_core::rng;

    fn ballot(order: &[u32]) -> Ballot {
        Ballot::from_sequence(order.iter().map(|&i| CandidateId::from(i)).collect()).unwrap()
    }

    #[test]
    fn single_block_matches_whole_election_dp() {
        let e = Election::new(
            vec![ballot(&[0, 1, 2]), ballot(&[1, 2, 0]), ballot(&[2, 0, 1])],
            3,
        )
        .unwrap();
        let cancel = CancelToken::new();
        let mut rng = rng::from_seed(1);
        let out = run_election(&e, None, Modus::Dp, &mut rng, &cancel).unwrap();
        assert_eq!(out.score, Some(e.kscore(&out.consensus)));
        assert_eq!(out.cross_contribution, 0);
    }

    #[test]
    fn condorcet_clean_election_splits_into_free_singletons() {
        let e = Election::new(vec![ballot(&[0, 1]), ballot(&[0, 1])], 2).unwrap();
        let cancel = CancelToken::new();
        let mut rng = rng::from_seed(1);
        let config = ReductionConfig::default();
        let out = run_election(&e, Some(&config), Modus::Dp, &mut rng, &cancel).unwrap();
        assert_eq!(out.score, Some(e.kscore(&out.consensus)));
    }

    #[test]
    fn cancelled_solve_yields_sentinel_outcome() {
        let e = Election::new(
            vec![ballot(&[0, 1, 2]), ballot(&[1, 2, 0]), ballot(&[2, 0, 1])],
            3,
        )
        .unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut rng = rng::from_seed(1);
        let out = run_election(&e, None, Modus::Dp, &mut rng, &cancel).unwrap();
        assert_eq!(out.score, None);
        assert!(out.consensus.is_empty());
    }

    #[test]
    fn dispatch_falls_back_to_dp_below_search_tree_cap() {
        let e = Election::new(
            vec![ballot(&[0, 1, 2]), ballot(&[1, 2, 0]), ballot(&[2, 0, 1])],
            3,
        )
        .unwrap();
        let cancel = CancelToken::new();
        let mut rng = rng::from_seed(1);
        // modus = 5 but the block only has 3 candidates, so DP runs.
        let out = run_election(&e, None, Modus::SearchTree(5), &mut rng, &cancel).unwrap();
        assert_eq!(out.score, Some(e.kscore(&out.consensus)));
    }
}
