//! Data-reduction preprocessor (`spec.md` §4.C): rules R1–R5, run to a
//! fixed point in priority order R5 → R3 → R1 → R4 → R2, producing an
//! ordered decomposition `⟨S₁, …, S_k⟩` whose per-block consensuses
//! concatenate to a global optimum.
//!
//! Grounded in `original_source/source/votesplitter.cpp`/`.hpp`: the five
//! `split_instances_Rule*` families map onto [`r1_condorcet_candidate`],
//! [`r2_condorcet_set`], [`r3_non_dirty_candidate`], [`r4_non_dirty_set`],
//! [`r5_condorcet_components`]; `heuristikalSplitTotal`'s fixed-point
//! re-entry loop maps onto [`reduce`]; `rulesSequence` maps onto
//! [`ReductionTrace`].

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use kemeny_core::{CandidateId, Election};

use crate::errors::{PipelineError, PipelineResult};

pub type CandidateSet = BTreeSet<CandidateId>;

/// R2/R4 tie-break policy among multiple eligible extraction sets,
/// grounded in `votesplitter.hpp`'s `bestChoiceMethod_*` constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetChoice {
    Smallest,
    Half,
    Third,
    Biggest,
}

impl SetChoice {
    /// `spec.md` §4.C: "compare |T| − |S|/denom; smallest absolute
    /// deviation wins". `Biggest` has no finite target ratio, so it is
    /// scored by negated size instead (larger T always wins).
    fn score(self, t_len: usize, s_len: usize) -> f64 {
        match self {
            SetChoice::Smallest => t_len as f64,
            SetChoice::Half => (t_len as f64 - s_len as f64 / 2.0).abs(),
            SetChoice::Third => (t_len as f64 - s_len as f64 / 3.0).abs(),
            SetChoice::Biggest => -(t_len as f64),
        }
    }
}

/// Which of R1–R4 are enabled, decoded from the `-r` 4-bit mask
/// (`spec.md` §6: bit0=R3, bit1=R1, bit2=R4, bit3=R2). R5 has no mask bit
/// — it always runs first when enabled via [`ReductionConfig::r5`],
/// matching §4.C's "R5 (always first if enabled)".
#[derive(Clone, Copy, Debug, Default)]
pub struct RuleFlags {
    pub r1: bool,
    pub r2: bool,
    pub r3: bool,
    pub r4: bool,
}

impl RuleFlags {
    /// Parse the `-r` mask: a 4-character string of `0`/`1`, bit0 the
    /// rightmost character. An all-zero mask yields every flag `false`,
    /// which combined with `ReductionConfig::r5` defaulting to `true`
    /// reproduces "all-zero defaults to R5 only".
    pub fn from_bits(mask: &str) -> PipelineResult<Self> {
        let chars: Vec<char> = mask.chars().collect();
        if chars.len() != 4 || chars.iter().any(|c| *c != '0' && *c != '1') {
            return Err(PipelineError::BadRulesMask(mask.to_string()));
        }
        let bit = |i: usize| chars[3 - i] == '1';
        Ok(RuleFlags {
            r3: bit(0),
            r1: bit(1),
            r4: bit(2),
            r2: bit(3),
        })
    }
}

#[derive(Clone, Debug)]
pub struct ReductionConfig {
    pub rules: RuleFlags,
    pub r5: bool,
    pub set_choice: SetChoice,
    pub max_set_size: usize,
    /// `--nondirty-majority-ratio` / `-m`, default 0.75; used by R3/R4.
    pub majority_ratio: f64,
}

impl Default for ReductionConfig {
    fn default() -> Self {
        ReductionConfig {
            rules: RuleFlags::default(),
            r5: true,
            set_choice: SetChoice::Smallest,
            max_set_size: usize::MAX,
            majority_ratio: 0.75,
        }
    }
}

/// One rule firing, recorded for `--print-information` and debug logging.
#[derive(Clone, Debug)]
pub enum ReductionStep {
    CondorcetCandidate { on: CandidateSet, candidate: CandidateId, front: bool },
    CondorcetSet { on: CandidateSet, extracted: CandidateSet, front: bool },
    NonDirtyCandidates { on: CandidateSet, anchors: Vec<CandidateId> },
    NonDirtySet { on: CandidateSet, extracted: CandidateSet },
    CondorcetComponents { on: CandidateSet, components: Vec<CandidateSet> },
}

/// The ordered trace of every rule firing during one [`reduce`] call,
/// grounded in `votesplitter.hpp`'s `rulesSequence` stringstream.
#[derive(Clone, Debug, Default)]
pub struct ReductionTrace(Vec<ReductionStep>);

impl ReductionTrace {
    pub fn steps(&self) -> &[ReductionStep] {
        &self.0
    }
}

/// Run the five rules to a fixed point over the whole candidate universe,
/// returning the ordered decomposition and the trace of rules that fired.
pub fn reduce(election: &Election, config: &ReductionConfig) -> (Vec<CandidateSet>, ReductionTrace) {
    let root: CandidateSet = election.candidates().collect();
    let mut blocks: VecDeque<CandidateSet> = VecDeque::from([root]);
    let mut trace = ReductionTrace::default();

    loop {
        let mut changed = false;
        let mut next: VecDeque<CandidateSet> = VecDeque::new();

        for block in blocks.drain(..) {
            if block.len() <= 1 {
                next.push_back(block);
                continue;
            }
            match try_split(election, &block, config, &mut trace) {
                Some(split) => {
                    changed = true;
                    next.extend(split);
                }
                None => next.push_back(block),
            }
        }

        blocks = next;
        if !changed {
            break;
        }
    }

    (blocks.into_iter().collect(), trace)
}

fn try_split(
    election: &Election,
    block: &CandidateSet,
    config: &ReductionConfig,
    trace: &mut ReductionTrace,
) -> Option<Vec<CandidateSet>> {
    if config.r5 {
        if let Some(split) = r5_condorcet_components(election, block, trace) {
            return Some(split);
        }
    }
    if config.rules.r3 {
        if let Some(split) = r3_non_dirty_candidate(election, block, config.majority_ratio, trace) {
            return Some(split);
        }
    }
    if config.rules.r1 {
        if let Some(split) = r1_condorcet_candidate(election, block, trace) {
            return Some(split);
        }
    }
    if config.rules.r4 {
        if let Some(split) = r4_non_dirty_set(election, block, config, trace) {
            return Some(split);
        }
    }
    if config.rules.r2 {
        if let Some(split) = r2_condorcet_set(election, block, config, trace) {
            return Some(split);
        }
    }
    None
}

fn beats(election: &Election, a: CandidateId, b: CandidateId) -> bool {
    election.subscore(a, b) > election.subscore(b, a)
}

/// R1: a candidate who strictly majority-beats (or loses to) every other
/// member of `block`. Grounded in `votesplitter.cpp`'s
/// `find_CondorcetCandidate`.
fn r1_condorcet_candidate(
    election: &Election,
    block: &CandidateSet,
    trace: &mut ReductionTrace,
) -> Option<Vec<CandidateSet>> {
    for &a in block {
        let wins_all = block.iter().all(|&b| b == a || beats(election, a, b));
        if wins_all {
            let rest: CandidateSet = block.iter().copied().filter(|&c| c != a).collect();
            trace.0.push(ReductionStep::CondorcetCandidate {
                on: block.clone(),
                candidate: a,
                front: true,
            });
            return Some(vec![[a].into_iter().collect(), rest]);
        }
        let loses_all = block.iter().all(|&b| b == a || beats(election, b, a));
        if loses_all {
            let rest: CandidateSet = block.iter().copied().filter(|&c| c != a).collect();
            trace.0.push(ReductionStep::CondorcetCandidate {
                on: block.clone(),
                candidate: a,
                front: false,
            });
            return Some(vec![rest, [a].into_iter().collect()]);
        }
    }
    None
}

fn dominates(election: &Election, winners: &[CandidateId], losers: &[CandidateId]) -> bool {
    winners.iter().all(|&a| losers.iter().all(|&b| beats(election, a, b)))
}

/// Every subset of `members` with size `1..=max_k`, in ascending
/// candidate-id lexicographic order.
fn subsets_up_to(members: &[CandidateId], max_k: usize) -> Vec<Vec<CandidateId>> {
    let mut out = Vec::new();
    let n = members.len();
    let max_k = max_k.min(n);
    let mut combo: Vec<usize> = Vec::new();

    fn rec(members: &[CandidateId], start: usize, k: usize, combo: &mut Vec<usize>, out: &mut Vec<Vec<CandidateId>>) {
        if combo.len() == k {
            out.push(combo.iter().map(|&i| members[i]).collect());
            return;
        }
        for i in start..members.len() {
            combo.push(i);
            rec(members, i + 1, k, combo, out);
            combo.pop();
        }
    }

    for k in 1..=max_k {
        rec(members, 0, k, &mut combo, &mut out);
    }
    out
}

/// R2: a small front or back "Condorcet set" — every member beats (or
/// loses to) every non-member by strict majority. Grounded in
/// `votesplitter.cpp`'s `split_instance_RuleCondorcetSets`.
fn r2_condorcet_set(
    election: &Election,
    block: &CandidateSet,
    config: &ReductionConfig,
    trace: &mut ReductionTrace,
) -> Option<Vec<CandidateSet>> {
    let members: Vec<CandidateId> = block.iter().copied().collect();
    let cap = config.max_set_size.min(members.len().saturating_sub(1));
    if cap == 0 {
        return None;
    }

    let mut candidates: Vec<(Vec<CandidateId>, bool)> = Vec::new();
    for t in subsets_up_to(&members, cap) {
        let rest: Vec<CandidateId> = members.iter().copied().filter(|c| !t.contains(c)).collect();
        if dominates(election, &t, &rest) {
            candidates.push((t.clone(), true));
        }
        if dominates(election, &rest, &t) {
            candidates.push((t, false));
        }
    }
    if candidates.is_empty() {
        return None;
    }

    candidates.sort_by(|(t1, _), (t2, _)| {
        let s1 = config.set_choice.score(t1.len(), members.len());
        let s2 = config.set_choice.score(t2.len(), members.len());
        s1.partial_cmp(&s2).unwrap().then_with(|| t1.cmp(t2))
    });
    let (t, front) = candidates.into_iter().next().unwrap();
    let t_set: CandidateSet = t.into_iter().collect();
    let rest_set: CandidateSet = block.difference(&t_set).copied().collect();

    trace.0.push(ReductionStep::CondorcetSet {
        on: block.clone(),
        extracted: t_set.clone(),
        front,
    });
    if front {
        Some(vec![t_set, rest_set])
    } else {
        Some(vec![rest_set, t_set])
    }
}

/// R3: candidates whose relation to every other member of `block` is
/// decided at `ratio` majority. Their rank (count of others who
/// majority-beat them) is well-defined independent of how the remaining
/// candidates resolve, exactly as `kemeny_algo::search_tree::fixed_rank`
/// argues at the whole-election level. Grounded in
/// `votesplitter.cpp`'s `split_instance_RuleMajorityNonDirtyCandidates`.
fn r3_non_dirty_candidate(
    election: &Election,
    block: &CandidateSet,
    ratio: f64,
    trace: &mut ReductionTrace,
) -> Option<Vec<CandidateSet>> {
    let is_anchor = |c: CandidateId| -> bool {
        block
            .iter()
            .all(|&d| d == c || election.majority_beats(ratio, c, d) || election.majority_beats(ratio, d, c))
    };
    let anchors: Vec<CandidateId> = block.iter().copied().filter(|&c| is_anchor(c)).collect();
    if anchors.is_empty() {
        return None;
    }

    let rank_of = |c: CandidateId| -> usize {
        block
            .iter()
            .filter(|&&d| d != c && election.majority_beats(ratio, d, c))
            .count()
    };

    let m = block.len();
    let mut slots: Vec<Option<CandidateId>> = vec![None; m];
    for &a in &anchors {
        slots[rank_of(a)] = Some(a);
    }

    // Anchors sit at their fixed rank; every run of empty slots between
    // (or around) them is filled, in order, by the non-anchor candidates
    // and becomes one combined block — their mutual order isn't decided
    // by this rule.
    let mut out = Vec::new();
    let mut non_anchor_run: Vec<CandidateId> = Vec::new();
    let non_anchors: Vec<CandidateId> = block.iter().copied().filter(|c| !anchors.contains(c)).collect();
    let mut non_anchor_iter = non_anchors.into_iter();
    for slot in slots {
        match slot {
            Some(a) => {
                if !non_anchor_run.is_empty() {
                    out.push(non_anchor_run.drain(..).collect());
                }
                out.push([a].into_iter().collect());
            }
            None => {
                if let Some(c) = non_anchor_iter.next() {
                    non_anchor_run.push(c);
                }
            }
        }
    }
    if !non_anchor_run.is_empty() {
        out.push(non_anchor_run.drain(..).collect());
    }

    trace.0.push(ReductionStep::NonDirtyCandidates {
        on: block.clone(),
        anchors: anchors.clone(),
    });
    Some(out)
}

/// R4: small groups that move as a block relative to every outside
/// candidate at `ratio` majority (every member agrees on direction versus
/// every non-member). Grounded in `votesplitter.cpp`'s
/// `split_instance_RuleMajorityNonDirtySets`.
fn r4_non_dirty_set(
    election: &Election,
    block: &CandidateSet,
    config: &ReductionConfig,
    trace: &mut ReductionTrace,
) -> Option<Vec<CandidateSet>> {
    let members: Vec<CandidateId> = block.iter().copied().collect();
    let cap = config.max_set_size.min(members.len().saturating_sub(1));
    if cap < 2 {
        return None; // size-1 groups are R3's job
    }

    let moves_as_block = |group: &[CandidateId], rest: &[CandidateId]| -> bool {
        rest.iter().all(|&d| {
            group.iter().all(|&a| election.majority_beats(config.majority_ratio, a, d))
                || group.iter().all(|&a| election.majority_beats(config.majority_ratio, d, a))
        })
    };

    let mut candidates: Vec<Vec<CandidateId>> = Vec::new();
    for n in subsets_up_to(&members, cap) {
        if n.len() < 2 {
            continue;
        }
        let rest: Vec<CandidateId> = members.iter().copied().filter(|c| !n.contains(c)).collect();
        if moves_as_block(&n, &rest) {
            candidates.push(n);
        }
    }
    if candidates.is_empty() {
        return None;
    }

    candidates.sort_by(|a, b| {
        let sa = config.set_choice.score(a.len(), members.len());
        let sb = config.set_choice.score(b.len(), members.len());
        sa.partial_cmp(&sb).unwrap().then_with(|| a.cmp(b))
    });
    let n = candidates.into_iter().next().unwrap();
    let n_set: CandidateSet = n.iter().copied().collect();
    let rest: Vec<CandidateId> = members.iter().copied().filter(|c| !n_set.contains(c)).collect();

    let rank = rest
        .iter()
        .filter(|&&d| election.majority_beats(config.majority_ratio, d, n[0]))
        .count();
    let (before, after): (Vec<CandidateId>, Vec<CandidateId>) = {
        let mut b = Vec::new();
        let mut a = Vec::new();
        for &d in &rest {
            if election.majority_beats(config.majority_ratio, d, n[0]) {
                b.push(d);
            } else {
                a.push(d);
            }
        }
        (b, a)
    };
    debug_assert_eq!(before.len(), rank);

    trace.0.push(ReductionStep::NonDirtySet {
        on: block.clone(),
        extracted: n_set.clone(),
    });

    let mut out = Vec::new();
    if !before.is_empty() {
        out.push(before.into_iter().collect());
    }
    out.push(n_set);
    if !after.is_empty() {
        out.push(after.into_iter().collect());
    }
    Some(out)
}

/// R5: strongly-connected components of the strict-majority digraph,
/// topologically sorted. Computed with Kosaraju's algorithm using
/// explicit stacks rather than recursion, so arbitrarily large dirty
/// blocks can't blow the call stack. Grounded in `votesplitter.cpp`'s
/// `split_instance_RuleCondorcetComponents`.
fn r5_condorcet_components(
    election: &Election,
    block: &CandidateSet,
    trace: &mut ReductionTrace,
) -> Option<Vec<CandidateSet>> {
    let members: Vec<CandidateId> = block.iter().copied().collect();
    if members.len() <= 1 {
        return None;
    }
    let mut adj: BTreeMap<CandidateId, Vec<CandidateId>> = BTreeMap::new();
    let mut radj: BTreeMap<CandidateId, Vec<CandidateId>> = BTreeMap::new();
    for &a in &members {
        adj.entry(a).or_default();
        radj.entry(a).or_default();
    }
    for &a in &members {
        for &b in &members {
            if a != b && beats(election, a, b) {
                adj.get_mut(&a).unwrap().push(b);
                radj.get_mut(&b).unwrap().push(a);
            }
        }
    }

    // Pass 1: iterative DFS over `adj` recording a finish order.
    let mut visited: BTreeSet<CandidateId> = BTreeSet::new();
    let mut finish_order: Vec<CandidateId> = Vec::new();
    for &start in &members {
        if visited.contains(&start) {
            continue;
        }
        let mut stack: Vec<(CandidateId, usize)> = vec![(start, 0)];
        visited.insert(start);
        while let Some(&mut (node, ref mut next_child)) = stack.last_mut() {
            let neighbors = &adj[&node];
            if *next_child < neighbors.len() {
                let child = neighbors[*next_child];
                *next_child += 1;
                if visited.insert(child) {
                    stack.push((child, 0));
                }
            } else {
                finish_order.push(node);
                stack.pop();
            }
        }
    }

    // Pass 2: iterative DFS over the reverse graph in decreasing finish
    // order, assigning component ids.
    let mut component_of: BTreeMap<CandidateId, usize> = BTreeMap::new();
    let mut components: Vec<Vec<CandidateId>> = Vec::new();
    for &start in finish_order.iter().rev() {
        if component_of.contains_key(&start) {
            continue;
        }
        let comp_id = components.len();
        let mut comp = Vec::new();
        let mut stack = vec![start];
        component_of.insert(start, comp_id);
        while let Some(node) = stack.pop() {
            comp.push(node);
            for &parent in &radj[&node] {
                if !component_of.contains_key(&parent) {
                    component_of.insert(parent, comp_id);
                    stack.push(parent);
                }
            }
        }
        components.push(comp);
    }

    if components.len() <= 1 {
        return None;
    }

    // Topologically order components: edges between distinct components
    // in `adj` only ever run one way (else they'd have merged into one
    // SCC), so counting in-edges per component and peeling zero-in-degree
    // components (Kahn's algorithm) gives the order.
    let mut in_degree = vec![0usize; components.len()];
    for &a in &members {
        let ca = component_of[&a];
        for &b in &adj[&a] {
            let cb = component_of[&b];
            if ca != cb {
                in_degree[cb] += 1;
            }
        }
    }
    let mut ready: VecDeque<usize> = (0..components.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut topo: Vec<usize> = Vec::new();
    while let Some(c) = ready.pop_front() {
        topo.push(c);
        for &a in &members {
            if component_of[&a] != c {
                continue;
            }
            for &b in &adj[&a] {
                let cb = component_of[&b];
                if cb != c {
                    in_degree[cb] = in_degree[cb].saturating_sub(1);
                    if in_degree[cb] == 0 {
                        ready.push_back(cb);
                    }
                }
            }
        }
    }

    let ordered: Vec<CandidateSet> = topo
        .into_iter()
        .map(|c| components[c].iter().copied().collect())
        .collect();

    trace.0.push(ReductionStep::CondorcetComponents {
        on: block.clone(),
        components: ordered.clone(),
    });
    Some(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kemeny_core::Ballot;

    fn c(i: u32) -> CandidateId {
        CandidateId::from(i)
    }

    fn ballot(order: &[u32]) -> Ballot {
        Ballot::from_sequence(order.iter().map(|&i| c(i)).collect()).unwrap()
    }

    #[test]
    fn rule_flags_parse_bit_positions() {
        let f = RuleFlags::from_bits("1010").unwrap();
        assert!(f.r2);
        assert!(f.r4);
        assert!(!f.r1);
        assert!(!f.r3);
    }

    #[test]
    fn rule_flags_rejects_wrong_length() {
        assert!(RuleFlags::from_bits("101").is_err());
        assert!(RuleFlags::from_bits("10102").is_err());
    }

    #[test]
    fn r1_splits_off_a_condorcet_winner() {
        // D beats everyone (S3 shape from spec.md §8).
        let e = Election::new(
            vec![
                ballot(&[3, 0, 1, 2]),
                ballot(&[3, 1, 2, 0]),
                ballot(&[3, 2, 0, 1]),
                ballot(&[3, 0, 2, 1]),
            ],
            4,
        )
        .unwrap();
        let block: CandidateSet = e.candidates().collect();
        let mut trace = ReductionTrace::default();
        let split = r1_condorcet_candidate(&e, &block, &mut trace).unwrap();
        assert_eq!(split[0], [c(3)].into_iter().collect());
    }

    #[test]
    fn r5_splits_two_independent_components_in_topological_order() {
        // {0,1} always precede {2,3}: every ballot ranks 0,1 ahead of 2,3.
        let e = Election::new(
            vec![
                ballot(&[0, 1, 2, 3]),
                ballot(&[1, 0, 3, 2]),
                ballot(&[0, 1, 3, 2]),
            ],
            4,
        )
        .unwrap();
        let block: CandidateSet = e.candidates().collect();
        let mut trace = ReductionTrace::default();
        let split = r5_condorcet_components(&e, &block, &mut trace).unwrap();
        assert_eq!(split.len(), 2);
        assert!(split[0].contains(&c(0)) && split[0].contains(&c(1)));
        assert!(split[1].contains(&c(2)) && split[1].contains(&c(3)));
    }

    #[test]
    fn r5_no_op_on_a_single_fully_cyclic_component() {
        let e = Election::new(
            vec![ballot(&[0, 1, 2]), ballot(&[1, 2, 0]), ballot(&[2, 0, 1])],
            3,
        )
        .unwrap();
        let block: CandidateSet = e.candidates().collect();
        let mut trace = ReductionTrace::default();
        assert!(r5_condorcet_components(&e, &block, &mut trace).is_none());
    }

    #[test]
    fn reduce_on_unanimous_election_collapses_to_singleton_chain() {
        // S2 from spec.md §8: 5 copies of A B C D.
        let e = Election::new(vec![ballot(&[0, 1, 2, 3]); 5], 4).unwrap();
        let config = ReductionConfig::default();
        let (blocks, _trace) = reduce(&e, &config);
        assert_eq!(blocks.len(), 4);
        assert!(blocks.iter().all(|b| b.len() == 1));
        let order: Vec<u32> = blocks.iter().map(|b| b.iter().next().unwrap().0).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn reduce_respects_max_set_size_cap() {
        let e = Election::new(
            vec![ballot(&[0, 1, 2, 3]); 5],
            4,
        )
        .unwrap();
        let mut config = ReductionConfig::default();
        config.rules.r1 = true;
        config.r5 = false;
        config.max_set_size = 1;
        let (blocks, _trace) = reduce(&e, &config);
        // R1 alone still peels one winner at a time down to singletons.
        assert_eq!(blocks.len(), 4);
    }
}
