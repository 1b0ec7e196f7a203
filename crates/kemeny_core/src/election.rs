//! The election model: ballots, the derived pairwise-preference matrix,
//! and the analyses every solver and reduction rule is built on
//! (`spec.md` §3, §4.B).

use std::cell::{OnceCell, RefCell};
use std::collections::BTreeSet;

use crate::ballot::Ballot;
use crate::candidate::CandidateId;
use crate::errors::CoreError;

/// `P[a][b]` = number of ballots ranking `a` strictly above `b`.
///
/// Derived invariants (checked by tests, not at runtime — these hold by
/// construction): `P[a][a] == 0`, and `P[a][b] + P[b][a] == n` for every
/// pair where both candidates are ranked on every ballot (true for every
/// pair here, since `Election::new` requires each ballot to rank exactly
/// the full universe).
#[derive(Clone, Debug)]
pub struct Pairwise {
    m: usize,
    cells: Vec<u64>,
}

impl Pairwise {
    fn zeroed(m: usize) -> Self {
        Pairwise {
            m,
            cells: vec![0u64; m * m],
        }
    }

    #[inline]
    fn idx(&self, a: CandidateId, b: CandidateId) -> usize {
        a.index() * self.m + b.index()
    }

    /// Ballots ranking `a` above `b` — the cost of placing `b` above `a`
    /// in a consensus (the "subscore" `s(a,b)` of `spec.md` §3).
    #[inline]
    pub fn get(&self, a: CandidateId, b: CandidateId) -> u64 {
        self.cells[self.idx(a, b)]
    }

    #[inline]
    fn add(&mut self, a: CandidateId, b: CandidateId, delta: u64) {
        let i = self.idx(a, b);
        self.cells[i] += delta;
    }

    /// `m(a, b) = P[a][b] - P[b][a]`.
    pub fn margin(&self, a: CandidateId, b: CandidateId) -> i64 {
        self.get(a, b) as i64 - self.get(b, a) as i64
    }

    pub fn num_candidates(&self) -> usize {
        self.m
    }
}

/// Ballots plus the candidate universe `C`. Post-construction invariant:
/// every ballot ranks exactly `C` (callers — normally `kemeny_io`'s
/// anonymizer — are responsible for filtering candidates missing from some
/// ballot before building an `Election`).
pub struct Election {
    ballots: Vec<Ballot>,
    num_candidates: usize,

    matrix: OnceCell<Pairwise>,
    dirty: OnceCell<(BTreeSet<(u32, u32)>, BTreeSet<u32>)>,
    bounds: OnceCell<(u64, u64)>,
    majority_cache: RefCell<Option<(u64, BTreeSet<(u32, u32)>)>>,
}

impl Election {
    /// Build an election, validating that every ballot ranks exactly the
    /// `num_candidates`-sized universe `0..num_candidates`.
    pub fn new(ballots: Vec<Ballot>, num_candidates: usize) -> Result<Self, CoreError> {
        if num_candidates == 0 {
            return Err(CoreError::EmptyUniverse);
        }
        for b in &ballots {
            if b.len() != num_candidates {
                return Err(CoreError::Internal(
                    "ballot does not rank exactly the candidate universe",
                ));
            }
        }
        Ok(Election {
            ballots,
            num_candidates,
            matrix: OnceCell::new(),
            dirty: OnceCell::new(),
            bounds: OnceCell::new(),
            majority_cache: RefCell::new(None),
        })
    }

    #[inline]
    pub fn num_candidates(&self) -> usize {
        self.num_candidates
    }

    #[inline]
    pub fn num_ballots(&self) -> usize {
        self.ballots.len()
    }

    #[inline]
    pub fn ballots(&self) -> &[Ballot] {
        &self.ballots
    }

    pub fn candidates(&self) -> impl Iterator<Item = CandidateId> {
        (0..self.num_candidates).map(CandidateId::from_index)
    }

    /// The pairwise matrix, computed once and cached.
    pub fn matrix(&self) -> &Pairwise {
        self.matrix.get_or_init(|| {
            let mut p = Pairwise::zeroed(self.num_candidates);
            for ballot in &self.ballots {
                let seq = ballot.sequence();
                for i in 0..seq.len() {
                    for j in (i + 1)..seq.len() {
                        p.add(seq[i], seq[j], 1);
                    }
                }
            }
            p
        })
    }

    /// `s(a, b) := P[a][b]`: the cost of placing `b` above `a`.
    #[inline]
    pub fn subscore(&self, a: CandidateId, b: CandidateId) -> u64 {
        self.matrix().get(a, b)
    }

    /// Kemeny score of a full permutation of the candidate universe:
    /// `K(pi) = sum over i<j of s(pi[j], pi[i])`.
    ///
    /// Panics if `perm` is not a permutation of `0..num_candidates` —
    /// per `spec.md` §4.B this is a programmer error, not a recoverable
    /// one.
    pub fn kscore(&self, perm: &[CandidateId]) -> u64 {
        assert!(
            self.is_permutation(perm),
            "kscore: argument is not a permutation of the candidate universe"
        );
        let m = self.matrix();
        let mut total = 0u64;
        for j in 0..perm.len() {
            for i in 0..j {
                total += m.get(perm[j], perm[i]);
            }
        }
        total
    }

    fn is_permutation(&self, perm: &[CandidateId]) -> bool {
        if perm.len() != self.num_candidates {
            return false;
        }
        let mut seen = vec![false; self.num_candidates];
        for c in perm {
            let i = c.index();
            if i >= self.num_candidates || seen[i] {
                return false;
            }
            seen[i] = true;
        }
        true
    }

    /// Kendall-tau distance between two ballots restricted to the pairs
    /// both rank: the number of candidate pairs the two ballots order
    /// differently.
    pub fn kt_distance(&self, a: &Ballot, b: &Ballot) -> u64 {
        let mut dist = 0u64;
        for x in self.candidates() {
            for y in self.candidates() {
                if x.0 >= y.0 {
                    continue;
                }
                if let (Some(pa), Some(pb)) = (a.prefers(x, y), b.prefers(x, y)) {
                    if pa != pb {
                        dist += 1;
                    }
                }
            }
        }
        dist
    }

    /// Dirty pairs (ballots disagree on direction) and the dirty candidate
    /// set (candidates appearing in at least one dirty pair), both
    /// memoized. Pairs are stored `(lower, upper)` with `lower.0 < upper.0`.
    pub fn dirty(&self) -> &(BTreeSet<(u32, u32)>, BTreeSet<u32>) {
        self.dirty.get_or_init(|| {
            let m = self.matrix();
            let mut pairs = BTreeSet::new();
            let mut cands = BTreeSet::new();
            for a in self.candidates() {
                for b in self.candidates() {
                    if a.0 >= b.0 {
                        continue;
                    }
                    if m.get(a, b) > 0 && m.get(b, a) > 0 {
                        pairs.insert((a.0, b.0));
                        cands.insert(a.0);
                        cands.insert(b.0);
                    }
                }
            }
            (pairs, cands)
        })
    }

    pub fn dirty_pairs(&self) -> &BTreeSet<(u32, u32)> {
        &self.dirty().0
    }

    pub fn dirty_candidates(&self) -> &BTreeSet<u32> {
        &self.dirty().1
    }

    /// Lower bound `sum over pairs of min(P[a][b], P[b][a])` and upper
    /// bound `sum over pairs of max(...)`, both memoized together.
    pub fn bounds(&self) -> (u64, u64) {
        *self.bounds.get_or_init(|| {
            let m = self.matrix();
            let mut lo = 0u64;
            let mut hi = 0u64;
            for a in self.candidates() {
                for b in self.candidates() {
                    if a.0 >= b.0 {
                        continue;
                    }
                    let ab = m.get(a, b);
                    let ba = m.get(b, a);
                    lo += ab.min(ba);
                    hi += ab.max(ba);
                }
            }
            (lo, hi)
        })
    }

    pub fn lower_bound(&self) -> u64 {
        self.bounds().0
    }

    pub fn upper_bound(&self) -> u64 {
        self.bounds().1
    }

    /// Pairs `(a, b)` with `a.0 < b.0` where the majority direction
    /// (`a` over `b`, or `b` over `a`) reaches at least `ratio` of the
    /// ballots. Memoized for the single most-recently-requested ratio —
    /// the CLI only ever exposes one `-m` value per run, so a one-slot
    /// cache is sufficient (see `SPEC_FULL.md` §4.B).
    pub fn majority_pairs(&self, ratio: f64) -> BTreeSet<(u32, u32)> {
        let key = ratio.to_bits();
        if let Some((cached_key, set)) = self.majority_cache.borrow().as_ref() {
            if *cached_key == key {
                return set.clone();
            }
        }
        let n = self.num_ballots() as f64;
        let threshold = ratio * n;
        let m = self.matrix();
        let mut out = BTreeSet::new();
        for a in self.candidates() {
            for b in self.candidates() {
                if a.0 >= b.0 {
                    continue;
                }
                let ab = m.get(a, b) as f64;
                let ba = m.get(b, a) as f64;
                if ab >= threshold || ba >= threshold {
                    out.insert((a.0, b.0));
                }
            }
        }
        *self.majority_cache.borrow_mut() = Some((key, out.clone()));
        out
    }

    /// `true` if `a` strictly beats `b` by majority at `ratio` (direction
    /// matters, unlike [`Self::majority_pairs`] which reports the pair).
    pub fn majority_beats(&self, ratio: f64, a: CandidateId, b: CandidateId) -> bool {
        let n = self.num_ballots() as f64;
        self.matrix().get(a, b) as f64 >= ratio * n
    }
}
