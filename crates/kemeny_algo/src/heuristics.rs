//! Fast approximate consensus heuristics (`spec.md` §4.F, `modus` values).
//!
//! Only `modus == 0`, pick-a-random-ballot, is implemented. The original
//! implementation offered four more (Borda, Copeland, ranked-pairs, and a
//! cosine-angle heuristic); `spec.md`'s Non-goals explicitly scope this
//! engine to the one heuristic plus the two exact solvers, so the other
//! four are not ported.

use kemeny_core::{rng::TieRng, CandidateId, Election};

/// Return one of the election's distinct ballots, chosen uniformly at
/// random, as an approximate consensus. This is the only place in the
/// engine where randomness reaches a solver's output — no solver search
/// order ever consults the RNG (see `kemeny_core::rng`'s module doc).
pub fn pick_a_random_ballot(election: &Election, rng: &mut TieRng) -> Vec<CandidateId> {
    let n = election.num_ballots();
    let i = rng
        .choose_index(n)
        .expect("pick_a_random_ballot requires at least one ballot");
    election.ballots()[i].sequence().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kemeny_core::{rng, Ballot};

    fn ballot(order: &[u32]) -> Ballot {
        Ballot::from_sequence(order.iter().map(|&i| CandidateId::from(i)).collect()).unwrap()
    }

    #[test]
    fn returns_one_of_the_cast_ballots() {
        let e = Election::new(
            vec![ballot(&[0, 1, 2]), ballot(&[1, 2, 0]), ballot(&[2, 0, 1])],
            3,
        )
        .unwrap();
        let mut rng = rng::from_seed(7);
        let picked = pick_a_random_ballot(&e, &mut rng);
        assert!(e.ballots().iter().any(|b| b.sequence() == picked.as_slice()));
    }

    #[test]
    fn same_seed_picks_same_ballot() {
        let e = Election::new(
            vec![ballot(&[0, 1, 2]), ballot(&[1, 2, 0]), ballot(&[2, 0, 1])],
            3,
        )
        .unwrap();
        let mut a = rng::from_seed(99);
        let mut b = rng::from_seed(99);
        assert_eq!(pick_a_random_ballot(&e, &mut a), pick_a_random_ballot(&e, &mut b));
    }
}
