//! Seeded RNG for the one place randomness is allowed: the
//! pick-a-random-ballot heuristic (`modus == 0`, `spec.md` §4.F).
//!
//! No solver search order ever consults this module — DP and search-tree
//! enumeration order is fixed by [`crate::determinism`] alone. Keeping the
//! RNG out of the deterministic solvers is what makes invariant 10
//! ("two runs with identical input and flags produce byte-identical
//! output") checkable without special-casing `modus`.

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

/// Newtype over `ChaCha20Rng`, seeded from a plain `u64` so callers never
/// have to think about the 32-byte seed array.
pub struct TieRng(ChaCha20Rng);

pub fn from_seed(seed: u64) -> TieRng {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&seed.to_le_bytes());
    TieRng(ChaCha20Rng::from_seed(bytes))
}

impl TieRng {
    /// Uniformly choose an index in `0..len` by rejection sampling (avoids
    /// modulo bias). Returns `None` for `len == 0`.
    pub fn choose_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let n = len as u64;
        let zone = u64::MAX - (u64::MAX % n);
        loop {
            let x = self.0.next_u64();
            if x < zone {
                return Some((x % n) as usize);
            }
        }
    }
}

impl Default for TieRng {
    fn default() -> Self {
        from_seed(0)
    }
}
