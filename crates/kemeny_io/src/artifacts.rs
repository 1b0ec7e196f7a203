//! Atomic persistence of a completed run's output set (`spec.md` §6).
//!
//! One run writes, for an input file `F`:
//!
//! - `F.dict` — the candidate name ↔ id dictionary (canonical JSON).
//! - `F.anoncomplete` — marker written once parsing and anonymization
//!   finish, recording the ballot and candidate counts seen.
//! - `F.consensus{k}` — the k-th optimal consensus ranking, one candidate
//!   name per line, best-to-worst. `k` starts at 0; more than one file is
//!   written only under `--keep-all-solutions`.
//! - `F.consensus{k}.score` — that ranking's Kemeny score, plain decimal.
//! - `F.consensus{k}.time` — wall-clock seconds spent finding it.
//!
//! `.dict`, `.anoncomplete`, `.consensus{k}` and `.consensus{k}.score` are
//! covered by the "identical input and flags ⇒ byte-identical output"
//! invariant (`spec.md` §8, invariant 10); `.consensus{k}.time` is not —
//! it records a wall-clock measurement and is expected to vary run to run.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use kemeny_core::CandidateId;

use crate::dictionary::Dictionary;
use crate::{canonical_json, IoError, IoResult};

/// One optimal (or tied-optimal, under `--keep-all-solutions`) consensus
/// ranking together with its score and the time spent to find it.
#[derive(Clone, Debug)]
pub struct ConsensusSolution {
    pub ranking: Vec<CandidateId>,
    pub score: u64,
    pub elapsed: Duration,
}

/// Everything one invocation produces, bundled so the CLI can build it
/// once in memory and write it out in a single pass.
#[derive(Clone, Debug)]
pub struct RunArtifacts {
    pub dictionary: Dictionary,
    pub ballot_count: usize,
    pub candidate_count: usize,
    pub solutions: Vec<ConsensusSolution>,
}

impl RunArtifacts {
    /// Write every file this run produces, atomically, next to `base`
    /// (typically the input election file's path).
    pub fn write_all(&self, base: &Path) -> IoResult<()> {
        self.write_dict(base)?;
        self.write_anoncomplete(base)?;
        for (k, solution) in self.solutions.iter().enumerate() {
            self.write_consensus(base, k, solution)?;
        }
        Ok(())
    }

    fn write_dict(&self, base: &Path) -> IoResult<()> {
        let path = sibling(base, ".dict");
        #[cfg(feature = "serde")]
        {
            canonical_json::write_canonical_file(&path, self.dictionary.names())?;
        }
        #[cfg(not(feature = "serde"))]
        {
            let body = self.dictionary.names().join("\n");
            canonical_json::write_atomic(&path, body.as_bytes())?;
        }
        Ok(())
    }

    fn write_anoncomplete(&self, base: &Path) -> IoResult<()> {
        let path = sibling(base, ".anoncomplete");
        let body = format!(
            "ballots={}\ncandidates={}",
            self.ballot_count, self.candidate_count
        );
        canonical_json::write_atomic(&path, body.as_bytes())
    }

    fn write_consensus(&self, base: &Path, k: usize, solution: &ConsensusSolution) -> IoResult<()> {
        let ranking_path = sibling(base, &format!(".consensus{k}"));
        let mut body = String::new();
        for id in &solution.ranking {
            let name = self
                .dictionary
                .name_of(*id)
                .ok_or_else(|| IoError::BadConversion(format!("no name for {id}")))?;
            body.push_str(name);
            body.push('\n');
        }
        body.pop(); // no trailing newline, matching the canonical-artifact convention
        canonical_json::write_atomic(&ranking_path, body.as_bytes())?;

        let score_path = sibling(base, &format!(".consensus{k}.score"));
        canonical_json::write_atomic(&score_path, solution.score.to_string().as_bytes())?;

        let time_path = sibling(base, &format!(".consensus{k}.time"));
        let secs = solution.elapsed.as_secs_f64();
        canonical_json::write_atomic(&time_path, format!("{secs:.6}").as_bytes())?;

        Ok(())
    }
}

/// Append `suffix` to `base`'s file name, e.g. `election.txt` + `.dict`
/// → `election.txt.dict`, matching `spec.md` §6's `F.<suffix>` naming.
fn sibling(base: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = base.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    match base.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(name),
        _ => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn c(i: u32) -> CandidateId {
        CandidateId::from(i)
    }

    #[test]
    fn sibling_appends_suffix_to_file_name_only() {
        let base = Path::new("data/election.txt");
        assert_eq!(
            sibling(base, ".dict"),
            PathBuf::from("data/election.txt.dict")
        );
    }

    #[test]
    fn write_all_produces_expected_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("election.txt");
        std::fs::write(&base, b"irrelevant").unwrap();

        let mut dict = Dictionary::new();
        let a = dict.intern("Alice");
        let b = dict.intern("Bob");

        let artifacts = RunArtifacts {
            dictionary: dict,
            ballot_count: 4,
            candidate_count: 2,
            solutions: vec![ConsensusSolution {
                ranking: vec![a, b],
                score: 2,
                elapsed: Duration::from_millis(5),
            }],
        };
        artifacts.write_all(&base).unwrap();

        assert!(dir.path().join("election.txt.anoncomplete").exists());
        assert!(dir.path().join("election.txt.consensus0").exists());
        assert!(dir.path().join("election.txt.consensus0.score").exists());
        assert!(dir.path().join("election.txt.consensus0.time").exists());

        let score = std::fs::read_to_string(dir.path().join("election.txt.consensus0.score")).unwrap();
        assert_eq!(score, "2");

        let ranking = std::fs::read_to_string(dir.path().join("election.txt.consensus0")).unwrap();
        assert_eq!(ranking, "Alice\nBob");
    }
}
