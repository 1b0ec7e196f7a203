//! End-to-end CLI scenarios against the compiled `kemeny` binary.
//!
//! Ballot lines use the `<name> > <name> > ...` format `kemeny_io::parser`
//! actually parses: one line is one voter, and a ranking cast by several
//! voters is simply repeated on several lines. Several tests carry their
//! own hand-derived pairwise counts in a comment next to the fixture so
//! the asserted score can be checked independently of the binary under
//! test.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn kemeny() -> Command {
    Command::cargo_bin("kemeny").unwrap()
}

/// A three-ballot Condorcet cycle (each pairwise margin 2-1, forming
/// A -> B -> C -> A). The lower bound from summing per-pair minorities is
/// 3, but no permutation can realize it: one majority direction must be
/// broken, so the true optimum is 4, tied among the three forward
/// rotations ABC, BCA, CAB. DP's tie-break picks the lexicographically
/// smallest, ABC.
#[test]
fn s1_cyclic_ballots_resolve_to_lexicographically_smallest_rotation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cycle.txt");
    fs::write(&path, "A > B > C\nB > C > A\nC > A > B\n").unwrap();

    kemeny()
        .args(["-e", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("4\tA B C\t"));
}

/// Five identical ballots: no disagreement anywhere, lower bound and
/// upper bound both 0, consensus is the ballot's own order.
#[test]
fn s2_unanimous_ballots_score_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unanimous.txt");
    fs::write(&path, "A > B > C > D\n".repeat(5)).unwrap();

    kemeny()
        .args(["-e", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("0\tA B C D\t"));
}

/// A strict Condorcet winner over the other three candidates (beats B
/// 3-1, C and D unanimously) with `R1` enabled via the rules mask
/// (`0010` sets only the R1 bit) and `-p` turned on. The reducer should
/// extract `{A}` as a free front block; the remaining `{B, C, D}`
/// sub-instance is itself a clean Condorcet order. Hand-derived score:
/// cross-contribution from A's one loss to B (1) plus the sub-block's
/// internal disagreement (C-above-B once, D-above-C once) = 3.
#[test]
fn s3_condorcet_winner_is_extracted_by_reduction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("condorcet.txt");
    fs::write(
        &path,
        "A > B > C > D\nA > B > D > C\nB > A > C > D\nA > C > B > D\n",
    )
    .unwrap();

    kemeny()
        .args(["-e", path.to_str().unwrap(), "-p", "-r", "0010"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("3\tA B C D\t"));
}

/// A candidate absent from exactly one ballot is dropped from the common
/// universe during anonymization rather than raising an error; only the
/// two candidates present on every ballot survive into the dictionary.
#[test]
fn s5_candidate_missing_from_one_ballot_is_dropped_not_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.txt");
    fs::write(&path, "A > B > X\nB > A > X\nA > B\n").unwrap();

    kemeny()
        .args(["-e", path.to_str().unwrap()])
        .assert()
        .success();

    let dict_path = dir.path().join("partial.txt.dict");
    let dict_text = fs::read_to_string(&dict_path).unwrap();
    assert!(!dict_text.contains('X'), "dict still names X: {dict_text}");
    assert!(dict_text.contains('A') && dict_text.contains('B'));
}

/// `^` marks a tie between adjacent candidates on a ballot, which this
/// engine does not support; the parser must reject it before anonymizing
/// anything, surfacing the `TieUnsupported` exit code.
#[test]
fn s6_tie_marker_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tied.txt");
    fs::write(&path, "A ^ B\n").unwrap();

    kemeny()
        .args(["-e", path.to_str().unwrap()])
        .assert()
        .failure()
        .code(4);
}

/// Invariant 10 (`spec.md` §8): identical input and flags produce
/// byte-identical output, aside from the wall-clock fields both the
/// report's `elapsed` column and the `.consensus0.time` artifact record.
#[test]
fn repeat_runs_on_identical_input_agree_on_every_field_but_timing() {
    let first_dir = tempfile::tempdir().unwrap();
    let second_dir = tempfile::tempdir().unwrap();
    let ballots = "A > B > C\nB > C > A\nC > A > B\nA > B > C\n";

    let first_path = first_dir.path().join("election.txt");
    let second_path = second_dir.path().join("election.txt");
    fs::write(&first_path, ballots).unwrap();
    fs::write(&second_path, ballots).unwrap();

    let first_out = kemeny()
        .args(["-e", first_path.to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let second_out = kemeny()
        .args(["-e", second_path.to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let strip_elapsed = |line: &[u8]| -> Vec<String> {
        let text = String::from_utf8_lossy(line);
        text.trim_end()
            .split('\t')
            .enumerate()
            .filter(|(i, _)| *i != 2)
            .map(|(_, f)| f.to_string())
            .collect()
    };
    assert_eq!(strip_elapsed(&first_out), strip_elapsed(&second_out));

    for suffix in [".dict", ".anoncomplete", ".consensus0", ".consensus0.score"] {
        let a = fs::read(format!("{}{suffix}", first_path.display())).unwrap();
        let b = fs::read(format!("{}{suffix}", second_path.display())).unwrap();
        assert_eq!(a, b, "{suffix} differs between identical runs");
    }
}

/// `--partitionate-with-datareductions` changes how the instance is
/// decomposed internally (invariant 5, `spec.md` §8: the reduced score
/// plus cross-contribution must equal the whole-instance optimum) but
/// must never change the reported score.
#[test]
fn reduction_agrees_with_direct_solving_on_the_same_instance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("six.txt");
    fs::write(
        &path,
        "A > B > C > D > E > F\n\
         B > C > A > D > E > F\n\
         C > A > B > D > E > F\n\
         D > E > F > A > B > C\n\
         E > F > D > A > B > C\n\
         F > D > E > A > B > C\n",
    )
    .unwrap();

    let direct = kemeny()
        .args(["-e", path.to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let reduced = kemeny()
        .args(["-e", path.to_str().unwrap(), "-p", "-r", "0010"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let score_field = |out: &[u8]| String::from_utf8_lossy(out).split('\t').next().unwrap().to_string();
    assert_eq!(score_field(&direct), score_field(&reduced));
}
