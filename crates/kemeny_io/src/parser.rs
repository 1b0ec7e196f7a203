//! Ballot file parsing and universe anonymization (`spec.md` §4.A, §6).
//!
//! The election file is line-oriented. Each non-blank, non-`#`-comment line
//! is one ballot, one voter:
//!
//! ```text
//! <name> > <name> > <name> ...
//! ```
//!
//! Names are opaque tokens — a name that happens to look like a number
//! (`"1"`, `"07"`) is never treated specially, only as text to intern
//! (`spec.md` §6: "numeric candidates are treated as strings"). A repeated
//! ranking is simply written as repeated lines; this format has no
//! per-line voter-count shorthand. No regex: the line is hand-tokenized
//! into runs of non-delimiter characters, split on runs of space/tab and
//! on the single-character delimiters `>` and `^`. A `^` delimiter means
//! "tied with", which this engine does not support (`spec.md`'s
//! ties-are-errors non-goal), so its mere presence on a line is rejected
//! rather than silently resolved.

use std::collections::{BTreeSet, HashSet};

use kemeny_core::{Ballot, CandidateId};

use crate::dictionary::Dictionary;
use crate::{IoError, IoResult, ParseErrorKind};

/// One ballot as read from the file, before anonymization: a ranked
/// sequence of candidate *names*, one voter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawBallot {
    pub names: Vec<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Delim {
    Gt,
    Caret,
}

enum Token {
    Name(String),
    Delim(Delim),
}

/// Tokenize one line into name/delimiter tokens. `line` must already have
/// any trailing newline stripped; `lineno` is 1-based, used for errors.
fn tokenize(line: &str, lineno: usize) -> IoResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut col = 0usize;

    let mut flush = |current: &mut String, tokens: &mut Vec<Token>| {
        if !current.is_empty() {
            tokens.push(Token::Name(std::mem::take(current)));
        }
    };

    for ch in line.chars() {
        col += 1;
        match ch {
            ' ' | '\t' => flush(&mut current, &mut tokens),
            '>' => {
                flush(&mut current, &mut tokens);
                tokens.push(Token::Delim(Delim::Gt));
            }
            '^' => {
                flush(&mut current, &mut tokens);
                tokens.push(Token::Delim(Delim::Caret));
            }
            c if c.is_control() => {
                return Err(IoError::Parse {
                    line: lineno,
                    column: col,
                    kind: ParseErrorKind::UnexpectedCharacter,
                });
            }
            c => current.push(c),
        }
    }
    flush(&mut current, &mut tokens);
    Ok(tokens)
}

/// Parse one non-blank, non-comment line into a [`RawBallot`].
fn parse_line(line: &str, lineno: usize) -> IoResult<RawBallot> {
    let tokens = tokenize(line, lineno)?;

    if tokens.iter().any(|t| matches!(t, Token::Delim(Delim::Caret))) {
        return Err(IoError::TieUnsupported { line: lineno });
    }

    let mut names = Vec::new();
    let mut seen = HashSet::new();
    for tok in tokens {
        if let Token::Name(name) = tok {
            if !seen.insert(name.clone()) {
                return Err(IoError::Parse {
                    line: lineno,
                    column: 1,
                    kind: ParseErrorKind::DuplicateCandidateOnBallot,
                });
            }
            names.push(name);
        }
    }
    if names.is_empty() {
        return Err(IoError::Parse {
            line: lineno,
            column: 1,
            kind: ParseErrorKind::EmptyRanking,
        });
    }

    Ok(RawBallot { names })
}

/// Parse every ballot line in `text`. Blank lines and lines starting with
/// `#` (after trimming leading whitespace) are ignored.
pub fn parse_ballots(text: &str) -> IoResult<Vec<RawBallot>> {
    let mut out = Vec::new();
    for (i, raw_line) in text.lines().enumerate() {
        let lineno = i + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        out.push(parse_line(raw_line, lineno)?);
    }
    Ok(out)
}

/// Intersect every ballot's candidate set, intern the survivors into a
/// [`Dictionary`] in order of first appearance across the input (`spec.md`
/// §4.A: "remap names to `0..|common|-1` in order of first appearance" —
/// deterministic for a given input order, but not alphabetical), then
/// restrict and reindex each ballot to that shared universe.
///
/// Returns `Err(IoError::EmptyUniverse)` if no candidate is ranked on
/// every ballot.
pub fn anonymize(raw: &[RawBallot]) -> IoResult<(Vec<Ballot>, Dictionary)> {
    if raw.is_empty() {
        return Err(IoError::EmptyUniverse);
    }

    let mut universe: BTreeSet<String> = raw[0].names.iter().cloned().collect();
    for b in &raw[1..] {
        let names: HashSet<&str> = b.names.iter().map(String::as_str).collect();
        universe.retain(|n| names.contains(n.as_str()));
    }
    if universe.is_empty() {
        return Err(IoError::EmptyUniverse);
    }

    let mut dict = Dictionary::new();
    let mut interned: HashSet<&str> = HashSet::new();
    for b in raw {
        for name in &b.names {
            if universe.contains(name.as_str()) && interned.insert(name.as_str()) {
                dict.intern(name);
            }
        }
    }

    let mut ballots = Vec::new();
    for b in raw {
        let seq: Vec<CandidateId> = b
            .names
            .iter()
            .filter(|n| universe.contains(n.as_str()))
            .map(|n| dict.id_of(n).expect("interned above"))
            .collect();
        ballots.push(Ballot::from_sequence(seq)?);
    }

    Ok((ballots, dict))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_ranking() {
        let b = parse_line("Alice > Bob > Carol", 1).unwrap();
        assert_eq!(b.names, vec!["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn tight_ranking_without_spaces_around_gt() {
        let b = parse_line("A>B>C", 1).unwrap();
        assert_eq!(b.names, vec!["A", "B", "C"]);
    }

    #[test]
    fn numeric_names_stay_opaque_strings() {
        let b = parse_line("1 > 2 > 3", 1).unwrap();
        assert_eq!(b.names, vec!["1", "2", "3"]);
    }

    #[test]
    fn rejects_tie_marker() {
        let err = parse_line("A ^ B", 1).unwrap_err();
        assert!(matches!(err, IoError::TieUnsupported { line: 1 }));
    }

    #[test]
    fn rejects_duplicate_candidate() {
        let err = parse_line("A > B > A", 1).unwrap_err();
        assert!(matches!(
            err,
            IoError::Parse {
                kind: ParseErrorKind::DuplicateCandidateOnBallot,
                ..
            }
        ));
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let text = "# header\n\nA > B\nA > B\n";
        let parsed = parse_ballots(text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].names, vec!["A", "B"]);
    }

    #[test]
    fn anonymize_intersects_and_reindexes() {
        let raw = vec![
            RawBallot {
                names: vec!["A".into(), "B".into(), "C".into()],
            },
            RawBallot {
                names: vec!["B".into(), "A".into()],
            },
        ];
        let (ballots, dict) = anonymize(&raw).unwrap();
        // "C" is dropped: it isn't ranked on the second ballot.
        assert_eq!(dict.len(), 2);
        assert_eq!(ballots[0].len(), 2);
        assert_eq!(ballots[1].len(), 2);
    }

    #[test]
    fn anonymize_ids_follow_first_appearance_not_alphabetical_order() {
        // "Zed" appears before "Amy" in the input, so it must be interned
        // first even though it sorts after alphabetically.
        let raw = vec![
            RawBallot {
                names: vec!["Zed".into(), "Amy".into()],
            },
            RawBallot {
                names: vec!["Amy".into(), "Zed".into()],
            },
        ];
        let (_, dict) = anonymize(&raw).unwrap();
        assert_eq!(dict.id_of("Zed").unwrap().index(), 0);
        assert_eq!(dict.id_of("Amy").unwrap().index(), 1);
    }

    #[test]
    fn anonymize_rejects_empty_intersection() {
        let raw = vec![
            RawBallot {
                names: vec!["A".into()],
            },
            RawBallot {
                names: vec!["B".into()],
            },
        ];
        assert!(matches!(anonymize(&raw), Err(IoError::EmptyUniverse)));
    }
}
