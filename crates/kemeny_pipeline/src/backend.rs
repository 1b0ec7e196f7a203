//! External MIP backend shim (`spec.md` §1, §6, §9's Design Notes).
//!
//! `spec.md` explicitly keeps any external solver's own optimization
//! logic out of scope — "never implement any external solver's math,
//! only the subprocess contract". This module is exactly that contract:
//! write a plain ILP formulation of one block's Kemeny problem, shell out
//! to a named solver binary, poll it against a [`CancelToken`], and parse
//! back the small, solver-agnostic marker lines (`Best objective ...`,
//! `x(i,j) 1`) `spec.md` §6 describes.
//!
//! Grounded in `original_source/source/jobmanagement.cpp`'s subprocess
//! dispatch for the external solvers it shells out to (`glpsol`, `cplex`,
//! `gurobi_cl`, a custom `linOrder` tool); this keeps the same
//! spawn-poll-parse shape but replaces its blocking `waitpid` with the
//! cancellable poll loop `kemeny_algo::CancelToken` makes possible
//! elsewhere in this engine.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use kemeny_algo::CancelToken;
use kemeny_core::{CandidateId, Election};

use crate::errors::{PipelineError, PipelineResult};
use crate::reduction::CandidateSet;

/// One external MIP solver this engine knows how to shell out to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BackendKind {
    Glpsol,
    Cplex,
    GurobiCl,
    LinOrder,
}

impl BackendKind {
    pub fn program(self) -> &'static str {
        match self {
            BackendKind::Glpsol => "glpsol",
            BackendKind::Cplex => "cplex",
            BackendKind::GurobiCl => "gurobi_cl",
            BackendKind::LinOrder => "linOrder",
        }
    }
}

/// Parsed result of one external solver invocation: the optimal score
/// plus every `x(i, j) = 1` ("`i` ranked above `j`") variable assignment.
#[derive(Clone, Debug)]
pub struct BackendSolution {
    pub score: u64,
    pub pairs_above: Vec<(u32, u32)>,
}

pub enum BackendOutcome {
    Solved(BackendSolution),
    Cancelled,
}

/// Anything that can run one block through an external optimizer. The
/// default methods implement the whole subprocess contract; only
/// [`Backend::kind`] varies between solvers, since the invocation shape
/// (`<program> <lp-file>`, text markers on stdout) is the same for all
/// four named in `spec.md` §6.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    fn spawn(&self, lp_path: &Path) -> PipelineResult<Child> {
        Command::new(self.kind().program())
            .arg(lp_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PipelineError::BackendFailure {
                backend: self.kind().program(),
                exit_code: None,
                stderr: e.to_string(),
            })
    }

    /// Poll `child` against `cancel` with a short sleep loop. On
    /// cancellation the child is killed outright (`std::process::Child`
    /// only offers `SIGKILL` on Unix without an extra signaling
    /// dependency this engine has no other use for; a graceful `SIGTERM`
    /// is therefore not attempted here).
    fn wait_with_cancel(&self, mut child: Child, cancel: &CancelToken) -> PipelineResult<BackendOutcome> {
        loop {
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                return Ok(BackendOutcome::Cancelled);
            }
            match child.try_wait() {
                Ok(Some(status)) => {
                    if !status.success() {
                        let stderr = read_all(child.stderr.take());
                        return Err(PipelineError::BackendFailure {
                            backend: self.kind().program(),
                            exit_code: status.code(),
                            stderr,
                        });
                    }
                    let stdout = read_all(child.stdout.take());
                    return Ok(BackendOutcome::Solved(parse_markers(&stdout, self.kind())?));
                }
                Ok(None) => std::thread::sleep(Duration::from_millis(100)),
                Err(e) => {
                    return Err(PipelineError::BackendFailure {
                        backend: self.kind().program(),
                        exit_code: None,
                        stderr: e.to_string(),
                    })
                }
            }
        }
    }
}

fn read_all(pipe: Option<impl Read>) -> String {
    let mut out = String::new();
    if let Some(mut p) = pipe {
        let _ = p.read_to_string(&mut out);
    }
    out
}

/// A [`Backend`] whose only state is which external program to invoke.
pub struct ExternalProcessBackend {
    kind: BackendKind,
}

impl ExternalProcessBackend {
    pub fn new(kind: BackendKind) -> Self {
        ExternalProcessBackend { kind }
    }
}

impl Backend for ExternalProcessBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }
}

/// Parse a solver's stdout for `Best objective <n>` and `x(i,j) 1` lines.
/// Solver-agnostic by design: every backend `spec.md` §6 names reports its
/// result this way (directly, or through a small wrapper script — out of
/// scope here).
fn parse_markers(stdout: &str, kind: BackendKind) -> PipelineResult<BackendSolution> {
    let mut score: Option<u64> = None;
    let mut pairs_above = Vec::new();

    for line in stdout.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Best objective") {
            if let Some(token) = rest.split_whitespace().next() {
                if let Ok(v) = token.parse::<f64>() {
                    score = Some(v.round().max(0.0) as u64);
                }
            }
        } else if let Some(rest) = line.strip_prefix("x(") {
            if let Some(close) = rest.find(')') {
                let inside = &rest[..close];
                let mut parts = inside.split(',');
                if let (Some(i), Some(j), tail) = (parts.next(), parts.next(), rest[close + 1..].trim()) {
                    if let (Ok(i), Ok(j)) = (i.trim().parse::<u32>(), j.trim().parse::<u32>()) {
                        if tail == "1" {
                            pairs_above.push((i, j));
                        }
                    }
                }
            }
        }
    }

    let score = score.ok_or(PipelineError::BackendFailure {
        backend: kind.program(),
        exit_code: None,
        stderr: "solver stdout did not report an objective value".to_string(),
    })?;
    Ok(BackendSolution { score, pairs_above })
}

/// Write a standard integer-program formulation of the Kemeny problem
/// restricted to `block`'s candidates, in CPLEX LP format. One binary
/// variable `x_a_b` per ordered pair of distinct candidates means "`a`
/// ranked above `b`"; the objective minimizes the cost of every variable
/// assignment, subject to antisymmetry and transitivity over every
/// triple. This is a mechanical translation of the score definition, not
/// solving logic.
pub fn write_lp(election: &Election, block: &CandidateSet, path: &Path) -> PipelineResult<()> {
    let members: Vec<CandidateId> = block.iter().copied().collect();
    let var = |a: CandidateId, b: CandidateId| format!("x_{}_{}", a.index(), b.index());

    let mut lp = String::from("Minimize\n obj: ");
    let mut terms = Vec::new();
    for &a in &members {
        for &b in &members {
            if a == b {
                continue;
            }
            let cost = election.subscore(b, a);
            if cost != 0 {
                terms.push(format!("{} {}", cost, var(a, b)));
            }
        }
    }
    if terms.is_empty() {
        lp.push('0');
    } else {
        lp.push_str(&terms.join(" + "));
    }

    lp.push_str("\nSubject To\n");
    for i in 0..members.len() {
        for j in (i + 1)..members.len() {
            let (a, b) = (members[i], members[j]);
            lp.push_str(&format!(
                " c_sym_{}_{}: {} + {} = 1\n",
                a.index(),
                b.index(),
                var(a, b),
                var(b, a)
            ));
        }
    }
    for &a in &members {
        for &b in &members {
            if a == b {
                continue;
            }
            for &c in &members {
                if c == a || c == b {
                    continue;
                }
                lp.push_str(&format!(
                    " c_trans_{}_{}_{}: {} + {} - {} <= 1\n",
                    a.index(),
                    b.index(),
                    c.index(),
                    var(a, b),
                    var(b, c),
                    var(a, c)
                ));
            }
        }
    }

    lp.push_str("Binary\n");
    for &a in &members {
        for &b in &members {
            if a != b {
                lp.push_str(&format!(" {}\n", var(a, b)));
            }
        }
    }
    lp.push_str("End\n");

    std::fs::write(path, lp).map_err(|e| PipelineError::BackendFailure {
        backend: "lp_writer",
        exit_code: None,
        stderr: e.to_string(),
    })
}

/// Reconstruct a ranking from the solver's `x(i,j) = 1` assignments:
/// a candidate's rank is how many others it loses to (is ranked below),
/// which is well-defined whenever the solver's transitivity constraints
/// held. Ties (malformed or partial output) break on ascending candidate
/// id, same as everywhere else in this engine.
pub fn ranking_from_solution(block: &CandidateSet, solution: &BackendSolution) -> Vec<CandidateId> {
    let members: Vec<CandidateId> = block.iter().copied().collect();
    let above: HashSet<(u32, u32)> = solution.pairs_above.iter().copied().collect();

    let mut ranked: Vec<(usize, CandidateId)> = members
        .iter()
        .map(|&c| {
            let losses = members
                .iter()
                .filter(|&&other| other != c && above.contains(&(other.0, c.0)))
                .count();
            (losses, c)
        })
        .collect();
    ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1 .0.cmp(&b.1 .0)));
    ranked.into_iter().map(|(_, c)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_program_names_match_spec_list() {
        assert_eq!(BackendKind::Glpsol.program(), "glpsol");
        assert_eq!(BackendKind::Cplex.program(), "cplex");
        assert_eq!(BackendKind::GurobiCl.program(), "gurobi_cl");
        assert_eq!(BackendKind::LinOrder.program(), "linOrder");
    }

    #[test]
    fn parse_markers_reads_objective_and_pairs() {
        let stdout = "some banner\nBest objective 4.000000 after node 1\nx(0,1) 1\nx(1,2) 0\nx(0,2) 1\n";
        let parsed = parse_markers(stdout, BackendKind::Glpsol).unwrap();
        assert_eq!(parsed.score, 4);
        assert_eq!(parsed.pairs_above, vec![(0, 1), (0, 2)]);
    }

    #[test]
    fn parse_markers_without_objective_is_an_error() {
        assert!(parse_markers("no markers here\n", BackendKind::Glpsol).is_err());
    }

    #[test]
    fn ranking_from_solution_orders_by_loss_count() {
        let block: CandidateSet = [CandidateId::from(0), CandidateId::from(1), CandidateId::from(2)]
            .into_iter()
            .collect();
        let solution = BackendSolution {
            score: 1,
            pairs_above: vec![(0, 1), (0, 2), (1, 2)],
        };
        let ranking = ranking_from_solution(&block, &solution);
        assert_eq!(
            ranking,
            vec![CandidateId::from(0), CandidateId::from(1), CandidateId::from(2)]
        );
    }
}
