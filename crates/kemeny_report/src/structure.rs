//! The report model: raw run outcome in, presentation-ready strings out
//! (`spec.md` §7's user-visible behavior). Built once per run and handed
//! to both renderers, mirroring the teacher's "build the model once,
//! render it many ways" split — just with a much smaller model, since
//! this engine reports one ranking and a score rather than a multi-section
//! legitimacy/frontier/integrity document.

use std::time::Duration;

/// Everything the CLI knows about a finished (or cancelled) run, before
/// any formatting decisions are made.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    /// Human label for the solver path actually used, e.g. `"DP"`,
    /// `"SearchTree(cap=4)"`, `"RandomBallot"`, or a backend's program
    /// name.
    pub mode_label: String,
    pub num_candidates: usize,
    pub num_ballots: usize,
    pub lower_bound: u64,
    pub upper_bound: u64,
    /// Number of independent blocks the reduction engine produced (`1`
    /// when reduction was not requested or found nothing to split).
    pub num_blocks: usize,
    /// `None` once the run was cancelled (`spec.md` §5's sentinel).
    pub score: Option<u64>,
    /// Candidate names in consensus order, already translated back from
    /// anonymized ids through `kemeny_io::dictionary::Dictionary`. Empty
    /// when `score` is `None`.
    pub consensus_names: Vec<String>,
    pub elapsed: Duration,
    /// Set only when `score` is `None`: why the run was cancelled.
    pub cancel_reason: Option<String>,
}

/// Presentation-ready strings for both renderers.
#[derive(Clone, Debug)]
pub struct ReportModel {
    pub mode_label: String,
    pub num_candidates: usize,
    pub num_ballots: usize,
    pub lower_bound: u64,
    pub upper_bound: u64,
    pub num_blocks: usize,
    pub cancelled: bool,
    pub cancel_reason: Option<String>,
    /// `"<n>"` if solved, `"-1"` if cancelled (`spec.md` §5, §7).
    pub score_display: String,
    /// Space-separated candidate names, best to worst; empty if
    /// cancelled.
    pub consensus_display: String,
    pub elapsed_display: String,
}

/// Build the presentation model from a raw outcome. Pure formatting — no
/// I/O, no randomness.
pub fn build_model(outcome: &RunOutcome) -> ReportModel {
    let cancelled = outcome.score.is_none();
    let score_display = match outcome.score {
        Some(s) => s.to_string(),
        None => "-1".to_string(),
    };
    let consensus_display = outcome.consensus_names.join(" ");
    let elapsed_display = format_duration(outcome.elapsed);

    ReportModel {
        mode_label: outcome.mode_label.clone(),
        num_candidates: outcome.num_candidates,
        num_ballots: outcome.num_ballots,
        lower_bound: outcome.lower_bound,
        upper_bound: outcome.upper_bound,
        num_blocks: outcome.num_blocks,
        cancelled,
        cancel_reason: outcome.cancel_reason.clone(),
        score_display,
        consensus_display,
        elapsed_display,
    }
}

/// `12.345s`-style formatting without pulling in a time-formatting crate
/// for one field.
fn format_duration(d: Duration) -> String {
    format!("{:.3}s", d.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(score: Option<u64>) -> RunOutcome {
        RunOutcome {
            mode_label: "DP".to_string(),
            num_candidates: 3,
            num_ballots: 10,
            lower_bound: 1,
            upper_bound: 5,
            num_blocks: 1,
            score,
            consensus_names: if score.is_some() {
                vec!["alice".to_string(), "bob".to_string(), "carol".to_string()]
            } else {
                Vec::new()
            },
            elapsed: Duration::from_millis(1500),
            cancel_reason: if score.is_none() {
                Some("timeout".to_string())
            } else {
                None
            },
        }
    }

    #[test]
    fn solved_run_formats_score_and_consensus() {
        let model = build_model(&sample(Some(4)));
        assert!(!model.cancelled);
        assert_eq!(model.score_display, "4");
        assert_eq!(model.consensus_display, "alice bob carol");
        assert_eq!(model.elapsed_display, "1.500s");
    }

    #[test]
    fn cancelled_run_reports_sentinel_score() {
        let model = build_model(&sample(None));
        assert!(model.cancelled);
        assert_eq!(model.score_display, "-1");
        assert_eq!(model.consensus_display, "");
        assert_eq!(model.cancel_reason.as_deref(), Some("timeout"));
    }
}
