//! The `--verbose` renderer (`spec.md` §6, §7): a short banner describing
//! how the instance was solved, followed by the same final
//! `score=<n> consensus=<names>` line `--brief` prints alone — so scripts
//! grepping for that line work in either mode.

use crate::structure::ReportModel;

pub fn render_human(model: &ReportModel) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "candidates={} ballots={} blocks={} bounds=[{}, {}] mode={}",
        model.num_candidates, model.num_ballots, model.num_blocks, model.lower_bound, model.upper_bound, model.mode_label
    ));
    lines.push(format!("elapsed={}", model.elapsed_display));
    if model.cancelled {
        let reason = model.cancel_reason.as_deref().unwrap_or("unknown");
        lines.push(format!("cancelled: {}", reason));
    }
    lines.push(final_line(model));
    lines.join("\n")
}

/// The one line both renderers agree on (`spec.md` §7).
pub fn final_line(model: &ReportModel) -> String {
    format!("score={} consensus={}", model.score_display, model.consensus_display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{build_model, RunOutcome};
    use std::time::Duration;

    fn solved() -> RunOutcome {
        RunOutcome {
            mode_label: "DP".to_string(),
            num_candidates: 3,
            num_ballots: 10,
            lower_bound: 1,
            upper_bound: 5,
            num_blocks: 1,
            score: Some(4),
            consensus_names: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            elapsed: Duration::from_millis(250),
            cancel_reason: None,
        }
    }

    #[test]
    fn human_render_ends_with_the_brief_line() {
        let model = build_model(&solved());
        let text = render_human(&model);
        assert_eq!(text.lines().last(), Some("score=4 consensus=a b c"));
    }

    #[test]
    fn cancelled_run_reports_its_reason_before_the_final_line() {
        let mut outcome = solved();
        outcome.score = None;
        outcome.consensus_names.clear();
        outcome.cancel_reason = Some("ram_out".to_string());
        let model = build_model(&outcome);
        let text = render_human(&model);
        assert!(text.contains("cancelled: ram_out"));
        assert_eq!(text.lines().last(), Some("score=-1 consensus="));
    }
}
