//! The `--brief` renderer (`spec.md` §6, §7): one tab-separated line, for
//! piping into scripts or spreadsheets rather than reading directly.

use crate::structure::ReportModel;

/// Column order: score, consensus, elapsed, candidates, ballots, blocks,
/// mode. `consensus` is itself space-separated (TSV only requires tabs
/// between fields, not within one).
pub fn render_table(model: &ReportModel) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        model.score_display,
        model.consensus_display,
        model.elapsed_display,
        model.num_candidates,
        model.num_ballots,
        model.num_blocks,
        model.mode_label,
    )
}
