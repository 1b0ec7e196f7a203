//! kemeny_report — turns one finished (or cancelled) run into the two
//! textual forms `spec.md` §6/§7 describe: a one-line `--brief` summary
//! and a multi-line `--verbose` one, built from the same
//! [`structure::ReportModel`] so both stay in sync.
//!
//! Grounded in the teacher's `vm_report`: pure, offline, no network, no
//! filesystem access, a model built once and handed to interchangeable
//! renderers. The teacher's model covered multi-section legitimacy/
//! frontier/integrity reports rendered as JSON or HTML; this one reports
//! a single ranking and score as TSV or plain text, so the HTML renderer
//! and its `minijinja` dependency have no counterpart here.

#![forbid(unsafe_code)]

pub mod render_human;
pub mod render_table;
pub mod structure;

pub use render_human::{final_line, render_human};
pub use render_table::render_table;
pub use structure::{build_model, ReportModel, RunOutcome};
