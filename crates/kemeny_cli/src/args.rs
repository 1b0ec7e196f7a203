//! Command-line surface (`spec.md` §6): flag parsing plus the
//! domain-specific validation clap's derive can't express on its own
//! (numeric conversions, the rules-selection mask, the set-choice name).
//!
//! Numeric-looking flags are read as `String` and converted here rather
//! than letting clap parse them directly, so a bad value reports through
//! this crate's own [`CliError`] — and the `BadConversion` exit code
//! `spec.md` §7 names — instead of clap's generic usage-error path.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use kemeny_pipeline::{RuleFlags, SetChoice};

#[derive(Debug, Parser)]
#[command(
    name = "kemeny",
    about = "Compute a Kemeny consensus ranking from a ballot file (or stdin)."
)]
struct Args {
    /// Ballot file; reads stdin when omitted.
    #[arg(long = "election-file", short = 'e')]
    election_file: Option<PathBuf>,

    #[arg(long = "solve-with-modus", short = 's', default_value = "1")]
    modus: String,

    #[arg(long = "partitionate-with-datareductions", short = 'p')]
    partitionate: bool,

    #[arg(long = "rules-selection-mode", short = 'r', default_value = "0000")]
    rules_selection_mode: String,

    #[arg(long = "set-choice-method", default_value = "smallestInstance")]
    set_choice_method: String,

    #[arg(long = "extract-instances-maxsize", short = 'x')]
    extract_instances_maxsize: Option<String>,

    #[arg(long = "keep-all-solutions", short = 'k')]
    keep_all_solutions: bool,

    #[arg(long = "timelimit", short = 't', default_value = "60")]
    timelimit: String,

    #[arg(long = "nondirty-majority-ratio", short = 'm', default_value = "0.75")]
    majority_ratio: String,

    #[arg(long = "print-information", short = 'i')]
    print_information: bool,

    #[arg(long, conflicts_with = "brief")]
    verbose: bool,
    #[arg(long, conflicts_with = "verbose")]
    brief: bool,
}

/// Validated, typed replacement for the raw [`Args`] — what `main.rs`
/// actually works with.
#[derive(Debug)]
pub struct Config {
    pub election_file: Option<PathBuf>,
    pub modus: i64,
    pub partitionate: bool,
    pub rule_flags: RuleFlags,
    pub set_choice: SetChoice,
    pub max_set_size: Option<usize>,
    pub keep_all_solutions: bool,
    pub timelimit: Duration,
    pub majority_ratio: f64,
    pub print_information: bool,
    pub verbose: bool,
}

/// `spec.md` §7's error kinds that originate at the CLI boundary, before
/// any ballot is read.
#[derive(Debug)]
pub enum CliError {
    ArgumentsRequired(String),
    FileNotFound(String),
    BadConversion { from: String, to: &'static str },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::ArgumentsRequired(msg) => write!(f, "{msg}"),
            CliError::FileNotFound(path) => write!(f, "election file not found: {path}"),
            CliError::BadConversion { from, to } => {
                write!(f, "cannot convert {from:?} to {to}")
            }
        }
    }
}

impl std::error::Error for CliError {}

pub fn parse_and_validate() -> Result<Config, CliError> {
    let args = Args::parse();

    if let Some(path) = &args.election_file {
        let meta = fs::metadata(path).map_err(|_| CliError::FileNotFound(path.display().to_string()))?;
        if !meta.is_file() {
            return Err(CliError::FileNotFound(path.display().to_string()));
        }
    }

    let modus = args.modus.parse::<i64>().map_err(|_| CliError::BadConversion {
        from: args.modus.clone(),
        to: "integer modus (--solve-with-modus)",
    })?;

    let rule_flags = RuleFlags::from_bits(&args.rules_selection_mode).map_err(|_| {
        CliError::ArgumentsRequired(format!(
            "--rules-selection-mode must be a 4-bit binary string, got {:?}",
            args.rules_selection_mode
        ))
    })?;

    let set_choice = parse_set_choice(&args.set_choice_method)?;

    let max_set_size = match &args.extract_instances_maxsize {
        Some(s) => Some(s.parse::<usize>().map_err(|_| CliError::BadConversion {
            from: s.clone(),
            to: "instance size (--extract-instances-maxsize)",
        })?),
        None => None,
    };

    let timelimit_secs = args.timelimit.parse::<f64>().map_err(|_| CliError::BadConversion {
        from: args.timelimit.clone(),
        to: "seconds (--timelimit)",
    })?;
    if !(timelimit_secs.is_finite() && timelimit_secs > 0.0) {
        return Err(CliError::BadConversion {
            from: args.timelimit.clone(),
            to: "seconds (--timelimit)",
        });
    }

    let majority_ratio = args.majority_ratio.parse::<f64>().map_err(|_| CliError::BadConversion {
        from: args.majority_ratio.clone(),
        to: "ratio (--nondirty-majority-ratio)",
    })?;
    if !(0.0..=1.0).contains(&majority_ratio) {
        return Err(CliError::BadConversion {
            from: args.majority_ratio.clone(),
            to: "ratio (--nondirty-majority-ratio)",
        });
    }

    Ok(Config {
        election_file: args.election_file,
        modus,
        partitionate: args.partitionate,
        rule_flags,
        set_choice,
        max_set_size,
        keep_all_solutions: args.keep_all_solutions,
        timelimit: Duration::from_secs_f64(timelimit_secs),
        majority_ratio,
        print_information: args.print_information,
        verbose: args.verbose,
    })
}

fn parse_set_choice(s: &str) -> Result<SetChoice, CliError> {
    match s {
        "smallestInstance" => Ok(SetChoice::Smallest),
        "halfOfInstance" => Ok(SetChoice::Half),
        "thirdOfInstance" => Ok(SetChoice::Third),
        "biggestInstance" => Ok(SetChoice::Biggest),
        other => Err(CliError::ArgumentsRequired(format!(
            "--set-choice-method must be one of smallestInstance|halfOfInstance|thirdOfInstance|biggestInstance, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_to_dp_mode_with_no_reduction() {
        let args = Args::parse_from(["kemeny", "-e", "/dev/null"]);
        assert_eq!(args.modus, "1");
        assert!(!args.partitionate);
        assert_eq!(args.rules_selection_mode, "0000");
    }

    #[test]
    fn verbose_and_brief_are_mutually_exclusive() {
        let err = Args::try_parse_from(["kemeny", "--verbose", "--brief"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn set_choice_rejects_unknown_name() {
        assert!(matches!(
            parse_set_choice("weirdInstance"),
            Err(CliError::ArgumentsRequired(_))
        ));
        assert_eq!(parse_set_choice("biggestInstance").unwrap(), SetChoice::Biggest);
    }

    #[test]
    fn missing_election_file_reports_not_found() {
        let args = Args::parse_from(["kemeny", "-e", "/no/such/path/at/all"]);
        let meta = fs::metadata(&args.election_file.unwrap());
        assert!(meta.is_err());
    }
}
