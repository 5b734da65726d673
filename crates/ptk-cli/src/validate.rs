//! # Validate Subcommand
//!
//! Applies the intake field invariants to a submission file without
//! storing or verifying it.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::load_submission;

/// Arguments for the `ptk validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Submission file (JSON or YAML).
    #[arg(value_name = "FILE")]
    pub path: PathBuf,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when valid, 1 when any field invariant fails.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let submission = load_submission(&args.path)?;
    match submission.validate() {
        Ok(()) => {
            println!("OK: {} ({})", submission.asset_name, args.path.display());
            Ok(0)
        }
        Err(err) => {
            println!(
                "FAIL: {} ({} violation(s))",
                args.path.display(),
                err.violations.len()
            );
            for violation in &err.violations {
                println!("  {}: {}", violation.field, violation.message);
            }
            Ok(1)
        }
    }
}
