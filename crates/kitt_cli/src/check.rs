//! `kitt check`: replay a hardware trace through the equivalence checker.

use std::path::Path;

use kitt_check::{check_trace, CheckError};
use serde_json::json;

use crate::project::{load_project, resolve_cycles, status_line, Tone};
use crate::{CheckArgs, GlobalArgs, ReportFormat};

/// Runs the `kitt check` command.
///
/// Returns exit code 0 when every compared cycle matches and 1 on the first
/// divergence. Trace, configuration and input errors are returned as errors.
pub fn run(args: &CheckArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let config = &project.config;
    let limit = resolve_cycles(args.cycles, args.time.as_deref(), config)?;
    let trace = Path::new(&args.trace);

    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!(
            "{}",
            status_line(
                global,
                Tone::Ok,
                "Checking",
                &format!("{} against {}", trace.display(), config.design.name),
            )
        );
    }

    match check_trace(trace, config, limit) {
        Ok(summary) => {
            match args.format {
                ReportFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "status": "pass",
                        "summary": summary,
                    }))?
                ),
                ReportFormat::Text => {
                    if !global.quiet {
                        eprintln!(
                            "{}",
                            status_line(global, Tone::Ok, "PASS", &summary.to_string())
                        );
                    }
                }
            }
            Ok(0)
        }
        Err(CheckError::Divergence(d)) => {
            match args.format {
                ReportFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "status": "fail",
                        "divergence": d,
                    }))?
                ),
                ReportFormat::Text => {
                    eprintln!("{}", status_line(global, Tone::Fail, "FAIL", &d.to_string()));
                }
            }
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}
