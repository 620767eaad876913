//! `kitt sim`: run the reference model from the stimulus script and record
//! a golden waveform.

use std::path::PathBuf;

use kitt_check::write_golden;
use kitt_common::format_fs;

use crate::project::{load_project, resolve_cycles, status_line, Tone};
use crate::{GlobalArgs, ReportFormat, SimArgs};

/// Cycles simulated when neither `--cycles` nor `--time` is given.
pub const DEFAULT_SIM_CYCLES: u64 = 10_000;

/// Runs the `kitt sim` command.
///
/// Writes the waveform to `--output`, or to `out/<design>.vcd` under the
/// project directory. Returns exit code 0 on success.
pub fn run(args: &SimArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let config = &project.config;
    let cycles = resolve_cycles(args.cycles, args.time.as_deref(), config)?
        .unwrap_or(DEFAULT_SIM_CYCLES);

    let output = match &args.output {
        Some(p) => PathBuf::from(p),
        None => {
            let out_dir = project.root.join("out");
            std::fs::create_dir_all(&out_dir)?;
            out_dir.join(format!("{}.vcd", config.design.name))
        }
    };

    if !global.quiet {
        eprintln!(
            "{}",
            status_line(
                global,
                Tone::Ok,
                "Simulating",
                &format!("{} for {cycles} cycles", config.design.name),
            )
        );
    }
    let summary = write_golden(&output, config, cycles)?;

    match args.format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        ReportFormat::Text => {
            if !global.quiet {
                let finished = format!(
                    "{} cycles ({}) with {} comet steps, final state {}",
                    summary.cycles,
                    format_fs(summary.cycles.saturating_mul(summary.period_fs)),
                    summary.advances,
                    summary.final_state.scanner.state,
                );
                eprintln!("{}", status_line(global, Tone::Ok, "Finished", &finished));
                if global.verbose {
                    eprintln!("{:>12} {}", "", summary.final_state);
                }
                eprintln!(
                    "{}",
                    status_line(global, Tone::Ok, "Waveform", &output.display().to_string())
                );
            }
        }
    }
    Ok(0)
}
