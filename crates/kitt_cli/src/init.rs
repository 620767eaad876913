//! `kitt init`: write a starter `kitt.toml`.
//!
//! The template spells out every table with the built-in defaults so the
//! constants can be edited to match the design under test.

use std::fs;
use std::path::{Path, PathBuf};

use kitt_config::CONFIG_FILE;

use crate::project::{status_line, Tone};
use crate::GlobalArgs;

/// Runs the `kitt init` command.
///
/// Creates `dir` if needed (the working directory when `None`) and writes
/// `kitt.toml` into it. Refuses to overwrite an existing file unless `force`.
pub fn run(
    dir: Option<String>,
    force: bool,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = match dir {
        Some(d) => PathBuf::from(d),
        None => std::env::current_dir()?,
    };
    fs::create_dir_all(&project_dir)?;

    let path = project_dir.join(CONFIG_FILE);
    if path.exists() && !force {
        return Err(format!(
            "'{}' already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }

    let name = design_name(&project_dir);
    fs::write(&path, template(&name))?;
    if !global.quiet {
        eprintln!(
            "{}",
            status_line(global, Tone::Ok, "Created", &path.display().to_string())
        );
    }
    Ok(0)
}

/// Design name derived from the directory, falling back to the default.
fn design_name(dir: &Path) -> String {
    dir.file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("kitt_scanner")
        .to_string()
}

fn template(name: &str) -> String {
    format!(
        r#"[design]
name = "{name}"
clock = "10MHz"

[debounce]
# Cycles between samples of the raw enable button (25 ms at 10 MHz).
sample_interval = 250000

[scanner]
# Cycles per comet step (150 ms and 100 ms at 10 MHz).
speed_slow_ticks = 1500000
speed_fast_ticks = 1000000
# PWM period and the on-time of the three tail taps (25 %, 10 % and 5 %).
pwm_period = 1000
pwm_duty = [250, 100, 50]
# "mirror" drives the LED bus with the comet; "dark" keeps it off.
led_array = "mirror"
# "reject" stops on modes without a modeled sequence; "stall" waits in CAPTURE.
unsupported_mode = "reject"

[signals]
clock = "tb.clk"
reset_n = "tb.rst_n"
inputs = "tb.ui_in"
pwm_out = "tb.uo_out"
# led_out = "tb.uio_out"
# enable_out = "tb.user_project.enable_out"
# state = "tb.user_project.state"
# pwm_count = "tb.user_project.pwm_count"

[trace]
sample_point = "before_edge"

# Golden-run inputs; each step holds until the next.
[[stimulus]]
cycle = 0
reset_n = false
inputs = 0

[[stimulus]]
cycle = 10
inputs = 0

[[stimulus]]
cycle = 20
inputs = "0b10_1001"
"#
    )
}
