//! kitt: the command-line interface of the KITT scanner reference model.
//!
//! Provides `kitt init` to write a starter configuration, `kitt sim` to run
//! the model and record a golden waveform, and `kitt check` to compare a
//! hardware simulation trace against the model cycle by cycle.

#![warn(missing_docs)]

mod check;
mod init;
mod project;
mod sim;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Cycle-accurate reference model and equivalence checker for the KITT scanner.
#[derive(Parser, Debug)]
#[command(name = "kitt", version, about = "KITT scanner reference model")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a `kitt.toml` file or the directory holding one.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a starter `kitt.toml`.
    Init {
        /// Directory to initialize (created if missing). Defaults to the
        /// current directory.
        dir: Option<String>,

        /// Overwrite an existing `kitt.toml`.
        #[arg(long)]
        force: bool,
    },
    /// Run the model from the stimulus script and record a golden waveform.
    Sim(SimArgs),
    /// Check a hardware trace against the model.
    Check(CheckArgs),
}

/// Arguments for the `kitt sim` subcommand.
#[derive(Parser, Debug)]
pub struct SimArgs {
    /// Number of clock cycles to simulate.
    #[arg(long, conflicts_with = "time")]
    pub cycles: Option<u64>,

    /// Simulated time (e.g., "100us", "10ms"), converted at the configured clock.
    #[arg(long)]
    pub time: Option<String>,

    /// Output path for the waveform (`.vcd`, or `.vcd.gz` to compress).
    #[arg(short, long)]
    pub output: Option<String>,

    /// Summary format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `kitt check` subcommand.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Hardware trace (`.vcd` or `.vcd.gz`).
    pub trace: String,

    /// Check at most this many clock edges.
    #[arg(long, conflicts_with = "time")]
    pub cycles: Option<u64>,

    /// Check at most this much simulated time.
    #[arg(long)]
    pub time: Option<String>,

    /// Report format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a config file or directory.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    init_logging(cli.quiet, cli.verbose, color);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Init { dir, force } => init::run(dir, force, &global),
        Command::Sim(ref args) => sim::run(args, &global),
        Command::Check(ref args) => check::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Default log filter for the verbosity flags.
fn log_level(quiet: bool, verbose: bool) -> log::LevelFilter {
    if quiet {
        log::LevelFilter::Error
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    }
}

/// Installs `env_logger`; `RUST_LOG` overrides the level chosen by flags.
fn init_logging(quiet: bool, verbose: bool, color: bool) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(log_level(quiet, verbose))
        .parse_default_env()
        .write_style(if color {
            env_logger::WriteStyle::Always
        } else {
            env_logger::WriteStyle::Never
        })
        .format_timestamp(None);
    if let Err(e) = builder.try_init() {
        eprintln!("warning: logging disabled: {e}");
    }
}
