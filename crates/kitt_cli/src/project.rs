//! Shared helpers for CLI commands: locating and loading `kitt.toml`,
//! turning `--cycles`/`--time` into a cycle count, and formatting status lines.

use std::path::{Path, PathBuf};

use kitt_common::parse_duration;
use kitt_config::{clock_frequency, load_config, load_config_file, KittConfig, CONFIG_FILE};

use crate::GlobalArgs;

/// A loaded configuration and the directory it belongs to.
#[derive(Debug)]
pub struct Project {
    /// Directory holding `kitt.toml`, or the working directory when running
    /// on built-in defaults.
    pub root: PathBuf,
    /// The parsed configuration.
    pub config: KittConfig,
}

/// Walks up from `start` looking for the nearest directory containing `kitt.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in '{}' or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Loads the configuration selected by the global flags.
///
/// `--config` names a file or a directory containing `kitt.toml`. Without
/// it, the nearest `kitt.toml` above the working directory is used, and the
/// built-in defaults when there is none.
pub fn load_project(global: &GlobalArgs) -> Result<Project, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            let root = p
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            return Ok(Project {
                root,
                config: load_config_file(&p)?,
            });
        }
        return Ok(Project {
            config: load_config(&p)?,
            root: p,
        });
    }

    let cwd = std::env::current_dir()?;
    match find_project_root(&cwd) {
        Ok(root) => Ok(Project {
            config: load_config(&root)?,
            root,
        }),
        Err(e) => {
            log::warn!("{e}; using built-in defaults");
            Ok(Project {
                root: cwd,
                config: KittConfig::default(),
            })
        }
    }
}

/// Resolves `--cycles` or `--time` into a cycle count at the configured clock.
///
/// Returns `None` when neither is given.
pub fn resolve_cycles(
    cycles: Option<u64>,
    time: Option<&str>,
    config: &KittConfig,
) -> Result<Option<u64>, Box<dyn std::error::Error>> {
    match (cycles, time) {
        (Some(n), _) => Ok(Some(n)),
        (None, Some(t)) => {
            let duration = parse_duration(t)?;
            let freq = clock_frequency(config)?;
            let n = freq
                .cycles_in(duration)
                .ok_or_else(|| format!("clock {freq} has no usable period"))?;
            log::debug!("{t} at {freq} is {n} cycles");
            Ok(Some(n))
        }
        (None, None) => Ok(None),
    }
}

/// Tone of a status line label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    /// Progress and success, bold green.
    Ok,
    /// Failure, bold red.
    Fail,
}

/// Formats a status line with `label` right-aligned in 12 columns.
///
/// The label is colored with ANSI codes when `--color` resolved to on.
pub fn status_line(global: &GlobalArgs, tone: Tone, label: &str, message: &str) -> String {
    if global.color {
        let code = match tone {
            Tone::Ok => "32",
            Tone::Fail => "31",
        };
        format!("\x1b[1;{code}m{label:>12}\x1b[0m {message}")
    } else {
        format!("{label:>12} {message}")
    }
}
