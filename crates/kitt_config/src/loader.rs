//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::KittConfig;
use kitt_common::Frequency;
use std::path::Path;

/// File name looked up in a project directory.
pub const CONFIG_FILE: &str = "kitt.toml";

/// Loads and validates a `kitt.toml` configuration from a project directory.
///
/// Reads `<project_dir>/kitt.toml`, parses it, and validates the constants.
pub fn load_config(project_dir: &Path) -> Result<KittConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE))
}

/// Loads and validates a configuration from an explicit file path.
pub fn load_config_file(path: &Path) -> Result<KittConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("loaded configuration from {}", path.display());
    load_config_from_str(&content)
}

/// Parses and validates a `kitt.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<KittConfig, ConfigError> {
    let config: KittConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required names are present and the design constants are
/// consistent with each other.
pub fn validate_config(config: &KittConfig) -> Result<(), ConfigError> {
    if config.design.name.is_empty() {
        return Err(ConfigError::MissingField("design.name".to_string()));
    }
    clock_frequency(config)?;

    if config.debounce.sample_interval == 0 {
        return Err(ConfigError::invalid(
            "debounce.sample_interval",
            "must be at least 1",
        ));
    }

    let scanner = &config.scanner;
    for (field, ticks) in [
        ("scanner.speed_slow_ticks", scanner.speed_slow_ticks),
        ("scanner.speed_fast_ticks", scanner.speed_fast_ticks),
    ] {
        if ticks == 0 {
            return Err(ConfigError::invalid(field, "must be at least 1"));
        }
    }
    if scanner.pwm_period == 0 {
        return Err(ConfigError::invalid("scanner.pwm_period", "must be at least 1"));
    }
    for (k, &duty) in scanner.pwm_duty.iter().enumerate() {
        if duty == 0 || duty > scanner.pwm_period {
            return Err(ConfigError::invalid(
                format!("scanner.pwm_duty[{k}]"),
                format!("{duty} must be within 1..={}", scanner.pwm_period),
            ));
        }
    }

    let signals = &config.signals;
    for (field, name) in [
        ("signals.clock", &signals.clock),
        ("signals.reset_n", &signals.reset_n),
        ("signals.inputs", &signals.inputs),
        ("signals.pwm_out", &signals.pwm_out),
    ] {
        if name.is_empty() {
            return Err(ConfigError::MissingField(field.to_string()));
        }
    }

    for pair in config.stimulus.windows(2) {
        if pair[1].cycle <= pair[0].cycle {
            return Err(ConfigError::invalid(
                "stimulus.cycle",
                format!(
                    "cycles must be strictly increasing ({} follows {})",
                    pair[1].cycle, pair[0].cycle
                ),
            ));
        }
    }

    Ok(())
}

/// Parses the configured clock frequency.
pub fn clock_frequency(config: &KittConfig) -> Result<Frequency, ConfigError> {
    let freq: Frequency = config
        .design
        .clock
        .parse::<Frequency>()
        .map_err(|e| ConfigError::invalid("design.clock", e.to_string()))?;
    if freq.period_fs().is_none() {
        return Err(ConfigError::invalid(
            "design.clock",
            format!("{freq} has no usable period"),
        ));
    }
    Ok(freq)
}
