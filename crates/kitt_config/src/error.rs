//! Error types for configuration loading and validation.

use std::path::PathBuf;

/// Errors that can occur when loading or validating a `kitt.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// File that was opened.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The TOML content could not be parsed into the configuration tables.
    #[error("invalid kitt.toml: {0}")]
    Parse(String),

    /// A signal or design name is empty.
    #[error("{0} must not be empty")]
    MissingField(String),

    /// A design constant is out of range or inconsistent with another.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted key of the offending value, e.g. `scanner.pwm_duty[1]`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_field() {
        let err = ConfigError::MissingField("signals.clock".to_string());
        assert_eq!(format!("{err}"), "signals.clock must not be empty");
    }

    #[test]
    fn display_parse_error() {
        let err = ConfigError::Parse("expected '=' at line 3".to_string());
        assert_eq!(format!("{err}"), "invalid kitt.toml: expected '=' at line 3");
    }

    #[test]
    fn display_invalid_value() {
        let err = ConfigError::invalid("debounce.sample_interval", "must be at least 1");
        assert_eq!(
            format!("{err}"),
            "debounce.sample_interval: must be at least 1"
        );
    }

    #[test]
    fn read_error_names_the_file() {
        let err = ConfigError::Read {
            path: PathBuf::from("/work/scanner/kitt.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        assert_eq!(
            format!("{err}"),
            "failed to read /work/scanner/kitt.toml: file not found"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
