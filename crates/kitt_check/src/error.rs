//! Error types for trace loading and equivalence checking.

use std::fmt;

use kitt_common::format_fs;
use kitt_config::ConfigError;
use kitt_model::{ModelError, ModelSnapshot};
use serde::Serialize;

use crate::probe::EdgeSample;

/// Errors that can occur while loading or resolving a VCD trace.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// An I/O error occurred while reading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A parse error at a specific line number.
    #[error("parse error at line {line}: {message}")]
    ParseError {
        /// The 1-based line number where the error occurred.
        line: usize,
        /// Description of the error.
        message: String,
    },
    /// The VCD file has a structural format error.
    #[error("format error: {0}")]
    FormatError(String),
    /// A configured signal is not declared in the trace.
    #[error("signal '{name}' not found in trace")]
    MissingSignal {
        /// The hierarchical name that was looked up.
        name: String,
    },
    /// A signal is declared with an unexpected width.
    #[error("signal '{name}' is {found} bits wide, expected {expected}")]
    WidthMismatch {
        /// The hierarchical name.
        name: String,
        /// Width the checker needs.
        expected: u32,
        /// Width declared in the trace.
        found: u32,
    },
    /// The clock never rises in the trace.
    #[error("clock '{0}' has no rising edges")]
    NoClockEdges(String),
}

/// Errors that end an equivalence check.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// Model and hardware disagree. Fatal: later cycles are not compared.
    #[error("{0}")]
    Divergence(Box<Divergence>),
    /// A hardware input the model consumes is `X` or `Z` out of reset.
    #[error("cycle {cycle}: input '{signal}' is not fully driven ({value})")]
    UnknownInput {
        /// Cycle index of the edge.
        cycle: u64,
        /// Which input.
        signal: String,
        /// The sampled value.
        value: String,
    },
    /// The model rejected its inputs.
    #[error("cycle {cycle}: {source}")]
    Model {
        /// Cycle index of the edge.
        cycle: u64,
        /// The model's error.
        source: ModelError,
    },
    /// The trace could not be loaded.
    #[error(transparent)]
    Trace(#[from] TraceError),
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Writing an output file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<Divergence> for CheckError {
    fn from(d: Divergence) -> Self {
        CheckError::Divergence(Box::new(d))
    }
}

/// The first cycle on which model and hardware outputs differ.
#[derive(Debug, Clone, Serialize)]
pub struct Divergence {
    /// Cycle index of the edge.
    pub cycle: u64,
    /// Time of the rising edge.
    pub time_fs: u64,
    /// Name of the compared signal (`pwm_out`, `led_out` or `enable_out`).
    pub signal: String,
    /// Model value, MSB first.
    pub expected: String,
    /// Hardware value, MSB first.
    pub actual: String,
    /// Bit indices that differ, lowest first.
    pub bits: Vec<u32>,
    /// Model registers after the edge.
    pub model: ModelSnapshot,
    /// Hardware values sampled for the edge.
    pub hardware: EdgeSample,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits: Vec<String> = self.bits.iter().map(|b| b.to_string()).collect();
        writeln!(
            f,
            "divergence on '{}' at cycle {} ({}): model={} hardware={} bits=[{}]",
            self.signal,
            self.cycle,
            format_fs(self.time_fs),
            self.expected,
            self.actual,
            bits.join(","),
        )?;
        writeln!(f, "model {}", self.model)?;
        write!(f, "hardware: {}", self.hardware)
    }
}
