//! The checker's view of the hardware: one sample per rising clock edge.

use std::collections::VecDeque;
use std::fmt;

use kitt_common::{Logic, LogicVec};
use serde::Serialize;

use crate::error::CheckError;

/// Hardware signal values sampled for one rising clock edge.
///
/// Values are four-state: a trace may carry `X`/`Z` before reset or on
/// undriven nets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeSample {
    /// Zero-based index of the edge.
    pub cycle: u64,
    /// Time of the rising edge in femtoseconds.
    pub time_fs: u64,
    /// Active-low reset.
    pub reset_n: Logic,
    /// 8-bit input bus.
    pub inputs: LogicVec,
    /// 8-bit PWM output bus.
    pub pwm_out: LogicVec,
    /// 8-bit LED output bus, when probed.
    pub led_out: Option<LogicVec>,
    /// Debounced enable, when probed.
    pub enable_out: Option<Logic>,
    /// Diagnostic probes, reported but never compared.
    pub probes: Vec<(String, LogicVec)>,
}

impl EdgeSample {
    /// A sample with every bus unknown and no optional probes.
    pub fn empty(cycle: u64, time_fs: u64) -> Self {
        Self {
            cycle,
            time_fs,
            reset_n: Logic::X,
            inputs: LogicVec::unknown(8),
            pwm_out: LogicVec::unknown(8),
            led_out: None,
            enable_out: None,
            probes: Vec::new(),
        }
    }
}

impl fmt::Display for EdgeSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rst_n={} ui_in={} pwm_out={}",
            self.reset_n, self.inputs, self.pwm_out
        )?;
        if let Some(led) = &self.led_out {
            write!(f, " led_out={led}")?;
        }
        if let Some(ena) = self.enable_out {
            write!(f, " enable_out={ena}")?;
        }
        for (name, value) in &self.probes {
            match value.to_u64() {
                Some(v) => write!(f, " {name}={v}")?,
                None => write!(f, " {name}={value}")?,
            }
        }
        Ok(())
    }
}

/// A source of per-edge hardware samples.
///
/// The checker pulls one sample per cycle and never drives the hardware.
pub trait HardwareProbe {
    /// Returns the sample for the next rising edge, or `None` when the
    /// source is exhausted.
    fn next_edge(&mut self) -> Result<Option<EdgeSample>, CheckError>;

    /// Whether samples carry the LED bus.
    fn has_led_out(&self) -> bool;

    /// Whether samples carry the debounced enable.
    fn has_enable_out(&self) -> bool;
}

/// A probe replaying samples collected up front.
#[derive(Debug, Default)]
pub struct SampleQueue {
    samples: VecDeque<EdgeSample>,
    led_out: bool,
    enable_out: bool,
}

impl SampleQueue {
    /// Wraps `samples`, replayed in order.
    pub fn new(samples: impl IntoIterator<Item = EdgeSample>) -> Self {
        let samples: VecDeque<EdgeSample> = samples.into_iter().collect();
        let led_out = samples.iter().any(|s| s.led_out.is_some());
        let enable_out = samples.iter().any(|s| s.enable_out.is_some());
        Self {
            samples,
            led_out,
            enable_out,
        }
    }

    /// Samples not yet consumed.
    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

impl HardwareProbe for SampleQueue {
    fn next_edge(&mut self) -> Result<Option<EdgeSample>, CheckError> {
        Ok(self.samples.pop_front())
    }

    fn has_led_out(&self) -> bool {
        self.led_out
    }

    fn has_enable_out(&self) -> bool {
        self.enable_out
    }
}
