//! The top-level model: debounce filter feeding the scanner enable.

use std::fmt;

use serde::Serialize;

use crate::debounce::{DebounceModel, DebounceParams, DebounceSnapshot};
use crate::error::ModelError;
use crate::inputs::{enable_bit, ScanConfig};
use crate::scanner::{ScannerModel, ScannerParams, ScannerSnapshot};
use crate::slots::Slots;

/// Construction constants of the whole design.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ModelParams {
    /// Debounce filter constants.
    pub debounce: DebounceParams,
    /// Scanner constants.
    pub scanner: ScannerParams,
}

/// The primary inputs sampled at one rising edge.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct CycleInputs {
    /// Active-low synchronous reset.
    pub reset_n: bool,
    /// The 8-bit input bus. Bit 0 is the raw enable button.
    pub ui_in: u8,
}

impl CycleInputs {
    /// Inputs with reset held.
    pub fn in_reset() -> Self {
        Self::default()
    }

    /// Inputs with reset released.
    pub fn running(ui_in: u8) -> Self {
        Self {
            reset_n: true,
            ui_in,
        }
    }
}

/// Model outputs after one rising edge.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct CycleOutputs {
    /// Debounced enable as seen by the scanner on this edge.
    pub enable: bool,
    /// PWM output bus.
    pub pwm: Slots,
    /// LED output bus.
    pub led: Slots,
    /// The comet advanced on this edge.
    pub advanced: bool,
}

/// Debounce and scanner models advanced in lockstep.
#[derive(Clone, Debug)]
pub struct KittModel {
    debounce: DebounceModel,
    scanner: ScannerModel,
    cycle: u64,
}

impl KittModel {
    /// Creates a model in its reset state.
    pub fn new(params: ModelParams) -> Self {
        Self {
            debounce: DebounceModel::new(params.debounce),
            scanner: ScannerModel::new(params.scanner),
            cycle: 0,
        }
    }

    /// Advances both models by one rising edge.
    ///
    /// The debounced enable returned by the filter on this edge drives the
    /// scanner on the same edge.
    ///
    /// # Errors
    ///
    /// Propagates [`ModelError`] from the scanner. The cycle still counts.
    pub fn step(&mut self, inputs: CycleInputs) -> Result<CycleOutputs, ModelError> {
        let reset = !inputs.reset_n;
        let enable = self.debounce.update(reset, enable_bit(inputs.ui_in));
        let result = self
            .scanner
            .update(reset, enable, ScanConfig::from_inputs(inputs.ui_in));
        self.cycle += 1;
        let out = result?;
        Ok(CycleOutputs {
            enable,
            pwm: out.pwm,
            led: out.led,
            advanced: out.advanced,
        })
    }

    /// Number of edges applied so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The debounce filter.
    pub fn debounce(&self) -> &DebounceModel {
        &self.debounce
    }

    /// The scanner.
    pub fn scanner(&self) -> &ScannerModel {
        &self.scanner
    }

    /// Captures both models' registers.
    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            cycle: self.cycle,
            debounce: self.debounce.snapshot(),
            scanner: self.scanner.snapshot(),
        }
    }
}

/// Register state of the whole design after a given number of edges.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct ModelSnapshot {
    /// Edges applied.
    pub cycle: u64,
    /// Debounce registers.
    pub debounce: DebounceSnapshot,
    /// Scanner registers.
    pub scanner: ScannerSnapshot,
}

impl fmt::Display for ModelSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cycle {}", self.cycle)?;
        writeln!(f, "  debounce: {}", self.debounce)?;
        write!(f, "  scanner:  {}", self.scanner)
    }
}
