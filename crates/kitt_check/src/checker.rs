//! Lock-step comparison of the reference model against hardware samples.

use std::fmt;

use kitt_common::{Logic, LogicVec};
use kitt_model::{CycleInputs, CycleOutputs, KittModel, ModelParams, Slots, SLOT_COUNT};
use serde::Serialize;

use crate::error::{CheckError, Divergence};
use crate::probe::{EdgeSample, HardwareProbe};

/// Input bus bits the model consumes (enable, mode, speed, invert, select).
const CONSUMED_INPUT_BITS: u32 = 6;

/// Which optional hardware signals are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompareSet {
    /// Compare the LED bus when a sample carries it.
    pub led_out: bool,
    /// Compare the debounced enable when a sample carries it.
    pub enable_out: bool,
}

impl CompareSet {
    /// Everything the probe provides.
    pub fn from_probe<P: HardwareProbe + ?Sized>(probe: &P) -> Self {
        Self {
            led_out: probe.has_led_out(),
            enable_out: probe.has_enable_out(),
        }
    }
}

/// Counters for a completed check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    /// Edges processed.
    pub cycles: u64,
    /// Edges on which outputs were compared.
    pub checked: u64,
    /// Edges sampled with reset asserted.
    pub reset_cycles: u64,
    /// Edges on which the debounced enable was high.
    pub enabled_cycles: u64,
    /// Comet advance events.
    pub advances: u64,
    /// Hardware signals compared.
    pub compared: Vec<String>,
}

impl CheckSummary {
    /// Pretty-printed JSON rendering.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for CheckSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cycles, {} compared ({} in reset, {} enabled, {} advances); signals: {}",
            self.cycles,
            self.checked,
            self.reset_cycles,
            self.enabled_cycles,
            self.advances,
            self.compared.join(", "),
        )
    }
}

/// Drives the reference model from hardware samples and compares outputs.
///
/// Comparison is armed by the first edge sampled with reset driven low.
/// Hardware registers hold no defined value before that edge has been
/// applied, so the edges up to and including it are stepped but not
/// compared. An undriven reset steps the model as reset but does not arm.
#[derive(Debug, Clone)]
pub struct EquivalenceChecker {
    model: KittModel,
    compare: CompareSet,
    armed: bool,
    summary: CheckSummary,
}

impl EquivalenceChecker {
    /// Creates a checker with a fresh model comparing the PWM bus plus the
    /// signals in `compare`.
    pub fn new(params: ModelParams, compare: CompareSet) -> Self {
        let mut compared = Vec::new();
        if compare.enable_out {
            compared.push("enable_out".to_string());
        }
        compared.push("pwm_out".to_string());
        if compare.led_out {
            compared.push("led_out".to_string());
        }
        Self {
            model: KittModel::new(params),
            compare,
            armed: false,
            summary: CheckSummary {
                compared,
                ..CheckSummary::default()
            },
        }
    }

    /// Advances the model by one edge and compares it with `sample`.
    ///
    /// # Errors
    ///
    /// [`CheckError::Divergence`] on the first mismatching signal,
    /// [`CheckError::UnknownInput`] when a consumed input bit is undriven out
    /// of reset, [`CheckError::Model`] when the model rejects its inputs.
    pub fn check_edge(&mut self, sample: &EdgeSample) -> Result<CycleOutputs, CheckError> {
        let inputs = decode_inputs(sample)?;
        let out = self
            .model
            .step(inputs)
            .map_err(|source| CheckError::Model {
                cycle: sample.cycle,
                source,
            })?;

        let reset = !inputs.reset_n;
        self.summary.cycles += 1;
        self.summary.reset_cycles += u64::from(reset);
        self.summary.enabled_cycles += u64::from(out.enable);
        self.summary.advances += u64::from(out.advanced);

        if self.armed {
            self.compare_outputs(sample, &out)?;
            self.summary.checked += 1;
            log::trace!("cycle {}: pwm_out={} ok", sample.cycle, out.pwm);
        } else if sample.reset_n == Logic::Zero {
            self.armed = true;
            log::debug!("cycle {}: reset seen, comparison armed", sample.cycle);
        }
        Ok(out)
    }

    /// Debounced enable before the scanner buses it drives.
    fn compare_outputs(&self, sample: &EdgeSample, out: &CycleOutputs) -> Result<(), CheckError> {
        if self.compare.enable_out {
            if let Some(ena) = sample.enable_out {
                if !ena.matches(out.enable) {
                    return Err(self
                        .divergence(
                            sample,
                            "enable_out",
                            Logic::from(out.enable).to_string(),
                            ena.to_string(),
                            vec![0],
                        )
                        .into());
                }
            }
        }
        self.compare_bus("pwm_out", out.pwm, &sample.pwm_out, sample)?;
        if self.compare.led_out {
            if let Some(led) = &sample.led_out {
                self.compare_bus("led_out", out.led, led, sample)?;
            }
        }
        Ok(())
    }

    fn compare_bus(
        &self,
        signal: &str,
        expected: Slots,
        actual: &LogicVec,
        sample: &EdgeSample,
    ) -> Result<(), CheckError> {
        let bits: Vec<u32> = (0..SLOT_COUNT as u32)
            .filter(|&i| {
                let hw = if i < actual.width() {
                    actual.get(i)
                } else {
                    Logic::X
                };
                !hw.matches(expected.get(i as usize))
            })
            .collect();
        if bits.is_empty() {
            return Ok(());
        }
        Err(self
            .divergence(sample, signal, expected.to_string(), actual.to_string(), bits)
            .into())
    }

    fn divergence(
        &self,
        sample: &EdgeSample,
        signal: &str,
        expected: String,
        actual: String,
        bits: Vec<u32>,
    ) -> Divergence {
        Divergence {
            cycle: sample.cycle,
            time_fs: sample.time_fs,
            signal: signal.to_string(),
            expected,
            actual,
            bits,
            model: self.model.snapshot(),
            hardware: sample.clone(),
        }
    }

    /// Checks every edge `probe` yields, up to `limit` edges.
    pub fn run<P: HardwareProbe + ?Sized>(
        &mut self,
        probe: &mut P,
        limit: Option<u64>,
    ) -> Result<CheckSummary, CheckError> {
        while limit.map_or(true, |n| self.summary.cycles < n) {
            let Some(sample) = probe.next_edge()? else {
                break;
            };
            self.check_edge(&sample)?;
        }
        log::info!("check passed: {}", self.summary);
        Ok(self.summary.clone())
    }

    /// Counters so far.
    pub fn summary(&self) -> &CheckSummary {
        &self.summary
    }

    /// The reference model.
    pub fn model(&self) -> &KittModel {
        &self.model
    }
}

/// Converts sampled hardware inputs into model inputs.
///
/// A reset that is not driven high counts as asserted. Out of reset, the
/// consumed input bits must be driven; the two spare bits read as 0 when
/// undriven.
fn decode_inputs(sample: &EdgeSample) -> Result<CycleInputs, CheckError> {
    let reset_n = sample.reset_n == Logic::One;
    let mut ui_in = 0u8;
    for i in 0..8u32 {
        let bit = if i < sample.inputs.width() {
            sample.inputs.get(i)
        } else {
            Logic::Zero
        };
        match bit.to_bool() {
            Some(b) => ui_in |= u8::from(b) << i,
            None if reset_n && i < CONSUMED_INPUT_BITS => {
                return Err(CheckError::UnknownInput {
                    cycle: sample.cycle,
                    signal: "inputs".to_string(),
                    value: sample.inputs.to_string(),
                });
            }
            None => {}
        }
    }
    Ok(CycleInputs { reset_n, ui_in })
}
