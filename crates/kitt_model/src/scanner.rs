//! Register-level model of the scanning sequencer.
//!
//! One [`ScannerModel::update`] call models one rising clock edge of the
//! sequencer core. Within a call the hardware's parallel register updates are
//! evaluated in dependency order:
//!
//! 1. snapshot the PWM taps (the pattern always uses the pre-edge taps)
//! 2. PWM taps and phase counter
//! 3. shift timer and its advance event
//! 4. state transition and next output pattern
//! 5. output select and inversion
//!
//! Steps 2 and 3 look at the state *before* the transition of step 4.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::comet::{comet_pattern, RunPhase, Taps};
use crate::error::ModelError;
use crate::inputs::{Mode, OutputSelect, ScanConfig, Speed};
use crate::pwm::{PwmGenerator, PwmParams};
use crate::slots::Slots;
use crate::timer::ShiftTimer;

/// What drives the LED array when the LED outputs do not select the PWM
/// pattern.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedArraySource {
    /// The LED array follows the comet pattern.
    #[default]
    Mirror,
    /// Nothing writes the LED array; it stays at its reset value.
    Dark,
}

/// How CAPTURE reacts to a mode without a modeled RUN sequence.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedModePolicy {
    /// Return [`ModelError::UnsupportedMode`].
    #[default]
    Reject,
    /// Stay in CAPTURE, as the hardware does.
    Stall,
}

/// Construction constants of the scanner.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ScannerParams {
    /// Cycles per comet step at slow speed.
    pub speed_slow_ticks: u32,
    /// Cycles per comet step at fast speed.
    pub speed_fast_ticks: u32,
    /// PWM generator constants.
    pub pwm: PwmParams,
    /// LED array behavior.
    pub led_array: LedArraySource,
    /// Reaction to unmodeled modes.
    pub unsupported_mode: UnsupportedModePolicy,
}

impl ScannerParams {
    /// Reload value for `speed`.
    pub fn ticks(&self, speed: Speed) -> u32 {
        match speed {
            Speed::Slow => self.speed_slow_ticks,
            Speed::Fast => self.speed_fast_ticks,
        }
    }
}

impl Default for ScannerParams {
    fn default() -> Self {
        Self {
            speed_slow_ticks: 1_500_000,
            speed_fast_ticks: 1_000_000,
            pwm: PwmParams::default(),
            led_array: LedArraySource::default(),
            unsupported_mode: UnsupportedModePolicy::default(),
        }
    }
}

/// Top-level FSM state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize)]
#[serde(tag = "state", content = "phase", rename_all = "snake_case")]
pub enum ScanState {
    /// Waiting for enable.
    #[default]
    Idle,
    /// Configuration latched, dispatching on mode.
    Capture,
    /// Sweeping; one of the 22 RUN states.
    Run(RunPhase),
}

impl ScanState {
    /// The hardware encoding: 0, 1 or 10..=31.
    pub fn code(self) -> u8 {
        match self {
            ScanState::Idle => 0,
            ScanState::Capture => 1,
            ScanState::Run(phase) => phase.state_code(),
        }
    }

    /// Decodes a hardware state value.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ScanState::Idle),
            1 => Some(ScanState::Capture),
            _ => RunPhase::from_state_code(code).map(ScanState::Run),
        }
    }

    /// True in any RUN state.
    pub fn is_running(self) -> bool {
        matches!(self, ScanState::Run(_))
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanState::Idle => write!(f, "IDLE"),
            ScanState::Capture => write!(f, "CAPTURE"),
            ScanState::Run(phase) => write!(f, "{phase}"),
        }
    }
}

/// Output buses for one cycle.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct ScannerOutputs {
    /// PWM output bus.
    pub pwm: Slots,
    /// LED output bus.
    pub led: Slots,
    /// The shift timer's advance event fired on this edge.
    pub advanced: bool,
}

/// Scanner state, advanced once per rising edge.
#[derive(Clone, Debug)]
pub struct ScannerModel {
    params: ScannerParams,
    state: ScanState,
    config: ScanConfig,
    timer: ShiftTimer,
    pwm: PwmGenerator,
    pattern: Slots,
    led_pattern: Slots,
    outputs: ScannerOutputs,
}

impl ScannerModel {
    /// Creates a scanner in its reset state.
    pub fn new(params: ScannerParams) -> Self {
        Self {
            params,
            state: ScanState::Idle,
            config: ScanConfig::default(),
            timer: ShiftTimer::new(),
            pwm: PwmGenerator::new(params.pwm),
            pattern: Slots::DARK,
            led_pattern: Slots::DARK,
            outputs: ScannerOutputs::default(),
        }
    }

    /// Synchronous reset: IDLE, configuration cleared, counters and arrays zeroed.
    pub fn reset(&mut self) {
        *self = Self::new(self.params);
    }

    /// Advances one clock edge.
    ///
    /// `inputs` is only latched on the IDLE → CAPTURE transition.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnsupportedMode`] when CAPTURE dispatches on a
    /// mode other than single and the policy is
    /// [`UnsupportedModePolicy::Reject`]. The registers still hold this
    /// edge's values.
    pub fn update(
        &mut self,
        reset: bool,
        enable: bool,
        inputs: ScanConfig,
    ) -> Result<ScannerOutputs, ModelError> {
        if reset {
            self.reset();
            return Ok(self.outputs);
        }

        let running = self.state.is_running();
        let taps = self.pwm.tick(enable, running);
        let ticks = self.params.ticks(self.config.speed);
        let advanced = self
            .timer
            .tick(enable, self.state == ScanState::Capture, ticks);
        if advanced {
            log::trace!("scanner: advance event in {}", self.state);
        }

        let result = self.transition(enable, inputs, taps, advanced);

        self.outputs = self.drive_outputs(advanced);
        result.map(|()| self.outputs)
    }

    fn transition(
        &mut self,
        enable: bool,
        inputs: ScanConfig,
        taps: Taps,
        advanced: bool,
    ) -> Result<(), ModelError> {
        if !enable {
            if self.state != ScanState::Idle {
                log::debug!("scanner: {} -> IDLE (enable released)", self.state);
            }
            self.state = ScanState::Idle;
            self.write_pattern(Slots::DARK);
            return Ok(());
        }

        match self.state {
            ScanState::Idle => {
                self.config = inputs;
                self.write_pattern(Slots::DARK);
                self.state = ScanState::Capture;
                log::debug!("scanner: IDLE -> CAPTURE ({})", self.config);
            }
            ScanState::Capture => match self.config.mode {
                Mode::Single => {
                    self.state = ScanState::Run(RunPhase::FIRST);
                    log::debug!("scanner: CAPTURE -> {}", RunPhase::FIRST);
                }
                mode @ (Mode::PingPong | Mode::Random | Mode::Reserved) => {
                    match self.params.unsupported_mode {
                        UnsupportedModePolicy::Reject => {
                            return Err(ModelError::UnsupportedMode { mode });
                        }
                        UnsupportedModePolicy::Stall => {
                            log::trace!("scanner: stalled in CAPTURE on mode {mode}");
                        }
                    }
                }
            },
            ScanState::Run(phase) => {
                let phase = if advanced {
                    let next = phase.next();
                    self.state = ScanState::Run(next);
                    log::trace!("scanner: {phase} -> {next}");
                    next
                } else {
                    phase
                };
                self.write_pattern(comet_pattern(phase, taps));
            }
        }
        Ok(())
    }

    fn write_pattern(&mut self, pattern: Slots) {
        self.pattern = pattern;
        if self.params.led_array == LedArraySource::Mirror {
            self.led_pattern = pattern;
        }
    }

    fn drive_outputs(&self, advanced: bool) -> ScannerOutputs {
        let pwm = self.pattern;
        let led = match self.config.select {
            OutputSelect::PwmArray => self.pattern,
            OutputSelect::LedArray => self.led_pattern,
        };
        let (pwm, led) = if self.config.invert {
            (pwm.inverted(), led.inverted())
        } else {
            (pwm, led)
        };
        ScannerOutputs { pwm, led, advanced }
    }

    /// Current FSM state.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Latched configuration.
    pub fn config(&self) -> ScanConfig {
        self.config
    }

    /// The pattern established for the current cycle, before select/invert.
    pub fn pattern(&self) -> Slots {
        self.pattern
    }

    /// The LED array, before select/invert.
    pub fn led_pattern(&self) -> Slots {
        self.led_pattern
    }

    /// Outputs of the last edge.
    pub fn outputs(&self) -> ScannerOutputs {
        self.outputs
    }

    /// PWM generator registers.
    pub fn pwm(&self) -> &PwmGenerator {
        &self.pwm
    }

    /// Shift timer counter.
    pub fn timer_remaining(&self) -> u32 {
        self.timer.remaining()
    }

    /// Construction constants.
    pub fn params(&self) -> ScannerParams {
        self.params
    }

    /// Captures the full register state for diagnostics.
    pub fn snapshot(&self) -> ScannerSnapshot {
        ScannerSnapshot {
            state: self.state,
            state_code: self.state.code(),
            config: self.config,
            shift_timer: self.timer.remaining(),
            pwm_phase: self.pwm.phase(),
            taps: self.pwm.taps(),
            pattern: self.pattern,
            led_pattern: self.led_pattern,
            pwm_out: self.outputs.pwm,
            led_out: self.outputs.led,
        }
    }
}

/// Copy of the scanner registers at one cycle.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct ScannerSnapshot {
    /// FSM state.
    pub state: ScanState,
    /// Hardware encoding of `state`.
    pub state_code: u8,
    /// Latched configuration.
    pub config: ScanConfig,
    /// Shift timer counter.
    pub shift_timer: u32,
    /// PWM phase counter.
    pub pwm_phase: u32,
    /// Tap registers.
    pub taps: Taps,
    /// Next output pattern.
    pub pattern: Slots,
    /// LED array.
    pub led_pattern: Slots,
    /// PWM output bus.
    pub pwm_out: Slots,
    /// LED output bus.
    pub led_out: Slots,
}

impl fmt::Display for ScannerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "state={} ({}) {} timer={} pwm_phase={} taps={} pattern={} pwm_out={} led_out={}",
            self.state,
            self.state_code,
            self.config,
            self.shift_timer,
            self.pwm_phase,
            self.taps,
            self.pattern,
            self.pwm_out,
            self.led_out,
        )
    }
}
