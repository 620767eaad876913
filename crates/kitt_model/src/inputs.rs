//! Decoding of the 8-bit input bus into the enable button and the scanner
//! configuration fields.
//!
//! | bit | meaning                                   |
//! |-----|-------------------------------------------|
//! | 0   | enable button (raw, feeds the debouncer)  |
//! | 1-2 | mode, `bit2 * 2 + bit1`                   |
//! | 3   | speed: 0 slow, 1 fast                     |
//! | 4   | output invert                             |
//! | 5   | output select: 0 LED array, 1 PWM array   |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Bus bit carrying the raw enable button.
pub const ENABLE_BIT: u8 = 0;
/// Lowest of the two mode bits.
pub const MODE_SHIFT: u8 = 1;
/// Bus bit selecting the fast shift speed.
pub const SPEED_BIT: u8 = 3;
/// Bus bit requesting inverted outputs.
pub const INVERT_BIT: u8 = 4;
/// Bus bit selecting the PWM array for the LED outputs.
pub const SELECT_BIT: u8 = 5;

/// Returns the raw enable button from an input bus value.
pub fn enable_bit(ui_in: u8) -> bool {
    (ui_in >> ENABLE_BIT) & 1 != 0
}

/// Scanning mode, latched when the scanner leaves IDLE.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// One comet sweeping across and back. The only modeled mode.
    #[default]
    Single,
    /// Two comets bouncing off each other. Not modeled.
    PingPong,
    /// Random positions. Not modeled.
    Random,
    /// Encoding 3, undefined in the design.
    Reserved,
}

impl Mode {
    /// Decodes the 2-bit mode field.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Mode::Single,
            1 => Mode::PingPong,
            2 => Mode::Random,
            _ => Mode::Reserved,
        }
    }

    /// The 2-bit hardware encoding.
    pub fn code(self) -> u8 {
        match self {
            Mode::Single => 0,
            Mode::PingPong => 1,
            Mode::Random => 2,
            Mode::Reserved => 3,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Single => write!(f, "single"),
            Mode::PingPong => write!(f, "pingpong"),
            Mode::Random => write!(f, "random"),
            Mode::Reserved => write!(f, "reserved"),
        }
    }
}

/// Shift speed: selects which reload value the shift timer uses.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speed {
    /// `speed_slow_ticks` per step.
    #[default]
    Slow,
    /// `speed_fast_ticks` per step.
    Fast,
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speed::Slow => write!(f, "slow"),
            Speed::Fast => write!(f, "fast"),
        }
    }
}

/// Source of the LED output bus.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSelect {
    /// The separately tracked LED array.
    #[default]
    LedArray,
    /// The PWM comet pattern.
    PwmArray,
}

impl fmt::Display for OutputSelect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSelect::LedArray => write!(f, "led"),
            OutputSelect::PwmArray => write!(f, "pwm"),
        }
    }
}

/// Configuration fields decoded from input bits 1-5.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Scanning mode.
    pub mode: Mode,
    /// Shift speed.
    pub speed: Speed,
    /// LED output source.
    pub select: OutputSelect,
    /// Complement both output buses.
    pub invert: bool,
}

impl ScanConfig {
    /// Decodes the configuration fields of an input bus value.
    pub fn from_inputs(ui_in: u8) -> Self {
        let bit = |n: u8| (ui_in >> n) & 1 != 0;
        Self {
            mode: Mode::from_bits(ui_in >> MODE_SHIFT),
            speed: if bit(SPEED_BIT) {
                Speed::Fast
            } else {
                Speed::Slow
            },
            select: if bit(SELECT_BIT) {
                OutputSelect::PwmArray
            } else {
                OutputSelect::LedArray
            },
            invert: bit(INVERT_BIT),
        }
    }

    /// Encodes these fields back into input bits 1-5 (bit 0 clear).
    pub fn to_inputs(self) -> u8 {
        (self.mode.code() << MODE_SHIFT)
            | (u8::from(self.speed == Speed::Fast) << SPEED_BIT)
            | (u8::from(self.invert) << INVERT_BIT)
            | (u8::from(self.select == OutputSelect::PwmArray) << SELECT_BIT)
    }
}

impl fmt::Display for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mode={} speed={} select={} invert={}",
            self.mode,
            self.speed,
            self.select,
            u8::from(self.invert)
        )
    }
}
