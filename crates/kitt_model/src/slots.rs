//! The 8-slot output array shared by the pattern, PWM and LED buses.

use std::fmt;

use kitt_common::{Logic, LogicVec};
use serde::{Deserialize, Serialize};

/// Number of output positions driven by the scanner.
pub const SLOT_COUNT: usize = 8;

/// One bit per output position; slot `i` drives bus bit `i`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Slots([bool; SLOT_COUNT]);

impl Slots {
    /// All positions off.
    pub const DARK: Slots = Slots([false; SLOT_COUNT]);

    /// Wraps an explicit slot array (slot 0 first).
    pub const fn new(bits: [bool; SLOT_COUNT]) -> Self {
        Self(bits)
    }

    /// Builds slots from a bus value, bit `i` to slot `i`.
    pub fn from_u8(value: u8) -> Self {
        Self(std::array::from_fn(|i| (value >> i) & 1 != 0))
    }

    /// Packs the slots into a bus value, slot `i` to bit `i`.
    pub fn to_u8(&self) -> u8 {
        self.0
            .iter()
            .enumerate()
            .fold(0, |acc, (i, &b)| acc | (u8::from(b) << i))
    }

    /// The bit at `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= SLOT_COUNT`.
    pub fn get(&self, slot: usize) -> bool {
        self.0[slot]
    }

    /// Sets the bit at `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= SLOT_COUNT`.
    pub fn set(&mut self, slot: usize, bit: bool) {
        self.0[slot] = bit;
    }

    /// The raw slot array, slot 0 first.
    pub fn bits(&self) -> [bool; SLOT_COUNT] {
        self.0
    }

    /// Every bit complemented.
    pub fn inverted(&self) -> Self {
        Self(self.0.map(|b| !b))
    }

    /// Number of slots that are on.
    pub fn count_lit(&self) -> usize {
        self.0.iter().filter(|&&b| b).count()
    }

    /// The slots as an 8-bit driven logic bus.
    pub fn to_logic_vec(&self) -> LogicVec {
        let mut v = LogicVec::new(SLOT_COUNT as u32);
        for (i, &b) in self.0.iter().enumerate() {
            v.set(i as u32, Logic::from_bool(b));
        }
        v
    }
}

/// Formatted like a bus value: slot 7 on the left, slot 0 on the right.
impl fmt::Display for Slots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.0.iter().rev() {
            write!(f, "{}", u8::from(b))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Slots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slots({self})")
    }
}
