//! Vectors of 4-state logic values for sampled hardware buses.

use crate::logic::Logic;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A bus of 4-state [`Logic`] values, bit 0 first.
///
/// Buses in this design are narrow (8-bit I/O ports, a 5-bit FSM state), so
/// values are stored one per element rather than packed.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicVec {
    bits: Vec<Logic>,
}

impl LogicVec {
    /// Creates a new `LogicVec` of the given width, initialized to all `Zero`.
    pub fn new(width: u32) -> Self {
        Self {
            bits: vec![Logic::Zero; width as usize],
        }
    }

    /// Creates a `LogicVec` with every bit `X`, the value of a signal that a
    /// waveform has not assigned yet.
    pub fn unknown(width: u32) -> Self {
        Self {
            bits: vec![Logic::X; width as usize],
        }
    }

    /// Returns the number of logic values in this vector.
    pub fn width(&self) -> u32 {
        self.bits.len() as u32
    }

    /// Gets the logic value at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> Logic {
        assert!(
            index < self.width(),
            "index {index} out of bounds for width {}",
            self.width()
        );
        self.bits[index as usize]
    }

    /// Sets the logic value at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, value: Logic) {
        assert!(
            index < self.width(),
            "index {index} out of bounds for width {}",
            self.width()
        );
        self.bits[index as usize] = value;
    }

    /// Returns the bit at `index` as a boolean, or `None` if it is `X`/`Z`
    /// or beyond the bus width.
    pub fn bit(&self, index: u32) -> Option<bool> {
        self.bits.get(index as usize).and_then(|b| b.to_bool())
    }

    /// Creates a single-bit `LogicVec` from a boolean value.
    pub fn from_bool(value: bool) -> Self {
        Self {
            bits: vec![Logic::from_bool(value)],
        }
    }

    /// Creates a `LogicVec` from a `u64` value with the given width.
    ///
    /// Bits beyond the given width are ignored.
    pub fn from_u64(value: u64, width: u32) -> Self {
        let bits = (0..width)
            .map(|i| Logic::from_bool(i < 64 && (value >> i) & 1 != 0))
            .collect();
        Self { bits }
    }

    /// Converts the `LogicVec` to a `u64`, if all bits are definite (0 or 1).
    ///
    /// Returns `None` if the vector contains X or Z values, or if the width
    /// exceeds 64 bits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.width() > 64 {
            return None;
        }
        self.bits
            .iter()
            .enumerate()
            .try_fold(0u64, |acc, (i, b)| Some(acc | (u64::from(b.to_bool()?) << i)))
    }

    /// Returns true if no bit is `X` or `Z`.
    pub fn is_fully_known(&self) -> bool {
        self.bits.iter().all(|b| b.is_known())
    }

    /// Parses a binary string like `"10XZ"` into a `LogicVec`.
    ///
    /// The leftmost character is the most significant bit (highest index).
    /// Returns `None` if the string contains invalid characters.
    pub fn from_binary_str(s: &str) -> Option<Self> {
        let bits = s
            .chars()
            .rev()
            .map(Logic::from_char)
            .collect::<Option<Vec<_>>>()?;
        Some(Self { bits })
    }

    /// Builds a value of `width` bits from a VCD binary value change.
    ///
    /// VCD allows short values: missing high bits are filled with `0`, or
    /// with `X`/`Z` when the leftmost given bit is `X`/`Z`. Extra high bits
    /// are dropped. Unrecognized characters read as `X`.
    pub fn from_vcd_bits(bits: &str, width: u32) -> Self {
        let given: Vec<Logic> = bits
            .chars()
            .rev()
            .map(|c| Logic::from_char(c).unwrap_or(Logic::X))
            .collect();
        let fill = match given.last() {
            Some(Logic::X) => Logic::X,
            Some(Logic::Z) => Logic::Z,
            _ => Logic::Zero,
        };
        let bits = (0..width as usize)
            .map(|i| given.get(i).copied().unwrap_or(fill))
            .collect();
        Self { bits }
    }

    /// Iterates over the bits, bit 0 first.
    pub fn iter(&self) -> impl Iterator<Item = Logic> + '_ {
        self.bits.iter().copied()
    }
}

impl fmt::Display for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.bits.iter().rev() {
            write!(f, "{b}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogicVec({self})")
    }
}
