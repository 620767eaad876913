//! Shared foundational types for the KITT scanner reference model.
//!
//! Hardware signals sampled from a simulation are 4-state ([`Logic`],
//! [`LogicVec`]); the models themselves work on plain booleans. This crate
//! also holds clock [`Frequency`] parsing and femtosecond time helpers used
//! to convert between waveform timestamps and clock cycles.

#![warn(missing_docs)]

pub mod frequency;
pub mod logic;
pub mod logic_vec;
pub mod time;

pub use frequency::{Frequency, ParseFrequencyError};
pub use logic::Logic;
pub use logic_vec::LogicVec;
pub use time::{format_fs, parse_duration, ParseDurationError};
