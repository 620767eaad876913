//! The comet template: which of the 8 slots are lit in each RUN phase.
//!
//! The hardware enumerates 22 RUN states (encoded 10..=31), each with its own
//! literal 8-slot pattern. They all follow one rule: a full-brightness head
//! plus three PWM taps trailing behind it, sweeping from slot 0 to slot 7 and
//! back. The head overshoots each end by three positions so the tail can
//! drain out of the array before the comet turns around.
//!
//! ```text
//! phase  0..=10  head = phase        tail towards slot 0  (RUN_10..RUN_20)
//! phase 11..=21  head = 18 - phase   tail towards slot 7  (RUN_21..RUN_31)
//! ```

use std::fmt;

use serde::Serialize;

use crate::slots::{Slots, SLOT_COUNT};

/// Number of RUN states in the ring.
pub const RUN_PHASES: u8 = 22;

/// Hardware state code of the first RUN state.
const RUN_CODE_BASE: u8 = 10;

/// First phase of the reverse sweep.
const REVERSE_START: u8 = 11;

/// Position of a RUN state in the 22-state ring.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord, Serialize)]
pub struct RunPhase(u8);

impl RunPhase {
    /// RUN_10, entered from CAPTURE and after RUN_31.
    pub const FIRST: RunPhase = RunPhase(0);

    /// Returns the phase at `index`, or `None` if `index >= RUN_PHASES`.
    pub fn new(index: u8) -> Option<Self> {
        (index < RUN_PHASES).then_some(Self(index))
    }

    /// Returns the phase for a hardware state code in `10..=31`.
    pub fn from_state_code(code: u8) -> Option<Self> {
        code.checked_sub(RUN_CODE_BASE).and_then(Self::new)
    }

    /// Index in the ring, `0..RUN_PHASES`.
    pub fn index(self) -> u8 {
        self.0
    }

    /// The hardware state encoding, `10..=31`.
    pub fn state_code(self) -> u8 {
        self.0 + RUN_CODE_BASE
    }

    /// The phase entered on the next advance event.
    pub fn next(self) -> Self {
        Self((self.0 + 1) % RUN_PHASES)
    }

    /// Iterates the whole ring starting at [`RunPhase::FIRST`].
    pub fn all() -> impl Iterator<Item = RunPhase> {
        (0..RUN_PHASES).map(RunPhase)
    }

    /// Signed head position; may lie outside `0..8`.
    pub fn head(self) -> i8 {
        if self.0 < REVERSE_START {
            self.0 as i8
        } else {
            18 - self.0 as i8
        }
    }

    /// Direction from the head towards its tail (`-1` or `+1`).
    pub fn tail_step(self) -> i8 {
        if self.0 < REVERSE_START {
            -1
        } else {
            1
        }
    }

    /// True when the head is past either end of the array.
    pub fn is_overscan(self) -> bool {
        slot_index(self.head()).is_none()
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RUN_{}", self.state_code())
    }
}

/// The three latched PWM duty signals, tap 0 nearest the head.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize)]
pub struct Taps(pub [bool; 3]);

impl Taps {
    /// All taps low.
    pub const LOW: Taps = Taps([false; 3]);
    /// All taps high.
    pub const HIGH: Taps = Taps([true; 3]);

    /// Tap `k`.
    pub fn get(&self, k: usize) -> bool {
        self.0[k]
    }
}

impl fmt::Display for Taps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0.map(u8::from);
        write!(f, "[{a},{b},{c}]")
    }
}

fn slot_index(pos: i8) -> Option<usize> {
    usize::try_from(pos).ok().filter(|&p| p < SLOT_COUNT)
}

/// Computes the 8-slot pattern for `phase` with the given tap values.
///
/// Positions that fall outside the array are dropped, not wrapped.
pub fn comet_pattern(phase: RunPhase, taps: Taps) -> Slots {
    let mut slots = Slots::DARK;
    let head = phase.head();
    let step = phase.tail_step();

    if let Some(slot) = slot_index(head) {
        slots.set(slot, true);
    }
    for (k, &tap) in taps.0.iter().enumerate() {
        if let Some(slot) = slot_index(head + step * (k as i8 + 1)) {
            slots.set(slot, tap);
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_wraps_after_run_31() {
        let last = RunPhase::new(21).unwrap();
        assert_eq!(last.state_code(), 31);
        assert_eq!(last.next(), RunPhase::FIRST);
        assert_eq!(RunPhase::new(22), None);
    }

    #[test]
    fn state_code_roundtrip() {
        for p in RunPhase::all() {
            assert_eq!(RunPhase::from_state_code(p.state_code()), Some(p));
        }
        assert_eq!(RunPhase::from_state_code(1), None);
        assert_eq!(RunPhase::from_state_code(32), None);
    }

    #[test]
    fn first_phase_is_head_at_slot_zero() {
        let p = comet_pattern(RunPhase::FIRST, Taps::HIGH);
        assert_eq!(p.bits(), [true, false, false, false, false, false, false, false]);
    }

    #[test]
    fn forward_tail_trails_towards_slot_zero() {
        let p = comet_pattern(RunPhase::new(4).unwrap(), Taps([true, false, true]));
        // head 4, tap0 at 3, tap1 at 2, tap2 at 1
        assert_eq!(p.bits(), [false, true, false, true, true, false, false, false]);
    }

    #[test]
    fn reverse_tail_trails_towards_slot_seven() {
        let p = comet_pattern(RunPhase::new(13).unwrap(), Taps::HIGH);
        // RUN_23: head 5, taps at 6 and 7
        assert_eq!(p.bits(), [false, false, false, false, false, true, true, true]);
    }

    #[test]
    fn overscan_phases() {
        let overscan: Vec<u8> = RunPhase::all()
            .filter(|p| p.is_overscan())
            .map(|p| p.state_code())
            .collect();
        assert_eq!(overscan, vec![18, 19, 20, 29, 30, 31]);
    }

    #[test]
    fn head_moves_one_slot_per_phase() {
        for p in RunPhase::all() {
            let delta = (p.next().head() - p.head()).abs();
            if p.index() == 10 {
                // Turnaround: head jumps from 10 back to 7.
                assert_eq!(delta, 3);
            } else if p.index() == 21 {
                // Turnaround: head jumps from -3 to 0.
                assert_eq!(delta, 3);
            } else {
                assert_eq!(delta, 1, "phase {p}");
            }
        }
    }

    #[test]
    fn display() {
        assert_eq!(RunPhase::FIRST.to_string(), "RUN_10");
        assert_eq!(Taps([true, false, true]).to_string(), "[1,0,1]");
    }
}
