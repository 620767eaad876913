//! The down-counting shift timer that paces the comet.

/// Down-counter raising one advance event per reload period.
///
/// While the scanner is in CAPTURE the counter is loaded with the full tick
/// count every cycle. In every other enabled state it counts down, and on the
/// cycle it is found at zero it raises the advance event and reloads with
/// `ticks - 1`. Both paths give exactly `ticks` cycles between events.
#[derive(Clone, Debug, Default)]
pub struct ShiftTimer {
    remaining: u32,
}

impl ShiftTimer {
    /// Creates a timer at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the counter.
    pub fn reset(&mut self) {
        self.remaining = 0;
    }

    /// Advances one clock edge and returns whether the advance event fired.
    pub fn tick(&mut self, enabled: bool, capturing: bool, ticks: u32) -> bool {
        if !enabled {
            self.remaining = 0;
            return false;
        }
        if capturing {
            self.remaining = ticks;
            return false;
        }
        if self.remaining > 0 {
            self.remaining -= 1;
            false
        } else {
            self.remaining = ticks.saturating_sub(1);
            true
        }
    }

    /// Current counter value.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire_cycles(timer: &mut ShiftTimer, ticks: u32, cycles: usize) -> Vec<usize> {
        (0..cycles)
            .filter(|_| timer.tick(true, false, ticks))
            .collect()
    }

    #[test]
    fn capture_loads_full_period() {
        let mut t = ShiftTimer::new();
        t.tick(true, true, 5);
        assert_eq!(t.remaining(), 5);
        // counts 4,3,2,1,0 then fires on the sixth cycle after capture
        assert_eq!(fire_cycles(&mut t, 5, 16), vec![5, 10, 15]);
    }

    #[test]
    fn fires_immediately_from_zero() {
        let mut t = ShiftTimer::new();
        assert!(t.tick(true, false, 3));
        assert_eq!(t.remaining(), 2);
    }

    #[test]
    fn disabled_holds_at_zero() {
        let mut t = ShiftTimer::new();
        t.tick(true, true, 9);
        assert!(!t.tick(false, false, 9));
        assert_eq!(t.remaining(), 0);
    }

    #[test]
    fn single_tick_period_fires_every_cycle() {
        let mut t = ShiftTimer::new();
        t.tick(true, true, 1);
        assert_eq!(fire_cycles(&mut t, 1, 5), vec![1, 2, 3, 4]);
    }
}
