//! The three fixed-period PWM duty generators that dim the comet's tail.

use crate::comet::Taps;

/// Period and duty thresholds of the PWM generators, in clock cycles.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PwmParams {
    /// Length of one PWM period.
    pub period: u32,
    /// Phase count at which each tap is cleared, plus one.
    pub duty: [u32; 3],
}

impl Default for PwmParams {
    /// 25 %, 10 % and 5 % of a 1000-cycle period.
    fn default() -> Self {
        Self {
            period: 1000,
            duty: [250, 100, 50],
        }
    }
}

/// Phase counter plus the three latched tap registers.
///
/// All three taps are set when the counter reads 0 and tap `k` is cleared
/// when it reads `duty[k] - 1`, so a tap cleared on the same count it is set
/// (`duty == 1`) stays low.
#[derive(Clone, Debug)]
pub struct PwmGenerator {
    params: PwmParams,
    phase: u32,
    taps: Taps,
}

impl PwmGenerator {
    /// Creates a generator with the counter at 0 and all taps low.
    pub fn new(params: PwmParams) -> Self {
        Self {
            params,
            phase: 0,
            taps: Taps::LOW,
        }
    }

    /// Clears the counter and the taps.
    pub fn reset(&mut self) {
        self.phase = 0;
        self.taps = Taps::LOW;
    }

    /// Advances one clock edge.
    ///
    /// `running` is whether the scanner sat in a RUN state at the start of
    /// the cycle. Returns the tap values held *before* this edge, which is
    /// what the comet template reads.
    pub fn tick(&mut self, enabled: bool, running: bool) -> Taps {
        let held = self.taps;

        if running {
            if self.phase == 0 {
                self.taps = Taps::HIGH;
            }
            for (k, &duty) in self.params.duty.iter().enumerate() {
                if duty.checked_sub(1) == Some(self.phase) {
                    self.taps.0[k] = false;
                }
            }
        } else {
            self.taps = Taps::LOW;
        }

        if !enabled {
            self.phase = 0;
        } else if running {
            self.phase = if self.phase + 1 < self.params.period {
                self.phase + 1
            } else {
                0
            };
        }

        held
    }

    /// Current phase counter.
    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// Current tap registers.
    pub fn taps(&self) -> Taps {
        self.taps
    }

    /// Construction constants.
    pub fn params(&self) -> PwmParams {
        self.params
    }
}
