//! Register-level model of the enable-button debounce filter.
//!
//! The filter re-times the raw button through a 2-stage synchronizer, takes
//! one sample of the synchronized bit every `sample_interval` cycles into a
//! 3-deep window, and switches its output only when all three samples agree.
//! The output passes through one more register before it leaves the block,
//! so [`DebounceModel::update`] returns the value filtered on the *previous*
//! cycle.

use std::fmt;

use serde::Serialize;

/// Construction constants of the debounce filter.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DebounceParams {
    /// Cycles between two samples of the synchronized input.
    pub sample_interval: u32,
}

impl Default for DebounceParams {
    /// 25 ms at the design's 10 MHz clock.
    fn default() -> Self {
        Self {
            sample_interval: 250_000,
        }
    }
}

/// Startup pipeline state after reset release.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DebounceStage {
    /// First cycle after reset.
    #[default]
    Sync0,
    /// Second cycle after reset.
    Sync1,
    /// Steady state: filtering, sampling and synchronizing every cycle.
    Count,
}

impl fmt::Display for DebounceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebounceStage::Sync0 => write!(f, "SYNC0"),
            DebounceStage::Sync1 => write!(f, "SYNC1"),
            DebounceStage::Count => write!(f, "COUNT"),
        }
    }
}

/// Debounce filter state, advanced once per rising edge.
#[derive(Clone, Debug)]
pub struct DebounceModel {
    params: DebounceParams,
    stage: DebounceStage,
    /// `[newest, oldest]` synchronizer flops.
    synchronizer: [bool; 2],
    /// Sample window, most recent first.
    window: [bool; 3],
    counter: u32,
    output: bool,
    output_registered: bool,
}

impl DebounceModel {
    /// Creates a filter in its reset state.
    pub fn new(params: DebounceParams) -> Self {
        Self {
            params,
            stage: DebounceStage::Sync0,
            synchronizer: [false; 2],
            window: [false; 3],
            counter: 0,
            output: false,
            output_registered: false,
        }
    }

    /// Synchronous reset: every register cleared.
    pub fn reset(&mut self) {
        *self = Self::new(self.params);
    }

    /// Advances one clock edge and returns the registered filter output.
    ///
    /// `raw` is only consumed once the pipeline reached [`DebounceStage::Count`].
    pub fn update(&mut self, reset: bool, raw: bool) -> bool {
        if reset {
            self.reset();
            return false;
        }

        self.output_registered = self.output;

        match self.stage {
            DebounceStage::Sync0 => self.stage = DebounceStage::Sync1,
            DebounceStage::Sync1 => self.stage = DebounceStage::Count,
            DebounceStage::Count => {
                match self.window {
                    [true, true, true] => self.set_output(true),
                    [false, false, false] => self.set_output(false),
                    _ => {}
                }

                if self.counter >= self.params.sample_interval.saturating_sub(1) {
                    self.counter = 0;
                    self.window = [self.synchronizer[1], self.window[0], self.window[1]];
                    log::trace!("debounce: sampled window {}", WindowFmt(self.window));
                } else {
                    self.counter += 1;
                }

                self.synchronizer = [raw, self.synchronizer[0]];
            }
        }

        self.output_registered
    }

    fn set_output(&mut self, value: bool) {
        if self.output != value {
            log::debug!("debounce: filtered output -> {}", u8::from(value));
        }
        self.output = value;
    }

    /// The externally visible (registered) output.
    pub fn output(&self) -> bool {
        self.output_registered
    }

    /// The filtered value that becomes visible on the next edge.
    pub fn filtered(&self) -> bool {
        self.output
    }

    /// Current pipeline stage.
    pub fn stage(&self) -> DebounceStage {
        self.stage
    }

    /// Sample window, most recent first.
    pub fn window(&self) -> [bool; 3] {
        self.window
    }

    /// Current sample counter.
    pub fn sample_counter(&self) -> u32 {
        self.counter
    }

    /// Construction constants.
    pub fn params(&self) -> DebounceParams {
        self.params
    }

    /// Captures the full register state for diagnostics.
    pub fn snapshot(&self) -> DebounceSnapshot {
        DebounceSnapshot {
            stage: self.stage,
            synchronizer: self.synchronizer,
            window: self.window,
            sample_counter: self.counter,
            output: self.output,
            output_registered: self.output_registered,
        }
    }
}

/// Copy of the debounce registers at one cycle.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct DebounceSnapshot {
    /// Pipeline stage.
    pub stage: DebounceStage,
    /// `[newest, oldest]` synchronizer flops.
    pub synchronizer: [bool; 2],
    /// Sample window, most recent first.
    pub window: [bool; 3],
    /// Sample counter.
    pub sample_counter: u32,
    /// Filtered value.
    pub output: bool,
    /// Registered (visible) value.
    pub output_registered: bool,
}

impl fmt::Display for DebounceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stage={} sync=[{},{}] window={} counter={} out={} out_reg={}",
            self.stage,
            u8::from(self.synchronizer[0]),
            u8::from(self.synchronizer[1]),
            WindowFmt(self.window),
            self.sample_counter,
            u8::from(self.output),
            u8::from(self.output_registered),
        )
    }
}

struct WindowFmt([bool; 3]);

impl fmt::Display for WindowFmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0.map(u8::from);
        write!(f, "[{a},{b},{c}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(interval: u32) -> DebounceModel {
        DebounceModel::new(DebounceParams {
            sample_interval: interval,
        })
    }

    #[test]
    fn reset_returns_zero_and_clears() {
        let mut m = model(2);
        for _ in 0..20 {
            m.update(false, true);
        }
        assert!(m.output());
        assert!(!m.update(true, true));
        assert_eq!(m.snapshot(), model(2).snapshot());
    }

    #[test]
    fn pipeline_fill_takes_two_cycles() {
        let mut m = model(4);
        assert_eq!(m.stage(), DebounceStage::Sync0);
        m.update(false, true);
        assert_eq!(m.stage(), DebounceStage::Sync1);
        m.update(false, true);
        assert_eq!(m.stage(), DebounceStage::Count);
        // The raw bit was not captured during the fill.
        assert_eq!(m.snapshot().synchronizer, [false, false]);
        m.update(false, true);
        assert_eq!(m.snapshot().synchronizer, [true, false]);
    }

    #[test]
    fn counter_wraps_at_interval() {
        let mut m = model(3);
        m.update(false, false);
        m.update(false, false);
        let counts: Vec<u32> = (0..7)
            .map(|_| {
                m.update(false, false);
                m.sample_counter()
            })
            .collect();
        assert_eq!(counts, vec![1, 2, 0, 1, 2, 0, 1]);
    }

    #[test]
    fn sample_takes_previous_second_stage() {
        let mut m = model(1);
        m.update(false, false);
        m.update(false, false);
        // COUNT with interval 1 samples every cycle, before the synchronizer shifts.
        m.update(false, true);
        assert_eq!(m.window(), [false, false, false]);
        m.update(false, true);
        assert_eq!(m.window(), [false, false, false]);
        m.update(false, true);
        assert_eq!(m.window(), [true, false, false]);
    }

    #[test]
    fn output_is_registered_one_cycle_late() {
        let mut m = model(1);
        let mut returned = Vec::new();
        let mut filtered = Vec::new();
        for _ in 0..12 {
            returned.push(m.update(false, true));
            filtered.push(m.filtered());
        }
        let rise = filtered.iter().position(|&b| b).unwrap();
        assert!(!returned[rise]);
        assert!(returned[rise + 1]);
    }

    #[test]
    fn mixed_window_holds_output() {
        let mut m = model(1);
        for _ in 0..10 {
            m.update(false, true);
        }
        assert!(m.filtered());
        // One low sample, then high again: the window never reads [0,0,0].
        m.update(false, false);
        for _ in 0..6 {
            m.update(false, true);
            assert!(m.filtered());
        }
    }

    #[test]
    fn zero_interval_samples_every_cycle() {
        let mut a = model(0);
        let mut b = model(1);
        for i in 0..16 {
            let raw = i % 5 < 3;
            assert_eq!(a.update(false, raw), b.update(false, raw));
        }
    }

    #[test]
    fn snapshot_display() {
        let m = model(4);
        assert_eq!(
            m.snapshot().to_string(),
            "stage=SYNC0 sync=[0,0] window=[0,0,0] counter=0 out=0 out_reg=0"
        );
    }
}
