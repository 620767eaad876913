//! Scripted input sequences for golden runs.

use kitt_config::StimulusStep;
use kitt_model::CycleInputs;

/// A piecewise-constant input script.
///
/// Each step's values hold from its cycle until the next step. Cycles before
/// the first step are driven in reset with the input bus at zero.
#[derive(Debug, Clone, Default)]
pub struct StimulusScript {
    steps: Vec<StimulusStep>,
}

impl StimulusScript {
    /// Builds a script; steps are ordered by cycle, later duplicates win.
    pub fn new(mut steps: Vec<StimulusStep>) -> Self {
        steps.sort_by_key(|s| s.cycle);
        steps.dedup_by(|later, earlier| {
            if later.cycle == earlier.cycle {
                *earlier = *later;
                true
            } else {
                false
            }
        });
        Self { steps }
    }

    /// The inputs driven on `cycle`.
    pub fn inputs_at(&self, cycle: u64) -> CycleInputs {
        let n = self.steps.partition_point(|s| s.cycle <= cycle);
        match n.checked_sub(1).map(|i| &self.steps[i]) {
            Some(step) => CycleInputs {
                reset_n: step.reset_n,
                ui_in: step.inputs,
            },
            None => CycleInputs::in_reset(),
        }
    }

    /// Cycle of the last step: from here on the inputs no longer change.
    pub fn settled_at(&self) -> u64 {
        self.steps.last().map_or(0, |s| s.cycle)
    }

    /// The ordered steps.
    pub fn steps(&self) -> &[StimulusStep] {
        &self.steps
    }

    /// Inputs for cycles `0..cycles`.
    pub fn iter(&self, cycles: u64) -> impl Iterator<Item = CycleInputs> + '_ {
        (0..cycles).map(move |c| self.inputs_at(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitt_config::default_stimulus;

    fn step(cycle: u64, reset_n: bool, inputs: u8) -> StimulusStep {
        StimulusStep {
            cycle,
            reset_n,
            inputs,
        }
    }

    #[test]
    fn default_script_timeline() {
        let script = StimulusScript::new(default_stimulus());
        assert_eq!(script.inputs_at(0), CycleInputs::in_reset());
        assert_eq!(script.inputs_at(9), CycleInputs::in_reset());
        assert_eq!(script.inputs_at(10), CycleInputs::running(0));
        assert_eq!(script.inputs_at(19), CycleInputs::running(0));
        assert_eq!(script.inputs_at(20), CycleInputs::running(0b10_1001));
        assert_eq!(script.inputs_at(1_000_000), CycleInputs::running(0b10_1001));
        assert_eq!(script.settled_at(), 20);
    }

    #[test]
    fn before_first_step_is_reset() {
        let script = StimulusScript::new(vec![step(5, true, 1)]);
        assert_eq!(script.inputs_at(4), CycleInputs::in_reset());
        assert_eq!(script.inputs_at(5), CycleInputs::running(1));
    }

    #[test]
    fn unordered_steps_sorted_and_duplicates_replaced() {
        let script = StimulusScript::new(vec![
            step(10, true, 3),
            step(0, false, 0),
            step(10, true, 7),
        ]);
        assert_eq!(script.steps().len(), 2);
        assert_eq!(script.inputs_at(10).ui_in, 7);
    }

    #[test]
    fn iterates_requested_cycles() {
        let script = StimulusScript::new(vec![step(0, false, 0), step(2, true, 1)]);
        let seq: Vec<bool> = script.iter(4).map(|i| i.reset_n).collect();
        assert_eq!(seq, vec![false, false, true, true]);
    }

    #[test]
    fn empty_script_holds_reset() {
        let script = StimulusScript::default();
        assert_eq!(script.inputs_at(100), CycleInputs::in_reset());
        assert_eq!(script.settled_at(), 0);
    }
}
