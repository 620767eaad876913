//! Equivalence checking of KITT scanner hardware against the reference model.
//!
//! A [`HardwareProbe`] yields one [`EdgeSample`] per rising clock edge: the
//! inputs the design saw and the outputs it drove. The
//! [`EquivalenceChecker`] steps a [`kitt_model::KittModel`] on the same
//! inputs and stops at the first cycle where any compared output differs,
//! reporting a [`Divergence`] with both sides' state.
//!
//! Hardware samples usually come from a simulation dump replayed by
//! [`VcdTrace`]. [`golden`] runs the model alone from a stimulus script and
//! records a trace in the same format, which must pass its own check.

#![warn(missing_docs)]

pub mod checker;
pub mod error;
pub mod golden;
pub mod probe;
pub mod recorder;
pub mod stimulus;
pub mod trace;
pub mod vcd;

pub use checker::{CheckSummary, CompareSet, EquivalenceChecker};
pub use error::{CheckError, Divergence, TraceError};
pub use golden::{golden_signals, record_golden, write_golden, GoldenSummary};
pub use probe::{EdgeSample, HardwareProbe, SampleQueue};
pub use recorder::{TraceSignal, VcdRecorder};
pub use stimulus::StimulusScript;
pub use trace::VcdTrace;
pub use vcd::{load_vcd, load_vcd_file, SignalDef, Waveform};

use std::path::Path;

use kitt_config::KittConfig;

/// Replays the trace at `path` through a checker built from `config`.
///
/// The LED bus and debounced enable are compared when the signal map names
/// them. At most `limit` edges are checked.
pub fn check_trace(
    path: &Path,
    config: &KittConfig,
    limit: Option<u64>,
) -> Result<CheckSummary, CheckError> {
    let mut trace = VcdTrace::open(path, &config.signals, config.trace.sample_point)?;
    let mut checker =
        EquivalenceChecker::new(config.model_params(), CompareSet::from_probe(&trace));
    checker.run(&mut trace, limit)
}
