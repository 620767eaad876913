//! Cycle-accurate reference models for the KITT scanner design.
//!
//! Two register-level models are advanced once per rising clock edge, in a
//! fixed order:
//!
//! 1. [`DebounceModel`]: 2-stage synchronizer, 3-sample majority-hold
//!    filter and one cycle of output registration on input bit 0.
//! 2. [`ScannerModel`]: the scanning FSM (IDLE, CAPTURE and the 22-phase
//!    RUN ring), the shift timer, three PWM duty taps and the output
//!    select/invert stage, enabled by the debounced bit.
//!
//! [`KittModel`] wires the two together the way the hardware top level does.
//! Every update takes its inputs explicitly, so the models are pure functions
//! of (previous state, this cycle's inputs).
//!
//! # Usage
//!
//! ```
//! use kitt_model::{CycleInputs, KittModel, ModelParams};
//!
//! let mut model = KittModel::new(ModelParams::default());
//! let out = model.step(CycleInputs { reset_n: false, ui_in: 0 }).unwrap();
//! assert!(!out.enable);
//! assert_eq!(out.pwm.to_u8(), 0);
//! ```

#![warn(missing_docs)]

pub mod comet;
pub mod debounce;
pub mod error;
pub mod inputs;
pub mod model;
pub mod pwm;
pub mod scanner;
pub mod slots;
pub mod timer;

pub use comet::{comet_pattern, RunPhase, Taps, RUN_PHASES};
pub use debounce::{DebounceModel, DebounceParams, DebounceSnapshot, DebounceStage};
pub use error::ModelError;
pub use inputs::{Mode, OutputSelect, ScanConfig, Speed};
pub use model::{CycleInputs, CycleOutputs, KittModel, ModelParams, ModelSnapshot};
pub use pwm::{PwmGenerator, PwmParams};
pub use scanner::{
    LedArraySource, ScanState, ScannerModel, ScannerOutputs, ScannerParams, ScannerSnapshot,
    UnsupportedModePolicy,
};
pub use slots::{Slots, SLOT_COUNT};
pub use timer::ShiftTimer;
