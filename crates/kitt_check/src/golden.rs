//! Golden traces: the reference model driven by the stimulus script and
//! recorded as a VCD with the same signal names a hardware trace uses.
//!
//! Cycle `k` occupies `[k*P, (k+1)*P)` for clock period `P`. The clock falls
//! at `k*P`, where the cycle's inputs and the model outputs for that cycle
//! are also written, and rises at `k*P + P/2`. Sampling before each rising
//! edge therefore reads back exactly what the model consumed and produced.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use kitt_common::time::{FS_PER_NS, FS_PER_PS};
use kitt_common::{format_fs, LogicVec};
use kitt_config::{clock_frequency, ConfigError, KittConfig, SignalMap};
use kitt_model::{KittModel, ModelSnapshot};
use serde::Serialize;

use crate::error::CheckError;
use crate::recorder::{TraceSignal, VcdRecorder};
use crate::stimulus::StimulusScript;

/// Width of the recorded FSM state code.
const STATE_WIDTH: u32 = 5;

/// Result of a golden run.
#[derive(Debug, Clone, Serialize)]
pub struct GoldenSummary {
    /// Cycles simulated.
    pub cycles: u64,
    /// Clock period.
    pub period_fs: u64,
    /// Cycles on which the debounced enable was high.
    pub enabled_cycles: u64,
    /// Comet advance events.
    pub advances: u64,
    /// Model registers after the last cycle.
    pub final_state: ModelSnapshot,
}

impl fmt::Display for GoldenSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cycles ({}), {} enabled, {} advances, final state {}",
            self.cycles,
            format_fs(self.cycles.saturating_mul(self.period_fs)),
            self.enabled_cycles,
            self.advances,
            self.final_state.scanner.state,
        )
    }
}

/// The signal map of a golden trace recorded under `signals`.
///
/// Required names are kept. Optional probes left unset are placed next to
/// the clock (`<scope>.ena_out`, `<scope>.led_out`, `<scope>.state`,
/// `<scope>.pwm_count`), so the golden trace can be checked on every output.
pub fn golden_signals(signals: &SignalMap) -> SignalMap {
    let sibling = |leaf: &str| match signals.clock.rsplit_once('.') {
        Some((scope, _)) => format!("{scope}.{leaf}"),
        None => leaf.to_string(),
    };
    SignalMap {
        led_out: Some(signals.led_out.clone().unwrap_or_else(|| sibling("led_out"))),
        enable_out: Some(
            signals
                .enable_out
                .clone()
                .unwrap_or_else(|| sibling("ena_out")),
        ),
        state: Some(signals.state.clone().unwrap_or_else(|| sibling("state"))),
        pwm_count: Some(
            signals
                .pwm_count
                .clone()
                .unwrap_or_else(|| sibling("pwm_count")),
        ),
        ..signals.clone()
    }
}

/// Handles of the recorded signals.
struct Channels {
    clk: TraceSignal,
    rst_n: TraceSignal,
    ui_in: TraceSignal,
    ena_out: TraceSignal,
    pwm_out: TraceSignal,
    led_out: TraceSignal,
    state: TraceSignal,
    pwm_count: TraceSignal,
}

/// Runs the model for `cycles` cycles and records the trace to `writer`.
///
/// Returns the sink together with the run summary.
pub fn record_golden<W: Write>(
    writer: W,
    config: &KittConfig,
    cycles: u64,
) -> Result<(W, GoldenSummary), CheckError> {
    let period_fs = clock_period(config)?;
    let half = period_fs / 2;
    let script = StimulusScript::new(config.stimulus_script());
    let mut model = KittModel::new(config.model_params());
    let mut rec = VcdRecorder::new(writer, timescale_for(period_fs));
    let ch = declare(&mut rec, &golden_signals(&config.signals), pwm_count_width(config))?;

    let low = LogicVec::from_bool(false);
    let high = LogicVec::from_bool(true);
    let mut enabled_cycles = 0;
    let mut advances = 0;
    for (cycle, inputs) in script.iter(cycles).enumerate() {
        let cycle = cycle as u64;
        let out = model
            .step(inputs)
            .map_err(|source| CheckError::Model { cycle, source })?;
        enabled_cycles += u64::from(out.enable);
        advances += u64::from(out.advanced);

        let snap = model.scanner().snapshot();
        let fall = cycle * period_fs;
        rec.change(fall, ch.clk, &low)?;
        rec.change(fall, ch.rst_n, &LogicVec::from_bool(inputs.reset_n))?;
        rec.change(fall, ch.ui_in, &LogicVec::from_u64(u64::from(inputs.ui_in), 8))?;
        rec.change(fall, ch.ena_out, &LogicVec::from_bool(out.enable))?;
        rec.change(fall, ch.pwm_out, &out.pwm.to_logic_vec())?;
        rec.change(fall, ch.led_out, &out.led.to_logic_vec())?;
        rec.change(
            fall,
            ch.state,
            &LogicVec::from_u64(u64::from(snap.state_code), STATE_WIDTH),
        )?;
        rec.change(
            fall,
            ch.pwm_count,
            &LogicVec::from_u64(u64::from(snap.pwm_phase), pwm_count_width(config)),
        )?;
        rec.change(fall + half, ch.clk, &high)?;
    }

    let writer = rec.finish(Some(cycles * period_fs))?;
    let summary = GoldenSummary {
        cycles,
        period_fs,
        enabled_cycles,
        advances,
        final_state: model.snapshot(),
    };
    log::info!("golden run: {summary}");
    Ok((writer, summary))
}

/// Records a golden trace to `path`, gzip-compressed when it ends in `.gz`.
pub fn write_golden(
    path: &Path,
    config: &KittConfig,
    cycles: u64,
) -> Result<GoldenSummary, CheckError> {
    let file = BufWriter::new(File::create(path)?);
    let summary = if path.extension().is_some_and(|e| e == "gz") {
        let encoder = GzEncoder::new(file, Compression::default());
        let (encoder, summary) = record_golden(encoder, config, cycles)?;
        encoder.finish()?.flush()?;
        summary
    } else {
        let (mut file, summary) = record_golden(file, config, cycles)?;
        file.flush()?;
        summary
    };
    log::info!("wrote {}", path.display());
    Ok(summary)
}

fn clock_period(config: &KittConfig) -> Result<u64, CheckError> {
    let freq = clock_frequency(config)?;
    match freq.period_fs() {
        Some(p) if p >= 2 => Ok(p),
        _ => Err(ConfigError::invalid("design.clock", format!("{freq} is too fast to record")).into()),
    }
}

/// Coarsest unit that places both clock edges on whole ticks.
fn timescale_for(period_fs: u64) -> u64 {
    [FS_PER_NS, FS_PER_PS]
        .into_iter()
        .find(|&unit| period_fs % (2 * unit) == 0)
        .unwrap_or(1)
}

fn pwm_count_width(config: &KittConfig) -> u32 {
    let max = config.scanner.pwm_period.saturating_sub(1);
    (u32::BITS - max.leading_zeros()).max(1)
}

fn declare<W: Write>(
    rec: &mut VcdRecorder<W>,
    signals: &SignalMap,
    pwm_count_width: u32,
) -> io::Result<Channels> {
    let optional = |name: &Option<String>| name.clone().unwrap_or_default();
    let entries = [
        (signals.clock.clone(), 1),
        (signals.reset_n.clone(), 1),
        (signals.inputs.clone(), 8),
        (optional(&signals.enable_out), 1),
        (signals.pwm_out.clone(), 8),
        (optional(&signals.led_out), 8),
        (optional(&signals.state), STATE_WIDTH),
        (optional(&signals.pwm_count), pwm_count_width),
    ];
    let handles = declare_hierarchy(rec, &entries)?;
    Ok(Channels {
        clk: handles[0],
        rst_n: handles[1],
        ui_in: handles[2],
        ena_out: handles[3],
        pwm_out: handles[4],
        led_out: handles[5],
        state: handles[6],
        pwm_count: handles[7],
    })
}

/// Declares dotted names as nested scopes; returns one handle per entry.
/// Entries sharing a name share a handle.
fn declare_hierarchy<W: Write>(
    rec: &mut VcdRecorder<W>,
    entries: &[(String, u32)],
) -> io::Result<Vec<TraceSignal>> {
    let split = |name: &str| -> (Vec<String>, String) {
        let mut parts: Vec<String> = name.split('.').map(str::to_string).collect();
        let leaf = parts.pop().unwrap_or_default();
        (parts, leaf)
    };

    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| split(&entries[a].0).0.cmp(&split(&entries[b].0).0));

    let mut handles: Vec<Option<TraceSignal>> = vec![None; entries.len()];
    let mut declared: HashMap<&str, TraceSignal> = HashMap::new();
    let mut open: Vec<String> = Vec::new();
    for i in order {
        let (name, width) = &entries[i];
        if let Some(&h) = declared.get(name.as_str()) {
            handles[i] = Some(h);
            continue;
        }
        let (scopes, leaf) = split(name);
        let common = open
            .iter()
            .zip(&scopes)
            .take_while(|(a, b)| a == b)
            .count();
        while open.len() > common {
            rec.end_scope()?;
            open.pop();
        }
        for scope in &scopes[common..] {
            rec.begin_scope(scope)?;
            open.push(scope.clone());
        }
        let h = rec.add_signal(&leaf, *width)?;
        declared.insert(name.as_str(), h);
        handles[i] = Some(h);
    }
    for _ in open {
        rec.end_scope()?;
    }
    Ok(handles.into_iter().flatten().collect())
}
