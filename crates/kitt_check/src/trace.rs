//! Replay of a hardware VCD trace as a sequence of per-edge samples.

use std::path::Path;

use kitt_common::{Logic, LogicVec};
use kitt_config::{SamplePoint, SignalMap};

use crate::error::{CheckError, TraceError};
use crate::probe::{EdgeSample, HardwareProbe};
use crate::vcd::{load_vcd_file, Waveform};

/// A resolved trace signal: index into the waveform plus declared width.
#[derive(Clone, Copy, Debug)]
struct Resolved {
    idx: usize,
    width: u32,
}

/// A hardware trace replayed one rising clock edge at a time.
#[derive(Debug)]
pub struct VcdTrace {
    waveform: Waveform,
    edges: Vec<u64>,
    next: usize,
    sample_point: SamplePoint,
    reset_n: Resolved,
    inputs: Resolved,
    pwm_out: Resolved,
    led_out: Option<Resolved>,
    enable_out: Option<Resolved>,
    probes: Vec<(String, Resolved)>,
}

impl VcdTrace {
    /// Loads `path` (plain or gzip VCD) keeping only the mapped signals.
    pub fn open(
        path: &Path,
        signals: &SignalMap,
        sample_point: SamplePoint,
    ) -> Result<Self, TraceError> {
        let mut names = vec![
            signals.clock.as_str(),
            signals.reset_n.as_str(),
            signals.inputs.as_str(),
            signals.pwm_out.as_str(),
        ];
        names.extend(signals.led_out.as_deref());
        names.extend(signals.enable_out.as_deref());
        names.extend(signals.probes().into_iter().map(|(_, name)| name));

        let waveform = load_vcd_file(path, Some(names.as_slice()))?;
        Self::from_waveform(waveform, signals, sample_point)
    }

    /// Resolves the mapped signals in an already loaded waveform.
    pub fn from_waveform(
        waveform: Waveform,
        signals: &SignalMap,
        sample_point: SamplePoint,
    ) -> Result<Self, TraceError> {
        let clock = resolve(&waveform, &signals.clock, Some(1))?;
        let reset_n = resolve(&waveform, &signals.reset_n, Some(1))?;
        let inputs = resolve(&waveform, &signals.inputs, Some(8))?;
        let pwm_out = resolve(&waveform, &signals.pwm_out, Some(8))?;
        let led_out = signals
            .led_out
            .as_deref()
            .map(|name| resolve(&waveform, name, Some(8)))
            .transpose()?;
        let enable_out = signals
            .enable_out
            .as_deref()
            .map(|name| resolve(&waveform, name, Some(1)))
            .transpose()?;
        let probes = signals
            .probes()
            .into_iter()
            .map(|(label, name)| Ok((label.to_string(), resolve(&waveform, name, None)?)))
            .collect::<Result<Vec<_>, TraceError>>()?;

        let edges = rising_edges(&waveform.histories[clock.idx]);
        if edges.is_empty() {
            return Err(TraceError::NoClockEdges(signals.clock.clone()));
        }
        log::info!(
            "trace has {} rising edges on '{}', sampling {}",
            edges.len(),
            signals.clock,
            match sample_point {
                SamplePoint::BeforeEdge => "before each edge",
                SamplePoint::AtEdge => "at each edge",
            }
        );

        Ok(Self {
            waveform,
            edges,
            next: 0,
            sample_point,
            reset_n,
            inputs,
            pwm_out,
            led_out,
            enable_out,
            probes,
        })
    }

    /// Number of rising clock edges in the trace.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Rising edge timestamps in femtoseconds.
    pub fn edges(&self) -> &[u64] {
        &self.edges
    }

    /// Builds the sample for edge `cycle`, or `None` past the last edge.
    pub fn sample(&self, cycle: usize) -> Option<EdgeSample> {
        let time_fs = *self.edges.get(cycle)?;
        let read = |r: Resolved| self.read(r, time_fs);
        Some(EdgeSample {
            cycle: cycle as u64,
            time_fs,
            reset_n: read(self.reset_n).get(0),
            inputs: read(self.inputs),
            pwm_out: read(self.pwm_out),
            led_out: self.led_out.map(read),
            enable_out: self.enable_out.map(|r| read(r).get(0)),
            probes: self
                .probes
                .iter()
                .map(|(label, r)| (label.clone(), read(*r)))
                .collect(),
        })
    }

    fn read(&self, r: Resolved, time_fs: u64) -> LogicVec {
        let value = match self.sample_point {
            SamplePoint::BeforeEdge => self.waveform.value_before(r.idx, time_fs),
            SamplePoint::AtEdge => self.waveform.value_at(r.idx, time_fs),
        };
        value.cloned().unwrap_or_else(|| LogicVec::unknown(r.width))
    }
}

impl HardwareProbe for VcdTrace {
    fn next_edge(&mut self) -> Result<Option<EdgeSample>, CheckError> {
        let sample = self.sample(self.next);
        if sample.is_some() {
            self.next += 1;
        }
        Ok(sample)
    }

    fn has_led_out(&self) -> bool {
        self.led_out.is_some()
    }

    fn has_enable_out(&self) -> bool {
        self.enable_out.is_some()
    }
}

fn resolve(waveform: &Waveform, name: &str, width: Option<u32>) -> Result<Resolved, TraceError> {
    let idx = waveform.find(name).ok_or_else(|| TraceError::MissingSignal {
        name: name.to_string(),
    })?;
    let found = waveform.signals[idx].width;
    if let Some(expected) = width {
        if found != expected {
            return Err(TraceError::WidthMismatch {
                name: name.to_string(),
                expected,
                found,
            });
        }
    }
    Ok(Resolved { idx, width: found })
}

/// Timestamps of every 0 → 1 transition.
fn rising_edges(history: &[(u64, LogicVec)]) -> Vec<u64> {
    let mut edges = Vec::new();
    let mut prev = Logic::X;
    for (time, value) in history {
        let bit = value.get(0);
        if prev == Logic::Zero && bit == Logic::One {
            edges.push(*time);
        }
        prev = bit;
    }
    edges
}
