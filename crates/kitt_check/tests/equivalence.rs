//! End-to-end checks: golden traces recorded by the model are replayed
//! through the checker, intact and with injected faults.

use std::io::Cursor;
use std::path::Path;

use kitt_check::{
    check_trace, golden_signals, load_vcd, record_golden, write_golden, CheckError,
    CompareSet, EquivalenceChecker, HardwareProbe, VcdTrace, Waveform,
};
use kitt_common::time::FS_PER_NS;
use kitt_common::LogicVec;
use kitt_config::{load_config_from_str, KittConfig, SamplePoint, SignalMap};

/// 10 MHz clock: 100 ns per cycle.
const PERIOD_FS: u64 = 100 * FS_PER_NS;

const CONFIG: &str = r#"
[design]
name = "kitt_scanner"
clock = "10MHz"

[debounce]
sample_interval = 2

[scanner]
speed_slow_ticks = 6
speed_fast_ticks = 4
pwm_period = 8
pwm_duty = [6, 3, 1]
"#;

fn config() -> KittConfig {
    let mut config = load_config_from_str(CONFIG).unwrap();
    config.signals = golden_signals(&config.signals);
    config
}

fn golden_waveform(config: &KittConfig, cycles: u64) -> Waveform {
    let (text, _) = record_golden(Vec::new(), config, cycles).unwrap();
    load_vcd(Cursor::new(text)).unwrap()
}

fn run(config: &KittConfig, waveform: Waveform) -> Result<kitt_check::CheckSummary, CheckError> {
    let mut trace =
        VcdTrace::from_waveform(waveform, &config.signals, config.trace.sample_point).unwrap();
    let compare = CompareSet::from_probe(&trace);
    EquivalenceChecker::new(config.model_params(), compare).run(&mut trace, None)
}

/// Replaces the value of `signal` during the low clock phase of `cycle`.
fn glitch(waveform: &mut Waveform, signal: &str, cycle: u64, value: LogicVec) {
    let idx = waveform.find(signal).unwrap();
    let start = cycle * PERIOD_FS + FS_PER_NS;
    let end = cycle * PERIOD_FS + PERIOD_FS / 2 + FS_PER_NS;
    let restore = waveform.value_before(idx, end).unwrap().clone();
    let history = &mut waveform.histories[idx];
    history.retain(|(t, _)| *t < start || *t >= end);
    let at = history.partition_point(|(t, _)| *t < start);
    history.insert(at, (start, value));
    history.insert(at + 1, (end, restore));
}

#[test]
fn golden_trace_passes_its_own_check() {
    let config = config();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("golden.vcd");
    let golden = write_golden(&path, &config, 400).unwrap();

    let summary = check_trace(&path, &config, None).unwrap();
    assert_eq!(summary.cycles, 400);
    // Edge 0 is in reset and arms the comparison.
    assert_eq!(summary.checked, 399);
    assert_eq!(summary.reset_cycles, 10);
    assert_eq!(summary.enabled_cycles, golden.enabled_cycles);
    assert_eq!(summary.advances, golden.advances);
    assert_eq!(summary.compared, vec!["enable_out", "pwm_out", "led_out"]);
}

#[test]
fn compressed_golden_trace_passes() {
    let config = config();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("golden.vcd.gz");
    write_golden(&path, &config, 120).unwrap();
    let summary = check_trace(&path, &config, Some(100)).unwrap();
    assert_eq!(summary.cycles, 100);
}

#[test]
fn both_sample_points_agree_on_golden_trace() {
    let mut config = config();
    for point in [SamplePoint::BeforeEdge, SamplePoint::AtEdge] {
        config.trace.sample_point = point;
        let summary = run(&config, golden_waveform(&config, 150)).unwrap();
        assert_eq!(summary.checked, 149);
    }
}

#[test]
fn pwm_glitch_reported_at_its_cycle() {
    let config = config();
    let mut waveform = golden_waveform(&config, 300);
    let idx = waveform.find("tb.uo_out").unwrap();
    let mut bad = waveform
        .value_before(idx, 200 * PERIOD_FS + PERIOD_FS / 2)
        .unwrap()
        .clone();
    bad.set(2, !bad.get(2));
    glitch(&mut waveform, "tb.uo_out", 200, bad);

    let err = run(&config, waveform).unwrap_err();
    let CheckError::Divergence(d) = err else {
        panic!("expected divergence");
    };
    assert_eq!(d.cycle, 200);
    assert_eq!(d.signal, "pwm_out");
    assert_eq!(d.bits, vec![2]);
    assert_eq!(d.time_fs, 200 * PERIOD_FS + PERIOD_FS / 2);
    let report = d.to_string();
    assert!(report.starts_with("divergence on 'pwm_out' at cycle 200 (20050 ns)"));
    assert!(report.contains("\nhardware: rst_n=1 ui_in=00101001"), "{report}");
}

#[test]
fn stuck_enable_reported() {
    let config = config();
    let mut waveform = golden_waveform(&config, 100);
    glitch(&mut waveform, "tb.ena_out", 60, LogicVec::from_bool(false));
    let err = run(&config, waveform).unwrap_err();
    assert!(matches!(err, CheckError::Divergence(d) if d.signal == "enable_out" && d.cycle == 60));
}

#[test]
fn mismatched_speed_constant_diverges() {
    let recorded = config();
    let waveform = golden_waveform(&recorded, 300);

    let mut checking = recorded.clone();
    checking.scanner.speed_fast_ticks = 5;
    checking.scanner.speed_slow_ticks = 7;
    let err = run(&checking, waveform).unwrap_err();
    let CheckError::Divergence(d) = err else {
        panic!("expected divergence");
    };
    // Enable is pressed at cycle 20, so the comet has started by then.
    assert!(d.cycle > 20);
    assert!(d.signal == "pwm_out" || d.signal == "led_out");
}

#[test]
fn only_mapped_outputs_are_compared() {
    let mut config = config();
    let waveform = golden_waveform(&config, 80);
    config.signals = SignalMap {
        state: Some("tb.state".into()),
        ..SignalMap::default()
    };
    let mut trace =
        VcdTrace::from_waveform(waveform, &config.signals, SamplePoint::BeforeEdge).unwrap();
    assert!(!trace.has_led_out());
    assert!(!trace.has_enable_out());
    let compare = CompareSet::from_probe(&trace);
    let summary = EquivalenceChecker::new(config.model_params(), compare)
        .run(&mut trace, None)
        .unwrap();
    assert_eq!(summary.compared, vec!["pwm_out"]);
}

#[test]
fn missing_trace_file() {
    let err = check_trace(Path::new("/nonexistent/trace.vcd"), &config(), None).unwrap_err();
    assert!(matches!(err, CheckError::Trace(_)));
}
