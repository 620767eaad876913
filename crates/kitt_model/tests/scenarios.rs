//! Cycle-level scenarios for the debounce filter, the scanner and the
//! composed model.

use kitt_model::{
    CycleInputs, DebounceModel, DebounceParams, KittModel, ModelParams, PwmParams, RunPhase,
    ScanConfig, ScanState, ScannerModel, ScannerParams, Slots, RUN_PHASES,
};

const SINGLE_SLOW_PWM: u8 = 0b10_0000;
const INVERT: u8 = 0b1_0000;

fn scanner_params() -> ScannerParams {
    ScannerParams {
        speed_slow_ticks: 8,
        speed_fast_ticks: 5,
        pwm: PwmParams {
            period: 6,
            duty: [4, 3, 2],
        },
        ..ScannerParams::default()
    }
}

fn enabled(s: &mut ScannerModel, ui_in: u8) -> kitt_model::ScannerOutputs {
    s.update(false, true, ScanConfig::from_inputs(ui_in))
        .expect("single mode never fails")
}

#[test]
fn reset_release_idle_capture_run() {
    let mut s = ScannerModel::new(scanner_params());
    for _ in 0..4 {
        s.update(true, true, ScanConfig::from_inputs(SINGLE_SLOW_PWM))
            .unwrap();
        assert_eq!(s.state(), ScanState::Idle);
    }

    enabled(&mut s, SINGLE_SLOW_PWM);
    assert_eq!(s.state(), ScanState::Capture);
    enabled(&mut s, SINGLE_SLOW_PWM);
    assert_eq!(s.state(), ScanState::Run(RunPhase::FIRST));
    enabled(&mut s, SINGLE_SLOW_PWM);
    assert_eq!(s.pattern().bits(), [true, false, false, false, false, false, false, false]);
}

#[test]
fn debounce_output_follows_full_window_by_one_cycle() {
    let mut m = DebounceModel::new(DebounceParams { sample_interval: 4 });
    m.update(true, true);

    let mut full_window_at = None;
    let mut filtered_at = None;
    let mut output_at = None;
    for call in 1..=20 {
        let out = m.update(false, true);
        if full_window_at.is_none() && m.window() == [true, true, true] {
            full_window_at = Some(call);
        }
        if filtered_at.is_none() && m.filtered() {
            filtered_at = Some(call);
        }
        if output_at.is_none() && out {
            output_at = Some(call);
        }
    }

    assert_eq!(full_window_at, Some(14));
    assert_eq!(filtered_at, Some(15));
    assert_eq!(output_at, Some(16));
}

#[test]
fn enable_drop_mid_run_clears_outputs_same_cycle() {
    let mut s = ScannerModel::new(scanner_params());
    enabled(&mut s, SINGLE_SLOW_PWM);
    for _ in 0..40 {
        enabled(&mut s, SINGLE_SLOW_PWM);
    }
    assert!(s.state().is_running());
    assert_ne!(s.outputs().pwm, Slots::DARK);

    let out = s.update(false, false, ScanConfig::default()).unwrap();
    assert_eq!(s.state(), ScanState::Idle);
    assert_eq!(out.pwm, Slots::DARK);
    assert_eq!(out.led, Slots::DARK);
}

#[test]
fn inversion_complements_both_arrays() {
    let mut plain = ScannerModel::new(scanner_params());
    let mut inverted = ScannerModel::new(scanner_params());
    for _ in 0..200 {
        let a = enabled(&mut plain, SINGLE_SLOW_PWM);
        let b = enabled(&mut inverted, SINGLE_SLOW_PWM | INVERT);
        assert_eq!(b.pwm, a.pwm.inverted());
        assert_eq!(b.led, a.led.inverted());
    }
}

#[test]
fn ring_traversal_visits_every_phase_in_order() {
    let params = scanner_params();
    let ticks = params.speed_slow_ticks as usize;
    let mut s = ScannerModel::new(params);
    enabled(&mut s, SINGLE_SLOW_PWM);
    enabled(&mut s, SINGLE_SLOW_PWM);

    let mut codes = Vec::new();
    for _ in 0..(ticks * RUN_PHASES as usize * 2) {
        enabled(&mut s, SINGLE_SLOW_PWM);
        codes.push(s.state().code());
    }

    let expected: Vec<u8> = RunPhase::all()
        .chain(RunPhase::all())
        .flat_map(|p| std::iter::repeat(p.state_code()).take(ticks))
        .collect();
    assert_eq!(codes, expected);
}

#[test]
fn fast_speed_uses_fast_reload() {
    let params = scanner_params();
    let mut s = ScannerModel::new(params);
    enabled(&mut s, SINGLE_SLOW_PWM | 0b1000);
    enabled(&mut s, 0);

    let mut advances = Vec::new();
    for cycle in 0..30 {
        if enabled(&mut s, 0).advanced {
            advances.push(cycle);
        }
    }
    let period = params.speed_fast_ticks as usize;
    assert_eq!(advances, vec![period, 2 * period, 3 * period, 4 * period, 5 * period]);
}

#[test]
fn exactly_one_head_outside_overscan() {
    let mut s = ScannerModel::new(scanner_params());
    enabled(&mut s, SINGLE_SLOW_PWM);
    enabled(&mut s, SINGLE_SLOW_PWM);
    for _ in 0..400 {
        enabled(&mut s, SINGLE_SLOW_PWM);
        let ScanState::Run(phase) = s.state() else {
            panic!("left RUN while enabled");
        };
        let head = phase.head();
        if !phase.is_overscan() {
            assert!(s.pattern().get(head as usize), "{phase}: head slot dark");
        }
        assert!(s.pattern().count_lit() <= 4);
    }
}

#[test]
fn composed_model_runs_after_button_press() {
    let params = ModelParams {
        debounce: DebounceParams { sample_interval: 2 },
        scanner: scanner_params(),
    };
    let mut m = KittModel::new(params);
    for _ in 0..10 {
        m.step(CycleInputs::in_reset()).unwrap();
    }

    let ui_in = SINGLE_SLOW_PWM | 0b1000 | 1;
    let mut lit = 0;
    for _ in 0..300 {
        let out = m.step(CycleInputs::running(ui_in)).unwrap();
        if out.pwm != Slots::DARK {
            lit += 1;
        }
        // With the PWM array selected both buses carry the pattern.
        assert_eq!(out.led, out.pwm);
    }
    assert!(lit > 150);
    assert!(m.scanner().state().is_running());
    assert_eq!(m.cycle(), 310);
}
