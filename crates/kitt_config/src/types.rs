//! Configuration types deserialized from `kitt.toml`.

use kitt_model::{
    DebounceParams, LedArraySource, ModelParams, PwmParams, ScannerParams, UnsupportedModePolicy,
};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// The top-level configuration parsed from `kitt.toml`.
///
/// Every table is optional. A file with no tables at all describes the
/// design as shipped: a 10 MHz clock, 25 ms debounce sampling, 150 ms and
/// 100 ms comet steps and a 1000-cycle PWM period.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KittConfig {
    /// Design metadata (name, clock frequency).
    #[serde(default)]
    pub design: DesignConfig,
    /// Debounce filter constants.
    #[serde(default)]
    pub debounce: DebounceConfig,
    /// Scanner constants.
    #[serde(default)]
    pub scanner: ScannerConfig,
    /// Hierarchical names of the hardware signals in a trace.
    #[serde(default)]
    pub signals: SignalMap,
    /// Trace sampling settings.
    #[serde(default)]
    pub trace: TraceConfig,
    /// Input script for golden runs. Empty means the built-in script.
    #[serde(default)]
    pub stimulus: Vec<StimulusStep>,
}

impl KittConfig {
    /// The model construction constants described by this configuration.
    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            debounce: DebounceParams {
                sample_interval: self.debounce.sample_interval,
            },
            scanner: ScannerParams {
                speed_slow_ticks: self.scanner.speed_slow_ticks,
                speed_fast_ticks: self.scanner.speed_fast_ticks,
                pwm: PwmParams {
                    period: self.scanner.pwm_period,
                    duty: self.scanner.pwm_duty,
                },
                led_array: self.scanner.led_array,
                unsupported_mode: self.scanner.unsupported_mode,
            },
        }
    }

    /// The stimulus script, falling back to [`default_stimulus`] when the
    /// file defines none.
    pub fn stimulus_script(&self) -> Vec<StimulusStep> {
        if self.stimulus.is_empty() {
            default_stimulus()
        } else {
            self.stimulus.clone()
        }
    }
}

/// Design metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct DesignConfig {
    /// Design name, used as the top scope of recorded traces.
    #[serde(default = "default_design_name")]
    pub name: String,
    /// Clock frequency (e.g., `"10MHz"`), parsed to [`Frequency`](kitt_common::Frequency).
    #[serde(default = "default_clock")]
    pub clock: String,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            name: default_design_name(),
            clock: default_clock(),
        }
    }
}

fn default_design_name() -> String {
    "kitt_scanner".to_string()
}

fn default_clock() -> String {
    "10MHz".to_string()
}

/// Debounce filter constants.
#[derive(Debug, Clone, Deserialize)]
pub struct DebounceConfig {
    /// Cycles between two samples of the synchronized button.
    #[serde(default = "default_sample_interval")]
    pub sample_interval: u32,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            sample_interval: default_sample_interval(),
        }
    }
}

fn default_sample_interval() -> u32 {
    DebounceParams::default().sample_interval
}

/// Scanner constants.
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    /// Cycles per comet step at slow speed.
    #[serde(default = "default_slow_ticks")]
    pub speed_slow_ticks: u32,
    /// Cycles per comet step at fast speed.
    #[serde(default = "default_fast_ticks")]
    pub speed_fast_ticks: u32,
    /// PWM period in cycles.
    #[serde(default = "default_pwm_period")]
    pub pwm_period: u32,
    /// Clear thresholds of the three PWM taps.
    #[serde(default = "default_pwm_duty")]
    pub pwm_duty: [u32; 3],
    /// What the LED array shows when the PWM array is not selected.
    #[serde(default)]
    pub led_array: LedArraySource,
    /// Reaction to modes other than single.
    #[serde(default)]
    pub unsupported_mode: UnsupportedModePolicy,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            speed_slow_ticks: default_slow_ticks(),
            speed_fast_ticks: default_fast_ticks(),
            pwm_period: default_pwm_period(),
            pwm_duty: default_pwm_duty(),
            led_array: LedArraySource::default(),
            unsupported_mode: UnsupportedModePolicy::default(),
        }
    }
}

fn default_slow_ticks() -> u32 {
    ScannerParams::default().speed_slow_ticks
}

fn default_fast_ticks() -> u32 {
    ScannerParams::default().speed_fast_ticks
}

fn default_pwm_period() -> u32 {
    PwmParams::default().period
}

fn default_pwm_duty() -> [u32; 3] {
    PwmParams::default().duty
}

/// Hierarchical names (`scope.sub.signal`) of the traced hardware signals.
///
/// `clock`, `reset_n`, `inputs` and `pwm_out` are required for replay; the
/// rest are optional probes compared or reported when present.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalMap {
    /// Clock; rising edges define cycles.
    #[serde(default = "default_clock_signal")]
    pub clock: String,
    /// Active-low reset.
    #[serde(default = "default_reset_signal")]
    pub reset_n: String,
    /// 8-bit input bus.
    #[serde(default = "default_inputs_signal")]
    pub inputs: String,
    /// 8-bit PWM output bus.
    #[serde(default = "default_pwm_signal")]
    pub pwm_out: String,
    /// 8-bit LED output bus, compared when set.
    #[serde(default)]
    pub led_out: Option<String>,
    /// Debounced enable, compared when set.
    #[serde(default)]
    pub enable_out: Option<String>,
    /// Hardware FSM state, reported on divergence when set.
    #[serde(default)]
    pub state: Option<String>,
    /// Hardware PWM counter, reported on divergence when set.
    #[serde(default)]
    pub pwm_count: Option<String>,
}

impl SignalMap {
    /// Diagnostic probes as `(label, signal)` pairs.
    pub fn probes(&self) -> Vec<(&'static str, &str)> {
        let mut probes = Vec::new();
        if let Some(state) = &self.state {
            probes.push(("state", state.as_str()));
        }
        if let Some(count) = &self.pwm_count {
            probes.push(("pwm_count", count.as_str()));
        }
        probes
    }
}

impl Default for SignalMap {
    fn default() -> Self {
        Self {
            clock: default_clock_signal(),
            reset_n: default_reset_signal(),
            inputs: default_inputs_signal(),
            pwm_out: default_pwm_signal(),
            led_out: None,
            enable_out: None,
            state: None,
            pwm_count: None,
        }
    }
}

fn default_clock_signal() -> String {
    "tb.clk".to_string()
}

fn default_reset_signal() -> String {
    "tb.rst_n".to_string()
}

fn default_inputs_signal() -> String {
    "tb.ui_in".to_string()
}

fn default_pwm_signal() -> String {
    "tb.uo_out".to_string()
}

/// Trace sampling settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraceConfig {
    /// Where around each rising edge the hardware values are read.
    #[serde(default)]
    pub sample_point: SamplePoint,
}

/// Where around a rising clock edge a traced value is read.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SamplePoint {
    /// The last value strictly before the edge: what the edge's registers
    /// load from, and what a testbench sees right after the edge settles.
    #[default]
    BeforeEdge,
    /// The value recorded at the edge timestamp itself.
    AtEdge,
}

/// One step of a stimulus script: from `cycle` on, drive these values.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct StimulusStep {
    /// First cycle the values apply to.
    pub cycle: u64,
    /// Active-low reset level.
    #[serde(default = "default_reset_n")]
    pub reset_n: bool,
    /// 8-bit input bus value (integer or `"0b..."`/`"0x..."` string).
    #[serde(default, deserialize_with = "deserialize_bus_value")]
    pub inputs: u8,
}

fn default_reset_n() -> bool {
    true
}

/// The built-in script: 10 cycles in reset, 10 idle cycles, then the enable
/// button pressed with the PWM array selected at fast speed.
pub fn default_stimulus() -> Vec<StimulusStep> {
    vec![
        StimulusStep {
            cycle: 0,
            reset_n: false,
            inputs: 0,
        },
        StimulusStep {
            cycle: 10,
            reset_n: true,
            inputs: 0,
        },
        StimulusStep {
            cycle: 20,
            reset_n: true,
            inputs: 0b10_1001,
        },
    ]
}

/// Deserializes an 8-bit bus value given as an integer or as a string with an
/// optional `0b`/`0x` prefix and `_` separators.
///
/// Allows `inputs = 41`, `inputs = 0b10_1001` (TOML binary literal) and
/// `inputs = "0b10_1001"` alike.
fn deserialize_bus_value<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    struct BusValue;

    impl<'de> Visitor<'de> for BusValue {
        type Value = u8;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("an 8-bit integer or a \"0b\"/\"0x\" string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            u8::try_from(v).map_err(|_| E::custom(format!("bus value {v} does not fit in 8 bits")))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            u8::try_from(v).map_err(|_| E::custom(format!("bus value {v} does not fit in 8 bits")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            parse_bus_value(v).ok_or_else(|| E::custom(format!("invalid bus value '{v}'")))
        }
    }

    deserializer.deserialize_any(BusValue)
}

fn parse_bus_value(s: &str) -> Option<u8> {
    let cleaned: String = s.trim().chars().filter(|&c| c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();
    if let Some(bin) = lower.strip_prefix("0b") {
        u8::from_str_radix(bin, 2).ok()
    } else if let Some(hex) = lower.strip_prefix("0x") {
        u8::from_str_radix(hex, 16).ok()
    } else {
        lower.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn empty_file_reproduces_shipped_design() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.design.name, "kitt_scanner");
        assert_eq!(config.design.clock, "10MHz");
        assert_eq!(config.model_params(), ModelParams::default());
        assert_eq!(config.trace.sample_point, SamplePoint::BeforeEdge);
        assert_eq!(config.signals.pwm_out, "tb.uo_out");
        assert!(config.signals.probes().is_empty());
    }

    #[test]
    fn scanner_enums() {
        let toml = r#"
[scanner]
led_array = "dark"
unsupported_mode = "stall"
"#;
        let config = load_config_from_str(toml).unwrap();
        let params = config.model_params();
        assert_eq!(params.scanner.led_array, LedArraySource::Dark);
        assert_eq!(
            params.scanner.unsupported_mode,
            UnsupportedModePolicy::Stall
        );
    }

    #[test]
    fn unknown_led_array_is_parse_error() {
        let toml = r#"
[scanner]
led_array = "rainbow"
"#;
        assert!(load_config_from_str(toml).is_err());
    }

    #[test]
    fn sample_point_variants() {
        for (input, expected) in [
            ("before_edge", SamplePoint::BeforeEdge),
            ("at_edge", SamplePoint::AtEdge),
        ] {
            let toml = format!("[trace]\nsample_point = \"{input}\"\n");
            let config = load_config_from_str(&toml).unwrap();
            assert_eq!(config.trace.sample_point, expected);
        }
    }

    #[test]
    fn probes_in_fixed_order() {
        let toml = r#"
[signals]
pwm_count = "tb.dut.pwm_count"
state = "tb.dut.state"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(
            config.signals.probes(),
            vec![("state", "tb.dut.state"), ("pwm_count", "tb.dut.pwm_count")]
        );
    }

    #[test]
    fn stimulus_bus_value_forms() {
        let toml = r#"
[[stimulus]]
cycle = 0
reset_n = false

[[stimulus]]
cycle = 5
inputs = 41

[[stimulus]]
cycle = 6
inputs = 0b10_1001

[[stimulus]]
cycle = 7
inputs = "0b10_1001"

[[stimulus]]
cycle = 8
inputs = "0x29"
"#;
        let config = load_config_from_str(toml).unwrap();
        let script = config.stimulus_script();
        assert_eq!(script.len(), 5);
        assert!(!script[0].reset_n);
        assert_eq!(script[0].inputs, 0);
        assert!(script[1].reset_n);
        assert!(script[1..].iter().all(|s| s.inputs == 41));
    }

    #[test]
    fn stimulus_value_out_of_range() {
        let toml = "[[stimulus]]\ncycle = 0\ninputs = 300\n";
        assert!(load_config_from_str(toml).is_err());
        let toml = "[[stimulus]]\ncycle = 0\ninputs = \"0b1_0000_0000\"\n";
        assert!(load_config_from_str(toml).is_err());
    }

    #[test]
    fn default_script_used_when_none_given() {
        let config = load_config_from_str("").unwrap();
        let script = config.stimulus_script();
        assert_eq!(script, default_stimulus());
        assert_eq!(script.last().map(|s| s.inputs), Some(0b10_1001));
    }

    #[test]
    fn parse_bus_value_forms() {
        assert_eq!(parse_bus_value("255"), Some(255));
        assert_eq!(parse_bus_value("0B1111"), Some(15));
        assert_eq!(parse_bus_value("0xff"), Some(255));
        assert_eq!(parse_bus_value("0x100"), None);
        assert_eq!(parse_bus_value("abc"), None);
    }
}
