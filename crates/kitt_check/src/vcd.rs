//! VCD file loader for hardware simulation traces.
//!
//! Parses IEEE 1364 Value Change Dump files, plain or gzip-compressed, into a
//! [`Waveform`]: signal definitions plus per-signal value-change histories in
//! femtoseconds. Loading can be restricted to a set of signals so long
//! simulations only keep the histories the checker reads.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use kitt_common::time::unit_fs;
use kitt_common::{Logic, LogicVec};

use crate::error::TraceError;

/// Metadata for a signal declared in the VCD header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignalDef {
    /// The VCD identifier code (e.g., "!", "\"", "!\"").
    pub id_code: String,
    /// The hierarchical signal name (dotted path from the scope stack).
    pub name: String,
    /// Bit width of the signal.
    pub width: u32,
    /// The VCD variable type (e.g., "wire", "reg").
    pub var_type: String,
}

/// A loaded waveform.
#[derive(Clone, Debug, Default)]
pub struct Waveform {
    /// Femtoseconds per VCD time unit.
    pub timescale_fs: u64,
    /// Signal definitions in declaration order.
    pub signals: Vec<SignalDef>,
    /// Per-signal `(time_fs, value)` changes sorted by time, parallel to
    /// `signals`. Empty for signals excluded from loading.
    pub histories: Vec<Vec<(u64, LogicVec)>>,
}

impl Waveform {
    /// Index of the signal with hierarchical name `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.signals.iter().position(|s| s.name == name)
    }

    /// The value of signal `idx` established strictly before `time_fs`.
    pub fn value_before(&self, idx: usize, time_fs: u64) -> Option<&LogicVec> {
        let history = &self.histories[idx];
        let n = history.partition_point(|(t, _)| *t < time_fs);
        n.checked_sub(1).map(|i| &history[i].1)
    }

    /// The value of signal `idx` at `time_fs`, including changes recorded at
    /// exactly that time.
    pub fn value_at(&self, idx: usize, time_fs: u64) -> Option<&LogicVec> {
        let history = &self.histories[idx];
        let n = history.partition_point(|(t, _)| *t <= time_fs);
        n.checked_sub(1).map(|i| &history[i].1)
    }

    /// Timestamp of the last recorded change.
    pub fn end_time_fs(&self) -> u64 {
        self.histories
            .iter()
            .filter_map(|h| h.last().map(|(t, _)| *t))
            .max()
            .unwrap_or(0)
    }
}

/// Loads every signal of a VCD waveform from a buffered reader.
///
/// # Errors
///
/// Returns [`TraceError`] on I/O errors, parse errors, or a missing
/// `$enddefinitions`.
pub fn load_vcd<R: BufRead>(reader: R) -> Result<Waveform, TraceError> {
    VcdParser::new(None).parse(reader)
}

/// Loads a VCD waveform keeping histories only for the named signals.
///
/// All signals are still declared in [`Waveform::signals`].
pub fn load_vcd_signals<R: BufRead>(reader: R, names: &[&str]) -> Result<Waveform, TraceError> {
    let keep = names.iter().map(|n| n.to_string()).collect();
    VcdParser::new(Some(keep)).parse(reader)
}

/// Opens a VCD file, transparently decompressing gzip content.
///
/// Compression is detected from the gzip magic bytes, not the file name.
pub fn open_vcd_file(path: &Path) -> Result<Box<dyn BufRead>, TraceError> {
    let mut file = BufReader::new(File::open(path)?);
    let gzip = file.fill_buf()?.starts_with(&[0x1f, 0x8b]);
    if gzip {
        log::debug!("{}: gzip-compressed trace", path.display());
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(file))
    }
}

/// Loads a VCD file from a filesystem path, keeping only `names` when given.
pub fn load_vcd_file(path: &Path, names: Option<&[&str]>) -> Result<Waveform, TraceError> {
    let reader = open_vcd_file(path)?;
    let waveform = match names {
        Some(names) => load_vcd_signals(reader, names)?,
        None => load_vcd(reader)?,
    };
    log::info!(
        "loaded {} ({} signals, ends at {})",
        path.display(),
        waveform.signals.len(),
        kitt_common::format_fs(waveform.end_time_fs())
    );
    Ok(waveform)
}

/// Streaming parser state.
struct VcdParser {
    keep: Option<HashSet<String>>,
    waveform: Waveform,
    /// Identifier code to signal indices; one code may alias several vars.
    ids: HashMap<String, Vec<usize>>,
    scopes: Vec<String>,
    /// Open header keyword and the tokens collected for it so far.
    keyword: Option<(String, Vec<String>)>,
    in_definitions: bool,
    time_fs: u64,
    /// A `b`/`r` value waiting for its identifier on the next token.
    pending_vector: Option<String>,
    /// Inside a `$comment` block among the value changes.
    in_comment: bool,
}

impl VcdParser {
    fn new(keep: Option<HashSet<String>>) -> Self {
        Self {
            keep,
            waveform: Waveform {
                timescale_fs: 1,
                ..Waveform::default()
            },
            ids: HashMap::new(),
            scopes: Vec::new(),
            keyword: None,
            in_definitions: true,
            time_fs: 0,
            pending_vector: None,
            in_comment: false,
        }
    }

    fn parse<R: BufRead>(mut self, reader: R) -> Result<Waveform, TraceError> {
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_num = idx + 1;
            for token in line.split_whitespace() {
                if self.in_definitions {
                    self.definition_token(token, line_num)?;
                } else {
                    self.change_token(token, line_num)?;
                }
            }
        }

        if self.in_definitions && !self.waveform.signals.is_empty() {
            return Err(TraceError::FormatError(
                "missing $enddefinitions".to_string(),
            ));
        }
        Ok(self.waveform)
    }

    fn definition_token(&mut self, token: &str, line_num: usize) -> Result<(), TraceError> {
        if let Some((keyword, body)) = self.keyword.as_mut() {
            if token == "$end" {
                let keyword = std::mem::take(keyword);
                let body = std::mem::take(body);
                self.keyword = None;
                return self.process_keyword(&keyword, &body, line_num);
            }
            body.push(token.to_string());
            return Ok(());
        }

        match token.strip_prefix('$') {
            Some("enddefinitions") => {
                self.in_definitions = false;
                // The trailing `$end` is skipped in the value-change phase.
            }
            Some(keyword) if !keyword.is_empty() => {
                self.keyword = Some((keyword.to_ascii_lowercase(), Vec::new()));
            }
            _ => {
                return Err(TraceError::ParseError {
                    line: line_num,
                    message: format!("unexpected token in header: {token}"),
                });
            }
        }
        Ok(())
    }

    fn process_keyword(
        &mut self,
        keyword: &str,
        body: &[String],
        line_num: usize,
    ) -> Result<(), TraceError> {
        match keyword {
            "timescale" => {
                self.waveform.timescale_fs = parse_timescale(&body.concat(), line_num)?;
            }
            "scope" => {
                // "module <name>", "begin <name>", ...
                if let Some(name) = body.last() {
                    self.scopes.push(name.clone());
                }
            }
            "upscope" => {
                self.scopes.pop();
            }
            "var" => self.declare_var(body, line_num)?,
            // $comment, $date, $version, ...
            _ => {}
        }
        Ok(())
    }

    fn declare_var(&mut self, body: &[String], line_num: usize) -> Result<(), TraceError> {
        // "<type> <width> <id_code> <name> [<range>]"
        let [var_type, width, id_code, var_name, ..] = body else {
            return Err(TraceError::ParseError {
                line: line_num,
                message: format!("invalid $var: {}", body.join(" ")),
            });
        };
        let width: u32 = width.parse().map_err(|_| TraceError::ParseError {
            line: line_num,
            message: format!("invalid width in $var: {width}"),
        })?;

        let name = if self.scopes.is_empty() {
            var_name.clone()
        } else {
            format!("{}.{}", self.scopes.join("."), var_name)
        };
        let kept = self.keep.as_ref().map_or(true, |k| k.contains(&name));

        let idx = self.waveform.signals.len();
        self.waveform.signals.push(SignalDef {
            id_code: id_code.clone(),
            name,
            width,
            var_type: var_type.clone(),
        });
        self.waveform.histories.push(Vec::new());
        if kept {
            self.ids.entry(id_code.clone()).or_default().push(idx);
        }
        Ok(())
    }

    fn change_token(&mut self, token: &str, line_num: usize) -> Result<(), TraceError> {
        if let Some(value) = self.pending_vector.take() {
            self.record(token, |width| {
                if value.starts_with(['b', 'B']) {
                    Some(LogicVec::from_vcd_bits(&value[1..], width))
                } else {
                    None
                }
            });
            return Ok(());
        }

        if self.in_comment {
            self.in_comment = token != "$end";
            return Ok(());
        }
        if token == "$comment" {
            self.in_comment = true;
            return Ok(());
        }
        if token.starts_with('$') {
            // $dumpvars, $dumpon, $dumpoff, $dumpall, $end
            return Ok(());
        }

        if let Some(time) = token.strip_prefix('#') {
            let time: u64 = time.parse().map_err(|_| TraceError::ParseError {
                line: line_num,
                message: format!("invalid timestamp: {token}"),
            })?;
            self.time_fs = time
                .checked_mul(self.waveform.timescale_fs)
                .ok_or_else(|| TraceError::ParseError {
                    line: line_num,
                    message: format!("timestamp overflows femtoseconds: {token}"),
                })?;
            return Ok(());
        }

        let mut chars = token.chars();
        match chars.next() {
            Some('b' | 'B' | 'r' | 'R') => {
                self.pending_vector = Some(token.to_string());
            }
            Some(c) => match Logic::from_char(c) {
                Some(bit) => self.record(chars.as_str(), |width| {
                    Some(LogicVec::from_vcd_bits(&bit.vcd_char().to_string(), width))
                }),
                None => {
                    return Err(TraceError::ParseError {
                        line: line_num,
                        message: format!("invalid value change: {token}"),
                    });
                }
            },
            None => {}
        }
        Ok(())
    }

    /// Appends a change for every signal declared with `id_code`. `value`
    /// builds the value for a given width; `None` drops the change.
    fn record(&mut self, id_code: &str, value: impl Fn(u32) -> Option<LogicVec>) {
        let Some(indices) = self.ids.get(id_code) else {
            return;
        };
        for &idx in indices {
            let width = self.waveform.signals[idx].width;
            if let Some(v) = value(width) {
                self.waveform.histories[idx].push((self.time_fs, v));
            }
        }
    }
}

/// Parses a VCD timescale like "1ns", "10ps" or "100 fs" into femtoseconds.
fn parse_timescale(body: &str, line_num: usize) -> Result<u64, TraceError> {
    let s = body.trim();
    if s.is_empty() {
        return Ok(1);
    }

    let digit_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (num_str, unit_str) = s.split_at(digit_end);
    let num: u64 = if num_str.is_empty() {
        1
    } else {
        num_str.parse().map_err(|_| TraceError::ParseError {
            line: line_num,
            message: format!("invalid timescale number: {num_str}"),
        })?
    };

    let unit = unit_str.trim().to_ascii_lowercase();
    let fs_per = if unit.is_empty() {
        1
    } else {
        unit_fs(&unit).ok_or_else(|| TraceError::ParseError {
            line: line_num,
            message: format!("unknown timescale unit: {unit}"),
        })?
    };
    Ok(num * fs_per)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitt_common::time::{FS_PER_NS, FS_PER_PS};
    use std::io::{Cursor, Write};

    fn minimal_vcd() -> &'static str {
        "\
$date
  Simulation date
$end
$version
  Icarus Verilog
$end
$timescale
  1ns
$end
$scope module tb $end
$var wire 1 ! clk $end
$var wire 8 \" ui_in [7:0] $end
$scope module dut $end
$var reg 5 # state [4:0] $end
$upscope $end
$upscope $end
$enddefinitions $end
$dumpvars
0!
bx \"
b0 #
$end
#50
1!
#100
0!
b101001 \"
"
    }

    #[test]
    fn load_minimal_vcd() {
        let w = load_vcd(Cursor::new(minimal_vcd())).unwrap();
        assert_eq!(w.timescale_fs, FS_PER_NS);
        assert_eq!(w.signals.len(), 3);
        assert_eq!(w.signals[0].name, "tb.clk");
        assert_eq!(w.signals[1].name, "tb.ui_in");
        assert_eq!(w.signals[2].name, "tb.dut.state");
        assert_eq!(w.signals[2].var_type, "reg");

        let clk = &w.histories[0];
        assert_eq!(clk.len(), 3);
        assert_eq!(clk[1].0, 50 * FS_PER_NS);
        assert_eq!(clk[1].1, LogicVec::from_bool(true));

        let ui = &w.histories[1];
        assert_eq!(ui[0].1, LogicVec::unknown(8));
        assert_eq!(ui[1].1.to_u64(), Some(0b10_1001));
        assert_eq!(w.end_time_fs(), 100 * FS_PER_NS);
    }

    #[test]
    fn timescale_with_space() {
        let vcd = "$timescale 10 ps $end\n$var wire 1 ! s $end\n$enddefinitions $end\n#3\n1!\n";
        let w = load_vcd(Cursor::new(vcd)).unwrap();
        assert_eq!(w.timescale_fs, 10 * FS_PER_PS);
        assert_eq!(w.histories[0][0].0, 30 * FS_PER_PS);
        assert_eq!(w.signals[0].name, "s");
    }

    #[test]
    fn unknown_timescale_unit() {
        let vcd = "$timescale 1 parsec $end\n$enddefinitions $end\n";
        let err = load_vcd(Cursor::new(vcd)).unwrap_err();
        assert!(matches!(err, TraceError::ParseError { line: 1, .. }));
    }

    #[test]
    fn missing_enddefinitions() {
        let vcd = "$var wire 1 ! clk $end\n";
        let err = load_vcd(Cursor::new(vcd)).unwrap_err();
        assert!(matches!(err, TraceError::FormatError(_)));
    }

    #[test]
    fn invalid_timestamp() {
        let vcd = "$var wire 1 ! clk $end\n$enddefinitions $end\n#abc\n";
        let err = load_vcd(Cursor::new(vcd)).unwrap_err();
        assert!(matches!(err, TraceError::ParseError { line: 3, .. }));
    }

    #[test]
    fn comments_among_value_changes() {
        let vcd = "\
$var wire 1 ! clk $end
$enddefinitions $end
#0
$comment reset released by tb at 1 $end
1!
$comment
  spans #lines and b101 !
$end
#10
0!
";
        let w = load_vcd(Cursor::new(vcd)).unwrap();
        let clk = &w.histories[0];
        assert_eq!(clk.len(), 2);
        assert_eq!(clk[0], (0, LogicVec::from_bool(true)));
        assert_eq!(clk[1], (10, LogicVec::from_bool(false)));
    }

    #[test]
    fn aliased_identifier_codes() {
        let vcd = "\
$scope module tb $end
$var wire 1 ! clk $end
$scope module dut $end
$var wire 1 ! clk $end
$upscope $end
$upscope $end
$enddefinitions $end
#0
1!
";
        let w = load_vcd(Cursor::new(vcd)).unwrap();
        assert_eq!(w.histories[0].len(), 1);
        assert_eq!(w.histories[1].len(), 1);
    }

    #[test]
    fn real_values_are_skipped() {
        let vcd = "$var real 64 ! temp $end\n$var wire 1 \" s $end\n$enddefinitions $end\n#0\nr1.5 !\n1\"\n";
        let w = load_vcd(Cursor::new(vcd)).unwrap();
        assert!(w.histories[0].is_empty());
        assert_eq!(w.histories[1].len(), 1);
    }

    #[test]
    fn filtered_load_keeps_declarations() {
        let w = load_vcd_signals(Cursor::new(minimal_vcd()), &["tb.clk"]).unwrap();
        assert_eq!(w.signals.len(), 3);
        assert_eq!(w.histories[0].len(), 3);
        assert!(w.histories[1].is_empty());
        assert!(w.histories[2].is_empty());
    }

    #[test]
    fn value_before_and_at() {
        let w = load_vcd(Cursor::new(minimal_vcd())).unwrap();
        let clk = w.find("tb.clk").unwrap();
        let t = 50 * FS_PER_NS;
        assert_eq!(w.value_before(clk, t), Some(&LogicVec::from_bool(false)));
        assert_eq!(w.value_at(clk, t), Some(&LogicVec::from_bool(true)));
        assert_eq!(w.value_before(clk, 0), None);
        assert_eq!(w.find("tb.nothing"), None);
    }

    #[test]
    fn gzip_file_is_decompressed() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.vcd.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(minimal_vcd().as_bytes()).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let w = load_vcd_file(&path, None).unwrap();
        assert_eq!(w.signals.len(), 3);
        assert_eq!(w.histories[0].len(), 3);
    }

    #[test]
    fn plain_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.vcd");
        std::fs::write(&path, minimal_vcd()).unwrap();
        let w = load_vcd_file(&path, Some(&["tb.ui_in"])).unwrap();
        assert_eq!(w.histories[1].len(), 2);
        assert!(w.histories[0].is_empty());
    }
}
