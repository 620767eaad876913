//! VCD writer for model-generated (golden) traces.
//!
//! Produces IEEE 1364 Value Change Dump text readable by [`crate::vcd`],
//! GTKWave, Surfer and other viewers. Only value changes are written.

use std::io::{self, Write};

use kitt_common::{format_fs, LogicVec};

/// Handle of a signal declared on a [`VcdRecorder`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TraceSignal(usize);

struct Declared {
    id_code: String,
    width: u32,
    last: Option<LogicVec>,
}

/// VCD recorder writing to any [`Write`] sink.
///
/// Declare scopes and signals first, then record changes with
/// non-decreasing timestamps and call [`VcdRecorder::finish`].
pub struct VcdRecorder<W: Write> {
    writer: W,
    timescale_fs: u64,
    signals: Vec<Declared>,
    header_written: bool,
    definitions_closed: bool,
    current_time: Option<u64>,
}

impl<W: Write> VcdRecorder<W> {
    /// Creates a recorder whose timestamps count units of `timescale_fs`
    /// femtoseconds.
    pub fn new(writer: W, timescale_fs: u64) -> Self {
        Self {
            writer,
            timescale_fs: timescale_fs.max(1),
            signals: Vec::new(),
            header_written: false,
            definitions_closed: false,
            current_time: None,
        }
    }

    fn write_header(&mut self) -> io::Result<()> {
        if self.header_written {
            return Ok(());
        }
        writeln!(self.writer, "$version")?;
        writeln!(self.writer, "  kitt reference model {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(self.writer, "$end")?;
        writeln!(self.writer, "$timescale {} $end", format_fs(self.timescale_fs))?;
        self.header_written = true;
        Ok(())
    }

    /// Identifier code for a sequential index: printable ASCII from `!`,
    /// growing to several characters past 94 signals.
    fn make_id_code(index: usize) -> String {
        let mut result = String::new();
        let mut idx = index;
        loop {
            result.push((b'!' + (idx % 94) as u8) as char);
            idx /= 94;
            if idx == 0 {
                break;
            }
            idx -= 1;
        }
        result
    }

    fn format_value(value: &LogicVec, width: u32) -> String {
        if width == 1 {
            value.get(0).vcd_char().to_string()
        } else {
            let mut s = String::with_capacity(width as usize + 1);
            s.push('b');
            s.extend((0..width).rev().map(|i| value.get(i).vcd_char()));
            s
        }
    }

    /// Opens a scope (hierarchy level).
    pub fn begin_scope(&mut self, name: &str) -> io::Result<()> {
        self.write_header()?;
        writeln!(self.writer, "$scope module {name} $end")
    }

    /// Closes the innermost scope.
    pub fn end_scope(&mut self) -> io::Result<()> {
        writeln!(self.writer, "$upscope $end")
    }

    /// Declares a signal in the current scope.
    pub fn add_signal(&mut self, name: &str, width: u32) -> io::Result<TraceSignal> {
        self.write_header()?;
        let id_code = Self::make_id_code(self.signals.len());
        if width == 1 {
            writeln!(self.writer, "$var wire 1 {id_code} {name} $end")?;
        } else {
            writeln!(
                self.writer,
                "$var wire {width} {id_code} {name} [{}:0] $end",
                width - 1
            )?;
        }
        self.signals.push(Declared {
            id_code,
            width,
            last: None,
        });
        Ok(TraceSignal(self.signals.len() - 1))
    }

    /// Records `value` for `signal` at `time_fs`; unchanged values are
    /// skipped.
    pub fn change(&mut self, time_fs: u64, signal: TraceSignal, value: &LogicVec) -> io::Result<()> {
        let declared = self.signals.get(signal.0).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "signal not declared on this recorder")
        })?;
        if declared.last.as_ref() == Some(value) {
            return Ok(());
        }

        if !self.definitions_closed {
            self.write_header()?;
            writeln!(self.writer, "$enddefinitions $end")?;
            writeln!(self.writer, "$dumpvars")?;
            self.definitions_closed = true;
        }
        let time = time_fs / self.timescale_fs;
        if self.current_time != Some(time) {
            writeln!(self.writer, "#{time}")?;
            self.current_time = Some(time);
        }

        let declared = &mut self.signals[signal.0];
        let text = Self::format_value(value, declared.width);
        if declared.width == 1 {
            writeln!(self.writer, "{text}{}", declared.id_code)?;
        } else {
            writeln!(self.writer, "{text} {}", declared.id_code)?;
        }
        declared.last = Some(value.clone());
        Ok(())
    }

    /// Closes the definitions if nothing was recorded, writes a final
    /// timestamp when given, flushes, and returns the sink.
    pub fn finish(mut self, end_time_fs: Option<u64>) -> io::Result<W> {
        if !self.definitions_closed {
            self.write_header()?;
            writeln!(self.writer, "$enddefinitions $end")?;
        }
        if let Some(end) = end_time_fs {
            let end = end / self.timescale_fs;
            if self.current_time.map_or(true, |t| end > t) {
                writeln!(self.writer, "#{end}")?;
            }
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}
