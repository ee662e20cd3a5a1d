//! Dual-sink output: everything goes to the log, the console gets a copy
//! unless quiet.
//!
//! The three writers share one small capability, [`Sink`]:
//!
//! - [`ConsoleSink`]: a borrowed console stream; closing it only flushes
//! - [`FileSink`]: the log file, opened in append mode
//! - [`Output`]: the fan-out writer composed over the other two
//!
//! `Output` implements [`std::io::Write`], so probes write with `writeln!`.
//!
//! ## Quiet mode
//!
//! The quiet flag is set once at startup with [`Output::set_quiet`]. Any
//! transient change goes through [`Output::visible`] or [`Output::silenced`],
//! which return a guard that restores the previous value when dropped, on
//! every exit path:
//!
//! ```rust
//! use dbprobelib::output::Output;
//! use std::io::Write;
//!
//! # fn demo(out: &mut Output) -> std::io::Result<()> {
//! out.set_quiet(true);
//! writeln!(out, "only in the log")?;
//! {
//!     let mut out = out.visible();
//!     writeln!(out, "on the console too")?;
//! }
//! assert!(out.is_quiet());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::ops::{Deref, DerefMut};
use std::path::Path;

use console::Term;

use crate::error::Error;

/// Something lines can be written to.
pub trait Sink {
    /// Append `buf` in full.
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Push buffered bytes to the underlying target.
    fn flush(&mut self) -> io::Result<()>;

    /// Release the target. Later writes fail.
    fn close(&mut self) -> io::Result<()>;
}

/// The interactive console.
///
/// The stream is borrowed from the process: [`Sink::close`] flushes it but
/// never closes it.
pub struct ConsoleSink {
    inner: Box<dyn Write>,
}

impl ConsoleSink {
    /// Console sink over the process stdout.
    pub fn stdout() -> Self {
        Self::new(Term::stdout())
    }

    /// Console sink over any writer (used by tests and embedding callers).
    pub fn new(inner: impl Write + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }
}

impl Sink for ConsoleSink {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Append-only log file.
///
/// Line buffered; the append position is never moved.
pub struct FileSink {
    file: Option<LineWriter<File>>,
}

impl FileSink {
    /// Open (or create) `path` for appending.
    pub fn append(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| Error::LogOpen {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            file: Some(LineWriter::new(file)),
        })
    }

    fn file(&mut self) -> io::Result<&mut LineWriter<File>> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "log file is closed"))
    }
}

impl Sink for FileSink {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file()?.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(mut file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Fan-out writer over a console sink and a log sink.
pub struct Output {
    console: Box<dyn Sink>,
    log: Box<dyn Sink>,
    quiet: bool,
}

impl Output {
    /// Compose an output from its two targets. Starts not quiet.
    pub fn new(console: impl Sink + 'static, log: impl Sink + 'static) -> Self {
        Self {
            console: Box::new(console),
            log: Box::new(log),
            quiet: false,
        }
    }

    /// Stdout plus a log file appended at `path`.
    ///
    /// Failing to open the log is fatal for the tool.
    pub fn open(log_path: impl AsRef<Path>) -> Result<Self, Error> {
        let log = FileSink::append(log_path)?;
        Ok(Self::new(ConsoleSink::stdout(), log))
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Set the process-wide quiet state. Call once at startup; use
    /// [`Output::visible`] / [`Output::silenced`] for anything transient.
    pub fn set_quiet(&mut self, quiet: bool) {
        self.quiet = quiet;
    }

    /// Force console output until the returned guard is dropped.
    pub fn visible(&mut self) -> QuietGuard<'_> {
        QuietGuard::new(self, false)
    }

    /// Suppress console output until the returned guard is dropped.
    pub fn silenced(&mut self) -> QuietGuard<'_> {
        QuietGuard::new(self, true)
    }

    /// Write one line that is shown even in quiet mode.
    pub fn report(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        let mut out = self.visible();
        out.write_fmt(args)?;
        out.write_all(b"\n")
    }

    /// Flush both targets and release the log. The console stays open.
    pub fn close(&mut self) -> io::Result<()> {
        self.console.flush()?;
        self.log.close()
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.log.write_all(buf)?;
        if !self.quiet {
            self.console.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.log.flush()?;
        self.console.flush()
    }
}

/// Scoped quiet override. Dereferences to the [`Output`]; restores the
/// previous quiet value on drop.
pub struct QuietGuard<'a> {
    output: &'a mut Output,
    previous: bool,
}

impl<'a> QuietGuard<'a> {
    fn new(output: &'a mut Output, quiet: bool) -> Self {
        let previous = output.quiet;
        output.quiet = quiet;
        Self { output, previous }
    }
}

impl Deref for QuietGuard<'_> {
    type Target = Output;

    fn deref(&self) -> &Output {
        self.output
    }
}

impl DerefMut for QuietGuard<'_> {
    fn deref_mut(&mut self) -> &mut Output {
        self.output
    }
}

impl Write for QuietGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}

impl Drop for QuietGuard<'_> {
    fn drop(&mut self) {
        self.output.quiet = self.previous;
    }
}


#[cfg(test)]
mod tests {
    use super::testing::Capture;
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_lines_reach_both_sinks_in_order() {
        let mut cap = Capture::new();
        writeln!(cap.output, "first").unwrap();
        writeln!(cap.output, "second").unwrap();

        assert_eq!(cap.console.text(), "first\nsecond\n");
        assert_eq!(cap.log.text(), "first\nsecond\n");
    }

    #[test]
    fn test_quiet_suppresses_console_only() {
        let mut cap = Capture::quiet();
        writeln!(cap.output, "hidden").unwrap();

        assert_eq!(cap.console.text(), "");
        assert_eq!(cap.log.text(), "hidden\n");
    }

    #[test]
    fn test_report_is_visible_while_quiet() {
        let mut cap = Capture::quiet();
        cap.output
            .report(format_args!("Connection: {}", "refused"))
            .unwrap();
        writeln!(cap.output, "after").unwrap();

        assert_eq!(cap.console.text(), "Connection: refused\n");
        assert_eq!(cap.log.text(), "Connection: refused\nafter\n");
        assert!(cap.output.is_quiet());
    }

    #[test]
    fn test_guard_restores_previous_state() {
        let mut cap = Capture::new();
        {
            let mut out = cap.output.silenced();
            writeln!(out, "silenced").unwrap();
            {
                let mut inner = out.visible();
                writeln!(inner, "forced").unwrap();
            }
            assert!(out.is_quiet());
        }
        assert!(!cap.output.is_quiet());
        assert_eq!(cap.console.text(), "forced\n");
        assert_eq!(cap.log.text(), "silenced\nforced\n");
    }

    #[test]
    fn test_guard_restores_on_error_path() {
        fn failing(out: &mut Output) -> io::Result<()> {
            let mut out = out.visible();
            writeln!(out, "partial")?;
            Err(io::Error::other("boom"))
        }

        let mut cap = Capture::quiet();
        assert!(failing(&mut cap.output).is_err());
        assert!(cap.output.is_quiet());
    }

    #[test]
    fn test_file_sink_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("probe.log");
        fs::write(&path, "existing\n").unwrap();

        let mut out = Output::new(ConsoleSink::new(io::sink()), FileSink::append(&path).unwrap());
        writeln!(out, "appended").unwrap();
        out.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "existing\nappended\n");
    }

    #[test]
    fn test_write_after_close_fails() {
        let dir = tempdir().unwrap();
        let mut sink = FileSink::append(dir.path().join("x.log")).unwrap();
        sink.close().unwrap();
        assert!(sink.write_all(b"late").is_err());
    }

    #[test]
    fn test_unopenable_log_is_startup_failure() {
        let dir = tempdir().unwrap();
        let result = Output::open(dir.path().join("missing").join("probe.log"));
        assert!(matches!(result, Err(Error::LogOpen { .. })));
    }
}
