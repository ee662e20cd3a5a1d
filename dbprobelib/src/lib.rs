//! # dbprobelib
//!
//! Environment and database diagnostics for the `dbprobe` tool.
//!
//! ## Overview
//!
//! A run walks a fixed list of diagnostic sections and then probes one
//! target given on the command line:
//!
//! - **Network**: the local host and its interfaces
//! - **Drivers** and **Driver manager**: which database drivers are built in
//!   and which one accepts the target
//! - **Search path**, **Libraries**, **System properties**: the process
//!   environment
//! - **Target**: `ping:<host>`, `tcp:<host>:<port>`, or a database
//!   connection string with optional table, column and SQL requests
//!
//! Every line goes to the console and to an append-only log file. In quiet
//! mode only errors and SQL result rows reach the console; the log always
//! gets everything.
//!
//! ## Features
//!
//! - **Failure boundaries**: a failing section is reported once and the run
//!   continues
//! - **Adaptive tables**: result sets of any shape are fitted to the page width
//!   and streamed row by row
//! - **Pluggable drivers**: SQLite is built in, other drivers register through
//!   the [`Driver`] trait
//!
//! ## Example
//!
//! ```rust
//! use dbprobelib::config::{Parsed, RunConfiguration, ToolOptions};
//! use dbprobelib::output::{ConsoleSink, FileSink, Output};
//! use tempfile::tempdir;
//!
//! let dir = tempdir().unwrap();
//! let log = FileSink::append(dir.path().join("dbprobe.log")).unwrap();
//! let mut out = Output::new(ConsoleSink::new(Vec::new()), log);
//!
//! let Parsed::Run(config) = RunConfiguration::parse(["-z", "sqlite::memory:", "-", "-", "sql:SELECT 1"]) else {
//!     unreachable!()
//! };
//! let summary = dbprobelib::run(&mut out, &config, &ToolOptions::default()).unwrap();
//! assert_eq!(summary.failed, 0);
//! out.close().unwrap();
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod output;
pub mod probe;
pub mod runner;
pub mod table;

use std::io;

pub use config::{Parsed, RunConfiguration, SectionFilter, Target, ToolOptions};
pub use driver::{Connection, Driver, DriverManager, ResultSet, Value};
pub use error::{Error, ResultExt};
pub use output::{Output, QuietGuard, Sink};
pub use runner::{Context, RunSummary, Runner, Section};
pub use table::{fit_widths, Layout, RowFormat, TableRenderer};

/// Result type for dbprobelib operations
pub type Result<T> = std::result::Result<T, Error>;

/// Run every selected section and the target probe against `out`.
///
/// Section failures are reported on `out` and counted in the summary; only
/// a failing output ends the run with an error.
pub fn run(out: &mut Output, config: &RunConfiguration, options: &ToolOptions) -> io::Result<RunSummary> {
    out.set_quiet(config.quiet);

    let layout = Layout::new(config.width);
    let mut drivers = DriverManager::with_builtin();
    drivers.set_login_timeout(options.login_timeout);
    let driver_names = probe::drivers::load_names(&mut *out, options.drivers_file.as_deref())?;

    let ctx = Context {
        out,
        layout: &layout,
        config,
        drivers: &drivers,
        driver_names: &driver_names,
    };
    let summary = Runner::new(ctx, probe::sections(config)).run()?;
    tracing::debug!(
        run = summary.run,
        skipped = summary.skipped,
        failed = summary.failed,
        "run finished"
    );
    Ok(summary)
}
