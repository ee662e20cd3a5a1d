//! # dbprobe
//!
//! A CLI tool that checks the environment a database client runs in.
//!
//! ## Overview
//!
//! dbprobe is built on top of dbprobelib. It prints a report of the network,
//! the available database drivers, the search paths and the process
//! environment, then probes one target: a host (`ping:`), a raw TCP endpoint
//! (`tcp:`) or a database connection. Everything printed is also appended to
//! a log file.
//!
//! ## Usage
//!
//! ```bash
//! # Full report, logged to dbprobe.log
//! dbprobe
//!
//! # Only network and drivers, 120 columns wide
//! dbprobe -120 -nd
//!
//! # Is the database port open?
//! dbprobe -z tcp:db.internal:5432
//!
//! # Quiet: only the query rows reach the console
//! dbprobe -q sqlite:app.db - - sql:SELECT id, name FROM users
//!
//! # Log somewhere else
//! dbprobe --log /tmp/probe.log -z ping:db.internal
//! ```
//!
//! Diagnostics of the tool itself go to stderr, filtered by `RUST_LOG`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dbprobelib::config::{write_usage, DEFAULT_LOG};
use dbprobelib::{Output, Parsed, RunConfiguration, ToolOptions};
use tracing_subscriber::EnvFilter;

/// Exit status after printing the usage text.
const EXIT_USAGE: u8 = 1;
/// Exit status when the tool cannot start (log file, console).
const EXIT_STARTUP: u8 = 2;

/// Build the clap Command structure
///
/// Only the named flags belong to clap. Everything else, including the
/// single-dash options of the positional grammar (`-q`, `-120`, `-nd`), is
/// collected verbatim and parsed by [`RunConfiguration::parse`].
fn build_command() -> Command {
    Command::new("dbprobe")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Arthur Debert")
        .about("Probe network, drivers and a database connection; log everything")
        .disable_help_flag(true)
        .arg(
            Arg::new("log")
                .long("log")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .default_value(DEFAULT_LOG)
                .help("Append every printed line to FILE"),
        )
        .arg(
            Arg::new("drivers")
                .long("drivers")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Read the driver names to check from FILE"),
        )
        .arg(
            Arg::new("login-timeout")
                .long("login-timeout")
                .value_name("SECS")
                .value_parser(value_parser!(u64))
                .default_value("0")
                .help("Login timeout handed to the database driver"),
        )
        .arg(
            Arg::new("args")
                .action(ArgAction::Append)
                .num_args(0..)
                .allow_hyphen_values(true)
                .trailing_var_arg(true)
                .help("[-h] [-q] [-<width>] [-<section>...] [<url> [<user> <password> [<arguments>...]]]"),
        )
}

fn tool_options(matches: &ArgMatches) -> ToolOptions {
    let defaults = ToolOptions::default();
    ToolOptions {
        log_path: matches
            .get_one::<PathBuf>("log")
            .cloned()
            .unwrap_or(defaults.log_path),
        drivers_file: matches.get_one::<PathBuf>("drivers").cloned(),
        login_timeout: matches
            .get_one::<u64>("login-timeout")
            .map(|secs| Duration::from_secs(*secs))
            .unwrap_or(defaults.login_timeout),
    }
}

/// Tool diagnostics on stderr; `RUST_LOG` overrides the `warn` default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(matches: &ArgMatches) -> Result<ExitCode> {
    let options = tool_options(matches);
    let args: Vec<String> = matches
        .get_many::<String>("args")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let mut out = Output::open(&options.log_path)?;
    let status = match RunConfiguration::parse(args) {
        Parsed::Usage => {
            write_usage(&mut out, env!("CARGO_PKG_VERSION")).context("writing usage")?;
            ExitCode::from(EXIT_USAGE)
        }
        Parsed::Run(config) => {
            let summary = dbprobelib::run(&mut out, &config, &options).context("writing report")?;
            tracing::info!(failed = summary.failed, "done");
            ExitCode::SUCCESS
        }
    };
    out.close()
        .with_context(|| format!("closing {}", options.log_path.display()))?;
    Ok(status)
}

fn main() -> ExitCode {
    let matches = build_command().get_matches();
    init_tracing();

    match run(&matches) {
        Ok(status) => status,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(EXIT_STARTUP)
        }
    }
}
