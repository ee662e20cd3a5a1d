//! Section runner.
//!
//! A run is a fixed, ordered list of [`Section`]s. Fixed sections are
//! selected by the [`SectionFilter`](crate::config::SectionFilter); the
//! target section runs whenever a target was given. Each section prints its
//! header and then runs inside a failure boundary: an `Err` is reported as
//! one always-visible line right after the header and the run moves on.

use std::io::{self, Write};

use crate::config::RunConfiguration;
use crate::driver::DriverManager;
use crate::output::Output;
use crate::table::{spaced, Layout};
use crate::Result;

/// Tool name shown in the banner.
const BANNER_NAME: &str = "DBProbe";

/// Everything a section body can use.
pub struct Context<'a> {
    pub out: &'a mut Output,
    pub layout: &'a Layout,
    pub config: &'a RunConfiguration,
    pub drivers: &'a DriverManager,
    /// Driver names from the drivers list.
    pub driver_names: &'a [String],
}

impl Context<'_> {
    /// Print a header inside a section (`TABLES`, `SQL ...`).
    pub fn header(&mut self, title: &str, subheader: Option<&str>) -> io::Result<()> {
        self.layout.header(&mut *self.out, title, subheader)
    }
}

pub type SectionBody = Box<dyn Fn(&mut Context<'_>) -> Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Diagnostic category, selected by its identifier.
    Fixed(char),
    /// The user's target; never filtered.
    Target,
}

/// One named step of the run.
pub struct Section {
    pub kind: SectionKind,
    pub title: String,
    pub subheader: Option<String>,
    body: SectionBody,
}

impl Section {
    pub fn fixed(
        id: char,
        title: &str,
        body: impl Fn(&mut Context<'_>) -> Result<()> + 'static,
    ) -> Self {
        Self {
            kind: SectionKind::Fixed(id),
            title: title.to_string(),
            subheader: None,
            body: Box::new(body),
        }
    }

    pub fn target(
        title: &str,
        subheader: Option<String>,
        body: impl Fn(&mut Context<'_>) -> Result<()> + 'static,
    ) -> Self {
        Self {
            kind: SectionKind::Target,
            title: title.to_string(),
            subheader,
            body: Box::new(body),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running(usize),
    Done,
}

/// What happened during a run. Failures never change the exit status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub run: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct Runner<'a> {
    ctx: Context<'a>,
    sections: Vec<Section>,
    state: RunState,
}

impl<'a> Runner<'a> {
    pub fn new(ctx: Context<'a>, sections: Vec<Section>) -> Self {
        Self {
            ctx,
            sections,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn selected(&self, section: &Section) -> bool {
        match section.kind {
            SectionKind::Fixed(id) => self.ctx.config.sections.includes(id),
            SectionKind::Target => true,
        }
    }

    /// Print parse warnings, the banner and every selected section, in order.
    ///
    /// Only output failures end the run early.
    pub fn run(&mut self) -> io::Result<RunSummary> {
        let mut summary = RunSummary::default();
        self.warnings()?;
        self.banner()?;

        for i in 0..self.sections.len() {
            self.state = RunState::Running(i);
            let section = &self.sections[i];
            if !self.selected(section) {
                tracing::debug!(section = %section.title, "skipped");
                summary.skipped += 1;
                continue;
            }

            tracing::debug!(section = %section.title, "running");
            self.ctx
                .layout
                .header(&mut *self.ctx.out, &section.title, section.subheader.as_deref())?;
            summary.run += 1;
            if let Err(err) = (section.body)(&mut self.ctx) {
                tracing::warn!(section = %section.title, error = %err, "section failed");
                summary.failed += 1;
                self.ctx.out.report(format_args!("{err}"))?;
            }
        }

        writeln!(self.ctx.out, "{}", self.ctx.layout.separator())?;
        self.ctx.out.flush()?;
        self.state = RunState::Done;
        Ok(summary)
    }

    fn warnings(&mut self) -> io::Result<()> {
        for warning in &self.ctx.config.warnings {
            if warning.visible {
                self.ctx.out.report(format_args!("{}", warning.message))?;
            } else {
                writeln!(self.ctx.out, "{}", warning.message)?;
            }
        }
        Ok(())
    }

    fn banner(&mut self) -> io::Result<()> {
        let layout = self.ctx.layout;
        let out = &mut *self.ctx.out;
        let indent = (layout.width().saturating_sub(26) / 2).max(1);
        let now = chrono::Local::now();

        writeln!(out, "{}", layout.separator())?;
        writeln!(
            out,
            "{:indent$} {}   v {:<5}",
            "",
            spaced(BANNER_NAME).trim(),
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(out, "{:indent$} {}", "", now.format("%Y-%m-%d  %H:%M:%S"))?;
        writeln!(out, "{}", layout.subseparator())?;
        for arg in &self.ctx.config.echo {
            writeln!(out, "{arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Parsed, SectionFilter};
    use crate::output::testing::Capture;
    use crate::Error;

    fn config(filter: SectionFilter, quiet: bool) -> RunConfiguration {
        RunConfiguration {
            sections: filter,
            quiet,
            ..Default::default()
        }
    }

    fn sections() -> Vec<Section> {
        vec![
            Section::fixed('a', "ALPHA", |ctx| {
                writeln!(ctx.out, "alpha body")?;
                Ok(())
            }),
            Section::fixed('b', "BRAVO", |ctx| {
                writeln!(ctx.out, "bravo start")?;
                Err(Error::UnknownHost("nowhere".into()).context("Host"))
            }),
            Section::fixed('c', "CHARLIE", |ctx| {
                writeln!(ctx.out, "charlie body")?;
                Ok(())
            }),
            Section::target("TARGET", Some("tcp:x:1".into()), |ctx| {
                writeln!(ctx.out, "target body")?;
                Ok(())
            }),
        ]
    }

    fn run(cap: &mut Capture, config: &RunConfiguration) -> RunSummary {
        let layout = Layout::new(Some(30));
        let drivers = DriverManager::new();
        let ctx = Context {
            out: &mut cap.output,
            layout: &layout,
            config,
            drivers: &drivers,
            driver_names: &[],
        };
        let mut runner = Runner::new(ctx, sections());
        let summary = runner.run().unwrap();
        assert_eq!(runner.state(), RunState::Done);
        summary
    }

    #[test]
    fn test_failure_is_reported_once_and_run_continues() {
        let mut cap = Capture::new();
        let summary = run(&mut cap, &config(SectionFilter::all(), false));

        assert_eq!(summary, RunSummary { run: 4, skipped: 0, failed: 1 });
        let text = cap.console.text();
        assert_eq!(text.matches("Host: unknown host: nowhere").count(), 1);
        let lines: Vec<&str> = text.lines().collect();
        let failed = lines
            .iter()
            .position(|l| *l == "Host: unknown host: nowhere")
            .unwrap();
        assert_eq!(lines[failed - 1], "bravo start");
        assert_eq!(lines[failed - 2], "-".repeat(30));
        assert!(text.contains("  C H A R L I E \n"));
        assert!(text.contains("charlie body"));
    }

    #[test]
    fn test_filter_skips_headers_but_never_the_target() {
        let mut cap = Capture::new();
        let summary = run(&mut cap, &config(SectionFilter::only("c"), false));

        assert_eq!(summary.skipped, 2);
        let text = cap.console.text();
        assert!(!text.contains("A L P H A"));
        assert!(!text.contains("bravo"));
        assert!(text.contains("C H A R L I E"));
        assert!(text.contains("  T A R G E T   tcp:x:1\n"));
        assert!(text.contains("target body"));
    }

    #[test]
    fn test_quiet_run_logs_everything_and_shows_errors() {
        let mut cap = Capture::quiet();
        run(&mut cap, &config(SectionFilter::all(), true));

        assert_eq!(cap.console.text(), "Host: unknown host: nowhere\n");
        let log = cap.log.text();
        for expected in ["alpha body", "bravo start", "Host: unknown host: nowhere", "target body"] {
            assert!(log.contains(expected), "missing {expected}");
        }
        assert!(cap.output.is_quiet());
    }

    #[test]
    fn test_banner_and_echo() {
        let parsed = RunConfiguration::parse(["-z", "tcp:x:1"]);
        let Parsed::Run(config) = parsed else {
            panic!("expected a run")
        };
        let mut cap = Capture::new();
        run(&mut cap, &config);

        let text = cap.console.text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "=".repeat(30));
        assert!(lines[1].starts_with("   D B P r o b e   v "));
        assert_eq!(lines[3], "-".repeat(30));
        assert_eq!(lines[4], "-z");
        assert_eq!(lines[5], "tcp:x:1");
        assert_eq!(*lines.last().unwrap(), "=".repeat(30));
    }

    #[test]
    fn test_warnings_printed_first() {
        let parsed = RunConfiguration::parse(["-7x", "sqlite:a", "-", "-", "bogus"]);
        let Parsed::Run(config) = parsed else {
            panic!("expected a run")
        };
        let mut cap = Capture::quiet();
        run(&mut cap, &config);

        assert!(cap.console.text().starts_with("unrecognized option: -7x\n"));
        assert!(cap.log.text().contains("unrecognized option: bogus\n"));
        assert!(!cap.console.text().contains("bogus"));
    }
}
