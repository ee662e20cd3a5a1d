//! DRIVERS section: is every expected driver compiled in?

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::runner::Context;
use crate::Result;

/// Driver names checked when no list is given on the command line.
pub const BUILTIN_LIST: &str = include_str!("../../resources/drivers.ini");

/// Names from a drivers list, skipping blank lines and `#` comments.
pub fn parse_names(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Driver names from `file`, or the built-in list without one.
///
/// An unreadable file is reported on `out` and yields no names.
pub fn load_names<W: Write + ?Sized>(out: &mut W, file: Option<&Path>) -> io::Result<Vec<String>> {
    let Some(file) = file else {
        return Ok(parse_names(BUILTIN_LIST));
    };
    match fs::read_to_string(file) {
        Ok(text) => Ok(parse_names(&text)),
        Err(err) => {
            tracing::warn!(file = %file.display(), error = %err, "drivers list");
            writeln!(out, "unable to open {}", file.display())?;
            Ok(Vec::new())
        }
    }
}

pub fn run(ctx: &mut Context<'_>) -> Result<()> {
    for name in ctx.driver_names {
        match ctx.drivers.load(name) {
            Ok(_) => writeln!(ctx.out, "{name} OK")?,
            Err(err) => writeln!(ctx.out, "{err}")?,
        }
    }
    Ok(())
}
