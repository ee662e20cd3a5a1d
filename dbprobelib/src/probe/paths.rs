//! SEARCH PATH and LIBRARIES sections.

use std::env;
use std::ffi::OsString;
use std::io::{self, Write};

use crate::runner::Context;
use crate::Result;

/// Environment variable holding the dynamic-library search path.
pub const LIBRARY_PATH_VAR: &str = if cfg!(windows) {
    "PATH"
} else if cfg!(target_os = "macos") {
    "DYLD_LIBRARY_PATH"
} else {
    "LD_LIBRARY_PATH"
};

fn write_entries<W: Write + ?Sized>(out: &mut W, value: Option<OsString>) -> io::Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    for entry in env::split_paths(&value) {
        writeln!(out, "{}", entry.display())?;
    }
    Ok(())
}

/// Executable search path, one entry per line.
pub fn search_path(ctx: &mut Context<'_>) -> Result<()> {
    write_entries(&mut *ctx.out, env::var_os("PATH"))?;
    Ok(())
}

/// Library search path, one entry per line.
pub fn libraries(ctx: &mut Context<'_>) -> Result<()> {
    tracing::debug!(var = LIBRARY_PATH_VAR, "library path");
    write_entries(&mut *ctx.out, env::var_os(LIBRARY_PATH_VAR))?;
    Ok(())
}
