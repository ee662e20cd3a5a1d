//! SYSTEM PROPERTIES section: runtime facts, then the environment.

use std::env;
use std::io::{self, Write};

use crate::runner::Context;
use crate::Result;

/// Facts about the running process, sorted by key.
pub fn runtime_properties() -> Vec<(String, String)> {
    let mut properties = vec![
        ("os.name".to_string(), env::consts::OS.to_string()),
        ("os.family".to_string(), env::consts::FAMILY.to_string()),
        ("os.arch".to_string(), env::consts::ARCH.to_string()),
        ("tool.version".to_string(), env!("CARGO_PKG_VERSION").to_string()),
        ("temp.dir".to_string(), env::temp_dir().display().to_string()),
    ];
    if let Ok(exe) = env::current_exe() {
        properties.push(("exe.path".to_string(), exe.display().to_string()));
    }
    if let Ok(dir) = env::current_dir() {
        properties.push(("user.dir".to_string(), dir.display().to_string()));
    }
    properties.sort();
    properties
}

/// The process environment, sorted by name. Non-UTF-8 entries are shown lossily.
pub fn environment() -> Vec<(String, String)> {
    let mut vars: Vec<(String, String)> = env::vars_os()
        .map(|(k, v)| {
            (
                k.to_string_lossy().into_owned(),
                v.to_string_lossy().into_owned(),
            )
        })
        .collect();
    vars.sort();
    vars
}

fn write_properties<W: Write + ?Sized>(out: &mut W, properties: &[(String, String)]) -> io::Result<()> {
    for (key, value) in properties {
        writeln!(out, "{key} = {value}")?;
    }
    Ok(())
}

pub fn run(ctx: &mut Context<'_>) -> Result<()> {
    write_properties(&mut *ctx.out, &runtime_properties())?;
    write_properties(&mut *ctx.out, &environment())?;
    Ok(())
}
