//! DRIVER MANAGER section: registry settings and the registered drivers.

use std::io::Write;

use crate::driver::Driver;
use crate::runner::Context;
use crate::Result;

fn driver_line(driver: &dyn Driver, url: Option<&str>) -> String {
    let (major, minor) = driver.version();
    let compliance = if driver.sql_compliant() {
        "SQL-compliant"
    } else {
        "NON-compliant"
    };
    let usable = match url {
        Some(url) if driver.accepts_url(url) => "USABLE",
        _ => "",
    };
    format!(
        "{:<40} {major:>2}.{minor:<2} {compliance:>14} {usable}",
        driver.name()
    )
}

pub fn run(ctx: &mut Context<'_>) -> Result<()> {
    writeln!(
        ctx.out,
        "Login timeout: {} seconds",
        ctx.drivers.login_timeout().as_secs()
    )?;
    let url = ctx.config.url.as_deref();
    for driver in ctx.drivers.drivers() {
        writeln!(ctx.out, "{}", driver_line(driver, url))?;
    }
    Ok(())
}
