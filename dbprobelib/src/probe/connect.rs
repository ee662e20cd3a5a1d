//! CONNECT section: open a database connection and look around.
//!
//! After connecting, the product, its version and the catalogs are printed,
//! followed by whatever was asked for on the command line: the table list,
//! the columns of some tables and the results of one SQL command. Each of
//! those steps reports its own failure and the next step still runs.

use std::io::Write;

use crate::driver::{Connection, Credentials, ResultSet, ResultVisitor, TableInfo};
use crate::error::ResultExt;
use crate::output::Output;
use crate::runner::Context;
use crate::table::{columns_format, tables_format, Layout, TableRenderer};
use crate::Result;

const NO_TABLE: &str = "NO TABLE FOUND";

/// Credentials for `user`; `-` or no user connects without any.
fn credentials(user: Option<&str>, password: Option<&str>) -> Option<Credentials> {
    match user {
        None | Some("-") => None,
        Some(user) => Some(Credentials {
            user: user.to_string(),
            password: password.unwrap_or_default().to_string(),
        }),
    }
}

fn or_null(value: Option<&str>) -> &str {
    value.unwrap_or("null")
}

fn metadata(out: &mut Output, conn: &dyn Connection) -> Result<()> {
    match conn.product_name() {
        Ok(name) => writeln!(out, "Product: {name}")?,
        Err(err) => out.report(format_args!("Product: {err}"))?,
    }
    match conn.product_version() {
        Ok((major, minor)) => {
            writeln!(out, "Major: {major}")?;
            writeln!(out, "Minor: {minor}")?;
        }
        Err(err) => {
            out.report(format_args!("Major: {err}"))?;
            out.report(format_args!("Minor: {err}"))?;
        }
    }
    writeln!(out, "Catalogs:")?;
    match conn.catalogs() {
        Ok(catalogs) => {
            for catalog in catalogs {
                writeln!(out, "    {catalog}")?;
            }
        }
        Err(err) => out.report(format_args!("    {err}"))?,
    }
    Ok(())
}

fn write_tables(out: &mut Output, conn: &dyn Connection) -> Result<()> {
    let tables = conn.tables()?;
    if tables.is_empty() {
        writeln!(out, "{NO_TABLE}")?;
        return Ok(());
    }
    let format = tables_format();
    format.write_row(&mut *out, ["CATALOG", "SCHEMA", "NAME", "TYPE"])?;
    for table in &tables {
        format.write_row(
            &mut *out,
            [
                or_null(table.catalog.as_deref()),
                or_null(table.schema.as_deref()),
                table.name.as_str(),
                table.kind.as_str(),
            ],
        )?;
    }
    Ok(())
}

fn write_columns(out: &mut Output, layout: &Layout, conn: &dyn Connection, wanted: &str) -> Result<()> {
    let matches: Vec<TableInfo> = conn
        .tables()?
        .into_iter()
        .filter(|t| t.name.eq_ignore_ascii_case(wanted))
        .collect();
    if matches.is_empty() {
        writeln!(out, "{NO_TABLE}")?;
        return Ok(());
    }

    let format = columns_format();
    for (i, table) in matches.iter().enumerate() {
        if i > 0 {
            writeln!(out, "{}", layout.subseparator())?;
        }
        writeln!(
            out,
            "Table: {}, Catalog: {}, Schema: {}",
            table.name,
            or_null(table.catalog.as_deref()),
            or_null(table.schema.as_deref())
        )?;
        let columns = conn.columns(table)?;
        if !columns.is_empty() {
            format.write_row(&mut *out, ["NAME", "TYPE", "SIZE", "DEFAULT"])?;
        }
        for column in &columns {
            let size = column.size_text();
            format.write_row(
                &mut *out,
                [
                    column.name.as_str(),
                    column.type_name.as_str(),
                    size.as_str(),
                    or_null(column.default.as_deref()),
                ],
            )?;
        }
    }
    Ok(())
}

/// Prints every result of a statement, separated by sub-separators.
struct ResultPrinter<'a> {
    out: &'a mut Output,
    layout: &'a Layout,
    results: usize,
}

impl ResultPrinter<'_> {
    fn next_result(&mut self) -> Result<()> {
        if self.results > 0 {
            writeln!(self.out, "{}", self.layout.subseparator())?;
        }
        self.results += 1;
        Ok(())
    }
}

impl ResultVisitor for ResultPrinter<'_> {
    fn result_set(&mut self, rows: &mut dyn ResultSet) -> Result<()> {
        self.next_result()?;
        let count = TableRenderer::new(self.layout).stream(self.out, rows)?;
        tracing::debug!(rows = count, "result set");
        Ok(())
    }

    fn update_count(&mut self, count: u64) -> Result<()> {
        self.next_result()?;
        writeln!(self.out, "count: {count}")?;
        Ok(())
    }
}

pub fn run(ctx: &mut Context<'_>) -> Result<()> {
    let config = ctx.config;
    let Some(url) = config.url.as_deref() else {
        return Ok(());
    };
    let credentials = credentials(config.user.as_deref(), config.password.as_deref());
    let conn = ctx
        .drivers
        .connect(url, credentials.as_ref())
        .context("Connection")?;

    metadata(ctx.out, conn.as_ref())?;

    if config.tables {
        ctx.header("TABLES", None)?;
        if let Err(err) = write_tables(ctx.out, conn.as_ref()) {
            ctx.out.report(format_args!("Tables: {err}"))?;
        }
    }

    for table in &config.columns {
        ctx.header("COLUMNS ", Some(table.as_str()))?;
        if let Err(err) = write_columns(ctx.out, ctx.layout, conn.as_ref(), table) {
            ctx.out.report(format_args!("Columns: {err}"))?;
        }
    }

    if let Some(sql) = config.sql.as_deref() {
        ctx.header("SQL", Some(sql))?;
        let mut printer = ResultPrinter {
            out: &mut *ctx.out,
            layout: ctx.layout,
            results: 0,
        };
        if let Err(err) = conn.execute(sql, &mut printer) {
            ctx.out.report(format_args!("Execute: {err}"))?;
        }
    }
    Ok(())
}
