//! Fixed-width text tables.
//!
//! Everything dbprobe prints as a table goes through a [`RowFormat`]: one
//! fixed-width, truncating field per column, joined by separators. The same
//! format renders the header, the dashed separator row and every data row,
//! so rows always line up with their header.
//!
//! Result sets of unknown shape are fitted to the line budget first, see
//! [`fit_widths`], and then streamed row by row with [`TableRenderer`].

use std::io::{self, Write};

use crate::driver::{types, ColumnMeta, ResultSet};
use crate::output::Output;

/// Default line budget when none (or a non-positive one) is configured.
pub const DEFAULT_WIDTH: usize = 100;

/// Above this mean the iterative shrink is used, otherwise the clamp.
const ITERATIVE_MEAN: usize = 15;
/// Clamp width of the narrow-mean regime.
const CLAMP_WIDTH: usize = 20;
/// A backward scan stops early once the line is this short.
const SCAN_STOP_TOTAL: usize = 80;
/// Factor applied to the mean when a scan shrinks nothing.
const MEAN_DECAY: f64 = 0.7;
/// The iterative shrink gives up below this mean.
const MIN_MEAN: usize = 7;

/// Page geometry: the line budget and the rules drawn across it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    width: usize,
    separator: String,
    subseparator: String,
}

impl Layout {
    /// Layout for `width` columns; `None` or zero means [`DEFAULT_WIDTH`].
    pub fn new(width: Option<usize>) -> Self {
        let width = width.filter(|w| *w > 0).unwrap_or(DEFAULT_WIDTH);
        Self {
            width,
            separator: "=".repeat(width),
            subseparator: "-".repeat(width),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Full-width line of `=`.
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Full-width line of `-`.
    pub fn subseparator(&self) -> &str {
        &self.subseparator
    }

    /// Print a section header: separator, spaced title, sub-separator.
    pub fn header<W: Write + ?Sized>(
        &self,
        out: &mut W,
        title: &str,
        subheader: Option<&str>,
    ) -> io::Result<()> {
        let mut line = spaced(title);
        if let Some(sub) = subheader {
            line.push_str("  ");
            line.push_str(sub);
        }
        writeln!(out, "{}", self.separator)?;
        writeln!(out, " {}", line)?;
        writeln!(out, "{}", self.subseparator)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(None)
    }
}

/// `"SQL"` becomes `" S Q L "`.
pub fn spaced(text: &str) -> String {
    let mut spaced = String::with_capacity(text.len() * 2 + 1);
    for c in text.chars() {
        spaced.push(' ');
        spaced.push(c);
    }
    spaced.push(' ');
    spaced
}

/// Fit requested column widths into a `max`-character line.
///
/// With pipe separators the line is `(N-1) + sum(widths)` long. If that
/// already fits, the widths are returned unchanged. Otherwise, with
/// `mean = 2 * ceil(max / N)`:
///
/// - `mean > 15`: repeatedly scan the columns from last to first, taking one
///   character from every column wider than `mean` (a scan stops early once
///   the line is down to 80). A scan that takes nothing decays `mean` by 30%;
///   the loop gives up when `mean < 7`, so the line may stay wider than `max`.
/// - otherwise every column wider than 20 is clamped to 20.
///
/// Widths are never returned below 1.
pub fn fit_widths(requested: &[usize], max: usize) -> Vec<usize> {
    let mut widths = requested.to_vec();
    let count = widths.len();
    if count == 0 {
        return widths;
    }

    let mut total = count - 1 + widths.iter().sum::<usize>();
    if total > max {
        let mut mean = 2 * max.div_ceil(count);
        if mean > ITERATIVE_MEAN {
            while total > max {
                // A lone column above the mean shrinks by one per scan.
                let mut over = (0..count).filter(|&i| widths[i] > mean);
                if let (Some(i), None) = (over.next(), over.next()) {
                    let step = (widths[i] - mean).min(total - max);
                    widths[i] -= step;
                    total -= step;
                    continue;
                }
                let mut changed = false;
                for width in widths.iter_mut().rev() {
                    if *width > mean {
                        changed = true;
                        *width -= 1;
                        total -= 1;
                        if total <= SCAN_STOP_TOTAL {
                            break;
                        }
                    }
                }
                if !changed {
                    mean = (mean as f64 * MEAN_DECAY) as usize;
                    if mean < MIN_MEAN {
                        break;
                    }
                }
            }
        } else {
            for width in widths.iter_mut() {
                if *width > CLAMP_WIDTH {
                    *width = CLAMP_WIDTH;
                }
            }
        }
    }

    for width in widths.iter_mut() {
        *width = (*width).max(1);
    }
    widths
}

/// A result column: label, requested width and width after fitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub label: String,
    pub requested: usize,
    pub width: usize,
}

impl ColumnSpec {
    pub fn new(label: impl Into<String>, requested: usize) -> Self {
        Self {
            label: label.into(),
            requested,
            width: requested.max(1),
        }
    }
}

/// Run [`fit_widths`] over `columns`, updating each final width.
pub fn fit_columns(columns: &mut [ColumnSpec], max: usize) {
    let requested: Vec<usize> = columns.iter().map(|c| c.requested).collect();
    for (column, width) in columns.iter_mut().zip(fit_widths(&requested, max)) {
        column.width = width;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    width: usize,
    align: Align,
}

/// Row template: fixed-width fields that pad and truncate their values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFormat {
    fields: Vec<Field>,
    separators: Vec<String>,
}

impl RowFormat {
    /// Left-aligned fields joined by `|`.
    pub fn pipe(widths: &[usize]) -> Self {
        Self::joined(widths, "|")
    }

    /// Left-aligned fields joined by `separator`.
    pub fn joined(widths: &[usize], separator: &str) -> Self {
        let mut builder = RowFormatBuilder::default();
        for (i, width) in widths.iter().enumerate() {
            if i > 0 {
                builder = builder.sep(separator);
            }
            builder = builder.left(*width);
        }
        builder.build()
    }

    /// Start a format with mixed alignment and separators.
    pub fn builder() -> RowFormatBuilder {
        RowFormatBuilder::default()
    }

    pub fn widths(&self) -> Vec<usize> {
        self.fields.iter().map(|f| f.width).collect()
    }

    /// Format one row (no line terminator). Missing values render empty,
    /// extra values are ignored.
    pub fn format<I, S>(&self, values: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut values = values.into_iter();
        let mut line = String::new();
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                line.push_str(&self.separators[i - 1]);
            }
            let value = values.next();
            let text: &str = value.as_ref().map_or("", |v| v.as_ref());
            let w = field.width;
            match field.align {
                Align::Left => line.push_str(&format!("{:<w$.w$}", text)),
                Align::Right => line.push_str(&format!("{:>w$.w$}", text)),
            }
        }
        line
    }

    /// Format one row and write it as a line.
    pub fn write_row<W, I, S>(&self, out: &mut W, values: I) -> io::Result<()>
    where
        W: Write + ?Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        writeln!(out, "{}", self.format(values))
    }

    /// Write the dashed row: `rule` in every field, truncated to fit.
    pub fn write_rule<W: Write + ?Sized>(&self, out: &mut W, rule: &str) -> io::Result<()> {
        self.write_row(out, std::iter::repeat(rule).take(self.fields.len()))
    }
}

/// Builder for [`RowFormat`]. Fields without an explicit separator between
/// them are joined directly.
#[derive(Debug, Default)]
pub struct RowFormatBuilder {
    fields: Vec<Field>,
    separators: Vec<String>,
    pending: Option<String>,
}

impl RowFormatBuilder {
    pub fn left(self, width: usize) -> Self {
        self.field(width, Align::Left)
    }

    pub fn right(self, width: usize) -> Self {
        self.field(width, Align::Right)
    }

    pub fn sep(mut self, separator: &str) -> Self {
        self.pending = Some(separator.to_string());
        self
    }

    fn field(mut self, width: usize, align: Align) -> Self {
        if !self.fields.is_empty() {
            self.separators.push(self.pending.take().unwrap_or_default());
        }
        self.pending = None;
        self.fields.push(Field { width, align });
        self
    }

    pub fn build(self) -> RowFormat {
        RowFormat {
            fields: self.fields,
            separators: self.separators,
        }
    }
}

/// Layout of the table listing.
pub fn tables_format() -> RowFormat {
    RowFormat::joined(&[16, 16, 32, 6], " | ")
}

/// Layout of the column listing.
pub fn columns_format() -> RowFormat {
    RowFormat::joined(&[16, 16, 12, 16], " | ")
}

/// Layout of the result-set description.
pub fn describe_format() -> RowFormat {
    RowFormat::builder()
        .left(12)
        .sep("|")
        .left(12)
        .sep("|")
        .left(15)
        .sep("|")
        .left(15)
        .sep("|")
        .left(12)
        .sep("|")
        .right(4)
        .sep(".")
        .left(4)
        .sep("|")
        .left(10)
        .build()
}

/// Renders result sets of any shape within the page width.
pub struct TableRenderer<'a> {
    layout: &'a Layout,
}

impl<'a> TableRenderer<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }

    /// Fitted column specs for a result shape.
    pub fn fit(&self, columns: &[ColumnMeta]) -> Vec<ColumnSpec> {
        let mut specs: Vec<ColumnSpec> = columns
            .iter()
            .map(|c| ColumnSpec::new(c.label.clone(), c.display_size))
            .collect();
        fit_columns(&mut specs, self.layout.width());
        specs
    }

    /// Describe the columns of a result: one line per column.
    pub fn describe<W: Write + ?Sized>(&self, out: &mut W, columns: &[ColumnMeta]) -> io::Result<()> {
        let format = describe_format();
        format.write_row(
            out,
            [
                "Catalog",
                "Schema",
                "Table",
                "Name",
                "TypeName",
                "Precision",
                "Scale",
                "SQLType",
            ],
        )?;
        format.write_rule(out, self.layout.subseparator())?;
        for column in columns {
            format.write_row(
                out,
                [
                    column.catalog.clone(),
                    column.schema.clone(),
                    column.table.clone(),
                    column.name.clone(),
                    column.type_name.clone(),
                    column.precision.to_string(),
                    column.scale.to_string(),
                    types::type_name(column.type_code)
                        .unwrap_or("null")
                        .to_string(),
                ],
            )?;
        }
        Ok(())
    }

    /// Describe the result, fit its columns and print every row as it is
    /// fetched. Rows are shown on the console even in quiet mode; the quiet
    /// state is restored afterwards on every path. Returns the row count.
    pub fn stream(&self, out: &mut Output, rows: &mut dyn ResultSet) -> crate::Result<u64> {
        let columns = rows.columns().to_vec();
        self.describe(out, &columns)?;
        writeln!(out, "{}", self.layout.subseparator())?;

        let specs = self.fit(&columns);
        let widths: Vec<usize> = specs.iter().map(|s| s.width).collect();
        let format = RowFormat::pipe(&widths);
        format.write_row(out, specs.iter().map(|s| s.label.as_str()))?;
        format.write_rule(out, self.layout.subseparator())?;

        let mut out = out.visible();
        let mut count = 0;
        while let Some(row) = rows.next_row()? {
            format.write_row(&mut out, row.iter().map(|v| v.to_string()))?;
            count += 1;
        }
        tracing::debug!(rows = count, columns = widths.len(), "streamed result set");
        Ok(count)
    }
}
