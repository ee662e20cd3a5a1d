//! Run configuration parsed from the command line.
//!
//! The positional grammar is
//!
//! ```text
//! [-h] [-q] [-<width>] [-<sections>] [<target> [<user> <password> [tables] [columns:<table>]* [sql:<text>]]]
//! ```
//!
//! Parsing never fails: unknown options become [`Warning`]s that the caller
//! prints once the output is open, and a help request becomes
//! [`Parsed::Usage`].

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Log file used when `--log` is not given.
pub const DEFAULT_LOG: &str = "dbprobe.log";

/// Which fixed sections to run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionFilter(Option<String>);

impl SectionFilter {
    /// Run every section.
    pub fn all() -> Self {
        Self(None)
    }

    /// Run only the sections whose identifiers appear in `ids`.
    pub fn only(ids: impl Into<String>) -> Self {
        Self(Some(ids.into()))
    }

    pub fn includes(&self, id: char) -> bool {
        match &self.0 {
            None => true,
            Some(ids) => ids.contains(id),
        }
    }

    pub fn is_all(&self) -> bool {
        self.0.is_none()
    }
}

/// What the user asked to connect to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// `ping:<host>[:<timeoutMs>]`, stored without the scheme
    Ping(String),
    /// `tcp:<host>:<port>[:<timeoutMs>]`, stored without the scheme
    Tcp(String),
    /// Any other connection string, passed to the drivers as is
    Connect(String),
}

impl Target {
    pub fn parse(url: &str) -> Self {
        if let Some(address) = url.strip_prefix("ping:") {
            Target::Ping(address.to_string())
        } else if let Some(address) = url.strip_prefix("tcp:") {
            Target::Tcp(address.to_string())
        } else {
            Target::Connect(url.to_string())
        }
    }
}

/// A problem found while parsing, printed when the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    /// Shown even in quiet mode.
    pub visible: bool,
}

impl Warning {
    fn quiet(message: String) -> Self {
        Self {
            message,
            visible: false,
        }
    }

    fn visible(message: String) -> Self {
        Self {
            message,
            visible: true,
        }
    }
}

/// Everything a run needs from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfiguration {
    /// Line budget; `None` when unset or not positive.
    pub width: Option<usize>,
    pub quiet: bool,
    pub sections: SectionFilter,
    pub target: Option<Target>,
    /// The target as typed, for headers and driver matching.
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub tables: bool,
    pub columns: Vec<String>,
    pub sql: Option<String>,
    /// Arguments as given, password masked.
    pub echo: Vec<String>,
    pub warnings: Vec<Warning>,
}

/// Settings that come from named command-line flags rather than the
/// positional grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOptions {
    pub log_path: PathBuf,
    /// Replaces the built-in drivers list.
    pub drivers_file: Option<PathBuf>,
    pub login_timeout: Duration,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG),
            drivers_file: None,
            login_timeout: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Run(RunConfiguration),
    Usage,
}

/// `Integer.decode`-style number: decimal, `0x` hex or leading-zero octal.
fn decode(text: &str) -> Option<i32> {
    let (digits, radix) = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (hex, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text, 10)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    i32::from_str_radix(digits, radix).ok()
}

impl RunConfiguration {
    /// Parse the positional arguments (program name excluded).
    pub fn parse<I, S>(args: I) -> Parsed
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut config = RunConfiguration {
            echo: args.clone(),
            ..Default::default()
        };
        let mut sections: Option<String> = None;
        let mut i = 0;

        while i < args.len() && args[i].starts_with('-') {
            let arg = args[i][1..].to_lowercase();
            i += 1;
            if arg == "h" || arg == "help" {
                return Parsed::Usage;
            }
            if arg == "q" {
                config.quiet = true;
                continue;
            }
            if arg.starts_with(|c: char| c.is_ascii_digit()) {
                match decode(&arg) {
                    Some(width) => {
                        config.width = usize::try_from(width).ok().filter(|w| *w > 0);
                        continue;
                    }
                    None => config
                        .warnings
                        .push(Warning::visible(format!("unrecognized option: -{arg}"))),
                }
            }
            sections.get_or_insert_with(String::new).push_str(&arg);
        }
        config.sections = match sections {
            Some(ids) => SectionFilter::only(ids),
            None => SectionFilter::all(),
        };

        if i < args.len() {
            let url = args[i].clone();
            i += 1;
            if url == "?" || url.eq_ignore_ascii_case("help") {
                return Parsed::Usage;
            }
            config.target = Some(Target::parse(&url));
            config.url = Some(url);

            if i + 1 < args.len() {
                config.user = Some(args[i].clone());
                config.password = Some(args[i + 1].clone());
                config.echo[i + 1] = "***".to_string();
                i += 2;

                while i < args.len() {
                    let raw = &args[i];
                    i += 1;
                    let option = raw.to_ascii_lowercase();
                    if option == "tables" {
                        config.tables = true;
                    } else if option.starts_with("columns:") {
                        let table = &raw["columns:".len()..];
                        if table.is_empty() {
                            config
                                .warnings
                                .push(Warning::quiet(format!("no table given at: {raw}")));
                        } else {
                            config.columns.push(table.to_string());
                        }
                    } else if option.starts_with("sql:") {
                        let mut sql = raw["sql:".len()..].to_string();
                        for rest in &args[i..] {
                            sql.push(' ');
                            sql.push_str(rest);
                        }
                        config.sql = Some(sql);
                        i = args.len();
                    } else {
                        config
                            .warnings
                            .push(Warning::quiet(format!("unrecognized option: {raw}")));
                    }
                }
            }
        }

        Parsed::Run(config)
    }
}

/// Print the usage text.
pub fn write_usage<W: Write + ?Sized>(out: &mut W, version: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "dbprobe v {version}")?;
    writeln!(out)?;
    writeln!(
        out,
        "Usage: dbprobe [--log <file>] [--drivers <file>] [-h] [-q] [-<width>] [-<section>...] [<url> [<user> <password> [<arguments>...]]]"
    )?;
    writeln!(out)?;
    writeln!(out, "Options:")?;
    writeln!(out, "    -h            - this help")?;
    writeln!(out, "    -q            - quiet, no output, only from sql:")?;
    writeln!(out, "    -<width>      - sets output width, default 100")?;
    writeln!(out, "    -<section>... - restricts output to given section")?;
    writeln!(out, "                    c - search path")?;
    writeln!(out, "                    d - drivers")?;
    writeln!(out, "                    l - library path")?;
    writeln!(out, "                    m - driver manager")?;
    writeln!(out, "                    n - network")?;
    writeln!(out, "                    p - properties")?;
    writeln!(out, "                    z - no section at all")?;
    writeln!(out)?;
    writeln!(out, "URL:")?;
    writeln!(out, "    sqlite:<path>           - SQLite database file")?;
    writeln!(out, "    sqlite::memory:         - in-memory SQLite database")?;
    writeln!(out, "    ping:<host>[:<timeout>] - check if the host is reachable")?;
    writeln!(out, "    tcp:<host>:<portnumber>[:<timeout>] - open TCP")?;
    writeln!(out)?;
    writeln!(out, "Arguments (after <user> <password>, use - as user for none):")?;
    writeln!(out, "    tables - show list of tables")?;
    writeln!(out, "    columns:<table> - show columns of <table>")?;
    writeln!(out, "    sql:<sql> - executes SQL command")?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> RunConfiguration {
        match RunConfiguration::parse(args.iter().copied()) {
            Parsed::Run(config) => config,
            Parsed::Usage => panic!("unexpected usage for {args:?}"),
        }
    }

    #[test]
    fn test_no_arguments_runs_everything() {
        let config = run(&[]);
        assert!(config.sections.is_all());
        assert_eq!(config.width, None);
        assert!(!config.quiet);
        assert!(config.target.is_none());
    }

    #[test]
    fn test_flags_width_and_sections() {
        let config = run(&["-q", "-120", "-nd", "-P"]);
        assert!(config.quiet);
        assert_eq!(config.width, Some(120));
        assert!(config.sections.includes('n'));
        assert!(config.sections.includes('d'));
        assert!(config.sections.includes('p'));
        assert!(!config.sections.includes('m'));
    }

    #[test]
    fn test_width_radix_and_non_positive() {
        assert_eq!(run(&["-0x50"]).width, Some(80));
        assert_eq!(run(&["-010"]).width, Some(8));
        assert_eq!(run(&["-0"]).width, None);
    }

    #[test]
    fn test_bad_number_warns_and_becomes_sections() {
        let config = run(&["-12a"]);
        assert_eq!(config.width, None);
        assert_eq!(config.warnings.len(), 1);
        assert!(config.warnings[0].visible);
        assert_eq!(config.warnings[0].message, "unrecognized option: -12a");
        assert!(config.sections.includes('a'));
    }

    #[test]
    fn test_help_requests() {
        assert_eq!(RunConfiguration::parse(["-h"]), Parsed::Usage);
        assert_eq!(RunConfiguration::parse(["-HELP"]), Parsed::Usage);
        assert_eq!(RunConfiguration::parse(["-q", "?"]), Parsed::Usage);
        assert_eq!(RunConfiguration::parse(["help"]), Parsed::Usage);
    }

    #[test]
    fn test_targets() {
        assert_eq!(
            run(&["ping:example.org:500"]).target,
            Some(Target::Ping("example.org:500".into()))
        );
        assert_eq!(run(&["tcp::80"]).target, Some(Target::Tcp(":80".into())));
        assert_eq!(
            run(&["sqlite:app.db"]).target,
            Some(Target::Connect("sqlite:app.db".into()))
        );
    }

    #[test]
    fn test_connection_arguments() {
        let config = run(&[
            "-z",
            "sqlite:app.db",
            "scott",
            "tiger",
            "TABLES",
            "columns:People",
            "sql:SELECT",
            "name,",
            "Id",
            "FROM",
            "People",
        ]);
        assert!(!config.sections.includes('n'));
        assert_eq!(config.user.as_deref(), Some("scott"));
        assert_eq!(config.password.as_deref(), Some("tiger"));
        assert!(config.tables);
        assert_eq!(config.columns, vec!["People".to_string()]);
        assert_eq!(config.sql.as_deref(), Some("SELECT name, Id FROM People"));
        assert_eq!(config.echo[3], "***");
        assert_eq!(config.echo[2], "scott");
    }

    #[test]
    fn test_user_without_password_is_ignored() {
        let config = run(&["sqlite:app.db", "scott"]);
        assert_eq!(config.user, None);
        assert_eq!(config.echo, vec!["sqlite:app.db", "scott"]);
    }

    #[test]
    fn test_option_warnings() {
        let config = run(&["sqlite:app.db", "-", "-", "columns:", "bogus"]);
        let messages: Vec<&str> = config.warnings.iter().map(|w| w.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["no table given at: columns:", "unrecognized option: bogus"]
        );
        assert!(config.warnings.iter().all(|w| !w.visible));
    }

    #[test]
    fn test_tool_option_defaults() {
        let options = ToolOptions::default();
        assert_eq!(options.log_path, PathBuf::from("dbprobe.log"));
        assert_eq!(options.drivers_file, None);
        assert_eq!(options.login_timeout, Duration::ZERO);
    }

    #[test]
    fn test_usage_text_mentions_sections() {
        let mut buf = Vec::new();
        write_usage(&mut buf, "1.1.0").unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("dbprobe v 1.1.0"));
        assert!(text.contains("z - no section at all"));
    }
}
