//! Database drivers: the registry, the connection model and result sets.
//!
//! A [`Driver`] claims connection strings it understands and opens
//! [`Connection`]s. The [`DriverManager`] keeps the registered drivers in
//! order and hands a connection string to the first one that accepts it.
//!
//! Statements report their results through a [`ResultVisitor`]: an update
//! count, or a [`ResultSet`] that is read one row at a time while the
//! statement is still open. Nothing is collected up front.

pub mod sqlite;
pub mod types;

use std::fmt;
use std::time::Duration;

use crate::error::Error;
use crate::Result;

/// A single value read from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => f.write_str(s),
            Value::Blob(bytes) => {
                f.write_str("x'")?;
                for b in bytes {
                    write!(f, "{b:02X}")?;
                }
                f.write_str("'")
            }
        }
    }
}

/// Description of one result column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMeta {
    pub catalog: String,
    pub schema: String,
    pub table: String,
    pub name: String,
    /// Heading to print; usually the name or its alias.
    pub label: String,
    pub type_name: String,
    /// Standard SQL type code, see [`types`].
    pub type_code: i32,
    pub precision: u32,
    pub scale: u32,
    /// Nominal display width, the requested width when rendering.
    pub display_size: usize,
}

/// A table or view known to the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub name: String,
    pub kind: String,
}

/// A column of a table, as declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub type_name: String,
    pub size: Option<u32>,
    pub decimal_digits: Option<u32>,
    pub default: Option<String>,
}

impl ColumnInfo {
    /// `"10.2"`, `"40"` or empty when the size is unknown.
    pub fn size_text(&self) -> String {
        match (self.size, self.decimal_digits) {
            (None, _) => String::new(),
            (Some(size), None) => size.to_string(),
            (Some(size), Some(digits)) => format!("{size}.{digits}"),
        }
    }
}

/// Rows of a result, read lazily.
pub trait ResultSet {
    fn columns(&self) -> &[ColumnMeta];

    /// Fetch the next row; `None` once the result is exhausted.
    fn next_row(&mut self) -> Result<Option<Vec<Value>>>;
}

/// Receives the results of a statement in order.
pub trait ResultVisitor {
    fn result_set(&mut self, rows: &mut dyn ResultSet) -> Result<()>;

    fn update_count(&mut self, count: u64) -> Result<()>;
}

/// An open database session.
pub trait Connection {
    fn product_name(&self) -> Result<String>;

    /// `(major, minor)` version of the database product.
    fn product_version(&self) -> Result<(u32, u32)>;

    fn catalogs(&self) -> Result<Vec<String>>;

    fn tables(&self) -> Result<Vec<TableInfo>>;

    fn columns(&self, table: &TableInfo) -> Result<Vec<ColumnInfo>>;

    /// Run `sql` exactly as given and report every result to `visitor`.
    fn execute(&self, sql: &str, visitor: &mut dyn ResultVisitor) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// A database driver.
pub trait Driver {
    /// Name used in the drivers list and the driver-manager report.
    fn name(&self) -> &str;

    /// `(major, minor)` driver version.
    fn version(&self) -> (u32, u32);

    /// Whether the driver implements standard SQL fully.
    fn sql_compliant(&self) -> bool;

    fn accepts_url(&self, url: &str) -> bool;

    fn connect(
        &self,
        url: &str,
        credentials: Option<&Credentials>,
        login_timeout: Duration,
    ) -> Result<Box<dyn Connection>>;
}

/// Registered drivers, tried in registration order.
pub struct DriverManager {
    drivers: Vec<Box<dyn Driver>>,
    login_timeout: Duration,
}

impl DriverManager {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            drivers: Vec::new(),
            login_timeout: Duration::ZERO,
        }
    }

    /// Registry with every driver compiled into this build.
    pub fn with_builtin() -> Self {
        let mut manager = Self::new();
        manager.register(Box::new(sqlite::SqliteDriver));
        manager
    }

    pub fn register(&mut self, driver: Box<dyn Driver>) {
        self.drivers.push(driver);
    }

    pub fn drivers(&self) -> impl Iterator<Item = &dyn Driver> {
        self.drivers.iter().map(|d| d.as_ref())
    }

    pub fn login_timeout(&self) -> Duration {
        self.login_timeout
    }

    pub fn set_login_timeout(&mut self, timeout: Duration) {
        self.login_timeout = timeout;
    }

    /// Look a driver up by name (case-insensitive).
    pub fn load(&self, name: &str) -> Result<&dyn Driver> {
        self.drivers()
            .find(|d| d.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| Error::DriverNotFound(name.to_string()))
    }

    /// Connect with the first driver that accepts `url`.
    pub fn connect(
        &self,
        url: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Box<dyn Connection>> {
        let driver = self
            .drivers()
            .find(|d| d.accepts_url(url))
            .ok_or_else(|| Error::NoSuitableDriver(url.to_string()))?;
        tracing::debug!(driver = driver.name(), url, "connecting");
        driver.connect(url, credentials, self.login_timeout)
    }
}

impl Default for DriverManager {
    fn default() -> Self {
        Self::with_builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Integer(-3).to_string(), "-3");
        assert_eq!(Value::Real(1.5).to_string(), "1.5");
        assert_eq!(Value::Text("abc".into()).to_string(), "abc");
        assert_eq!(Value::Blob(vec![0xde, 0xad]).to_string(), "x'DEAD'");
    }

    #[test]
    fn test_size_text() {
        let mut column = ColumnInfo {
            name: "amount".into(),
            type_name: "DECIMAL".into(),
            size: Some(10),
            decimal_digits: Some(2),
            default: None,
        };
        assert_eq!(column.size_text(), "10.2");
        column.decimal_digits = None;
        assert_eq!(column.size_text(), "10");
        column.size = None;
        assert_eq!(column.size_text(), "");
    }

    #[test]
    fn test_load_known_and_unknown_driver() {
        let manager = DriverManager::with_builtin();
        assert_eq!(manager.load("SQLite").unwrap().name(), "sqlite");
        let err = manager.load("oracle").err().unwrap();
        assert_eq!(err.to_string(), "driver not found: oracle");
    }

    #[test]
    fn test_connect_without_suitable_driver() {
        let manager = DriverManager::with_builtin();
        let err = manager.connect("postgres://db/app", None).err().unwrap();
        assert_eq!(
            err.to_string(),
            "no suitable driver found for postgres://db/app"
        );
    }
}
