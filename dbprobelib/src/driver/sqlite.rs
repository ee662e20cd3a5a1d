//! Built-in SQLite driver.
//!
//! Accepts `sqlite:<path>`, `sqlite::memory:` and `jdbc:sqlite:<path>`.
//! Existing database files are opened read-write but never created.

use std::time::Duration;

use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::types::ValueRef;
use rusqlite::{Batch, OpenFlags, Rows, Statement};

use super::types::DeclaredType;
use super::{
    ColumnInfo, ColumnMeta, Connection, Credentials, Driver, ResultSet, ResultVisitor, TableInfo,
    Value,
};
use crate::Result;

const PREFIXES: &[&str] = &["jdbc:sqlite:", "sqlite:"];
const MEMORY: &str = ":memory:";

pub struct SqliteDriver;

impl SqliteDriver {
    fn path(url: &str) -> Option<&str> {
        PREFIXES.iter().find_map(|prefix| {
            url.strip_prefix(prefix)
                .map(|rest| rest.strip_prefix("//").unwrap_or(rest))
        })
    }
}

fn library_version() -> (u32, u32) {
    let number = rusqlite::version_number().max(0) as u32;
    (number / 1_000_000, (number / 1_000) % 1_000)
}

impl Driver for SqliteDriver {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> (u32, u32) {
        library_version()
    }

    fn sql_compliant(&self) -> bool {
        false
    }

    fn accepts_url(&self, url: &str) -> bool {
        Self::path(url).is_some()
    }

    fn connect(
        &self,
        url: &str,
        credentials: Option<&Credentials>,
        login_timeout: Duration,
    ) -> Result<Box<dyn Connection>> {
        let path = Self::path(url)
            .ok_or_else(|| crate::Error::NoSuitableDriver(url.to_string()))?;
        if let Some(credentials) = credentials {
            tracing::debug!(user = %credentials.user, "sqlite ignores credentials");
        }

        let conn = if path == MEMORY {
            rusqlite::Connection::open_in_memory()?
        } else {
            rusqlite::Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        };
        conn.busy_timeout(login_timeout)?;
        Ok(Box::new(SqliteConnection { conn }))
    }
}

pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    /// Wrap an already open connection.
    pub fn new(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

impl Connection for SqliteConnection {
    fn product_name(&self) -> Result<String> {
        Ok("SQLite".to_string())
    }

    fn product_version(&self) -> Result<(u32, u32)> {
        Ok(library_version())
    }

    fn catalogs(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("PRAGMA database_list")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    fn tables(&self) -> Result<Vec<TableInfo>> {
        let mut tables = Vec::new();
        for catalog in self.catalogs()? {
            let sql = format!(
                "SELECT name, type FROM {}.sqlite_master \
                 WHERE type IN ('table', 'view') ORDER BY name",
                quote(&catalog)
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map([], |row| {
                Ok(TableInfo {
                    catalog: Some(catalog.clone()),
                    schema: None,
                    name: row.get(0)?,
                    kind: row.get::<_, String>(1)?.to_uppercase(),
                })
            })?;
            for table in rows {
                tables.push(table?);
            }
        }
        Ok(tables)
    }

    fn columns(&self, table: &TableInfo) -> Result<Vec<ColumnInfo>> {
        let schema = table.catalog.as_deref().unwrap_or("main");
        let mut stmt = self
            .conn
            .prepare("SELECT name, type, dflt_value FROM pragma_table_info(?1, ?2) ORDER BY cid")?;
        let rows = stmt.query_map([table.name.as_str(), schema], |row| {
            let type_name: String = row.get(1)?;
            let declared = DeclaredType::parse(Some(&type_name));
            Ok(ColumnInfo {
                name: row.get(0)?,
                type_name,
                size: declared.size,
                decimal_digits: declared.decimal_digits,
                default: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Statements run one after the other; each reports its own result.
    fn execute(&self, sql: &str, visitor: &mut dyn ResultVisitor) -> Result<()> {
        let mut batch = Batch::new(&self.conn, sql);
        while let Some(mut stmt) = batch.next()? {
            if stmt.column_count() == 0 {
                let count = stmt.execute([])?;
                visitor.update_count(count as u64)?;
                continue;
            }
            let columns = describe(&stmt);
            let mut rows = SqliteRows {
                rows: stmt.query([])?,
                columns,
            };
            visitor.result_set(&mut rows)?;
        }
        Ok(())
    }
}

fn describe(stmt: &Statement<'_>) -> Vec<ColumnMeta> {
    stmt.columns()
        .iter()
        .map(|column| {
            let declared = DeclaredType::parse(column.decl_type());
            ColumnMeta {
                name: column.name().to_string(),
                label: column.name().to_string(),
                type_name: column.decl_type().unwrap_or_default().to_string(),
                type_code: declared.code,
                precision: declared.size.unwrap_or(0),
                scale: declared.decimal_digits.unwrap_or(0),
                display_size: declared.display_size(),
                ..ColumnMeta::default()
            }
        })
        .collect()
}

struct SqliteRows<'stmt> {
    rows: Rows<'stmt>,
    columns: Vec<ColumnMeta>,
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

impl ResultSet for SqliteRows<'_> {
    fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        let count = self.columns.len();
        match self.rows.next()? {
            Some(row) => {
                let mut values = Vec::with_capacity(count);
                for i in 0..count {
                    values.push(to_value(row.get_ref(i)?));
                }
                Ok(Some(values))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::types;
    use tempfile::tempdir;

    #[derive(Default)]
    struct Collect {
        counts: Vec<u64>,
        columns: Vec<ColumnMeta>,
        rows: Vec<Vec<Value>>,
    }

    impl ResultVisitor for Collect {
        fn result_set(&mut self, rows: &mut dyn ResultSet) -> Result<()> {
            self.columns = rows.columns().to_vec();
            while let Some(row) = rows.next_row()? {
                self.rows.push(row);
            }
            Ok(())
        }

        fn update_count(&mut self, count: u64) -> Result<()> {
            self.counts.push(count);
            Ok(())
        }
    }

    fn memory() -> SqliteConnection {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE people (id INTEGER PRIMARY KEY, name VARCHAR(40) DEFAULT 'anon', \
             balance DECIMAL(10,2));
             INSERT INTO people (name, balance) VALUES ('ann', 1.5), ('bob', NULL);
             CREATE VIEW rich AS SELECT * FROM people WHERE balance > 1;",
        )
        .unwrap();
        SqliteConnection::new(conn)
    }

    #[test]
    fn test_accepts_sqlite_urls_only() {
        assert!(SqliteDriver.accepts_url("sqlite::memory:"));
        assert!(SqliteDriver.accepts_url("jdbc:sqlite:/tmp/app.db"));
        assert!(!SqliteDriver.accepts_url("jdbc:mysql://host/db"));
        assert_eq!(SqliteDriver::path("sqlite:///tmp/app.db"), Some("/tmp/app.db"));
    }

    #[test]
    fn test_connect_memory_and_product() {
        let conn = SqliteDriver
            .connect("sqlite::memory:", None, Duration::ZERO)
            .unwrap();
        assert_eq!(conn.product_name().unwrap(), "SQLite");
        assert_eq!(conn.product_version().unwrap().0, 3);
    }

    #[test]
    fn test_connect_missing_file_fails() {
        let dir = tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("absent.db").display());
        assert!(SqliteDriver.connect(&url, None, Duration::ZERO).is_err());
    }

    #[test]
    fn test_catalogs_and_tables() {
        let conn = memory();
        assert_eq!(conn.catalogs().unwrap(), vec!["main".to_string()]);

        let tables = conn.tables().unwrap();
        let names: Vec<(&str, &str)> = tables
            .iter()
            .map(|t| (t.name.as_str(), t.kind.as_str()))
            .collect();
        assert_eq!(names, vec![("people", "TABLE"), ("rich", "VIEW")]);
    }

    #[test]
    fn test_columns_of_table() {
        let conn = memory();
        let people = conn
            .tables()
            .unwrap()
            .into_iter()
            .find(|t| t.name == "people")
            .unwrap();
        let columns = conn.columns(&people).unwrap();

        assert_eq!(columns.len(), 3);
        assert_eq!(columns[1].name, "name");
        assert_eq!(columns[1].size_text(), "40");
        assert_eq!(columns[1].default.as_deref(), Some("'anon'"));
        assert_eq!(columns[2].size_text(), "10.2");
        assert_eq!(columns[0].size_text(), "");
    }

    #[test]
    fn test_execute_query_streams_rows() {
        let conn = memory();
        let mut collect = Collect::default();
        conn.execute("SELECT id, name, balance FROM people ORDER BY id", &mut collect)
            .unwrap();

        assert_eq!(collect.columns[1].label, "name");
        assert_eq!(collect.columns[1].type_code, types::VARCHAR);
        assert_eq!(collect.columns[1].display_size, 40);
        assert_eq!(collect.rows.len(), 2);
        assert_eq!(collect.rows[0][1], Value::Text("ann".into()));
        assert_eq!(collect.rows[1][2], Value::Null);
    }

    #[test]
    fn test_execute_update_reports_count() {
        let conn = memory();
        let mut collect = Collect::default();
        conn.execute("UPDATE people SET balance = 0", &mut collect)
            .unwrap();
        assert_eq!(collect.counts, vec![2]);
    }

    #[test]
    fn test_execute_reports_every_statement() {
        let conn = memory();
        let mut collect = Collect::default();
        conn.execute("SELECT 1 AS a; SELECT 'two' AS b;", &mut collect)
            .unwrap();
        assert_eq!(
            collect.rows,
            vec![vec![Value::Integer(1)], vec![Value::Text("two".into())]]
        );
        assert_eq!(collect.columns[0].label, "b");

        let mut collect = Collect::default();
        conn.execute(
            "CREATE TABLE t (x); INSERT INTO t VALUES (1), (2); SELECT count(*) FROM t",
            &mut collect,
        )
        .unwrap();
        assert_eq!(collect.counts.len(), 2);
        assert_eq!(collect.counts[1], 2);
        assert_eq!(collect.rows, vec![vec![Value::Integer(2)]]);
    }

    #[test]
    fn test_execute_bad_sql_fails() {
        let conn = memory();
        let mut collect = Collect::default();
        assert!(conn.execute("SELEKT 1", &mut collect).is_err());
    }
}
