//! Standard SQL type codes and their names.
//!
//! The codes are the well-known generic SQL type numbers drivers report for
//! result columns. The name table is static; nothing is discovered at run
//! time.

pub const BIT: i32 = -7;
pub const TINYINT: i32 = -6;
pub const SMALLINT: i32 = 5;
pub const INTEGER: i32 = 4;
pub const BIGINT: i32 = -5;
pub const FLOAT: i32 = 6;
pub const REAL: i32 = 7;
pub const DOUBLE: i32 = 8;
pub const NUMERIC: i32 = 2;
pub const DECIMAL: i32 = 3;
pub const CHAR: i32 = 1;
pub const VARCHAR: i32 = 12;
pub const LONGVARCHAR: i32 = -1;
pub const DATE: i32 = 91;
pub const TIME: i32 = 92;
pub const TIMESTAMP: i32 = 93;
pub const BINARY: i32 = -2;
pub const VARBINARY: i32 = -3;
pub const LONGVARBINARY: i32 = -4;
pub const NULL: i32 = 0;
pub const OTHER: i32 = 1111;
pub const BLOB: i32 = 2004;
pub const CLOB: i32 = 2005;
pub const BOOLEAN: i32 = 16;

static TYPE_NAMES: &[(i32, &str)] = &[
    (BIT, "BIT"),
    (TINYINT, "TINYINT"),
    (SMALLINT, "SMALLINT"),
    (INTEGER, "INTEGER"),
    (BIGINT, "BIGINT"),
    (FLOAT, "FLOAT"),
    (REAL, "REAL"),
    (DOUBLE, "DOUBLE"),
    (NUMERIC, "NUMERIC"),
    (DECIMAL, "DECIMAL"),
    (CHAR, "CHAR"),
    (VARCHAR, "VARCHAR"),
    (LONGVARCHAR, "LONGVARCHAR"),
    (DATE, "DATE"),
    (TIME, "TIME"),
    (TIMESTAMP, "TIMESTAMP"),
    (BINARY, "BINARY"),
    (VARBINARY, "VARBINARY"),
    (LONGVARBINARY, "LONGVARBINARY"),
    (NULL, "NULL"),
    (OTHER, "OTHER"),
    (2000, "JAVA_OBJECT"),
    (2001, "DISTINCT"),
    (2002, "STRUCT"),
    (2003, "ARRAY"),
    (BLOB, "BLOB"),
    (CLOB, "CLOB"),
    (2006, "REF"),
    (70, "DATALINK"),
    (BOOLEAN, "BOOLEAN"),
    (-8, "ROWID"),
    (-15, "NCHAR"),
    (-9, "NVARCHAR"),
    (-16, "LONGNVARCHAR"),
    (2011, "NCLOB"),
    (2009, "SQLXML"),
    (2012, "REF_CURSOR"),
    (2013, "TIME_WITH_TIMEZONE"),
    (2014, "TIMESTAMP_WITH_TIMEZONE"),
];

/// Symbolic name of a type code.
pub fn type_name(code: i32) -> Option<&'static str> {
    TYPE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// What a declared column type (`VARCHAR(40)`, `DECIMAL(10,2)`, `TEXT`)
/// says about the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclaredType {
    pub code: i32,
    /// Length or precision from the parentheses, if any.
    pub size: Option<u32>,
    /// Scale from the parentheses, if any.
    pub decimal_digits: Option<u32>,
}

impl DeclaredType {
    /// Classify a declared type the way SQLite assigns affinity, refined
    /// by the common standard names. `None` is an expression column.
    pub fn parse(declared: Option<&str>) -> Self {
        let Some(declared) = declared.map(str::trim).filter(|d| !d.is_empty()) else {
            return Self {
                code: NULL,
                size: None,
                decimal_digits: None,
            };
        };

        let upper = declared.to_ascii_uppercase();
        let (base, args) = match upper.split_once('(') {
            Some((base, rest)) => (base.trim(), rest.trim_end_matches(')')),
            None => (upper.as_str(), ""),
        };
        let mut numbers = args.split(',').filter_map(|n| n.trim().parse::<u32>().ok());
        let size = numbers.next();
        let decimal_digits = numbers.next();

        let code = match base {
            "BOOLEAN" | "BOOL" => BOOLEAN,
            "BIT" => BIT,
            "TINYINT" => TINYINT,
            "SMALLINT" => SMALLINT,
            "BIGINT" => BIGINT,
            "REAL" => REAL,
            "FLOAT" => FLOAT,
            "DOUBLE" | "DOUBLE PRECISION" => DOUBLE,
            "NUMERIC" => NUMERIC,
            "DECIMAL" => DECIMAL,
            "DATE" => DATE,
            "TIME" => TIME,
            "DATETIME" | "TIMESTAMP" => TIMESTAMP,
            "CHAR" | "CHARACTER" | "NCHAR" => CHAR,
            "CLOB" => CLOB,
            b if b.contains("INT") => INTEGER,
            b if b.contains("CHAR") || b.contains("TEXT") => {
                if size.is_some() {
                    VARCHAR
                } else {
                    LONGVARCHAR
                }
            }
            b if b.contains("BLOB") => BLOB,
            b if b.contains("REAL") || b.contains("FLOA") || b.contains("DOUB") => DOUBLE,
            _ => NUMERIC,
        };

        Self {
            code,
            size,
            decimal_digits,
        }
    }

    /// Nominal display width of values of this type.
    pub fn display_size(&self) -> usize {
        match self.code {
            BOOLEAN | BIT => 5,
            DATE => 10,
            TIME => 8,
            TIMESTAMP => 23,
            TINYINT | SMALLINT | INTEGER | BIGINT => 20,
            REAL | FLOAT | DOUBLE => 25,
            NUMERIC | DECIMAL => match self.size {
                // digits, sign and decimal point
                Some(size) => size as usize + 2,
                None => 25,
            },
            CHAR | VARCHAR => self.size.map(|s| s as usize).unwrap_or(255),
            LONGVARCHAR | CLOB | BLOB => 255,
            _ => 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_lookup() {
        assert_eq!(type_name(INTEGER), Some("INTEGER"));
        assert_eq!(type_name(VARCHAR), Some("VARCHAR"));
        assert_eq!(type_name(2014), Some("TIMESTAMP_WITH_TIMEZONE"));
        assert_eq!(type_name(4242), None);
    }

    #[test]
    fn test_type_codes_are_unique() {
        for (i, (code, _)) in TYPE_NAMES.iter().enumerate() {
            assert!(
                TYPE_NAMES[i + 1..].iter().all(|(c, _)| c != code),
                "duplicate code {code}"
            );
        }
    }

    #[test]
    fn test_parse_sized_varchar() {
        let t = DeclaredType::parse(Some("varchar(40)"));
        assert_eq!(t.code, VARCHAR);
        assert_eq!(t.size, Some(40));
        assert_eq!(t.display_size(), 40);
    }

    #[test]
    fn test_parse_decimal_precision_and_scale() {
        let t = DeclaredType::parse(Some("DECIMAL(10, 2)"));
        assert_eq!(t.code, DECIMAL);
        assert_eq!(t.size, Some(10));
        assert_eq!(t.decimal_digits, Some(2));
        assert_eq!(t.display_size(), 12);
    }

    #[test]
    fn test_parse_affinity_fallbacks() {
        assert_eq!(DeclaredType::parse(Some("UNSIGNED BIG INT")).code, INTEGER);
        assert_eq!(DeclaredType::parse(Some("TEXT")).code, LONGVARCHAR);
        assert_eq!(DeclaredType::parse(Some("blob")).code, BLOB);
        assert_eq!(DeclaredType::parse(Some("money")).code, NUMERIC);
        assert_eq!(DeclaredType::parse(None).code, NULL);
        assert_eq!(DeclaredType::parse(Some("  ")).display_size(), 20);
    }
}
