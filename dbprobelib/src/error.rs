//! Error types for dbprobelib

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while probing
#[derive(Error, Debug)]
pub enum Error {
    /// The log file could not be opened; the tool cannot start without it
    #[error("unable to open log file '{path}': {source}")]
    LogOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    /// IO error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Error reported by a database driver
    #[error("{0}")]
    Database(#[from] rusqlite::Error),

    /// No registered driver accepts the connection string
    #[error("no suitable driver found for {0}")]
    NoSuitableDriver(String),

    /// A configured driver name is not compiled into this build
    #[error("driver not found: {0}")]
    DriverNotFound(String),

    /// A numeric argument (port, timeout) did not parse
    #[error("invalid {what}: \"{value}\"")]
    InvalidNumber { what: &'static str, value: String },

    /// `tcp:` target without a port
    #[error("missing port")]
    MissingPort,

    /// Host name did not resolve to any address
    #[error("unknown host: {0}")]
    UnknownHost(String),

    /// A failure tagged with the step it happened in (`Connection: ...`)
    #[error("{tag}: {source}")]
    Context {
        tag: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Tag this error with the step it happened in.
    pub fn context(self, tag: &'static str) -> Self {
        Error::Context {
            tag,
            source: Box::new(self),
        }
    }
}

/// Attach a context tag to the error side of a result.
pub trait ResultExt<T> {
    fn context(self, tag: &'static str) -> Result<T, Error>;
}

impl<T, E: Into<Error>> ResultExt<T> for Result<T, E> {
    fn context(self, tag: &'static str) -> Result<T, Error> {
        self.map_err(|e| e.into().context(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_prefixes_message() {
        let err = Error::NoSuitableDriver("pg://db".to_string()).context("Connection");
        assert_eq!(
            err.to_string(),
            "Connection: no suitable driver found for pg://db"
        );
    }

    #[test]
    fn test_result_ext_converts_io_errors() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        let err = result.context("Tcp").unwrap_err();
        assert_eq!(err.to_string(), "Tcp: refused");
    }
}
