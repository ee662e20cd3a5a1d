//! `ping:<host>[:<timeoutMs>]` reachability check.
//!
//! Raw ICMP needs privileges, so reachability is a TCP connection attempt to
//! the echo port: an accepted or a refused connection both prove that the
//! host answered.

use std::io::{ErrorKind, Write};
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::Error;
use crate::runner::Context;
use crate::Result;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

const ECHO_PORT: u16 = 7;

/// Parse a timeout in milliseconds, tagging failures with `Timeout`.
pub(crate) fn parse_timeout(text: &str) -> Result<Duration> {
    text.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| {
            Error::InvalidNumber {
                what: "timeout",
                value: text.to_string(),
            }
            .context("Timeout")
        })
}

/// Host and timeout from the part after `ping:`.
fn parse_address(address: &str) -> Result<(&str, Duration)> {
    let (host, timeout) = match address.split_once(':') {
        Some((host, timeout)) => (host, Some(timeout)),
        None => (address, None),
    };
    let host = if host.is_empty() { DEFAULT_HOST } else { host };
    let timeout = match timeout {
        Some(text) if !text.is_empty() => parse_timeout(text)?,
        _ => DEFAULT_TIMEOUT,
    };
    Ok((host, timeout))
}

/// First address `host` resolves to.
pub(crate) fn resolve(host: &str) -> Result<IpAddr> {
    (host, ECHO_PORT)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .map(|addr| addr.ip())
        .ok_or_else(|| Error::UnknownHost(host.to_string()))
}

/// Whether `ip` answers a connection attempt within `timeout`.
/// A zero timeout waits as long as the system does.
pub fn is_reachable(ip: IpAddr, timeout: Duration) -> bool {
    let addr = SocketAddr::new(ip, ECHO_PORT);
    let attempt = if timeout.is_zero() {
        TcpStream::connect(addr)
    } else {
        TcpStream::connect_timeout(&addr, timeout)
    };
    match attempt {
        Ok(_) => true,
        Err(err) => {
            tracing::debug!(%ip, error = %err, "echo port");
            err.kind() == ErrorKind::ConnectionRefused
        }
    }
}

pub fn run(ctx: &mut Context<'_>, address: &str) -> Result<()> {
    let (host, timeout) = parse_address(address)?;
    let ip = resolve(host).map_err(|err| err.context("Host"))?;
    let status = if is_reachable(ip, timeout) {
        "OK"
    } else {
        "unreachable"
    };
    writeln!(ctx.out, "{host}/{ip} ({host}): {status}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::testing::Capture;
    use crate::probe::testing::{parse, probe};

    #[test]
    fn test_parse_address_defaults() {
        assert_eq!(parse_address("").unwrap(), (DEFAULT_HOST, DEFAULT_TIMEOUT));
        assert_eq!(
            parse_address("db.local").unwrap(),
            ("db.local", DEFAULT_TIMEOUT)
        );
        assert_eq!(
            parse_address(":250").unwrap(),
            (DEFAULT_HOST, Duration::from_millis(250))
        );
    }

    #[test]
    fn test_bad_timeout_is_tagged() {
        let err = parse_address("db.local:soon").unwrap_err();
        assert_eq!(err.to_string(), "Timeout: invalid timeout: \"soon\"");
    }

    #[test]
    fn test_resolve_literal_address() {
        assert_eq!(resolve("127.0.0.1").unwrap().to_string(), "127.0.0.1");
    }

    #[test]
    fn test_ping_loopback() {
        let mut cap = Capture::new();
        let config = parse(&["ping:127.0.0.1:500"]);
        probe(&mut cap, &config, &[], |ctx| run(ctx, "127.0.0.1:500")).unwrap();

        assert_eq!(
            cap.console.text(),
            "127.0.0.1/127.0.0.1 (127.0.0.1): OK\n"
        );
    }
}
