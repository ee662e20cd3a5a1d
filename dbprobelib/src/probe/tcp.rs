//! `tcp:<host>:<port>[:<timeoutMs>]` connection check.
//!
//! Opens a connection, waits for the server to speak first and dumps up to
//! 256 bytes of whatever arrives, as signed bytes and as text.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::ping::parse_timeout;
use crate::error::{Error, ResultExt};
use crate::output::Output;
use crate::runner::Context;
use crate::Result;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

const READ_BUFFER: usize = 256;

#[derive(Debug, PartialEq, Eq)]
struct Address<'a> {
    host: &'a str,
    port: u16,
    timeout: Duration,
}

/// `None` when the port is missing.
fn parse_address(address: &str) -> Result<Option<Address<'_>>> {
    let mut tokens = address.splitn(3, ':');
    let host = tokens.next().unwrap_or_default();
    let Some(port) = tokens.next() else {
        return Ok(None);
    };
    let port = port.trim().parse::<u16>().map_err(|_| {
        Error::InvalidNumber {
            what: "port",
            value: port.to_string(),
        }
        .context("Port")
    })?;
    let timeout = match tokens.next() {
        Some(text) => parse_timeout(text)?,
        None => DEFAULT_TIMEOUT,
    };
    Ok(Some(Address {
        host: if host.is_empty() { DEFAULT_HOST } else { host },
        port,
        timeout,
    }))
}

fn connect(address: &Address<'_>) -> Result<TcpStream> {
    let addr: SocketAddr = (address.host, address.port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| Error::UnknownHost(address.host.to_string()))?;
    tracing::debug!(%addr, timeout = ?address.timeout, "tcp connect");
    let stream = if address.timeout.is_zero() {
        TcpStream::connect(addr)?
    } else {
        let stream = TcpStream::connect_timeout(&addr, address.timeout)?;
        stream.set_read_timeout(Some(address.timeout))?;
        stream
    };
    Ok(stream)
}

/// `[104, 105, 0, ...]` with bytes shown signed.
fn signed_bytes(buf: &[u8]) -> String {
    let bytes: Vec<String> = buf.iter().map(|b| (*b as i8).to_string()).collect();
    format!("[{}]", bytes.join(", "))
}

fn dump(out: &mut Output, stream: &mut TcpStream) -> Result<()> {
    let mut buf = [0u8; READ_BUFFER];
    match stream.read(&mut buf) {
        Ok(read) => {
            writeln!(out, "Read: {read} bytes")?;
            writeln!(out, "{}", signed_bytes(&buf))?;
            writeln!(out, "{}", String::from_utf8_lossy(&buf[..read]))?;
        }
        Err(err) => out.report(format_args!("{err}"))?,
    }
    Ok(())
}

pub fn run(ctx: &mut Context<'_>, address: &str) -> Result<()> {
    let Some(address) = parse_address(address)? else {
        writeln!(ctx.out, "Address: missing port")?;
        return Ok(());
    };
    let mut stream = connect(&address).context("Tcp")?;
    dump(ctx.out, &mut stream)
}
