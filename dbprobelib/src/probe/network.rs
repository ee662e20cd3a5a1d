//! NETWORK section: the local host and its interfaces.

use std::io::{self, Write};
use std::net::IpAddr;
use std::time::Duration;

use sysinfo::{Networks, System};

use super::ping;
use crate::runner::Context;
use crate::Result;

const LOCALHOST_TIMEOUT: Duration = Duration::from_millis(500);

/// One network interface as reported by the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    /// Address and prefix length.
    pub addresses: Vec<(IpAddr, u8)>,
    /// `None` for interfaces without a hardware address (loopback).
    pub hardware: Option<[u8; 6]>,
    pub mtu: u64,
}

impl Interface {
    fn hardware_text(&self) -> String {
        match self.hardware {
            Some(mac) => mac
                .iter()
                .map(|b| format!("{b:02X}"))
                .collect::<Vec<_>>()
                .join(":"),
            None => "null".to_string(),
        }
    }
}

/// Interfaces of this machine, sorted by name.
pub fn interfaces() -> Vec<Interface> {
    let networks = Networks::new_with_refreshed_list();
    let mut interfaces: Vec<Interface> = networks
        .list()
        .iter()
        .map(|(name, data)| {
            let mac = data.mac_address();
            Interface {
                name: name.clone(),
                addresses: data
                    .ip_networks()
                    .iter()
                    .map(|net| (net.addr, net.prefix))
                    .collect(),
                hardware: mac.0.iter().any(|b| *b != 0).then_some(mac.0),
                mtu: data.mtu(),
            }
        })
        .collect();
    interfaces.sort_by(|a, b| a.name.cmp(&b.name));
    interfaces
}

pub fn write_interfaces<W: Write + ?Sized>(out: &mut W, interfaces: &[Interface]) -> io::Result<()> {
    for interface in interfaces {
        writeln!(out, "Interface: {}", interface.name)?;
        writeln!(out, "  Name: {}", interface.name)?;
        for (addr, prefix) in &interface.addresses {
            writeln!(out, "    {addr}/{prefix}")?;
        }
        writeln!(out, "  Hardware: {}", interface.hardware_text())?;
        writeln!(out, "  MTU: {}", interface.mtu)?;
    }
    Ok(())
}

pub fn run(ctx: &mut Context<'_>) -> Result<()> {
    let host = System::host_name().unwrap_or_else(|| "localhost".to_string());
    match ping::resolve(&host) {
        Ok(ip) => {
            let reachable = ping::is_reachable(ip, LOCALHOST_TIMEOUT);
            writeln!(ctx.out, "Localhost: {host}/{ip} ({reachable})")?;
        }
        Err(err) => ctx.out.report(format_args!("Localhost: {err}"))?,
    }

    let interfaces = interfaces();
    tracing::debug!(count = interfaces.len(), "network interfaces");
    write_interfaces(&mut *ctx.out, &interfaces)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_write_interfaces() {
        let interfaces = vec![
            Interface {
                name: "eth0".into(),
                addresses: vec![(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)), 24)],
                hardware: Some([0x02, 0x42, 0xac, 0x11, 0x00, 0x02]),
                mtu: 1500,
            },
            Interface {
                name: "lo".into(),
                addresses: vec![(IpAddr::V4(Ipv4Addr::LOCALHOST), 8)],
                hardware: None,
                mtu: 65536,
            },
        ];
        let mut buf = Vec::new();
        write_interfaces(&mut buf, &interfaces).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Interface: eth0\n  Name: eth0\n    10.0.0.5/24\n  Hardware: 02:42:AC:11:00:02\n  MTU: 1500\n\
             Interface: lo\n  Name: lo\n    127.0.0.1/8\n  Hardware: null\n  MTU: 65536\n"
        );
    }

    #[test]
    fn test_interfaces_sorted() {
        let names: Vec<String> = interfaces().into_iter().map(|i| i.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
