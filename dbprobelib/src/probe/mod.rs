//! Diagnostic probes.
//!
//! Each probe is a section body: it writes lines or tables to the output and
//! returns `Err` when it cannot go on. Sub-steps that may fail on their own
//! (a product name, a socket read) are reported inline with
//! [`Output::report`](crate::output::Output::report) and the probe carries on.

pub mod connect;
pub mod drivers;
pub mod manager;
pub mod network;
pub mod paths;
pub mod ping;
pub mod properties;
pub mod tcp;

use crate::config::{RunConfiguration, Target};
use crate::runner::Section;

/// The fixed sections, in run order.
pub fn fixed_sections() -> Vec<Section> {
    vec![
        Section::fixed('n', "NETWORK", network::run),
        Section::fixed('d', "DRIVERS", drivers::run),
        Section::fixed('m', "DRIVER MANAGER", manager::run),
        Section::fixed('c', "SEARCH PATH", paths::search_path),
        Section::fixed('l', "LIBRARIES", paths::libraries),
        Section::fixed('p', "SYSTEM PROPERTIES", properties::run),
    ]
}

/// The section probing the user's target, if one was given.
pub fn target_section(config: &RunConfiguration) -> Option<Section> {
    let section = match config.target.as_ref()? {
        Target::Ping(address) => {
            let address = address.clone();
            Section::target("PING", Some(address.clone()), move |ctx| {
                ping::run(ctx, &address)
            })
        }
        Target::Tcp(address) => {
            let address = address.clone();
            Section::target("TCP", Some(address.clone()), move |ctx| {
                tcp::run(ctx, &address)
            })
        }
        Target::Connect(url) => {
            let user = config.user.as_deref().unwrap_or("null");
            Section::target("CONNECT", Some(format!("{url} {user}")), connect::run)
        }
    };
    Some(section)
}

/// Every section of a run: the fixed ones, then the target.
pub fn sections(config: &RunConfiguration) -> Vec<Section> {
    let mut sections = fixed_sections();
    sections.extend(target_section(config));
    sections
}
