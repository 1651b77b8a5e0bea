//! Command: list interfaces, cable peers and addresses of a rack's devices.
use std::fmt::Write as _;

use anyhow::Result;

use super::{CommandSetup, field};
use crate::cli::{GlobalOpts, RackOpts};
use crate::document::{Document, scalar_text};
use crate::inventory::InventorySource;
use crate::logging::Logger;

/// Paths tried in order for the device at the far end of an interface's
/// cable. Older data services report `cable_peer`, newer ones `link_peers`.
const PEER_PATHS: [&str; 2] = ["cable_peer.device.display", "link_peers.0.device.display"];

/// Run the `networks` command.
///
/// # Errors
///
/// Returns an error if configuration is incomplete or the data service
/// cannot be queried.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, opts: &RackOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let client = setup.connect()?;
    print!("{}", listing(&client, opts.rack)?);
    Ok(())
}

/// One block per device in `rack`, sorted by name, with a line per
/// interface: name, cable peer, IPv4, IPv6 and interface type.
///
/// # Errors
///
/// Returns an error if the data service cannot be queried.
pub fn listing(source: &dyn InventorySource, rack: u64) -> Result<String> {
    let mut devices = source.link_device_data(source.devices(&[rack])?)?;
    devices.sort_by_cached_key(|device| field(device, "display"));

    let mut out = String::new();
    for device in &devices {
        let _ = writeln!(out, "{}:", field(device, "display"));
        let Some(Document::Object(interfaces)) = device.get("interfaces") else {
            continue;
        };
        for interface in interfaces.values() {
            out.push_str(&interface_line(device, interface));
        }
    }
    Ok(out)
}

fn interface_line(device: &Document, interface: &Document) -> String {
    let peer = PEER_PATHS
        .iter()
        .map(|at| field(interface, at))
        .find(|peer| !peer.is_empty())
        .unwrap_or_default();

    // Interface names may contain dots, so addresses are looked up by key.
    let display = field(interface, "display");
    let address = |family: &str| {
        device
            .get("addresses")
            .and_then(|by_interface| by_interface.get(&display))
            .and_then(|by_family| by_family.get(family))
            .map(scalar_text)
            .unwrap_or_default()
    };

    format!(
        "  {:<12} {:<10} {:<20} {:<30} {}\n",
        field(interface, "name"),
        peer,
        address("IPv4"),
        address("IPv6"),
        field(interface, "type.label"),
    )
}
