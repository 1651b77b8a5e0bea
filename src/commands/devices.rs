//! Command: list rack devices from the top unit down.
use std::cmp::Reverse;
use std::fmt::Write as _;

use anyhow::Result;

use super::{CommandSetup, field};
use crate::cli::{DevicesOpts, GlobalOpts};
use crate::document::Document;
use crate::inventory::InventorySource;
use crate::logging::Logger;

/// Run the `devices` command.
///
/// # Errors
///
/// Returns an error if configuration is incomplete or the data service
/// cannot be queried.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, opts: &DevicesOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let client = setup.connect()?;
    print!("{}", listing(&client.devices(&opts.racks)?, opts.blanks));
    Ok(())
}

/// Rack unit a device is mounted at. Fractional units are truncated;
/// unmounted devices count as unit 0.
fn position(device: &Document) -> u64 {
    let Some(Document::Number(unit)) = device.get("position") else {
        return 0;
    };
    unit.as_u64()
        .or_else(|| unit.to_string().split('.').next()?.parse().ok())
        .unwrap_or(0)
}

/// Render devices sorted by descending position, with `Id`, `Pos`, `Name`
/// and `Type` columns. With `blanks`, every empty unit between two devices
/// gets a line holding its number.
#[must_use]
pub fn listing(devices: &[Document], blanks: bool) -> String {
    let mut sorted: Vec<&Document> = devices.iter().collect();
    sorted.sort_by_key(|device| Reverse(position(device)));

    let mut out = format!("{:<3} {:<3} {:<25} {:<20}\n", "Id", "Pos", "Name", "Type");
    let mut last = None;
    for device in sorted {
        let unit = position(device);
        if blanks && let Some(above) = last {
            for blank in (unit + 1..above).rev() {
                let _ = writeln!(out, "{blank}");
            }
        }
        let _ = writeln!(
            out,
            "{:<3} {:<3} {:<25} {:<20}",
            field(device, "id"),
            unit,
            field(device, "display"),
            field(device, "device_type.display"),
        );
        last = Some(unit);
    }
    out
}
