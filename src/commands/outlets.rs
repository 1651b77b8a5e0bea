//! Command: list the power outlets of a rack's devices.
use std::fmt::Write as _;

use anyhow::Result;

use super::{CommandSetup, field};
use crate::cli::{GlobalOpts, RackOpts};
use crate::document::Document;
use crate::inventory::InventorySource;
use crate::logging::Logger;

/// Run the `outlets` command.
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

/// One block per device in `rack`, listing each outlet as
/// `device.outlet`.
///
/// # Errors
///
/// Returns an error if the data service cannot be queried.
pub fn listing(source: &dyn InventorySource, rack: u64) -> Result<String> {
    let mut out = String::new();
    for device in source.devices(&[rack])? {
        let _ = writeln!(out, "{}:", field(&device, "display"));
        let Some(id) = device.get("id").and_then(Document::as_u64) else {
            continue;
        };
        for outlet in source.power_outlets(id)? {
            let _ = writeln!(
                out,
                "  - {}.{}",
                field(&outlet, "device.display"),
                field(&outlet, "display")
            );
        }
    }
    Ok(out)
}
