//! Command: list racks.
use std::fmt::Write as _;

use anyhow::Result;

use super::{CommandSetup, field};
use crate::cli::GlobalOpts;
use crate::document::Document;
use crate::inventory::InventorySource;
use crate::logging::Logger;

/// Run the `racks` command.
///
/// # Errors
///
/// Returns an error if configuration is incomplete or the data service
/// cannot be queried.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let client = setup.connect()?;
    print!("{}", table(&client.racks()?));
    Ok(())
}

/// Render racks as a fixed-width table.
#[must_use]
pub fn table(racks: &[Document]) -> String {
    let mut out = format!(
        "{:<3} {:<25} {:<20} {:<20} #devs\n",
        "Id", "Name", "Site", "Location"
    );
    for rack in racks {
        let _ = writeln!(
            out,
            "{:<3} {:<25} {:<20} {:<20} {}",
            field(rack, "id"),
            field(rack, "display"),
            field(rack, "site.display"),
            field(rack, "location.display"),
            field(rack, "device_count"),
        );
    }
    out
}
