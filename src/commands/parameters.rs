//! Command: print selected parameters of each device.
use std::fmt::Write as _;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::{GlobalOpts, ParametersOpts};
use crate::document::{Document, scalar_text};
use crate::inventory::InventorySource;
use crate::logging::Logger;
use crate::path::Path;

/// Marker printed for paths that do not resolve.
pub const MISSING: &str = "[DNE]";

/// Run the `parameters` command.
///
/// # Errors
///
/// Returns an error if configuration is incomplete or the data service
/// cannot be queried.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, opts: &ParametersOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let client = setup.connect()?;
    print!("{}", collect(&client, opts)?);
    Ok(())
}

/// Fetch and link the selected devices and render their parameters.
///
/// `--devices` takes precedence over `--racks`.
///
/// # Errors
///
/// Returns an error if the data service cannot be queried.
pub fn collect(source: &dyn InventorySource, opts: &ParametersOpts) -> Result<String> {
    let devices = if opts.devices.is_empty() {
        source.devices(&opts.racks)?
    } else {
        source.devices_by_name(&opts.devices)?
    };
    let devices = source.link_device_data(devices)?;
    let specs: Vec<Path> = opts.specs.iter().map(|s| Path::parse(s)).collect();

    let mut out = String::new();
    for device in &devices {
        let name = device.get("name").map(scalar_text).unwrap_or_default();
        out.push_str(&render_device(&source.fqdn(&name), device, &opts.specs, &specs));
    }
    Ok(out)
}

/// Render one device block: its name, then one aligned line per path.
#[must_use]
pub fn render_device(name: &str, device: &Document, labels: &[String], specs: &[Path]) -> String {
    let mut out = format!("{name}\n");
    for (label, spec) in labels.iter().zip(specs) {
        let value = spec
            .resolve(device)
            .map_or_else(|_| MISSING.to_string(), scalar_text);
        let _ = writeln!(out, "  {label:<40}:  {value}");
    }
    out
}
