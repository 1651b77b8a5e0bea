//! Command: dump linked device records as YAML.
use anyhow::Result;

use super::CommandSetup;
use crate::cli::{DeviceOpts, GlobalOpts};
use crate::document::Document;
use crate::document::io::{DocumentFormat, render};
use crate::inventory::InventorySource;
use crate::logging::Logger;

/// Run the `device` command.
///
/// # Errors
///
/// Returns an error if configuration is incomplete, the data service cannot
/// be queried, or a record cannot be serialized.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, opts: &DeviceOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let client = setup.connect()?;
    for device in lookup(&client, &opts.devices, log)? {
        print!("{}", dump(&device)?);
    }
    Ok(())
}

/// Resolve each argument as a device id when numeric, otherwise as a name,
/// and link the matches.
///
/// # Errors
///
/// Returns an error if the data service cannot be queried.
pub fn lookup(
    source: &dyn InventorySource,
    args: &[String],
    log: &Logger,
) -> Result<Vec<Document>> {
    let mut devices = Vec::new();
    for arg in args {
        let found = if let Ok(id) = arg.parse::<u64>() {
            log.debug(&format!("looking up device id {id}"));
            source.devices_by_id(&[id])?
        } else {
            log.debug(&format!("looking up device name {arg}"));
            source.devices_by_name(std::slice::from_ref(arg))?
        };
        if found.is_empty() {
            log.warn(&format!("no device matches '{arg}'"));
        }
        devices.extend(found);
    }
    Ok(source.link_device_data(devices)?)
}

/// Render one device as a commented YAML block.
///
/// # Errors
///
/// Returns an error if the record cannot be serialized.
pub fn dump(device: &Document) -> Result<String> {
    let id = device
        .get("id")
        .map_or_else(|| "?".to_string(), ToString::to_string);
    let body = render(device, DocumentFormat::Yaml, &format!("device #{id}"))?;
    Ok(format!("#\n# device: #{id}\n#\n{body}"))
}
