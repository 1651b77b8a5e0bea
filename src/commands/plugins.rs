//! Command: list registered transforms.
use anyhow::Result;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::logging::Logger;
use crate::transforms::PluginRegistry;

/// Run the `plugins` command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or a preset is
/// invalid.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let registry = setup.config.registry()?;
    print!("{}", listing(&registry));
    Ok(())
}

/// One registered name per line, sorted.
#[must_use]
pub fn listing(registry: &PluginRegistry) -> String {
    registry
        .names()
        .into_iter()
        .map(|name| format!("{name}\n"))
        .collect()
}
