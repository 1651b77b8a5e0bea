//! Subcommand orchestration.
pub mod device;
pub mod devices;
pub mod networks;
pub mod outlets;
pub mod parameters;
pub mod plugins;
pub mod racks;
pub mod update;
pub mod version;

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::document::{Document, scalar_text};
use crate::inventory::{HttpFetch, NetboxClient};
use crate::logging::Logger;
use crate::path;

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// Loaded configuration with environment overrides applied.
    pub config: Config,
}

impl CommandSetup {
    /// Load the configuration named by `--config` or the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or parsed.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let config = Config::load(global.config.as_deref())?;
        log.debug(&format!("api: {}", config.api_url()));
        log.debug(&format!("{} preset transform(s)", config.transforms.len()));
        Ok(Self { config })
    }

    /// Connect to the data service configured in [`config`](Self::config).
    ///
    /// # Errors
    ///
    /// Returns an error if no API token is configured.
    pub fn connect(&self) -> Result<NetboxClient<HttpFetch>> {
        Ok(NetboxClient::from_config(&self.config)?)
    }
}

/// Print the summary and bail if any host recorded a failure.
///
/// # Errors
///
/// Returns an error if one or more hosts failed.
pub fn finish(log: &Logger) -> Result<()> {
    log.print_summary();

    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} host(s) failed");
    }
    Ok(())
}

/// Text of the value at the dotted path `at`; empty when the path does not
/// resolve or the value is null.
pub(crate) fn field(record: &Document, at: &str) -> String {
    path::get(record, at)
        .ok()
        .filter(|value| !value.is_null())
        .map(scalar_text)
        .unwrap_or_default()
}
