//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the inventory sync tool.
#[derive(Parser, Debug)]
#[command(
    name = "invsync",
    about = "Reconcile NetBox inventory with Ansible host variables",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared across all subcommands.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Config file (defaults to ~/.config/invsync/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Preview changes without writing host files
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Process hosts one at a time (parallel is enabled by default)
    #[arg(long = "no-parallel", global = true, action = clap::ArgAction::SetFalse)]
    pub parallel: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Update host_vars files from inventory records
    Update(UpdateOpts),
    /// Print selected parameters of each device
    Parameters(ParametersOpts),
    /// Dump linked device records as YAML
    Device(DeviceOpts),
    /// List racks
    Racks,
    /// List rack devices from the top unit down
    Devices(DevicesOpts),
    /// List the power outlets of a rack's devices
    Outlets(RackOpts),
    /// List interfaces, cable peers and addresses of a rack's devices
    Networks(RackOpts),
    /// List registered transforms
    Plugins,
    /// Print version information
    Version,
}

impl Command {
    /// Short name used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Update(_) => "update",
            Self::Parameters(_) => "parameters",
            Self::Device(_) => "device",
            Self::Racks => "racks",
            Self::Devices(_) => "devices",
            Self::Outlets(_) => "outlets",
            Self::Networks(_) => "networks",
            Self::Plugins => "plugins",
            Self::Version => "version",
        }
    }
}

/// Options for the `update` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct UpdateOpts {
    /// Restrict to these rack ids (all racks by default)
    #[arg(short, long, value_delimiter = ',', num_args = 1..)]
    pub racks: Vec<u64>,

    /// Ansible directory containing host_vars/
    #[arg(short, long)]
    pub ansible_directory: Option<PathBuf>,

    /// Change specification file (YAML, JSON or TOML)
    #[arg(long)]
    pub changes: Option<PathBuf>,
}

/// Options for the `parameters` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ParametersOpts {
    /// Restrict to these rack ids
    #[arg(short, long, value_delimiter = ',', num_args = 1..)]
    pub racks: Vec<u64>,

    /// Restrict to these device names
    #[arg(short = 'D', long, value_delimiter = ',', num_args = 1..)]
    pub devices: Vec<String>,

    /// Dotted paths to print
    #[arg(required = true)]
    pub specs: Vec<String>,
}

/// Options for the `device` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct DeviceOpts {
    /// Device ids or names
    #[arg(required = true)]
    pub devices: Vec<String>,
}

/// Options for the `devices` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct DevicesOpts {
    /// Print one line per empty rack unit between devices
    #[arg(short, long)]
    pub blanks: bool,

    /// Rack ids (all racks by default)
    pub racks: Vec<u64>,
}

/// Options for subcommands that report on a single rack.
#[derive(Parser, Debug, Clone)]
pub struct RackOpts {
    /// Rack id
    pub rack: u64,
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_update_with_config() {
        let cli = Cli::parse_from(["invsync", "--config", "/tmp/c.toml", "update"]);
        assert_eq!(cli.global.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Command::Update(_)));
    }

    #[test]
    fn parse_update_dry_run_short() {
        let cli = Cli::parse_from(["invsync", "-d", "update"]);
        assert!(cli.global.dry_run);
    }

    #[test]
    fn parse_update_racks() {
        let cli = Cli::parse_from(["invsync", "update", "--racks", "3,7"]);
        assert!(
            matches!(&cli.command, Command::Update(_)),
            "Expected Update command"
        );
        if let Command::Update(opts) = cli.command {
            assert_eq!(opts.racks, vec![3, 7]);
        }
    }

    #[test]
    fn parse_update_ansible_directory_and_changes() {
        let cli = Cli::parse_from([
            "invsync",
            "update",
            "-a",
            "/srv/ansible",
            "--changes",
            "changes.yml",
        ]);
        if let Command::Update(opts) = cli.command {
            assert_eq!(opts.ansible_directory, Some(PathBuf::from("/srv/ansible")));
            assert_eq!(opts.changes, Some(PathBuf::from("changes.yml")));
        } else {
            panic!("Expected Update command");
        }
    }

    #[test]
    fn rack_ids_must_be_numeric() {
        assert!(Cli::try_parse_from(["invsync", "update", "--racks", "a1"]).is_err());
    }

    #[test]
    fn parse_parameters() {
        let cli = Cli::parse_from([
            "invsync",
            "parameters",
            "-D",
            "host1,host2",
            "name",
            "rack.display",
        ]);
        if let Command::Parameters(opts) = cli.command {
            assert_eq!(opts.devices, vec!["host1", "host2"]);
            assert_eq!(opts.specs, vec!["name", "rack.display"]);
            assert!(opts.racks.is_empty());
        } else {
            panic!("Expected Parameters command");
        }
    }

    #[test]
    fn parameters_requires_a_spec() {
        assert!(Cli::try_parse_from(["invsync", "parameters"]).is_err());
    }

    #[test]
    fn device_requires_an_argument() {
        assert!(Cli::try_parse_from(["invsync", "device"]).is_err());
    }

    #[test]
    fn parse_devices_with_blanks() {
        let cli = Cli::parse_from(["invsync", "devices", "-b", "3", "4"]);
        if let Command::Devices(opts) = cli.command {
            assert!(opts.blanks);
            assert_eq!(opts.racks, vec![3, 4]);
        } else {
            panic!("Expected Devices command");
        }
    }

    #[test]
    fn devices_defaults_to_every_rack() {
        let cli = Cli::parse_from(["invsync", "devices"]);
        assert!(matches!(cli.command, Command::Devices(ref opts) if opts.racks.is_empty() && !opts.blanks));
    }

    #[test]
    fn outlets_and_networks_require_a_rack() {
        assert!(Cli::try_parse_from(["invsync", "outlets"]).is_err());
        assert!(Cli::try_parse_from(["invsync", "networks"]).is_err());
        let cli = Cli::parse_from(["invsync", "networks", "12"]);
        assert!(matches!(cli.command, Command::Networks(RackOpts { rack: 12 })));
        assert_eq!(cli.command.name(), "networks");
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["invsync", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::parse_from(["invsync", "-v", "racks"]);
        assert!(cli.verbose);
    }

    #[test]
    fn parallel_defaults_to_true() {
        let cli = Cli::parse_from(["invsync", "update"]);
        assert!(cli.global.parallel);
    }

    #[test]
    fn no_parallel_disables_parallel() {
        let cli = Cli::parse_from(["invsync", "--no-parallel", "update"]);
        assert!(!cli.global.parallel);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["invsync", "update", "--dry-run", "-v"]);
        assert!(cli.global.dry_run);
        assert!(cli.verbose);
    }

    #[test]
    fn command_names_are_stable() {
        let cli = Cli::parse_from(["invsync", "plugins"]);
        assert_eq!(cli.command.name(), "plugins");
    }
}
