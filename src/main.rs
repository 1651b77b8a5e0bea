//! `invsync` command-line entry point.
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use invsync_cli::cli::{Cli, Command};
use invsync_cli::commands;
use invsync_cli::logging::{Logger, init_subscriber};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    init_subscriber(args.verbose, args.command.name());
    let log = Arc::new(Logger::new(args.command.name()));

    match &args.command {
        Command::Update(opts) => commands::update::run(&args.global, opts, &log),
        Command::Parameters(opts) => commands::parameters::run(&args.global, opts, &log),
        Command::Device(opts) => commands::device::run(&args.global, opts, &log),
        Command::Racks => commands::racks::run(&args.global, &log),
        Command::Devices(opts) => commands::devices::run(&args.global, opts, &log),
        Command::Outlets(opts) => commands::outlets::run(&args.global, opts, &log),
        Command::Networks(opts) => commands::networks::run(&args.global, opts, &log),
        Command::Plugins => commands::plugins::run(&args.global, &log),
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
