//! Glimpse CLI entry point: argument parsing, logging setup and dispatch.

use clap::Parser;
use glimpse_cli::{cli, commands, error, logger, ui};
use glimpse_config::ConfigDiscovery;
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // Config errors surface from the command itself; here they only mean
    // "no configured level".
    let log_level = ConfigDiscovery::new(args.command.config_dir())
        .load()
        .ok()
        .and_then(|config| config.settings.log_level);
    logger::init_logger(args.verbose, args.quiet, args.no_color, log_level.as_deref());
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Detect(detect_args) => commands::detect_execute(detect_args).await,
        cli::Command::Inject(inject_args) => commands::inject_execute(inject_args).await,
        cli::Command::Serve(serve_args) => commands::serve_execute(serve_args).await,
    };

    // Diagnostics via miette for readable error reports
    result.map_err(error::cli_error_to_miette)
}
