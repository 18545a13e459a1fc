//! Launchpad CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use launchpad::cli::{Cli, CommandDispatcher, Commands};
use launchpad::shell::is_ci;
use launchpad::ui::{create_ui, should_use_colors, OutputMode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("launchpad=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("launchpad=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("Launchpad starting with args: {:?}", cli);

    let output_mode = OutputMode::from_flags(cli.verbose, cli.quiet);
    let colors = should_use_colors(cli.no_color);

    let is_interactive = match &cli.command {
        Commands::Run(args) => !args.non_interactive && !is_ci() && console::user_attended(),
        _ => false,
    };

    let mut ui = create_ui(is_interactive, output_mode, colors);
    let dispatcher = CommandDispatcher::new(colors);

    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => ExitCode::from(result.exit_code.clamp(0, 255) as u8),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            ExitCode::from(1)
        }
    }
}
