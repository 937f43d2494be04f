mod cli;
mod commands;
mod errors;
mod project_file;
mod tracing;

use crate::cli::{Cli, parse};
use crate::commands::Command;
use crate::tracing::TracingConfig;
use ::tracing::{Instrument, instrument};

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with --level debug for more information.");
    }));

    if let Err(error) = run_main().await {
        eprintln!("{error:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> miette::Result<()> {
    let cli = parse();

    crate::tracing::init_tracing(TracingConfig::from_cli(&cli))?;

    run_cli(cli).await
}

#[instrument(skip_all)]
#[allow(clippy::print_stdout)]
async fn run_cli(cli: Cli) -> miette::Result<()> {
    let format = cli.format;
    let command: Command = cli.command.into();
    let span = crate::command_span!(command);

    let output = commands::execute(command, format).instrument(span).await?;
    print!("{}", output.rendered);

    match output.failure {
        Some(failure) => Err(failure.into()),
        None => Ok(()),
    }
}
