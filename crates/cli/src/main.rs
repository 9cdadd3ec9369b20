use crate::{
    commands::Commands,
    error::CliError,
    replay::ReplayArgs,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod env;
mod error;
mod output;
mod replay;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "scrollbridge",
    version = "0.1.0",
    about = "Demand-driven streaming over paginated search scrolls"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries the replayed items
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Replay {
            pages,
            request,
            max_items,
            index,
            env_file,
        } => {
            let shutdown = ShutdownCoordinator::new();
            shutdown.register_handlers();

            let args = ReplayArgs {
                pages,
                request,
                max_items,
                index,
                env_file,
            };
            let mut stdout = std::io::stdout().lock();
            match replay::run(args, &shutdown, &mut stdout).await {
                Ok(metrics) => match output::print_metrics(&mut std::io::stderr(), &metrics) {
                    Ok(()) => ExitCode::Success,
                    Err(e) => report(e),
                },
                Err(e) => report(e),
            }
        }
    };

    std::process::exit(code.as_i32());
}

fn report(err: CliError) -> ExitCode {
    match err {
        CliError::ShutdownRequested => {
            info!("Replay interrupted by shutdown signal");
            ExitCode::ShutdownRequested
        }
        err => {
            error!(error = %err, "Replay failed");
            ExitCode::GeneralError
        }
    }
}
