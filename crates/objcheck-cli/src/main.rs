use clap::Parser;
use objcheck_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Log to the XDG state file; fall back to stderr so the CLI still runs.
    let filter = logging::filter_for_verbosity(cli.verbose);
    if let Err(e) = logging::init_logging(filter) {
        logging::init_logging_stderr(filter);
        tracing::warn!("file logging unavailable, using stderr: {}", e);
    }

    if let Err(err) = cli.run().await {
        eprintln!("objcheck error: {:#}", err);
        std::process::exit(1);
    }
}
