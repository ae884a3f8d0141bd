mod cli;
mod execute;

use clap::Parser;
use crate::cli::CLI;
use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()>{
    let cli = CLI::parse();
    init_logging(cli.verbose);
    execute::execute(cli)
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("modgate={level}")));
    fmt().with_env_filter(filter).with_target(false).init();
}
