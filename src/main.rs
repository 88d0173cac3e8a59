//! Omniroute CLI entry point.

use clap::Parser;

use omniroute::cli::{handle_error, load_config, run, Cli};
use omniroute::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, json_mode),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, json_mode),
    };

    if let Err(err) = run(cli.command, config, json_mode).await {
        handle_error(err, json_mode);
    }
}
