use clap::Parser;
use std::env;
use std::process;

use nft_bag_checker::api::{print_sample_config, Cli, CliHandler, Commands};
use nft_bag_checker::config::AppConfig;
use nft_bag_checker::logging::init_logging;
use nft_bag_checker::pipeline::BagChecker;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Interactive);

    // Printing the sample must work before any config or key exists
    if command == Commands::Config {
        if let Err(e) = print_sample_config(&mut std::io::stdout()) {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        return;
    }

    let mut config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    // Console output and log lines share the terminal; keep logs quiet unless asked
    if env::var("LOG_LEVEL").is_err() {
        config.logging.level = "warn".to_string();
    }
    init_logging(&config.logging);

    let checker = match BagChecker::from_config(&config.provider) {
        Ok(checker) => checker,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let handler = CliHandler::new(checker, &config.export.output_dir);
    if let Err(e) = handler.execute_command(&command).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
