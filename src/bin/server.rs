use clap::Parser;
use nft_bag_checker::api::ApiServer;
use nft_bag_checker::config::AppConfig;
use nft_bag_checker::logging::init_logging;
use nft_bag_checker::pipeline::BagChecker;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "bag-checker-server")]
#[command(about = "Form UI for checking a wallet's NFT bag")]
#[command(version)]
struct Args {
    /// Server host, overrides the configured one
    #[arg(long)]
    host: Option<String>,

    /// Server port, overrides the configured one
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = AppConfig::load()?;
    init_logging(&config.logging);

    let host = args.host.unwrap_or(config.api.host);
    let port = args.port.unwrap_or(config.api.port);

    // A missing key stops the server here, before it accepts any request
    let checker = BagChecker::from_config(&config.provider)?;
    let server = ApiServer::new(Arc::new(checker), host, port);

    log::info!("Starting bag checker UI on {}:{}", server.host, server.port);

    if let Err(e) = server.start().await {
        log::error!("Server failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}
