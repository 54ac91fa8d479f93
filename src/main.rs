/// scenariod: scenario automation engine
///
/// Entry point for the scenariod server. Loads configuration from the
/// environment and starts the HTTP server with scenario management,
/// trigger dispatch, and execution tracking.

use scenariod::{config::Config, server::start_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    start_server(config).await?;
    Ok(())
}
