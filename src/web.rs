#![cfg(not(tarpaulin_include))]

use dotenvy::dotenv;
use grademaster::app;
use grademaster::config::ServerConfig;

/// Main entry point for the grading web service
///
/// Reads the server settings from the environment (see `config`),
/// starts logging and serves the JSON API until interrupted.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env()?;
    app::run(config).await
}
